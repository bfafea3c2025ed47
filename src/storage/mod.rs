//! Storage abstractions for paper metadata.
//!
//! Every year has two metadata stores kept side by side, plus a folder of
//! downloaded PDFs:
//!
//! ```text
//! {root}/
//! ├── metadata_2021.csv     # header + one row per recorded paper
//! ├── metadata_2021.json    # JSON array of the same records
//! └── 2021/
//!     └── {sanitized title}.pdf
//! ```
//!
//! The JSON store is rewritten in full on every append, so two processes
//! must never write the same root at the same time.

pub mod local;

use std::collections::HashSet;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::PaperMetadata;

// Re-export for convenience
pub use local::LocalStorage;

/// Trait for metadata storage backends.
#[async_trait]
pub trait MetadataSink: Send + Sync {
    /// Persist one record to every store of its year, creating stores as needed.
    async fn append(&self, record: &PaperMetadata) -> Result<()>;

    /// Sanitized titles already recorded for `year`.
    ///
    /// Missing or unreadable stores yield an empty set.
    async fn load_processed(&self, year: i32) -> HashSet<String>;
}
