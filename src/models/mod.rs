// src/models/mod.rs

//! Domain models for the scraper.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod paper;
mod schema;
mod summary;

// Re-export all public types
pub use config::{Config, OutputConfig, ScraperConfig, YearRange};
pub use paper::{
    MAX_TITLE_CHARS, NO_ABSTRACT, NO_AUTHORS, NO_PDF, PaperDetail, PaperLink, PaperMetadata,
    pdf_path, sanitize_title,
};
pub use schema::SiteSchema;
pub use summary::{ScrapeSummary, YearSummary};
