//! Pipeline entry points.
//!
//! - `run_scrape`: Scrape a year range into local storage
//! - `run_info`: Summarize what local storage holds

pub mod info;
pub mod scrape;

use std::sync::Arc;

use crate::error::Result;
use crate::models::{Config, ScrapeSummary, YearRange};
use crate::services::HttpTransport;
use crate::storage::LocalStorage;

pub use info::{YearInfo, run_info};
pub use scrape::Scraper;

/// Scrape `years` over HTTP into the configured output directory.
pub async fn run_scrape(config: &Config, years: YearRange) -> Result<ScrapeSummary> {
    let transport = Arc::new(HttpTransport::new(&config.scraper)?);
    let storage = Arc::new(LocalStorage::new(&config.output.root_dir));
    storage.ensure_root().await?;

    Scraper::new(config, transport, storage).run(years).await
}
