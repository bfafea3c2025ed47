//! Service layer for the scraper.
//!
//! This module contains the building blocks of the pipeline:
//! - HTTP access (`Transport`, `HttpTransport`)
//! - Fixed-delay retries (`RetryPolicy`)
//! - Page fetching (`Fetcher`)
//! - PDF downloading (`PdfDownloader`)
//! - Page parsing (`PageParser`)

mod downloader;
mod fetcher;
mod parser;
mod retry;
pub(crate) mod transport;

pub use downloader::{DownloadOutcome, PdfDownloader, partial_path};
pub use fetcher::Fetcher;
pub use parser::PageParser;
pub use retry::{Exhausted, RetryPolicy};
pub use transport::{BodyStream, HttpTransport, Transport, TransportResponse};
