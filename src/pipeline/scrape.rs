// src/pipeline/scrape.rs

//! Year-by-year scraping pipeline.
//!
//! For each year: fetch the listing, drop papers already recorded, then for
//! every remaining paper fetch its detail page, download its PDF and record
//! its metadata. Failures stay contained to the paper or year they occur in;
//! only an unusable output location aborts the run.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use futures::stream::{self, StreamExt};

use crate::error::{AppError, Result};
use crate::models::{
    Config, PaperLink, PaperMetadata, ScrapeSummary, ScraperConfig, SiteSchema, YearRange,
    YearSummary, pdf_path, sanitize_title,
};
use crate::services::{DownloadOutcome, Fetcher, PageParser, PdfDownloader, RetryPolicy, Transport};
use crate::storage::MetadataSink;
use crate::utils;

/// What happened to the PDF of a recorded paper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PdfStatus {
    Downloaded,
    AlreadyPresent,
    Missing,
    Failed,
}

/// Result of working on a single listed paper.
enum PaperOutcome {
    /// Ready to be recorded
    Ready {
        record: PaperMetadata,
        pdf: PdfStatus,
    },
    /// Detail page could not be fetched
    DetailFailed,
    /// Detail page had no title
    NoTitle,
    /// Title already recorded or claimed earlier in this run
    Duplicate,
    /// Output location unusable
    Fatal(AppError),
}

/// Titles recorded so far for the year being scraped.
///
/// A title is claimed before its PDF is downloaded, so two listing entries
/// resolving to the same title are only processed once.
struct ProcessedIndex(Mutex<HashSet<String>>);

impl ProcessedIndex {
    fn new(titles: HashSet<String>) -> Self {
        Self(Mutex::new(titles))
    }

    fn contains(&self, title: &str) -> bool {
        self.0
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(title)
    }

    /// Returns false if the title was already present.
    fn claim(&self, title: &str) -> bool {
        self.0
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(title.to_string())
    }

    fn release(&self, title: &str) {
        self.0
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(title);
    }
}

/// Drives fetching, parsing, downloading and persisting across years.
pub struct Scraper {
    settings: ScraperConfig,
    root_dir: PathBuf,
    fetcher: Fetcher,
    downloader: PdfDownloader,
    sink: Arc<dyn MetadataSink>,
}

impl Scraper {
    /// Create a scraper writing PDFs under `config.output.root_dir` and
    /// metadata through `sink`.
    pub fn new(config: &Config, transport: Arc<dyn Transport>, sink: Arc<dyn MetadataSink>) -> Self {
        let retry = RetryPolicy::from_config(&config.scraper);
        Self {
            settings: config.scraper.clone(),
            root_dir: config.output.root_dir.clone(),
            fetcher: Fetcher::new(Arc::clone(&transport), retry),
            downloader: PdfDownloader::new(transport, retry, config.scraper.chunk_size),
            sink,
        }
    }

    /// Scrape every year of `years` in order, pausing between years.
    ///
    /// Returns an error only for failures that make further progress
    /// impossible (see [`AppError::is_fatal`]).
    pub async fn run(&self, years: YearRange) -> Result<ScrapeSummary> {
        let start_time = Utc::now();
        utils::log::header(&format!(
            "Scraping proceedings {}-{}",
            years.start, years.end
        ));

        let delay = self.settings.request_delay();
        let mut summaries = Vec::new();

        for (i, year) in years.iter().enumerate() {
            if i > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let summary = match self.scrape_year(year).await {
                Ok(summary) => summary,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    log::error!("Year {year} aborted: {e}");
                    YearSummary {
                        listing_skipped: true,
                        ..YearSummary::new(year)
                    }
                }
            };
            utils::log::summary(&format!("Year {year}"), &summary.rows());
            summaries.push(summary);
        }

        let summary = ScrapeSummary {
            start_time,
            end_time: Utc::now(),
            years: summaries,
        };
        utils::log::summary("Scraping completed", &summary.rows());
        Ok(summary)
    }

    /// Scrape a single year.
    pub async fn scrape_year(&self, year: i32) -> Result<YearSummary> {
        let schema = SiteSchema::for_year(year);
        let parser = PageParser::new(schema, &self.settings.base_url)?;
        let mut summary = YearSummary::new(year);

        let url = self.settings.year_url(year);
        log::info!("Scraping year: {year} ({schema} markup)");

        let html = match self.fetcher.fetch(&url).await {
            Ok(html) => html,
            Err(e) => {
                log::error!("Failed to load year {year}, skipping: {e}");
                summary.listing_skipped = true;
                return Ok(summary);
            }
        };

        let links = match parser.parse_listing(&html) {
            None => {
                log::warn!("No paper list found for year {year}");
                summary.listing_skipped = true;
                return Ok(summary);
            }
            Some(links) if links.is_empty() => {
                log::warn!("No papers found for year {year}");
                summary.listing_skipped = true;
                return Ok(summary);
            }
            Some(links) => links,
        };
        summary.listed = links.len();
        log::info!("Found {} papers for year {year}", links.len());

        let index = ProcessedIndex::new(self.sink.load_processed(year).await);

        let pending: Vec<PaperLink> = links
            .into_iter()
            .filter(|link| {
                let known = index.contains(&sanitize_title(&link.title));
                if known {
                    log::info!("Skipping already processed paper: {}", link.title);
                }
                !known
            })
            .collect();
        summary.skipped_known = summary.listed - pending.len();

        let concurrency = self.settings.max_concurrent.max(1);
        let mut outcomes = stream::iter(pending.iter())
            .map(|link| self.process_paper(link, year, &parser, &index))
            .buffer_unordered(concurrency);

        // Single writer: every record is persisted from this loop.
        while let Some(outcome) = outcomes.next().await {
            match outcome {
                PaperOutcome::Ready { record, pdf } => {
                    match pdf {
                        PdfStatus::Downloaded => summary.pdf_downloaded += 1,
                        PdfStatus::AlreadyPresent => summary.pdf_already_present += 1,
                        PdfStatus::Missing => summary.pdf_missing += 1,
                        PdfStatus::Failed => summary.pdf_failures += 1,
                    }
                    match self.sink.append(&record).await {
                        Ok(()) => summary.recorded += 1,
                        Err(e) if e.is_fatal() => return Err(e),
                        Err(e) => {
                            log::error!("Failed to record {}: {e}", record.title);
                            summary.persist_failures += 1;
                            index.release(&record.title);
                        }
                    }
                }
                PaperOutcome::DetailFailed | PaperOutcome::NoTitle => summary.detail_failures += 1,
                PaperOutcome::Duplicate => summary.skipped_known += 1,
                PaperOutcome::Fatal(e) => return Err(e),
            }
        }

        Ok(summary)
    }

    async fn process_paper(
        &self,
        link: &PaperLink,
        year: i32,
        parser: &PageParser,
        index: &ProcessedIndex,
    ) -> PaperOutcome {
        log::info!("Processing paper: {} -> {}", link.title, link.url);

        let html = match self.fetcher.fetch(&link.url).await {
            Ok(html) => html,
            Err(e) => {
                log::error!("Skipping paper {}: {e}", link.url);
                return PaperOutcome::DetailFailed;
            }
        };

        let Some(detail) = parser.parse_detail(&html) else {
            log::warn!("No title found for {}", link.url);
            return PaperOutcome::NoTitle;
        };

        if !index.claim(&detail.title) {
            log::info!("Skipping already processed paper: {}", detail.title);
            return PaperOutcome::Duplicate;
        }

        let pdf = match detail.pdf_url.as_deref() {
            None => {
                log::warn!("No PDF found for {}", detail.title);
                PdfStatus::Missing
            }
            Some(pdf_url) => {
                log::info!("Found PDF for: {} -> {pdf_url}", detail.title);
                let destination = pdf_path(&self.root_dir, year, &detail.title);
                match self.downloader.download(pdf_url, &destination).await {
                    Ok(DownloadOutcome::Downloaded { .. }) => PdfStatus::Downloaded,
                    Ok(DownloadOutcome::AlreadyPresent) => PdfStatus::AlreadyPresent,
                    Err(e) if e.is_fatal() => {
                        index.release(&detail.title);
                        return PaperOutcome::Fatal(e);
                    }
                    Err(e) => {
                        log::error!("{e}");
                        PdfStatus::Failed
                    }
                }
            }
        };

        PaperOutcome::Ready {
            record: detail.into_metadata(year),
            pdf,
        }
    }
}
