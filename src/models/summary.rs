//! Run statistics.

use chrono::{DateTime, Utc};

/// Counters for one conference year.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct YearSummary {
    pub year: i32,
    /// Paper links found on the listing page
    pub listed: usize,
    /// Papers skipped because they were already recorded
    pub skipped_known: usize,
    /// Papers whose metadata was recorded in this run
    pub recorded: usize,
    /// Detail pages that could not be fetched or had no title
    pub detail_failures: usize,
    pub pdf_downloaded: usize,
    pub pdf_already_present: usize,
    pub pdf_missing: usize,
    pub pdf_failures: usize,
    /// Records that could not be written
    pub persist_failures: usize,
    /// Set when the listing page could not be fetched or held no papers
    pub listing_skipped: bool,
}

impl YearSummary {
    pub fn new(year: i32) -> Self {
        Self {
            year,
            ..Self::default()
        }
    }

    /// Key/value rows for log output.
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Listed", self.listed.to_string()),
            ("Already recorded", self.skipped_known.to_string()),
            ("Recorded", self.recorded.to_string()),
            ("Detail failures", self.detail_failures.to_string()),
            ("PDFs downloaded", self.pdf_downloaded.to_string()),
            ("PDFs already present", self.pdf_already_present.to_string()),
            ("PDFs missing", self.pdf_missing.to_string()),
            ("PDF failures", self.pdf_failures.to_string()),
            ("Persist failures", self.persist_failures.to_string()),
        ]
    }
}

/// Outcome of a full run over a year range.
#[derive(Debug, Clone)]
pub struct ScrapeSummary {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub years: Vec<YearSummary>,
}

impl ScrapeSummary {
    pub fn recorded(&self) -> usize {
        self.years.iter().map(|y| y.recorded).sum()
    }

    pub fn pdf_downloaded(&self) -> usize {
        self.years.iter().map(|y| y.pdf_downloaded).sum()
    }

    pub fn years_skipped(&self) -> usize {
        self.years.iter().filter(|y| y.listing_skipped).count()
    }

    pub fn rows(&self) -> Vec<(&'static str, String)> {
        let elapsed = self.end_time - self.start_time;
        vec![
            ("Years", self.years.len().to_string()),
            ("Years skipped", self.years_skipped().to_string()),
            ("Papers recorded", self.recorded().to_string()),
            ("PDFs downloaded", self.pdf_downloaded().to_string()),
            ("Elapsed", format!("{}s", elapsed.num_seconds())),
        ]
    }
}
