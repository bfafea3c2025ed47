//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP and scraping behavior settings
    #[serde(default)]
    pub scraper: ScraperConfig,

    /// Where scraped output is written
    #[serde(default)]
    pub output: OutputConfig,

    /// Inclusive range of conference years to process
    #[serde(default)]
    pub years: YearRange,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| AppError::config(format!("cannot read {}: {e}", path.display())))?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.scraper.user_agent.trim().is_empty() {
            return Err(AppError::validation("scraper.user_agent is empty"));
        }
        if url::Url::parse(&self.scraper.base_url).is_err() {
            return Err(AppError::validation(format!(
                "scraper.base_url is not an absolute URL: {}",
                self.scraper.base_url
            )));
        }
        if self.scraper.timeout_secs == 0 {
            return Err(AppError::validation("scraper.timeout_secs must be > 0"));
        }
        if self.scraper.max_attempts == 0 {
            return Err(AppError::validation("scraper.max_attempts must be > 0"));
        }
        if self.scraper.chunk_size == 0 {
            return Err(AppError::validation("scraper.chunk_size must be > 0"));
        }
        if self.scraper.max_concurrent == 0 {
            return Err(AppError::validation("scraper.max_concurrent must be > 0"));
        }
        if self.years.start > self.years.end {
            return Err(AppError::validation(format!(
                "years.start ({}) is after years.end ({})",
                self.years.start, self.years.end
            )));
        }
        Ok(())
    }
}

/// HTTP client and scraping behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Proceedings site every relative link is resolved against
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Total timeout of a single HTTP attempt, in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Attempts per URL, including the first one
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    /// Fixed pause between attempts in milliseconds
    #[serde(default = "defaults::retry_delay")]
    pub retry_delay_ms: u64,

    /// Politeness delay between years in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Size of each block written to disk while downloading, in bytes
    #[serde(default = "defaults::chunk_size")]
    pub chunk_size: usize,

    /// Papers processed concurrently within a year
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,
}

impl ScraperConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    /// URL of the listing page for a conference year.
    pub fn year_url(&self, year: i32) -> String {
        format!(
            "{}/paper_files/paper/{}",
            self.base_url.trim_end_matches('/'),
            year
        )
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_attempts: defaults::max_attempts(),
            retry_delay_ms: defaults::retry_delay(),
            request_delay_ms: defaults::request_delay(),
            chunk_size: defaults::chunk_size(),
            max_concurrent: defaults::max_concurrent(),
        }
    }
}

/// Output location settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Root directory holding metadata stores and per-year PDF folders
    #[serde(default = "defaults::root_dir")]
    pub root_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root_dir: defaults::root_dir(),
        }
    }
}

/// Inclusive range of years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    #[serde(default = "defaults::start_year")]
    pub start: i32,
    #[serde(default = "defaults::end_year")]
    pub end: i32,
}

impl YearRange {
    pub fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    pub fn iter(&self) -> std::ops::RangeInclusive<i32> {
        self.start..=self.end
    }
}

impl Default for YearRange {
    fn default() -> Self {
        Self {
            start: defaults::start_year(),
            end: defaults::end_year(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Scraper defaults
    pub fn base_url() -> String {
        "https://papers.nips.cc".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; proceedings/0.1)".into()
    }
    pub fn timeout() -> u64 {
        300
    }
    pub fn max_attempts() -> u32 {
        3
    }
    pub fn retry_delay() -> u64 {
        5_000
    }
    pub fn request_delay() -> u64 {
        5_000
    }
    pub fn chunk_size() -> usize {
        1024 * 1024
    }
    pub fn max_concurrent() -> usize {
        1
    }

    // Output defaults
    pub fn root_dir() -> PathBuf {
        PathBuf::from("scraped-pdfs")
    }

    // Year defaults
    pub fn start_year() -> i32 {
        2017
    }
    pub fn end_year() -> i32 {
        2023
    }
}
