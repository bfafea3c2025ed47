// src/error.rs

//! Unified error handling for the scraper.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for scraper operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client could not be built
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV serialization failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Page fetch gave up after exhausting its attempts
    #[error("Fetch of {url} failed after {attempts} attempts: {last}")]
    Fetch {
        url: String,
        attempts: u32,
        last: TransportError,
    },

    /// PDF download gave up after exhausting its attempts
    #[error("Download of {url} failed after {attempts} attempts: {last}")]
    Download {
        url: String,
        attempts: u32,
        last: TransportError,
    },

    /// Output location cannot be prepared. Aborts the run.
    #[error("Output location {path:?} is unusable: {source}")]
    Environment {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an environment error for an unusable output path.
    pub fn environment(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Environment {
            path: path.into(),
            source,
        }
    }

    /// Whether this error must abort the whole run instead of being contained.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Environment { .. })
    }
}

/// Failure of a single HTTP attempt.
///
/// Transport failures never escape the fetcher or downloader as raw
/// `reqwest` errors; they are folded into one of these kinds.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Server answered with a status other than 200
    #[error("HTTP status {0}")]
    Status(u16),

    /// The attempt exceeded its total timeout
    #[error("timed out")]
    Timeout,

    /// Connection, TLS or body read failure
    #[error("network error: {0}")]
    Network(String),

    /// Local write failed while streaming a response to disk
    #[error("write error: {0}")]
    Write(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(e.to_string())
        }
    }
}
