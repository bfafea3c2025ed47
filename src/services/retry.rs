// src/services/retry.rs

//! Fixed-delay retry loop shared by page fetches and PDF downloads.

use std::future::Future;
use std::time::Duration;

use crate::error::TransportError;
use crate::models::ScraperConfig;

/// How many times to try and how long to wait in between.
///
/// The delay is the same before every retry; there is no exponential growth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

/// Attempts were exhausted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exhausted {
    pub attempts: u32,
    pub last: TransportError,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn from_config(config: &ScraperConfig) -> Self {
        Self::new(config.max_attempts, config.retry_delay())
    }

    /// Run `attempt` until it succeeds or the attempts run out.
    ///
    /// `attempt` receives the 1-based attempt number. Each failure is logged:
    /// bad statuses as warnings, everything else as errors.
    pub async fn run<T, F, Fut>(
        &self,
        label: &str,
        url: &str,
        mut attempt: F,
    ) -> Result<T, Exhausted>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, TransportError>>,
    {
        let mut last = TransportError::Network("no attempt made".to_string());

        for n in 1..=self.max_attempts {
            match attempt(n).await {
                Ok(value) => return Ok(value),
                Err(error) => {
                    match &error {
                        TransportError::Status(status) => {
                            log::warn!("Failed to {label} {url} (HTTP {status})")
                        }
                        TransportError::Timeout => log::error!(
                            "Timeout on attempt {n}/{} to {label} {url}",
                            self.max_attempts
                        ),
                        other => log::error!(
                            "Failed to {label} {url} on attempt {n}/{}: {other}",
                            self.max_attempts
                        ),
                    }
                    last = error;
                }
            }

            if n < self.max_attempts {
                log::info!("Retrying {label} ({n}/{})...", self.max_attempts);
                if !self.delay.is_zero() {
                    tokio::time::sleep(self.delay).await;
                }
            }
        }

        log::error!(
            "Giving up on {url} after {} attempts",
            self.max_attempts
        );
        Err(Exhausted {
            attempts: self.max_attempts,
            last,
        })
    }
}
