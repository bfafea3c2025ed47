// src/services/fetcher.rs

//! Page fetcher with fixed-delay retries.

use std::sync::Arc;

use crate::error::{AppError, Result, TransportError};
use crate::services::retry::RetryPolicy;
use crate::services::transport::Transport;

/// Fetches HTML pages, retrying transient failures.
#[derive(Clone)]
pub struct Fetcher {
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
}

impl Fetcher {
    pub fn new(transport: Arc<dyn Transport>, retry: RetryPolicy) -> Self {
        Self { transport, retry }
    }

    /// Fetch `url` and return its body text.
    ///
    /// Non-200 statuses, timeouts and network errors are retried. Returns
    /// [`AppError::Fetch`] once every attempt has failed.
    pub async fn fetch(&self, url: &str) -> Result<String> {
        log::info!("Fetching URL: {url}");

        let body = self
            .retry
            .run("fetch", url, |_| async move {
                let response = self.transport.get(url).await?;
                if !response.is_ok() {
                    return Err(TransportError::Status(response.status));
                }
                response.text().await
            })
            .await
            .map_err(|exhausted| AppError::Fetch {
                url: url.to_string(),
                attempts: exhausted.attempts,
                last: exhausted.last,
            })?;

        log::info!("Successfully fetched: {url}");
        Ok(body)
    }
}
