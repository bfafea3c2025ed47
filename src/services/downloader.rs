// src/services/downloader.rs

//! PDF downloader.
//!
//! Streams a file to disk in fixed-size blocks. Every attempt writes into a
//! `.part` sibling that is renamed into place only once the body has been
//! fully written, so an existing destination file always means a complete
//! download.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::StreamExt;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result, TransportError};
use crate::services::retry::RetryPolicy;
use crate::services::transport::Transport;

/// What a download call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The destination already existed; no request was made
    AlreadyPresent,
    /// The file was fetched and written
    Downloaded { bytes: u64 },
}

/// Downloads PDF files with resume-skip and retry.
#[derive(Clone)]
pub struct PdfDownloader {
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
    chunk_size: usize,
}

impl PdfDownloader {
    pub fn new(transport: Arc<dyn Transport>, retry: RetryPolicy, chunk_size: usize) -> Self {
        Self {
            transport,
            retry,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Download `url` to `destination`.
    ///
    /// Returns immediately if `destination` exists. A failed attempt discards
    /// whatever it wrote and the next attempt starts from the first byte.
    /// Failing to create the destination directory is an
    /// [`AppError::Environment`] error.
    pub async fn download(&self, url: &str, destination: &Path) -> Result<DownloadOutcome> {
        if tokio::fs::try_exists(destination).await.unwrap_or(false) {
            log::info!(
                "PDF already exists: {}, skipping download.",
                destination.display()
            );
            return Ok(DownloadOutcome::AlreadyPresent);
        }

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::environment(parent, e))?;
        }

        log::info!("Downloading PDF: {url}");
        let partial = partial_path(destination);
        let partial = partial.as_path();

        let result = self
            .retry
            .run("download", url, |_| async move {
                let attempt = self.attempt(url, partial).await;
                if attempt.is_err() {
                    discard(partial).await;
                }
                attempt
            })
            .await;

        match result {
            Ok(bytes) => {
                if let Err(e) = tokio::fs::rename(partial, destination).await {
                    discard(partial).await;
                    return Err(AppError::Io(e));
                }
                log::info!("Saved PDF: {} ({bytes} bytes)", destination.display());
                Ok(DownloadOutcome::Downloaded { bytes })
            }
            Err(exhausted) => Err(AppError::Download {
                url: url.to_string(),
                attempts: exhausted.attempts,
                last: exhausted.last,
            }),
        }
    }

    /// One attempt: request, then copy the body into `partial` block by block.
    async fn attempt(&self, url: &str, partial: &Path) -> std::result::Result<u64, TransportError> {
        let response = self.transport.get(url).await?;
        if !response.is_ok() {
            return Err(TransportError::Status(response.status));
        }

        let mut file = tokio::fs::File::create(partial).await.map_err(write_error)?;
        let mut body = response.body;
        let mut block = Vec::with_capacity(self.chunk_size);
        let mut written = 0u64;

        while let Some(piece) = body.next().await {
            let mut piece = piece?;
            while !piece.is_empty() {
                let take = (self.chunk_size - block.len()).min(piece.len());
                block.extend_from_slice(&piece.split_to(take));
                if block.len() == self.chunk_size {
                    file.write_all(&block).await.map_err(write_error)?;
                    written += block.len() as u64;
                    block.clear();
                }
            }
        }

        if !block.is_empty() {
            file.write_all(&block).await.map_err(write_error)?;
            written += block.len() as u64;
        }
        file.flush().await.map_err(write_error)?;

        Ok(written)
    }
}

/// Sibling path used while a download is in flight.
pub fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    destination.with_file_name(name)
}

async fn discard(partial: &Path) {
    if let Err(e) = tokio::fs::remove_file(partial).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            log::warn!("Could not remove partial file {}: {e}", partial.display());
        }
    }
}

fn write_error(e: std::io::Error) -> TransportError {
    TransportError::Write(e.to_string())
}
