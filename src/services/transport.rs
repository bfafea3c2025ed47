// src/services/transport.rs

//! HTTP transport seam.
//!
//! Everything above this module sees a status code and a byte stream;
//! `reqwest` errors are converted into [`TransportError`] here.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use reqwest::Client;

use crate::error::{Result, TransportError};
use crate::models::ScraperConfig;

/// Streaming response body.
pub type BodyStream = BoxStream<'static, std::result::Result<Bytes, TransportError>>;

/// Response of a single GET attempt.
pub struct TransportResponse {
    pub status: u16,
    pub body: BodyStream,
}

impl TransportResponse {
    /// Build a response from an in-memory body.
    pub fn from_bytes(status: u16, body: impl Into<Bytes>) -> Self {
        let body: Bytes = body.into();
        Self {
            status,
            body: futures::stream::once(async move { Ok(body) }).boxed(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Drain the body into a string, replacing invalid UTF-8.
    pub async fn text(mut self) -> std::result::Result<String, TransportError> {
        let mut buf = Vec::new();
        while let Some(chunk) = self.body.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// Issues one HTTP GET attempt.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> std::result::Result<TransportResponse, TransportError>;
}

/// `reqwest`-backed transport.
///
/// The client timeout is the total budget of one attempt, body included.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport with the configured user agent and timeout.
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> std::result::Result<TransportResponse, TransportError> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes_stream().map_err(TransportError::from).boxed();
        Ok(TransportResponse { status, body })
    }
}
