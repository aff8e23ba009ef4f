//! HTTP transport seam.
//!
//! The client performs exactly one [`Transport::send`] per attempt and wraps
//! it in its own deadline, so implementations need not enforce timeouts.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Url;

use crate::config::RequestMethod;
use crate::types::SearchPayload;

/// One outbound attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    pub method: RequestMethod,
    pub url: Url,
    pub payload: SearchPayload,
}

/// Raw response; the body is read in full before it is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Connection-level failure (DNS, refused, reset, body read).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Trait for search transports.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one request and read the full response body.
    async fn send(&self, request: &OutboundRequest) -> Result<TransportResponse, TransportError>;
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured `reqwest::Client` (proxies, TLS roots, pooling).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &OutboundRequest) -> Result<TransportResponse, TransportError> {
        let builder = match request.method {
            RequestMethod::Post => self.client.post(request.url.clone()).json(&request.payload),
            RequestMethod::Get => self.client.get(request.url.clone()).query(&request.payload),
        };

        let response = builder.header(ACCEPT, "application/json").send().await?;

        let status = response.status();
        let body = response.text().await?;

        Ok(TransportResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }
}
