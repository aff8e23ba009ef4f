//! The knowledge base search client.
//!
//! Per call: validate the query, then attempt up to `max_retries` times.
//! Each attempt is bounded by `timeout`; timeouts and network failures are
//! retried after `retry_base_delay * 2^(n-2)` before attempt `n`. Validation
//! failures end the call immediately. The client keeps no state between calls.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OnceCell;

use crate::config::ClientConfig;
use crate::error::{RagError, RagResult};
use crate::transport::{HttpTransport, OutboundRequest, Transport};
use crate::types::{SearchPayload, SearchRequest, SearchResponse};
use crate::validate::parse_response;

/// RAG search client.
///
/// Cheap to share behind an `Arc`; concurrent `search` calls do not
/// interfere with each other.
pub struct RagClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for RagClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RagClient {
    /// Create a client that talks HTTP via `reqwest`.
    pub fn new(config: ClientConfig) -> RagResult<Self> {
        Self::with_transport(config, Arc::new(HttpTransport::new()))
    }

    /// Create a client over an arbitrary transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> RagResult<Self> {
        config.validate()?;
        Ok(Self { config, transport })
    }

    /// Create a client from `RAG_*` environment variables.
    pub fn from_env() -> RagResult<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Search the knowledge base.
    ///
    /// # Errors
    /// - `Validation` for a blank query (no request is sent) or a malformed
    ///   response (not retried)
    /// - `Unavailable` wrapping the last `Timeout`/`Network` error once the
    ///   attempt budget is exhausted
    pub async fn search(&self, request: &SearchRequest) -> RagResult<SearchResponse> {
        let payload = self.prepare(request)?;

        tracing::debug!(
            query = %payload.query,
            group_id = payload.group_id,
            max_results = payload.max_results,
            "Prepared search request"
        );

        let outbound = OutboundRequest {
            method: self.config.method,
            url: self.config.endpoint.clone(),
            payload,
        };

        let max_attempts = self.config.max_retries;
        let mut attempt = 1;

        loop {
            tracing::debug!(attempt, max_attempts, "Sending search request");

            match self.attempt(&outbound).await {
                Ok(response) => {
                    tracing::info!(
                        attempt,
                        sources = response.sources.len(),
                        "Search completed"
                    );
                    return Ok(response);
                }
                Err(err) if !err.is_retryable() => {
                    tracing::warn!(attempt, code = err.kind().code(), "Search rejected: {}", err);
                    return Err(err);
                }
                Err(err) if attempt >= max_attempts => {
                    tracing::error!(attempts = attempt, "Search failed, retries exhausted: {}", err);
                    return Err(RagError::Unavailable {
                        attempts: attempt,
                        last: Box::new(err),
                    });
                }
                Err(err) => {
                    attempt += 1;
                    let delay = backoff_delay(self.config.retry_base_delay, attempt);
                    tracing::warn!(
                        next_attempt = attempt,
                        delay_ms = delay.as_millis() as u64,
                        code = err.kind().code(),
                        "Search attempt failed, retrying: {}",
                        err
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Validate the request and fill in defaults. Performs no I/O.
    pub fn prepare(&self, request: &SearchRequest) -> RagResult<SearchPayload> {
        let query = request.query.trim();
        if query.is_empty() {
            return Err(RagError::Validation(
                "query required: query cannot be empty".to_string(),
            ));
        }

        Ok(SearchPayload {
            query: query.to_string(),
            group_id: request.group_id.unwrap_or(self.config.default_group_id),
            max_results: request
                .max_results
                .unwrap_or(self.config.default_max_results),
        })
    }

    /// One bounded attempt. Dropping the send future on timeout aborts it.
    async fn attempt(&self, outbound: &OutboundRequest) -> RagResult<SearchResponse> {
        let response =
            match tokio::time::timeout(self.config.timeout, self.transport.send(outbound)).await {
                Err(_) => {
                    return Err(RagError::Timeout {
                        timeout: self.config.timeout,
                    })
                }
                Ok(Err(e)) => return Err(RagError::transport(e)),
                Ok(Ok(response)) => response,
            };

        if !response.is_success() {
            return Err(RagError::http_status(response.status, &response.status_text));
        }

        parse_response(&response.body, self.config.id_kind)
    }
}

/// Delay before attempt `attempt` (1-based): zero for the first attempt,
/// then `base`, `2 * base`, `4 * base`, ...
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    if attempt < 2 {
        return Duration::ZERO;
    }
    let factor = 1u32.checked_shl(attempt - 2).unwrap_or(u32::MAX);
    base.saturating_mul(factor)
}

static SHARED_CLIENT: OnceCell<Arc<RagClient>> = OnceCell::const_new();

/// Process-wide client built from the environment on first use.
///
/// Concurrent first callers share one initialisation. A failed
/// initialisation is not cached, so a later call may succeed.
pub async fn shared_client() -> RagResult<Arc<RagClient>> {
    SHARED_CLIENT
        .get_or_try_init(|| async {
            tracing::debug!("Initialising shared search client");
            RagClient::from_env().map(Arc::new)
        })
        .await
        .cloned()
}
