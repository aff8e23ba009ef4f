//! Error taxonomy surfaced by the search client.
//!
//! Callers branch on [`RagError::kind`] rather than on message text. Only
//! `Timeout` and `Network` are retried; once the attempt budget is spent the
//! last of them is wrapped in `Unavailable`.

use kbsearch_core::AppError;
use std::time::Duration;
use thiserror::Error;

/// Errors returned by [`crate::RagClient`].
#[derive(Error, Debug)]
pub enum RagError {
    /// Blank query, or a response that breaks the expected shape
    #[error("{0}")]
    Validation(String),

    /// An attempt did not complete before its deadline
    #[error("RAG API request timeout after {}ms", .timeout.as_millis())]
    Timeout { timeout: Duration },

    /// Transport failure or non-2xx status
    #[error("{message}")]
    Network {
        message: String,
        status: Option<u16>,
        status_text: Option<String>,
    },

    /// Retries exhausted; no further automatic recovery
    #[error("Knowledge base unavailable after {attempts} attempt(s): {last}")]
    Unavailable {
        attempts: u32,
        #[source]
        last: Box<RagError>,
    },

    /// Client construction failed
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Stable discriminator for [`RagError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RagErrorKind {
    Validation,
    Timeout,
    Network,
    Unavailable,
    Config,
}

impl RagErrorKind {
    /// Wire code for this kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::Network => "NETWORK_ERROR",
            Self::Unavailable => "offline:api",
            Self::Config => "CONFIG_ERROR",
        }
    }
}

impl RagError {
    pub fn kind(&self) -> RagErrorKind {
        match self {
            Self::Validation(_) => RagErrorKind::Validation,
            Self::Timeout { .. } => RagErrorKind::Timeout,
            Self::Network { .. } => RagErrorKind::Network,
            Self::Unavailable { .. } => RagErrorKind::Unavailable,
            Self::Config(_) => RagErrorKind::Config,
        }
    }

    /// Kind of the underlying failure, looking through `Unavailable`.
    pub fn root_kind(&self) -> RagErrorKind {
        match self {
            Self::Unavailable { last, .. } => last.root_kind(),
            other => other.kind(),
        }
    }

    /// HTTP status of the underlying failure, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Network { status, .. } => *status,
            Self::Unavailable { last, .. } => last.status(),
            _ => None,
        }
    }

    /// Whether another attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Network { .. })
    }

    pub(crate) fn http_status(status: u16, status_text: &str) -> Self {
        Self::Network {
            message: format!("RAG API request failed: {} {}", status, status_text)
                .trim_end()
                .to_string(),
            status: Some(status),
            status_text: Some(status_text.to_string()),
        }
    }

    pub(crate) fn transport(message: impl std::fmt::Display) -> Self {
        Self::Network {
            message: format!("RAG API request failed: {}", message),
            status: None,
            status_text: None,
        }
    }
}

impl From<RagError> for AppError {
    fn from(err: RagError) -> Self {
        match err {
            RagError::Config(message) => AppError::Config(message),
            other => AppError::Rag {
                code: other.kind().code(),
                message: other.to_string(),
            },
        }
    }
}

/// Convenience type alias for Results with RagError.
pub type RagResult<T> = Result<T, RagError>;
