//! Search request and response types.
//!
//! `Citation` identifiers come in two deployment variants (integer or text).
//! Both deserialize into [`MsgId`]; which one is accepted is decided by the
//! configured [`IdKind`] during response validation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A knowledge base search request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Free-text query; must not be blank
    pub query: String,

    /// Message-source partition to search (falls back to the configured default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<i64>,

    /// Upper bound on returned sources (falls back to the configured default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,
}

impl SearchRequest {
    /// Create a request with only a query.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            group_id: None,
            max_results: None,
        }
    }

    /// Search within a specific group.
    pub fn with_group_id(mut self, group_id: i64) -> Self {
        self.group_id = Some(group_id);
        self
    }

    /// Limit the number of returned sources.
    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = Some(max_results);
        self
    }
}

/// The body (or query string) actually sent to the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchPayload {
    pub query: String,
    pub group_id: i64,
    pub max_results: u32,
}

/// A validated search response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Synthesized answer
    pub llm_answer: String,

    /// Supporting messages in the order the service returned them
    pub sources: Vec<Citation>,
}

/// One retrieved message supporting the answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub msg_id: MsgId,
    pub user_name: String,

    /// Opaque date string as sent by the service
    pub msg_date: String,
    pub msg_text: String,

    /// Back-reference to another message; it may not be in the same result set
    #[serde(default)]
    pub reply_to_msg_id: Option<MsgId>,
}

impl Citation {
    /// Whether this message replies to another citation in `sources`.
    pub fn replies_within<'a>(&self, sources: &'a [Citation]) -> Option<&'a Citation> {
        let target = self.reply_to_msg_id.as_ref()?;
        sources.iter().find(|c| &c.msg_id == target)
    }
}

/// Message identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MsgId {
    Integer(i64),
    Text(String),
}

impl MsgId {
    /// The identifier kind of this value.
    pub fn kind(&self) -> IdKind {
        match self {
            Self::Integer(_) => IdKind::Integer,
            Self::Text(_) => IdKind::Text,
        }
    }
}

impl fmt::Display for MsgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(id) => write!(f, "{}", id),
            Self::Text(id) => f.write_str(id),
        }
    }
}

/// Which identifier representation a deployment uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdKind {
    #[default]
    Text,
    Integer,
}

impl IdKind {
    /// Parse an identifier kind from a config string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "string" | "text" | "str" => Some(Self::Text),
            "integer" | "int" | "number" | "numeric" => Some(Self::Integer),
            _ => None,
        }
    }

    /// Get the canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "string",
            Self::Integer => "integer",
        }
    }
}
