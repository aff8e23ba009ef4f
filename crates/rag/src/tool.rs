//! Chat tool handler for knowledge base search.
//!
//! The tool turns every outcome into a value: successful searches and
//! failures are both streamed to the UI channel as [`StreamEvent`]s and
//! returned to the model as a [`ToolOutput`].

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

use crate::client::RagClient;
use crate::types::{Citation, SearchRequest};

pub const TOOL_NAME: &str = "knowledgeBaseSearch";
pub const TOOL_DESCRIPTION: &str =
    "Search external Telegram knowledge base for relevant information and sources";

/// Number of sources requested by the tool.
pub const TOOL_MAX_RESULTS: u32 = 5;

/// Message returned to the model when the search fails.
pub const FAILURE_MESSAGE: &str =
    "Failed to search knowledge base. Please try again or rephrase your query.";

/// Tool arguments as supplied by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInput {
    pub query: String,
    #[serde(default)]
    pub group_id: Option<i64>,
}

/// Event pushed to the UI data stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum StreamEvent {
    #[serde(rename = "data-rag-response")]
    RagResponse {
        llm_answer: String,
        sources: Vec<Citation>,
    },
    #[serde(rename = "data-rag-error")]
    RagError {
        error: String,
        message: String,
        code: String,
    },
}

/// Result handed back to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ToolOutput {
    Success {
        query: String,
        group_id: i64,
        llm_answer: String,
        sources: Vec<Citation>,
        source_count: usize,
    },
    Failure {
        query: String,
        group_id: i64,
        error: String,
        code: String,
        source_count: usize,
    },
}

impl ToolOutput {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Knowledge base search tool.
pub struct KnowledgeBaseSearchTool {
    client: Arc<RagClient>,
    events: Option<UnboundedSender<StreamEvent>>,
}

impl KnowledgeBaseSearchTool {
    pub fn new(client: Arc<RagClient>) -> Self {
        Self {
            client,
            events: None,
        }
    }

    /// Stream events to a UI channel.
    pub fn with_events(mut self, events: UnboundedSender<StreamEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// JSON schema of [`ToolInput`].
    pub fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "minLength": 1,
                    "description": "Search query to find relevant information in the knowledge base"
                },
                "group_id": {
                    "type": "integer",
                    "description": format!(
                        "Telegram group ID to search (default: {})",
                        self.client.config().default_group_id
                    )
                }
            },
            "required": ["query"]
        })
    }

    /// Run the search. Never fails; errors become `ToolOutput::Failure`.
    pub async fn execute(&self, input: ToolInput) -> ToolOutput {
        let group_id = input
            .group_id
            .unwrap_or(self.client.config().default_group_id);

        let request = SearchRequest::new(input.query.clone())
            .with_group_id(group_id)
            .with_max_results(TOOL_MAX_RESULTS);

        match self.client.search(&request).await {
            Ok(response) => {
                self.emit(StreamEvent::RagResponse {
                    llm_answer: response.llm_answer.clone(),
                    sources: response.sources.clone(),
                });

                ToolOutput::Success {
                    query: input.query,
                    group_id,
                    source_count: response.sources.len(),
                    llm_answer: response.llm_answer,
                    sources: response.sources,
                }
            }
            Err(err) => {
                tracing::error!(code = err.kind().code(), "Knowledge base search error: {}", err);

                let code = err.kind().code().to_string();
                self.emit(StreamEvent::RagError {
                    error: "Failed to search knowledge base".to_string(),
                    message: err.to_string(),
                    code: code.clone(),
                });

                ToolOutput::Failure {
                    query: input.query,
                    group_id,
                    error: FAILURE_MESSAGE.to_string(),
                    code,
                    source_count: 0,
                }
            }
        }
    }

    fn emit(&self, event: StreamEvent) {
        if let Some(events) = &self.events {
            if events.send(event).is_err() {
                tracing::debug!("Data stream closed, dropping event");
            }
        }
    }
}
