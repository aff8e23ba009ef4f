//! Knowledge base search client for the KB Search CLI.
//!
//! This crate talks to an external RAG (Retrieval-Augmented Generation)
//! search service: it builds the outbound request, bounds every attempt with
//! a deadline, retries transient failures with exponential backoff and
//! validates the untrusted JSON payload before handing back typed results.
//!
//! # Example
//! ```no_run
//! use kbsearch_rag::{ClientConfig, RagClient, SearchRequest};
//!
//! # async fn example() -> Result<(), kbsearch_rag::RagError> {
//! let config = ClientConfig::new("https://rag.example.com/search", 2493387211)?;
//! let client = RagClient::new(config)?;
//! let response = client.search(&SearchRequest::new("What is DexGuru?")).await?;
//! println!("{} ({} sources)", response.llm_answer, response.sources.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod tool;
pub mod transport;
pub mod types;
pub mod validate;

// Re-export main types
pub use client::{backoff_delay, shared_client, RagClient};
pub use config::{ClientConfig, RequestMethod};
pub use error::{RagError, RagErrorKind, RagResult};
pub use tool::{KnowledgeBaseSearchTool, StreamEvent, ToolInput, ToolOutput};
pub use transport::{HttpTransport, OutboundRequest, Transport, TransportError, TransportResponse};
pub use types::{Citation, IdKind, MsgId, SearchPayload, SearchRequest, SearchResponse};
