//! Tool command handler.
//!
//! Runs the knowledge base chat tool the way a chat runtime would: data
//! stream events go to stderr as JSON lines, the tool result goes to stdout.

use clap::Args;
use kbsearch_core::{AppConfig, AppError, AppResult};
use kbsearch_rag::tool::{TOOL_DESCRIPTION, TOOL_NAME};
use kbsearch_rag::{KnowledgeBaseSearchTool, ToolInput};
use std::sync::Arc;

use super::build_client;

/// Run the chat tool handler with JSON arguments
#[derive(Args, Debug)]
pub struct ToolCommand {
    /// Tool arguments, e.g. '{"query": "...", "group_id": 123}'
    pub input: Option<String>,

    /// Print the tool name, description and input schema instead
    #[arg(long)]
    pub describe: bool,
}

impl ToolCommand {
    /// Execute the tool command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let client = Arc::new(build_client(config)?);
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let tool = KnowledgeBaseSearchTool::new(client).with_events(tx);

        if self.describe {
            let description = serde_json::json!({
                "name": TOOL_NAME,
                "description": TOOL_DESCRIPTION,
                "inputSchema": tool.input_schema(),
            });
            println!("{}", serde_json::to_string_pretty(&description)?);
            return Ok(());
        }

        let raw = self
            .input
            .as_deref()
            .ok_or_else(|| AppError::Config("No tool input provided".to_string()))?;
        let input: ToolInput = serde_json::from_str(raw)?;

        tracing::info!("Executing {} tool", TOOL_NAME);
        let output = tool.execute(input).await;
        drop(tool);

        while let Some(event) = rx.recv().await {
            eprintln!("{}", serde_json::to_string(&event)?);
        }

        println!("{}", serde_json::to_string_pretty(&output)?);

        if output.is_success() {
            Ok(())
        } else {
            Err(AppError::Other("Knowledge base tool reported a failure".to_string()))
        }
    }
}
