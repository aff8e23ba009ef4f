//! Search command handler.
//!
//! Prints the synthesized answer followed by its numbered sources, or the
//! whole response as JSON.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use clap::Args;
use kbsearch_core::{AppConfig, AppError, AppResult};
use kbsearch_rag::{Citation, SearchRequest, SearchResponse};

use super::build_client;

/// Search the knowledge base
#[derive(Args, Debug)]
pub struct SearchCommand {
    /// The search query
    pub query: String,

    /// Group to search (defaults to the configured group)
    #[arg(short, long)]
    pub group_id: Option<i64>,

    /// Maximum number of sources to return
    #[arg(short = 'n', long)]
    pub max_results: Option<u32>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SearchCommand {
    /// Execute the search command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing search command");

        let client = build_client(config)?;

        let mut request = SearchRequest::new(&self.query);
        if let Some(group_id) = self.group_id {
            request = request.with_group_id(group_id);
        }
        if let Some(max_results) = self.max_results {
            request = request.with_max_results(max_results);
        }

        let group_id = self.group_id.unwrap_or(client.config().default_group_id);

        match client.search(&request).await {
            Ok(response) => {
                if self.json {
                    let output = serde_json::json!({
                        "query": self.query,
                        "group_id": group_id,
                        "llm_answer": response.llm_answer,
                        "sources": response.sources,
                        "source_count": response.sources.len(),
                    });
                    println!("{}", serde_json::to_string_pretty(&output)?);
                } else {
                    print!("{}", render(&response));
                }
                Ok(())
            }
            Err(err) => {
                if self.json {
                    let output = serde_json::json!({
                        "query": self.query,
                        "group_id": group_id,
                        "error": err.to_string(),
                        "code": err.kind().code(),
                        "status": err.status(),
                        "source_count": 0,
                    });
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                Err(AppError::from(err))
            }
        }
    }
}

/// Render a response as plain text.
fn render(response: &SearchResponse) -> String {
    let mut out = String::new();
    out.push_str(response.llm_answer.trim());
    out.push('\n');

    if response.sources.is_empty() {
        out.push_str("\nNo sources found.\n");
        return out;
    }

    out.push_str(&format!("\nSources ({}):\n", response.sources.len()));
    for (i, source) in response.sources.iter().enumerate() {
        out.push_str(&render_citation(i + 1, source, &response.sources));
    }
    out
}

fn render_citation(number: usize, source: &Citation, all: &[Citation]) -> String {
    let mut out = format!(
        "  [{}] {} - {} (#{})\n",
        number,
        source.user_name,
        format_date(&source.msg_date),
        source.msg_id
    );

    for line in source.msg_text.trim().lines() {
        out.push_str("      ");
        out.push_str(line);
        out.push('\n');
    }

    if let Some(reply_to) = &source.reply_to_msg_id {
        match source.replies_within(all) {
            Some(parent) => out.push_str(&format!(
                "      reply to #{} ({})\n",
                reply_to, parent.user_name
            )),
            None => out.push_str(&format!("      reply to #{}\n", reply_to)),
        }
    }

    out
}

/// Format a message date for display; unknown formats are shown verbatim.
fn format_date(raw: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format("%b %-d, %Y %H:%M").to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return dt.format("%b %-d, %Y %H:%M").to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format("%b %-d, %Y").to_string();
    }
    raw.to_string()
}
