//! Config command handler.

use clap::Args;
use kbsearch_core::{AppConfig, AppResult};

use super::client_config;

/// Show the resolved client configuration
#[derive(Args, Debug)]
pub struct ConfigCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ConfigCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let client = client_config(config)?;

        let output = serde_json::json!({
            "configFile": config.config_file,
            "endpoint": client.endpoint.as_str(),
            "defaultGroupId": client.default_group_id,
            "timeoutMs": client.timeout.as_millis() as u64,
            "maxRetries": client.max_retries,
            "retryDelayMs": client.retry_base_delay.as_millis() as u64,
            "defaultMaxResults": client.default_max_results,
            "method": client.method.as_str(),
            "msgIdKind": client.id_kind.as_str(),
        });

        if self.json {
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else if let serde_json::Value::Object(fields) = output {
            for (key, value) in fields {
                println!("{:<18} {}", key, value);
            }
        }

        Ok(())
    }
}
