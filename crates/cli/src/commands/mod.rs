//! Command handlers for the KB Search CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod config;
pub mod search;
pub mod tool;

pub use config::ConfigCommand;
pub use search::SearchCommand;
pub use tool::ToolCommand;

use kbsearch_core::{AppConfig, AppResult};
use kbsearch_rag::{ClientConfig, RagClient};

/// Resolve the client configuration from layered settings.
pub fn client_config(config: &AppConfig) -> AppResult<ClientConfig> {
    Ok(ClientConfig::from_lookup(|key| config.rag.get(key))?)
}

/// Build a search client from layered settings.
pub fn build_client(config: &AppConfig) -> AppResult<RagClient> {
    Ok(RagClient::new(client_config(config)?)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kbsearch_core::config::keys;
    use kbsearch_core::AppError;

    #[test]
    fn test_missing_endpoint_is_config_error() {
        let config = AppConfig::default();
        assert!(matches!(client_config(&config), Err(AppError::Config(_))));
    }

    #[test]
    fn test_layered_settings_reach_client() {
        let mut config = AppConfig::default();
        config.rag.set(keys::ENDPOINT_URL, "http://localhost:8000/rag");
        config.rag.set(keys::DEFAULT_GROUP_ID, "31337");

        let client = build_client(&config).unwrap();
        assert_eq!(client.config().default_group_id, 31337);
    }
}
