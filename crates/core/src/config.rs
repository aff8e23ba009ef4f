//! Configuration management for the KB Search CLI.
//!
//! This module handles loading and merging configuration from multiple sources,
//! lowest precedence first:
//! - Built-in defaults
//! - Config file (`.kbsearch/config.yaml`, or the path in `KBSEARCH_CONFIG`)
//! - Environment variables
//! - Command-line flags
//!
//! The `rag` section is kept as raw optional values; the search client parses
//! and validates them when it is constructed.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::logging::LogFormat;

/// Environment-style keys understood by the search client.
pub mod keys {
    pub const ENDPOINT_URL: &str = "RAG_ENDPOINT_URL";
    pub const DEFAULT_GROUP_ID: &str = "RAG_DEFAULT_GROUP_ID";
    pub const TIMEOUT: &str = "RAG_TIMEOUT";
    pub const MAX_RETRIES: &str = "RAG_MAX_RETRIES";
    pub const RETRY_DELAY: &str = "RAG_RETRY_DELAY";
    pub const HTTP_METHOD: &str = "RAG_HTTP_METHOD";
    pub const MSG_ID_KIND: &str = "RAG_MSG_ID_KIND";

    /// Every key, in documentation order.
    pub const ALL: [&str; 7] = [
        ENDPOINT_URL,
        DEFAULT_GROUP_ID,
        TIMEOUT,
        MAX_RETRIES,
        RETRY_DELAY,
        HTTP_METHOD,
        MSG_ID_KIND,
    ];
}

/// Default config file location, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = ".kbsearch/config.yaml";

/// Main application configuration.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Config file that was merged, if any
    pub config_file: Option<PathBuf>,

    /// Log filter override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Log line format
    pub log_format: LogFormat,

    /// Search client settings
    pub rag: RagSettings,
}

/// Search client settings as found in YAML, environment, or flags.
///
/// Values stay as strings so that parse errors are reported by the client
/// factory with the key that caused them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RagSettings {
    pub endpoint: Option<String>,
    pub default_group_id: Option<String>,
    pub timeout_ms: Option<String>,
    pub max_retries: Option<String>,
    pub retry_delay_ms: Option<String>,
    pub method: Option<String>,
    pub msg_id_kind: Option<String>,
}

impl RagSettings {
    /// Look up a value by its environment-style key.
    pub fn get(&self, key: &str) -> Option<String> {
        self.slot(key).and_then(|v| v.clone())
    }

    /// Set a value by its environment-style key. Unknown keys are ignored.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        if let Some(slot) = self.slot_mut(key) {
            *slot = Some(value.into());
        }
    }

    /// Overlay every key found by `lookup`.
    pub fn apply_lookup<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for key in keys::ALL {
            if let Some(value) = lookup(key) {
                self.set(key, value);
            }
        }
    }

    fn slot(&self, key: &str) -> Option<&Option<String>> {
        match key {
            keys::ENDPOINT_URL => Some(&self.endpoint),
            keys::DEFAULT_GROUP_ID => Some(&self.default_group_id),
            keys::TIMEOUT => Some(&self.timeout_ms),
            keys::MAX_RETRIES => Some(&self.max_retries),
            keys::RETRY_DELAY => Some(&self.retry_delay_ms),
            keys::HTTP_METHOD => Some(&self.method),
            keys::MSG_ID_KIND => Some(&self.msg_id_kind),
            _ => None,
        }
    }

    fn slot_mut(&mut self, key: &str) -> Option<&mut Option<String>> {
        match key {
            keys::ENDPOINT_URL => Some(&mut self.endpoint),
            keys::DEFAULT_GROUP_ID => Some(&mut self.default_group_id),
            keys::TIMEOUT => Some(&mut self.timeout_ms),
            keys::MAX_RETRIES => Some(&mut self.max_retries),
            keys::RETRY_DELAY => Some(&mut self.retry_delay_ms),
            keys::HTTP_METHOD => Some(&mut self.method),
            keys::MSG_ID_KIND => Some(&mut self.msg_id_kind),
            _ => None,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    rag: Option<RagFileSection>,
    logging: Option<LoggingConfig>,
}

/// YAML allows numbers where the settings keep strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RagFileSection {
    endpoint: Option<String>,
    default_group_id: Option<serde_yaml::Value>,
    timeout_ms: Option<serde_yaml::Value>,
    max_retries: Option<serde_yaml::Value>,
    retry_delay_ms: Option<serde_yaml::Value>,
    method: Option<String>,
    msg_id_kind: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
    json: Option<bool>,
}

fn scalar_to_string(value: Option<serde_yaml::Value>) -> Option<String> {
    match value? {
        serde_yaml::Value::String(s) => Some(s),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl AppConfig {
    /// Load configuration from the config file and process environment.
    ///
    /// Environment variables:
    /// - `KBSEARCH_CONFIG`: Path to config file
    /// - `RAG_*`: Search client settings (see [`keys`])
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use kbsearch_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Endpoint: {:?}", config.rag.endpoint);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_with(None, |key| std::env::var(key).ok())
    }

    /// Load configuration with an explicit config file and variable lookup.
    ///
    /// An explicitly named file must exist; the default location is optional.
    pub fn load_with<F>(config_file: Option<&Path>, lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        let explicit = config_file
            .map(Path::to_path_buf)
            .or_else(|| lookup("KBSEARCH_CONFIG").map(PathBuf::from));

        match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(AppError::Config(format!(
                        "Config file does not exist: {:?}",
                        path
                    )));
                }
                config.merge_yaml(&path)?;
            }
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_PATH);
                if path.exists() {
                    config.merge_yaml(&path)?;
                }
            }
        }

        // Environment variables override YAML config
        config.rag.apply_lookup(&lookup);

        if let Some(level) = lookup("RUST_LOG") {
            config.log_level = Some(level);
        }

        if lookup("NO_COLOR").is_some() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&mut self, path: &Path) -> AppResult<()> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        tracing::debug!("Merging config file {:?}", path);
        self.config_file = Some(path.to_path_buf());

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                self.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                self.no_color = !color;
            }
            if logging.json == Some(true) {
                self.log_format = LogFormat::Json;
            }
        }

        if let Some(rag) = config_file.rag {
            self.rag = RagSettings {
                endpoint: rag.endpoint,
                default_group_id: scalar_to_string(rag.default_group_id),
                timeout_ms: scalar_to_string(rag.timeout_ms),
                max_retries: scalar_to_string(rag.max_retries),
                retry_delay_ms: scalar_to_string(rag.retry_delay_ms),
                method: rag.method,
                msg_id_kind: rag.msg_id_kind,
            };
        }

        Ok(())
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Flags take precedence over both the environment and the config file.
    pub fn with_overrides(
        mut self,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
        rag_overrides: &[(&str, Option<String>)],
    ) -> Self {
        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        for (key, value) in rag_overrides {
            if let Some(value) = value {
                self.rag.set(key, value.clone());
            }
        }

        self
    }
}
