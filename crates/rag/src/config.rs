//! Search client configuration.
//!
//! A `ClientConfig` is built once, either explicitly or from
//! environment-style key/value pairs, and never mutated after the client
//! takes it.

use kbsearch_core::config::keys;
use reqwest::Url;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{RagError, RagResult};
use crate::types::IdKind;

/// Group searched when neither the request nor the environment names one.
pub const DEFAULT_GROUP_ID: i64 = 2_493_387_211;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_millis(1_000);
pub const DEFAULT_MAX_RESULTS: u32 = 5;

/// HTTP convention used by the deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMethod {
    /// JSON body
    #[default]
    Post,
    /// URL-encoded query string
    Get,
}

impl RequestMethod {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "POST" => Some(Self::Post),
            "GET" => Some(Self::Get),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Post => "POST",
            Self::Get => "GET",
        }
    }
}

/// Immutable client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Service address
    pub endpoint: Url,

    /// Fallback `group_id`
    pub default_group_id: i64,

    /// Per-attempt deadline
    pub timeout: Duration,

    /// Total attempt budget (the first attempt counts)
    pub max_retries: u32,

    /// Backoff seed; the delay doubles after every failed attempt
    pub retry_base_delay: Duration,

    /// Fallback `max_results`
    pub default_max_results: u32,

    pub method: RequestMethod,

    /// Identifier type accepted in responses
    pub id_kind: IdKind,
}

impl ClientConfig {
    /// Create a configuration with the documented defaults.
    pub fn new(endpoint: &str, default_group_id: i64) -> RagResult<Self> {
        let endpoint = parse_endpoint(endpoint)?;

        Ok(Self {
            endpoint,
            default_group_id,
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay: DEFAULT_RETRY_BASE_DELAY,
            default_max_results: DEFAULT_MAX_RESULTS,
            method: RequestMethod::default(),
            id_kind: IdKind::default(),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    pub fn with_method(mut self, method: RequestMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_id_kind(mut self, id_kind: IdKind) -> Self {
        self.id_kind = id_kind;
        self
    }

    /// Build a configuration from environment variables.
    ///
    /// See [`ClientConfig::from_lookup`] for the keys and defaults.
    pub fn from_env() -> RagResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from environment-style key/value pairs.
    ///
    /// | Key | Default |
    /// |---|---|
    /// | `RAG_ENDPOINT_URL` | required |
    /// | `RAG_DEFAULT_GROUP_ID` | `2493387211` |
    /// | `RAG_TIMEOUT` (ms) | `30000` |
    /// | `RAG_MAX_RETRIES` | `3` |
    /// | `RAG_RETRY_DELAY` (ms) | `1000` |
    /// | `RAG_HTTP_METHOD` | `POST` |
    /// | `RAG_MSG_ID_KIND` | `string` |
    ///
    /// Blank values count as absent. A missing endpoint or an unparsable
    /// value fails immediately with `RagError::Config`.
    pub fn from_lookup<F>(lookup: F) -> RagResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let endpoint = get(keys::ENDPOINT_URL).ok_or_else(|| {
            RagError::Config(format!("{} is required but not set", keys::ENDPOINT_URL))
        })?;

        let default_group_id =
            parse_key::<i64>(get(keys::DEFAULT_GROUP_ID), keys::DEFAULT_GROUP_ID)?
                .unwrap_or(DEFAULT_GROUP_ID);

        let mut config = Self::new(&endpoint, default_group_id)?;

        if let Some(ms) = parse_key::<u64>(get(keys::TIMEOUT), keys::TIMEOUT)? {
            config.timeout = Duration::from_millis(ms);
        }

        if let Some(retries) = parse_key::<u32>(get(keys::MAX_RETRIES), keys::MAX_RETRIES)? {
            config.max_retries = retries;
        }

        if let Some(ms) = parse_key::<u64>(get(keys::RETRY_DELAY), keys::RETRY_DELAY)? {
            config.retry_base_delay = Duration::from_millis(ms);
        }

        if let Some(method) = get(keys::HTTP_METHOD) {
            config.method = RequestMethod::parse(&method).ok_or_else(|| {
                RagError::Config(format!(
                    "Invalid {}: '{}' (expected POST or GET)",
                    keys::HTTP_METHOD,
                    method
                ))
            })?;
        }

        if let Some(kind) = get(keys::MSG_ID_KIND) {
            config.id_kind = IdKind::parse(&kind).ok_or_else(|| {
                RagError::Config(format!(
                    "Invalid {}: '{}' (expected string or integer)",
                    keys::MSG_ID_KIND,
                    kind
                ))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check invariants the retry loop depends on.
    pub fn validate(&self) -> RagResult<()> {
        if !matches!(self.endpoint.scheme(), "http" | "https") {
            return Err(RagError::Config(format!(
                "Endpoint must be an http(s) URL: {}",
                self.endpoint
            )));
        }

        if self.timeout.is_zero() {
            return Err(RagError::Config("Timeout must be greater than zero".to_string()));
        }

        if self.max_retries == 0 {
            return Err(RagError::Config(
                "Max retries must allow at least one attempt".to_string(),
            ));
        }

        if self.default_max_results == 0 {
            return Err(RagError::Config(
                "Default max results must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_endpoint(endpoint: &str) -> RagResult<Url> {
    Url::parse(endpoint.trim())
        .map_err(|e| RagError::Config(format!("Invalid endpoint URL '{}': {}", endpoint, e)))
}

fn parse_key<T: FromStr>(value: Option<String>, key: &str) -> RagResult<Option<T>>
where
    T::Err: std::fmt::Display,
{
    value
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| RagError::Config(format!("Invalid {}: '{}' ({})", key, raw, e)))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new("https://rag.example.com/search", 1).unwrap();
        assert_eq!(config.timeout, Duration::from_millis(30_000));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_base_delay, Duration::from_millis(1_000));
        assert_eq!(config.default_max_results, 5);
        assert_eq!(config.method, RequestMethod::Post);
        assert_eq!(config.id_kind, IdKind::Text);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config =
            ClientConfig::from_lookup(lookup_from(&[(keys::ENDPOINT_URL, "http://localhost/rag")]))
                .unwrap();
        assert_eq!(config.endpoint.as_str(), "http://localhost/rag");
        assert_eq!(config.default_group_id, DEFAULT_GROUP_ID);
        assert_eq!(config.max_retries, DEFAULT_MAX_RETRIES);
    }

    #[test]
    fn test_from_lookup_custom_values() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            (keys::ENDPOINT_URL, "https://custom.api.com/rag"),
            (keys::DEFAULT_GROUP_ID, "999999"),
            (keys::TIMEOUT, "10000"),
            (keys::MAX_RETRIES, "5"),
            (keys::RETRY_DELAY, "250"),
            (keys::HTTP_METHOD, "get"),
            (keys::MSG_ID_KIND, "integer"),
        ]))
        .unwrap();

        assert_eq!(config.default_group_id, 999_999);
        assert_eq!(config.timeout, Duration::from_millis(10_000));
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.retry_base_delay, Duration::from_millis(250));
        assert_eq!(config.method, RequestMethod::Get);
        assert_eq!(config.id_kind, IdKind::Integer);
    }

    #[test]
    fn test_missing_endpoint_fails_fast() {
        let err = ClientConfig::from_lookup(lookup_from(&[(keys::ENDPOINT_URL, "  ")]))
            .unwrap_err();
        assert!(matches!(err, RagError::Config(ref m) if m.contains("RAG_ENDPOINT_URL")));
    }

    #[test]
    fn test_unparsable_value_names_key() {
        let err = ClientConfig::from_lookup(lookup_from(&[
            (keys::ENDPOINT_URL, "http://localhost/rag"),
            (keys::MAX_RETRIES, "three"),
        ]))
        .unwrap_err();
        assert!(matches!(err, RagError::Config(ref m) if m.contains("RAG_MAX_RETRIES")));
    }

    #[test]
    fn test_invalid_endpoint() {
        assert!(ClientConfig::new("not a url", 1).is_err());
        let err = ClientConfig::new("ftp://files.example.com/rag", 1)
            .unwrap()
            .validate()
            .unwrap_err();
        assert!(matches!(err, RagError::Config(_)));
    }

    #[test]
    fn test_zero_budget_rejected() {
        let config = ClientConfig::new("http://localhost/rag", 1)
            .unwrap()
            .with_max_retries(0);
        assert!(config.validate().is_err());

        let config = ClientConfig::new("http://localhost/rag", 1)
            .unwrap()
            .with_timeout(Duration::ZERO);
        assert!(config.validate().is_err());
    }
}
