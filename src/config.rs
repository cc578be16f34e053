//! Plugin configuration.
//!
//! The plugin needs Twitter OAuth credentials, a search query and Zendesk
//! credentials. All eight values are required; a configuration with any
//! missing or blank value is rejected as a whole and the plugin stays
//! inactive.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Names of every required configuration key, in template order.
pub const REQUIRED_KEYS: [&str; 8] = [
    "TWITTER_CONSUMER_KEY",
    "TWITTER_CONSUMER_SECRET",
    "TWITTER_OAUTH_TOKEN",
    "TWITTER_OAUTH_SECRET",
    "TWITTER_SEARCH_QUERY",
    "ZENDESK_INSTANCE_URI",
    "ZENDESK_USER",
    "ZENDESK_PASSWORD",
];

/// Default number of tweets fetched per refill.
pub const DEFAULT_FETCH_LIMIT: usize = 100;

/// Validated plugin configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct SocialSupportConfig {
    pub twitter_consumer_key: String,
    pub twitter_consumer_secret: String,
    pub twitter_oauth_token: String,
    pub twitter_oauth_secret: String,
    pub twitter_search_query: String,
    pub zendesk_instance_uri: String,
    pub zendesk_user: String,
    pub zendesk_password: String,
}

impl SocialSupportConfig {
    /// Example configuration shown to operators.
    pub fn template() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("TWITTER_CONSUMER_KEY", "aaaaa"),
            ("TWITTER_CONSUMER_SECRET", "bbbb"),
            ("TWITTER_OAUTH_TOKEN", "ccccc"),
            ("TWITTER_OAUTH_SECRET", "dddd"),
            ("TWITTER_SEARCH_QUERY", "adcap"),
            ("ZENDESK_INSTANCE_URI", "https://example.zendesk.com"),
            ("ZENDESK_USER", "example@example.com"),
            ("ZENDESK_PASSWORD", "derppassword"),
        ])
    }

    /// Builds a configuration from a raw key/value map.
    ///
    /// Every key in [`REQUIRED_KEYS`] must be present and non-blank. The error
    /// lists all offending keys, not just the first.
    pub fn from_map(raw: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let missing: Vec<&'static str> = REQUIRED_KEYS
            .iter()
            .copied()
            .filter(|key| raw.get(*key).map_or(true, |v| v.trim().is_empty()))
            .collect();

        if !missing.is_empty() {
            return Err(ConfigError::MissingFields(missing));
        }

        let get = |key: &str| raw.get(key).cloned().unwrap_or_default();

        let config = Self {
            twitter_consumer_key: get("TWITTER_CONSUMER_KEY"),
            twitter_consumer_secret: get("TWITTER_CONSUMER_SECRET"),
            twitter_oauth_token: get("TWITTER_OAUTH_TOKEN"),
            twitter_oauth_secret: get("TWITTER_OAUTH_SECRET"),
            twitter_search_query: get("TWITTER_SEARCH_QUERY"),
            zendesk_instance_uri: get("ZENDESK_INSTANCE_URI"),
            zendesk_user: get("ZENDESK_USER"),
            zendesk_password: get("ZENDESK_PASSWORD"),
        };
        config.validate()?;
        Ok(config)
    }

    /// Creates configuration from environment variables named after the keys.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_map(&raw_from_env())
    }

    /// Loads configuration from a YAML mapping of key to string value.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_map(&raw_from_yaml_file(path)?)
    }

    /// Parses configuration from YAML text.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        Self::from_map(&raw_from_yaml_str(content)?)
    }

    /// Checks values that must be well formed beyond being present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let uri = self.zendesk_instance_uri.trim();
        if !(uri.starts_with("https://") || uri.starts_with("http://")) {
            return Err(ConfigError::InvalidValue {
                key: "ZENDESK_INSTANCE_URI".to_string(),
                message: format!("expected an http(s) URL, got '{uri}'"),
            });
        }
        Ok(())
    }
}

/// Collects the required keys that are set in the environment.
///
/// Unset keys are left out, so the map is empty when nothing is configured.
pub fn raw_from_env() -> HashMap<String, String> {
    REQUIRED_KEYS
        .iter()
        .filter_map(|key| std::env::var(key).ok().map(|v| (key.to_string(), v)))
        .collect()
}

/// Reads a YAML mapping of key to string value without validating it.
pub fn raw_from_yaml_file(path: impl AsRef<Path>) -> Result<HashMap<String, String>, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    raw_from_yaml_str(&content)
}

pub fn raw_from_yaml_str(content: &str) -> Result<HashMap<String, String>, ConfigError> {
    Ok(serde_yaml::from_str(content)?)
}

/// Non-secret plugin settings with defaults.
#[derive(Debug, Clone)]
pub struct PluginSettings {
    /// Number of tweets requested per refill.
    pub fetch_limit: usize,
    /// Reset the four persisted collections to empty on activation.
    ///
    /// When false, only collections that do not exist yet are seeded.
    pub reset_on_activate: bool,
}

impl Default for PluginSettings {
    fn default() -> Self {
        Self {
            fetch_limit: DEFAULT_FETCH_LIMIT,
            reset_on_activate: true,
        }
    }
}
