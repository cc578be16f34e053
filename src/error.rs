//! Error types for social-support operations.
//!
//! Defines error types for each subsystem:
//! - Plugin configuration
//! - Key-value persistence backends
//! - Twitter search calls
//! - Zendesk ticketing calls
//! - Training queue bookkeeping
//! - Plugin activation

use thiserror::Error;

/// Errors raised while validating or loading plugin configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration is missing required items: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Errors raised by a key-value store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Value stored under '{key}' has an unexpected shape: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] sqlx::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Store connection failed: {0}")]
    ConnectionFailed(String),
}

/// Errors raised by the Twitter search client.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Twitter API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse search response: {0}")]
    Parse(String),
}

/// Errors raised by the Zendesk client.
#[derive(Debug, Error)]
pub enum TicketingError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Zendesk API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Invalid Zendesk instance URI '{0}'")]
    InvalidInstance(String),
}

/// Errors raised by the queue, assignment, scoreboard and corpus operations.
#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("Queue '{0}' is empty")]
    EmptyQueue(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Search error: {0}")]
    Search(#[from] SearchError),
}

/// Errors that keep the plugin from activating.
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Ticketing client error: {0}")]
    Ticketing(#[from] TicketingError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
