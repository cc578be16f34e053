//! social-support: a chat-bot plugin that turns a Twitter search stream into
//! a human labeling queue.
//!
//! Trainers ask the bot for a tweet, decide whether its author needs technical
//! support, and earn points on a scoreboard. Labeled tweets accumulate in a
//! corpus meant for training a support classifier later.

pub mod cli;
pub mod config;
pub mod error;
pub mod metrics;
pub mod plugin;
pub mod store;
pub mod training;
pub mod twitter;
pub mod zendesk;

// Re-export commonly used types
pub use config::{PluginSettings, SocialSupportConfig};
pub use error::{
    ConfigError, PluginError, SearchError, StoreError, TicketingError, TrainingError,
};
pub use plugin::{ChatCommand, PluginHost, SocialSupport};
