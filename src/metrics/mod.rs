//! Metrics module for Prometheus-based monitoring.
//!
//! Tracks chat commands handled, tweets fetched into queues, labels recorded
//! and the current depth of each queue.
//!
//! # Example
//!
//! ```ignore
//! use social_support::metrics::{init_metrics, export_metrics, MetricsCollector};
//!
//! init_metrics().expect("Failed to initialize metrics");
//! let collector = MetricsCollector::new();
//! collector.record_command("status", true);
//! println!("{}", export_metrics());
//! ```

pub mod collectors;
pub mod prometheus;

pub use collectors::MetricsCollector;
pub use prometheus::{export_metrics, init_metrics};

pub use prometheus::{COMMANDS_TOTAL, LABELS_TOTAL, QUEUE_DEPTH, REGISTRY, TWEETS_FETCHED_TOTAL};
