//! High-level recording interface over the raw Prometheus metrics.
//!
//! Every method is a no-op until [`init_metrics`](super::init_metrics) has
//! been called, so library users that do not care about metrics pay nothing.

use super::prometheus::{COMMANDS_TOTAL, LABELS_TOTAL, QUEUE_DEPTH, TWEETS_FETCHED_TOTAL};

#[derive(Debug, Clone, Default)]
pub struct MetricsCollector;

impl MetricsCollector {
    pub fn new() -> Self {
        Self
    }

    /// Record one handled chat command.
    pub fn record_command(&self, command: &str, ok: bool) {
        if let Some(counter) = COMMANDS_TOTAL.get() {
            let status = if ok { "ok" } else { "error" };
            counter.with_label_values(&[command, status]).inc();
        }
    }

    /// Record a refill of `queue` that fetched `count` tweets.
    pub fn record_fetch(&self, queue: &str, count: usize) {
        if let Some(counter) = TWEETS_FETCHED_TOTAL.get() {
            counter.with_label_values(&[queue]).inc_by(count as f64);
        }
    }

    /// Record one labeled example.
    pub fn record_label(&self) {
        if let Some(counter) = LABELS_TOTAL.get() {
            counter.inc();
        }
    }

    /// Set the observed depth of `queue`.
    pub fn set_queue_depth(&self, queue: &str, depth: usize) {
        if let Some(gauge) = QUEUE_DEPTH.get() {
            gauge.with_label_values(&[queue]).set(depth as f64);
        }
    }
}
