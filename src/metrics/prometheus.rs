//! Prometheus metrics registration and export.

use prometheus::{CounterVec, Encoder, GaugeVec, IntCounter, Opts, Registry, TextEncoder};
use std::sync::{Mutex, OnceLock};

/// Global Prometheus registry for all social-support metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

/// Chat commands handled, labeled by command and outcome.
pub static COMMANDS_TOTAL: OnceLock<CounterVec> = OnceLock::new();

/// Tweets fetched into a queue, labeled by queue name.
pub static TWEETS_FETCHED_TOTAL: OnceLock<CounterVec> = OnceLock::new();

/// Labeled examples appended to the corpus.
pub static LABELS_TOTAL: OnceLock<IntCounter> = OnceLock::new();

/// Tweets waiting in a queue, labeled by queue name.
pub static QUEUE_DEPTH: OnceLock<GaugeVec> = OnceLock::new();

static INIT_LOCK: Mutex<()> = Mutex::new(());

/// Initialize all metrics and register them with the registry.
///
/// Calling this more than once is harmless; later calls keep the metrics
/// registered by the first.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    let _init = INIT_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    if REGISTRY.get().is_some() {
        return Ok(());
    }

    let registry = Registry::new();

    let commands_total = CounterVec::new(
        Opts::new("social_support_commands_total", "Chat commands handled"),
        &["command", "status"],
    )?;

    let tweets_fetched_total = CounterVec::new(
        Opts::new(
            "social_support_tweets_fetched_total",
            "Tweets fetched from search into a queue",
        ),
        &["queue_name"],
    )?;

    let labels_total = IntCounter::new(
        "social_support_labels_total",
        "Labeled examples appended to the training corpus",
    )?;

    let queue_depth = GaugeVec::new(
        Opts::new("social_support_queue_depth", "Tweets awaiting classification"),
        &["queue_name"],
    )?;

    registry.register(Box::new(commands_total.clone()))?;
    registry.register(Box::new(tweets_fetched_total.clone()))?;
    registry.register(Box::new(labels_total.clone()))?;
    registry.register(Box::new(queue_depth.clone()))?;

    let _ = REGISTRY.set(registry);
    let _ = COMMANDS_TOTAL.set(commands_total);
    let _ = TWEETS_FETCHED_TOTAL.set(tweets_fetched_total);
    let _ = LABELS_TOTAL.set(labels_total);
    let _ = QUEUE_DEPTH.set(queue_depth);

    tracing::debug!("Prometheus metrics initialized");
    Ok(())
}

/// Export all registered metrics in Prometheus text format.
pub fn export_metrics() -> String {
    let Some(registry) = REGISTRY.get() else {
        return "# Metrics not initialized. Call init_metrics() first.\n".to_string();
    };

    let encoder = TextEncoder::new();
    let metric_families = registry.gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return format!("# Error encoding metrics: {}\n", e);
    }

    String::from_utf8(buffer)
        .unwrap_or_else(|e| format!("# Error converting metrics to UTF-8: {}\n", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_metrics().expect("first init");
        init_metrics().expect("second init");
        assert!(REGISTRY.get().is_some());
    }

    #[test]
    fn test_export_after_recording() {
        init_metrics().expect("init");
        if let Some(counter) = COMMANDS_TOTAL.get() {
            counter.with_label_values(&["status", "ok"]).inc();
        }
        let text = export_metrics();
        assert!(!text.starts_with("# Error"));
        assert!(text.contains("social_support_commands_total"));
    }
}
