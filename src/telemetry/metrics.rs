//! Prometheus metrics for the status ingest path
//!
//! - `status_updates_applied_total` (counter) - updates validated and applied
//! - `status_updates_rejected_total` (counter) - updates rejected by validation
//! - `status_messages_discarded_total` (counter) - messages dropped before
//!   reaching an entity, by reason (`topic`, `payload`, `registry`, `internal`)
//! - `turtles_registered` (gauge) - current registry size

use prometheus::{Counter, CounterVec, Gauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

use super::{Result, TelemetryError};

/// Ingest metrics handles
pub struct IngestMetrics {
    updates_applied_total: Counter,
    updates_rejected_total: Counter,
    messages_discarded_total: CounterVec,
    turtles_registered: Gauge,
}

impl IngestMetrics {
    /// Create the ingest metrics and register them with the provided registry
    pub fn new(registry: &Registry) -> Result<Self> {
        let updates_applied_total = Counter::with_opts(
            Opts::new(
                "status_updates_applied_total",
                "Total number of status updates validated and applied",
            )
            .namespace("turtle_status"),
        )?;

        let updates_rejected_total = Counter::with_opts(
            Opts::new(
                "status_updates_rejected_total",
                "Total number of status updates rejected by schema validation",
            )
            .namespace("turtle_status"),
        )?;

        let messages_discarded_total = CounterVec::new(
            Opts::new(
                "status_messages_discarded_total",
                "Total number of transport messages discarded before reaching an entity",
            )
            .namespace("turtle_status"),
            &["reason"],
        )?;

        let turtles_registered = Gauge::with_opts(
            Opts::new(
                "turtles_registered",
                "Current number of turtles in the registry",
            )
            .namespace("turtle_status"),
        )?;

        registry.register(Box::new(updates_applied_total.clone()))?;
        registry.register(Box::new(updates_rejected_total.clone()))?;
        registry.register(Box::new(messages_discarded_total.clone()))?;
        registry.register(Box::new(turtles_registered.clone()))?;

        Ok(Self {
            updates_applied_total,
            updates_rejected_total,
            messages_discarded_total,
            turtles_registered,
        })
    }

    /// Record a successfully applied update
    pub fn record_applied(&self) {
        self.updates_applied_total.inc();
    }

    /// Record an update rejected by validation
    pub fn record_rejected(&self) {
        self.updates_rejected_total.inc();
    }

    /// Record a message discarded before reaching an entity
    pub fn record_discarded(&self, reason: &str) {
        self.messages_discarded_total
            .with_label_values(&[reason])
            .inc();
    }

    /// Update the registry size gauge
    pub fn set_registered(&self, count: usize) {
        self.turtles_registered.set(count as f64);
    }
}

/// Owns the Prometheus registry and the ingest metrics registered on it
pub struct IngestMetricsRegistry {
    registry: Registry,
    ingest: Arc<IngestMetrics>,
}

impl IngestMetricsRegistry {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let ingest = Arc::new(IngestMetrics::new(&registry)?);
        Ok(Self { registry, ingest })
    }

    /// The ingest metrics handle
    pub fn ingest(&self) -> Arc<IngestMetrics> {
        Arc::clone(&self.ingest)
    }

    /// Render all registered metrics in the Prometheus text format
    pub fn encode_text(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        encoder
            .encode_to_string(&self.registry.gather())
            .map_err(|err| TelemetryError::EncodingFailed(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_register_and_encode() {
        let registry = IngestMetricsRegistry::new().unwrap();
        let metrics = registry.ingest();

        metrics.record_applied();
        metrics.record_applied();
        metrics.record_rejected();
        metrics.record_discarded("topic");
        metrics.set_registered(3);

        let rendered = registry.encode_text().unwrap();
        assert!(rendered.contains("turtle_status_status_updates_applied_total 2"));
        assert!(rendered.contains("turtle_status_status_updates_rejected_total 1"));
        assert!(rendered.contains("reason=\"topic\""));
        assert!(rendered.contains("turtle_status_turtles_registered 3"));
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let registry = Registry::new();
        assert!(IngestMetrics::new(&registry).is_ok());
        assert!(IngestMetrics::new(&registry).is_err());
    }
}
