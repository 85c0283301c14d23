//! Status ingest routing
//!
//! Maps an inbound `(topic, payload)` pair from the status subscription to
//! the right turtle and applies the update. Malformed topics and payloads
//! are an expected byproduct of a shared wildcard subscription: they are
//! logged and discarded, never fatal, and no failure for one turtle may
//! affect any other turtle or the availability of the ingest path.

use std::sync::Arc;

use regex::Regex;
use serde_json::Value;
use tracing::{error, trace, warn};

use crate::error::StatusError;
use crate::registry::TurtleRegistry;
use crate::telemetry::metrics::IngestMetrics;
use crate::validator::StatusValidator;

/// What became of one inbound transport message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The update was validated and applied
    Applied,
    /// The topic did not carry a turtle id before the `status` suffix
    BadTopic,
    /// The payload was not valid JSON
    BadPayload,
    /// The payload failed schema validation; the turtle is unchanged
    Rejected,
    /// An internal error; the message was dropped
    Failed,
}

/// Routes status messages from the transport subscription to turtles.
///
/// Holds its collaborators by reference: the registry resolves (and
/// lazily creates) the entity, the validator admits the payload. The
/// router is bound to the base topic its subscription was registered
/// under (`<base_topic>/+/status`).
pub struct StatusRouter {
    base_topic: String,
    registry: Arc<TurtleRegistry>,
    validator: Arc<StatusValidator>,
    topic_pattern: Regex,
    metrics: Option<Arc<IngestMetrics>>,
}

impl StatusRouter {
    pub fn new(
        base_topic: impl Into<String>,
        registry: Arc<TurtleRegistry>,
        validator: Arc<StatusValidator>,
    ) -> Self {
        Self {
            base_topic: base_topic.into(),
            registry,
            validator,
            // After the base topic, exactly one non-empty segment carries
            // the turtle id, followed by the literal `status` suffix.
            topic_pattern: Regex::new(r"^([^/]+)/status$").expect("topic pattern must compile"),
            metrics: None,
        }
    }

    /// Attach ingest metrics
    pub fn with_metrics(mut self, metrics: Arc<IngestMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// The subscription pattern this router consumes
    pub fn subscription_pattern(&self) -> String {
        format!("{}/+/status", self.base_topic)
    }

    /// Extract the turtle id from a status topic, if it has the expected
    /// `<base_topic>/<id>/status` shape.
    pub fn turtle_id_from_topic<'t>(&self, topic: &'t str) -> Option<&'t str> {
        let rest = topic
            .strip_prefix(self.base_topic.as_str())?
            .strip_prefix('/')?;
        self.topic_pattern
            .captures(rest)
            .and_then(|captures| captures.get(1))
            .map(|segment| segment.as_str())
    }

    /// Handle one raw message from the transport subscription.
    pub fn handle_message(&self, topic: &str, payload: &[u8]) -> IngestOutcome {
        let Some(turtle_id) = self.turtle_id_from_topic(topic) else {
            warn!(topic = %topic, "could not extract turtle id from topic, discarding message");
            self.record_discard("topic");
            return IngestOutcome::BadTopic;
        };

        let value: Value = match serde_json::from_slice(payload) {
            Ok(value) => value,
            Err(err) => {
                warn!(
                    turtle_id = %turtle_id,
                    topic = %topic,
                    error = %err,
                    "undecodable status payload, discarding message"
                );
                self.record_discard("payload");
                return IngestOutcome::BadPayload;
            }
        };

        trace!(turtle_id = %turtle_id, topic = %topic, "received status update");

        let turtle = match self.registry.get_or_create(turtle_id) {
            Ok(turtle) => turtle,
            Err(err) => {
                error!(turtle_id = %turtle_id, error = %err, "failed to resolve turtle");
                self.record_discard("registry");
                return IngestOutcome::Failed;
            }
        };

        match turtle.apply_update(&self.validator, &value) {
            Ok(()) => {
                if let Some(metrics) = &self.metrics {
                    metrics.record_applied();
                    metrics.set_registered(self.registry.len());
                }
                IngestOutcome::Applied
            }
            Err(StatusError::Validation { faults }) => {
                warn!(
                    turtle_id = %turtle_id,
                    faults = ?faults,
                    "status update rejected by validation"
                );
                if let Some(metrics) = &self.metrics {
                    metrics.record_rejected();
                }
                IngestOutcome::Rejected
            }
            Err(err) => {
                error!(turtle_id = %turtle_id, error = %err, "failed to apply status update");
                self.record_discard("internal");
                IngestOutcome::Failed
            }
        }
    }

    fn record_discard(&self, reason: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_discarded(reason);
        }
    }
}
