//! Pub/sub transport seam
//!
//! The broker itself is an external collaborator; the agent only needs to
//! subscribe to a topic pattern and receive `(topic, payload)` pairs, and
//! to publish a payload to a topic for local exercising and seeding.
//! `InMemoryBus` provides exactly that capability on tokio channels — the
//! integration tests and the `--seed` startup burst run over it, and a
//! real broker client plugs in by feeding
//! `StatusRouter::handle_message` from its own receive callback.
//!
//! Topic patterns support the single-segment wildcard `+`
//! (e.g. `quayos/turtles/+/status`).

use std::sync::Mutex;

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::trace;

use crate::error::Result;

/// One raw message received from (or published to) the transport
#[derive(Debug, Clone)]
pub struct TransportMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

/// A live subscription on the bus. Dropping it unsubscribes.
pub struct Subscription {
    pattern: String,
    receiver: mpsc::UnboundedReceiver<TransportMessage>,
}

impl Subscription {
    /// The pattern this subscription was registered with
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Receive the next matching message, or `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<TransportMessage> {
        self.receiver.recv().await
    }
}

struct SubscriberEntry {
    pattern: String,
    sender: mpsc::UnboundedSender<TransportMessage>,
}

/// An in-process message bus with MQTT-style topics.
#[derive(Default)]
pub struct InMemoryBus {
    subscribers: Mutex<Vec<SubscriberEntry>>,
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscription for a topic pattern.
    pub fn subscribe(&self, pattern: &str) -> Subscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .expect("bus lock poisoned")
            .push(SubscriberEntry {
                pattern: pattern.to_string(),
                sender,
            });
        Subscription {
            pattern: pattern.to_string(),
            receiver,
        }
    }

    /// Publish a payload to a topic. Returns the number of subscriptions
    /// the message was delivered to.
    pub fn publish(&self, topic: &str, payload: impl Into<Vec<u8>>) -> usize {
        let payload = payload.into();
        let mut subscribers = self.subscribers.lock().expect("bus lock poisoned");
        subscribers.retain(|entry| !entry.sender.is_closed());

        let mut delivered = 0;
        for entry in subscribers.iter() {
            if topic_matches(&entry.pattern, topic) {
                let message = TransportMessage {
                    topic: topic.to_string(),
                    payload: payload.clone(),
                };
                if entry.sender.send(message).is_ok() {
                    delivered += 1;
                }
            }
        }
        trace!(topic = %topic, delivered, "published message");
        delivered
    }

    /// Publish a JSON value to a topic.
    pub fn publish_json(&self, topic: &str, payload: &Value) -> Result<usize> {
        let bytes = serde_json::to_vec(payload)?;
        Ok(self.publish(topic, bytes))
    }
}

/// Match a topic against a pattern where `+` matches exactly one segment.
pub fn topic_matches(pattern: &str, topic: &str) -> bool {
    let mut pattern_segments = pattern.split('/');
    let mut topic_segments = topic.split('/');
    loop {
        match (pattern_segments.next(), topic_segments.next()) {
            (Some("+"), Some(_)) => {}
            (Some(expected), Some(actual)) if expected == actual => {}
            (None, None) => return true,
            _ => return false,
        }
    }
}
