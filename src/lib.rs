//! Turtle Status Agent
//!
//! Bridges a fleet of quayOS turtles reporting state over a pub/sub
//! transport with a synchronous, read-only REST query surface. Each
//! turtle periodically publishes a status update on its own topic
//! (`<base_topic>/<id>/status`); the agent keeps the latest known state
//! per turtle in memory and exposes it for querying.
//!
//! ## Architecture
//!
//! 1. **Validator** (`validator`): pure schema validation of status
//!    payloads with structured, field-level faults.
//!
//! 2. **Entity** (`turtle`): server-side state of one turtle; applies
//!    validated updates atomically, all-or-nothing.
//!
//! 3. **Registry** (`registry`): owns every entity, keyed by turtle id,
//!    created lazily on first reference.
//!
//! 4. **Ingest** (`ingest`): routes `(topic, payload)` pairs from the
//!    status subscription to the right entity; malformed input is logged
//!    and dropped, never fatal.
//!
//! 5. **Query** (`query`) and **Handler** (`handler`): read-only DTOs over
//!    the registry and the axum routes serving them.
//!
//! 6. **Transport** (`transport`): the pub/sub seam; an in-process bus
//!    backs seeding and tests, a real broker client plugs in by feeding
//!    `StatusRouter::handle_message`.
//!
//! 7. **Telemetry** (`telemetry`): tracing initialisation and Prometheus
//!    ingest metrics.
//!
//! All components are constructed once at process start and passed
//! explicitly; there is no ambient global state.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use turtle_status::{StatusRouter, StatusValidator, TurtleRegistry};
//!
//! let registry = Arc::new(TurtleRegistry::new());
//! let validator = Arc::new(StatusValidator::new());
//! let router = StatusRouter::new("quayos/turtles", Arc::clone(&registry), validator);
//!
//! let payload = br#"{"online": false}"#;
//! router.handle_message("quayos/turtles/42/status", payload);
//! assert!(registry.exists("42"));
//! ```

pub mod error;
pub mod handler;
pub mod ingest;
pub mod query;
pub mod registry;
pub mod status;
pub mod telemetry;
pub mod transport;
pub mod turtle;
pub mod validator;

// Re-export the core types
pub use error::{Result, StatusError};
pub use ingest::{IngestOutcome, StatusRouter};
pub use query::{QueryService, TurtleDetail, TurtleSummary};
pub use registry::TurtleRegistry;
pub use status::{InventorySlot, Orientation, Position, StatusUpdate};
pub use turtle::{Turtle, TurtleSnapshot};
pub use validator::{StatusValidator, ValidationFault, ValidationReport};

// Re-export handler types for embedding the query surface
pub use handler::{create_router, ApiError, ApiResponse, ErrorInfo, HandlerState};

// Re-export telemetry types
pub use telemetry::{IngestMetrics, IngestMetricsRegistry, TelemetryError};

// Re-export the transport seam
pub use transport::{topic_matches, InMemoryBus, Subscription, TransportMessage};
