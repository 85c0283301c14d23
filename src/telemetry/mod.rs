//! Telemetry for the turtle status agent
//!
//! Provides:
//! - `metrics` - Prometheus metrics for the ingest path
//! - tracing subscriber initialisation for the binary

pub mod metrics;

pub use metrics::{IngestMetrics, IngestMetricsRegistry};

use thiserror::Error;

/// Telemetry errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("metrics error: {0}")]
    MetricsError(#[from] prometheus::Error),

    #[error("encoding error: {0}")]
    EncodingFailed(String),
}

pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Initialise the tracing subscriber from `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .init();
}
