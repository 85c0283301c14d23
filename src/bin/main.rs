//! Turtle status agent daemon
//!
//! Wires the ingest pipeline to the in-process transport bus and serves
//! the read-only query surface:
//!
//! ```bash
//! # Serve on the default address with four demo turtles
//! turtle-statusd --seed 4
//!
//! # Custom base topic and listen address
//! turtle-statusd --base-topic factory/turtles --listen 127.0.0.1:8080
//! ```
//!
//! Shuts down cleanly on SIGINT/SIGQUIT/SIGTERM: the subscription stops
//! accepting messages, in-flight updates complete, and the HTTP server
//! drains.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use serde_json::json;
use tokio::sync::watch;
use tracing::{error, info};

use turtle_status::telemetry::{self, IngestMetricsRegistry};
use turtle_status::transport::{InMemoryBus, Subscription};
use turtle_status::{
    create_router, HandlerState, QueryService, StatusRouter, StatusValidator, TurtleRegistry,
};

/// Turtle fleet status agent
#[derive(Debug, Parser)]
#[command(name = "turtle-statusd", version, about)]
struct Cli {
    /// Address for the REST query surface
    #[arg(long, env = "TURTLE_LISTEN_ADDR", default_value = "0.0.0.0:3000")]
    listen: SocketAddr,

    /// Base topic of the status subscription
    #[arg(long, env = "TURTLE_BASE_TOPIC", default_value = "quayos/turtles")]
    base_topic: String,

    /// Publish this many demo status updates on startup
    #[arg(long, default_value_t = 0)]
    seed: usize,
}

#[tokio::main]
async fn main() {
    telemetry::init_tracing();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        error!(error = %err, "agent failed");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    // One of each collaborator, constructed here and passed explicitly.
    let bus = Arc::new(InMemoryBus::new());
    let registry = Arc::new(TurtleRegistry::new());
    let validator = Arc::new(StatusValidator::new());
    let metrics = Arc::new(IngestMetricsRegistry::new()?);

    let router = Arc::new(
        StatusRouter::new(cli.base_topic.as_str(), Arc::clone(&registry), validator)
            .with_metrics(metrics.ingest()),
    );

    let pattern = router.subscription_pattern();
    let subscription = bus.subscribe(&pattern);
    info!(pattern = %pattern, "status subscription registered");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let ingest_handle = tokio::spawn(ingest_loop(subscription, Arc::clone(&router), shutdown_rx));

    if cli.seed > 0 {
        seed_demo_turtles(&bus, &cli.base_topic, cli.seed)?;
    }

    let state = HandlerState::new(QueryService::new(Arc::clone(&registry)), Arc::clone(&metrics));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(cli.listen).await?;
    info!(listen = %cli.listen, "query surface listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!("received shutdown signal, stopping");
            let _ = shutdown_tx.send(true);
        })
        .await?;

    // Let any in-flight update finish before exiting.
    ingest_handle.await?;
    info!("agent stopped");
    Ok(())
}

/// Consume the status subscription until shutdown.
async fn ingest_loop(
    mut subscription: Subscription,
    router: Arc<StatusRouter>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            message = subscription.recv() => match message {
                Some(message) => {
                    router.handle_message(&message.topic, &message.payload);
                }
                None => break,
            },
            _ = shutdown.changed() => {
                info!("ingest loop stopping");
                break;
            }
        }
    }
}

/// Publish a burst of demo status updates, one per synthetic turtle id.
fn seed_demo_turtles(
    bus: &InMemoryBus,
    base_topic: &str,
    count: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    info!(count, "seeding demo turtles");
    for id in 0..count {
        bus.publish_json(
            &format!("{}/{}/status", base_topic, id),
            &json!({
                "online": true,
                "fuel": 0,
                "position": { "x": 0, "y": 0, "z": 0 },
                "orientation": "north",
                "whitelist": [],
                "inventory": [],
            }),
        )?;
    }
    Ok(())
}

/// Resolve when the process receives SIGINT, SIGQUIT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut terminate =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        let mut quit = signal(SignalKind::quit()).expect("failed to install SIGQUIT handler");

        tokio::select! {
            _ = ctrl_c => {}
            _ = terminate.recv() => {}
            _ = quit.recv() => {}
        }
    }

    #[cfg(not(unix))]
    ctrl_c.await;
}
