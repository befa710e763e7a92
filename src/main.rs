//! AI Coaching Gateway (v1)
//!
//! A request-governance gateway built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌───────────────────────────────────────────────────┐
//!                       │                 COACH GATEWAY                      │
//!                       │                                                    │
//!   Client Request      │  ┌─────────┐    ┌──────────────────────────────┐  │
//!   ────────────────────┼─▶│  http   │───▶│          pipeline            │  │
//!                       │  │ server  │    │  method → flags → size →     │  │
//!                       │  └─────────┘    │  rate limit → parse →        │  │
//!                       │                 │  validate → identity →       │  │
//!                       │                 │  regen quota → safety        │  │
//!                       │                 └──────┬───────────────┬───────┘  │
//!                       │                        │               │          │
//!                       │                        ▼               ▼          │
//!                       │                ┌──────────────┐ ┌──────────────┐  │
//!   Client Response     │  ┌─────────┐   │    models    │ │    audit     │  │
//!   ◀───────────────────┼──│envelope │◀──│  (selection) │ │ (fail-open)  │  │
//!                       │  └─────────┘   └──────────────┘ └──────────────┘  │
//!                       │                                                    │
//!                       │  External collaborators (all fail-open):          │
//!                       │  counter store · audit store · profile store      │
//!                       └───────────────────────────────────────────────────┘
//! ```

use std::path::Path;

use tokio::net::TcpListener;

use coach_gateway::config::loader::load_config;
use coach_gateway::observability::{logging, metrics};
use coach_gateway::{GatewayConfig, GatewayServer, Shutdown};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    logging::init("coach_gateway=info,tower_http=info");

    tracing::info!("coach-gateway v0.1.0 starting");

    // Load configuration: explicit path, conventional file, or defaults.
    let config = match std::env::var("GATEWAY_CONFIG") {
        Ok(path) => load_config(Path::new(&path))?,
        Err(_) => {
            let conventional = Path::new("gateway.toml");
            if conventional.exists() {
                load_config(conventional)?
            } else {
                GatewayConfig::default()
            }
        }
    };

    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        ai_enabled = config.features.ai_enabled,
        rate_limiting = config.counter_store.is_configured(),
        audit = config.audit.is_configured(),
        "Configuration loaded"
    );

    // Bind TCP listener
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(
        address = %local_addr,
        "Listening for connections"
    );

    // Initialize metrics server
    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    // Trigger shutdown on Ctrl+C
    let shutdown = Shutdown::new();
    let shutdown_rx = shutdown.subscribe();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            shutdown.trigger();
        }
    });

    // Create and run HTTP server
    let server = GatewayServer::new(config);
    server.run(listener, shutdown_rx).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
