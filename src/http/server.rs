//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with one handler per governed route
//! - Wire up middleware (tracing, request timeout)
//! - Bind the server to a listener and serve with graceful shutdown
//! - Dispatch every request into the gate pipeline
//!
//! # Design Decisions
//! - Routes are registered with `any()` and the method gate runs inside the
//!   pipeline, so non-POST methods still get a well-formed envelope
//! - Each handler captures its immutable route descriptor at startup;
//!   there is no per-request route lookup

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::routing::any;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::audit::AuditLogger;
use crate::config::GatewayConfig;
use crate::context::{ContextStore, EmptyContextStore, RestContextStore};
use crate::llm::{CompletionClient, StubCompletionClient};
use crate::pipeline;
use crate::ratelimit::RateLimiter;
use crate::regen::RegenerationTracker;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub limiter: Arc<RateLimiter>,
    pub audit: Arc<AuditLogger>,
    pub regen: Arc<RegenerationTracker>,
    pub context: Arc<dyn ContextStore>,
    pub completions: Arc<dyn CompletionClient>,
}

/// HTTP server for the gateway.
pub struct GatewayServer {
    router: Router,
    config: Arc<GatewayConfig>,
}

impl GatewayServer {
    /// Create a new server with the given configuration.
    pub fn new(config: GatewayConfig) -> Self {
        let config = Arc::new(config);

        let limiter = Arc::new(RateLimiter::from_config(&config.counter_store));
        let audit = Arc::new(AuditLogger::from_config(&config.audit));
        let regen = Arc::new(RegenerationTracker::new(
            audit.store(),
            config.regeneration.clone(),
        ));
        let context: Arc<dyn ContextStore> = if config.profile_store.is_configured() {
            Arc::new(RestContextStore::new(&config.profile_store))
        } else {
            Arc::new(EmptyContextStore)
        };
        let completions: Arc<dyn CompletionClient> = Arc::new(StubCompletionClient);

        let state = AppState {
            config: config.clone(),
            limiter,
            audit,
            regen,
            context,
            completions,
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let mut router = Router::new();

        for route_config in &config.routes {
            let descriptor = Arc::new(route_config.clone());
            router = router.route(
                &route_config.path,
                any(
                    move |State(state): State<AppState>, request: Request<Body>| {
                        let descriptor = Arc::clone(&descriptor);
                        async move { pipeline::handle(state, descriptor, request).await }
                    },
                ),
            );
        }

        router
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener until the
    /// shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.config.routes.len(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}
