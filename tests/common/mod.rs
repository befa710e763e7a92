//! Shared utilities for integration testing.
//!
//! Spawns the gateway on an ephemeral port next to in-process mock stores:
//! a Redis-compatible pipeline endpoint with real INCR+EXPIRE semantics and
//! a PostgREST-compatible audit store that captures inserts and answers
//! count queries.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::{any, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use coach_gateway::{GatewayConfig, GatewayServer, Shutdown};

/// Start the gateway on an ephemeral port. The returned `Shutdown` must be
/// kept alive for the lifetime of the test.
pub async fn spawn_gateway(config: GatewayConfig) -> (SocketAddr, Shutdown) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind gateway listener");
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    let server = GatewayServer::new(config);
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    (addr, shutdown)
}

/// A gateway config suitable for tests: metrics off, stores unconfigured
/// unless wired explicitly.
pub fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.observability.metrics_enabled = false;
    config.counter_store.enabled = false;
    config.audit.enabled = false;
    config
}

/// Point the config's counter store at a mock (or dead) endpoint.
pub fn with_counter_store(mut config: GatewayConfig, url: String) -> GatewayConfig {
    config.counter_store.enabled = true;
    config.counter_store.url = url;
    config.counter_store.token = "test-token".to_string();
    config
}

/// Point the config's audit store at a mock endpoint.
pub fn with_audit_store(mut config: GatewayConfig, url: String) -> GatewayConfig {
    config.audit.enabled = true;
    config.audit.url = url;
    config.audit.service_key = "service-key".to_string();
    config
}

/// In-process counter store implementing the REST pipeline protocol with
/// real INCR+EXPIRE semantics (TTL armed by the increment that creates the
/// key, counts reset only by expiry).
#[derive(Clone, Default)]
pub struct MockCounterStore {
    entries: Arc<Mutex<HashMap<String, (u64, Option<Instant>)>>>,
}

impl MockCounterStore {
    fn incr(&self, key: &str, window_seconds: u64) -> u64 {
        let mut entries = self.entries.lock().unwrap();
        let now = Instant::now();

        let entry = entries.entry(key.to_string()).or_insert((0, None));
        let expired = matches!(entry.1, Some(expires_at) if expires_at <= now);
        if expired {
            *entry = (0, None);
        }

        entry.0 += 1;
        if entry.1.is_none() {
            entry.1 = Some(now + Duration::from_secs(window_seconds));
        }
        entry.0
    }
}

/// Start the mock counter store, returning its base URL.
pub async fn spawn_counter_store() -> (String, MockCounterStore) {
    let store = MockCounterStore::default();

    async fn pipeline(
        State(store): State<MockCounterStore>,
        Json(commands): Json<Vec<Vec<Value>>>,
    ) -> Json<Value> {
        let key = commands
            .first()
            .and_then(|cmd| cmd.get(1))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let window = commands
            .get(1)
            .and_then(|cmd| cmd.get(2))
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);

        let count = store.incr(&key, window);
        Json(json!([{"result": count}, {"result": 1}]))
    }

    let app = Router::new()
        .route("/pipeline", post(pipeline))
        .with_state(store.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind counter store");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (format!("http://{addr}"), store)
}

/// Captured state of the mock audit store.
#[derive(Clone, Default)]
pub struct MockAuditStore {
    pub records: Arc<Mutex<Vec<Value>>>,
    pub regeneration_count: Arc<AtomicU64>,
}

impl MockAuditStore {
    pub fn set_regeneration_count(&self, count: u64) {
        self.regeneration_count.store(count, Ordering::SeqCst);
    }

    pub fn recorded(&self) -> Vec<Value> {
        self.records.lock().unwrap().clone()
    }
}

/// Start the mock audit store (PostgREST-shaped), returning its base URL.
pub async fn spawn_audit_store() -> (String, MockAuditStore) {
    let store = MockAuditStore::default();

    async fn insert(
        State(store): State<MockAuditStore>,
        Json(record): Json<Value>,
    ) -> impl IntoResponse {
        store.records.lock().unwrap().push(record);
        axum::http::StatusCode::CREATED
    }

    async fn count(State(store): State<MockAuditStore>) -> impl IntoResponse {
        let total = store.regeneration_count.load(Ordering::SeqCst);
        (
            [(header::CONTENT_RANGE, format!("0-0/{total}"))],
            Json(json!([])),
        )
    }

    async fn table(
        state: State<MockAuditStore>,
        method: axum::http::Method,
        body: axum::body::Bytes,
    ) -> axum::response::Response {
        if method == axum::http::Method::POST {
            let record: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
            insert(state, Json(record)).await.into_response()
        } else {
            count(state).await.into_response()
        }
    }

    let app = Router::new()
        .route("/rest/v1/ai_request_logs", any(table))
        .with_state(store.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind audit store");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (format!("http://{addr}"), store)
}
