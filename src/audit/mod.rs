//! Request audit telemetry.
//!
//! # Responsibilities
//! - Define the append-only audit record written once per terminal outcome
//! - Record every outcome best-effort, without ever affecting the response
//!
//! # Design Decisions
//! - Fail-open: missing credentials, transport errors, and store rejections
//!   are logged locally and never propagated or retried synchronously
//! - No batching or backpressure: one write per request

pub mod store;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::AuditConfig;
use crate::observability::metrics;

use store::{AuditStore, RestAuditStore};

/// Terminal status of a governed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    Ok,
    Error,
    RateLimited,
    GuardrailBlock,
    BadRequest,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::Ok => "ok",
            AuditStatus::Error => "error",
            AuditStatus::RateLimited => "rate_limited",
            AuditStatus::GuardrailBlock => "guardrail_block",
            AuditStatus::BadRequest => "bad_request",
        }
    }
}

/// One append-only row per terminal request outcome. Never updated or
/// deleted by this system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub request_id: String,
    pub route: String,
    pub user_id: Option<String>,
    pub environment: Option<String>,
    pub model_used: Option<String>,
    pub tokens_in: Option<u64>,
    pub tokens_out: Option<u64>,
    pub cost_estimate_usd: Option<f64>,
    pub status: AuditStatus,
    pub http_status: u16,
    pub latency_ms: u64,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub is_regeneration: bool,
}

/// Best-effort recorder of request outcomes.
pub struct AuditLogger {
    store: Option<Arc<dyn AuditStore>>,
    environment: Option<String>,
}

impl AuditLogger {
    pub fn from_config(config: &AuditConfig) -> Self {
        let store: Option<Arc<dyn AuditStore>> = if config.is_configured() {
            Some(Arc::new(RestAuditStore::new(config)))
        } else {
            None
        };
        Self {
            store,
            environment: config.environment.clone(),
        }
    }

    #[cfg(test)]
    pub fn with_store(store: Arc<dyn AuditStore>) -> Self {
        Self {
            store: Some(store),
            environment: None,
        }
    }

    /// The audit store, for components that read history (regeneration).
    pub fn store(&self) -> Option<Arc<dyn AuditStore>> {
        self.store.clone()
    }

    /// Write one record. Fail-open: any failure is logged and swallowed.
    pub async fn record(&self, mut record: AuditRecord) {
        let Some(store) = &self.store else {
            return;
        };

        if record.environment.is_none() {
            record.environment = self.environment.clone();
        }

        if let Err(err) = store.insert(&record).await {
            tracing::warn!(
                request_id = %record.request_id,
                route = %record.route,
                error = %err,
                "Failed to write audit record"
            );
            metrics::record_store_failure("audit");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::sync::Mutex;
    use store::AuditStoreError;

    struct RejectingStore;

    #[async_trait]
    impl AuditStore for RejectingStore {
        async fn insert(&self, _: &AuditRecord) -> Result<(), AuditStoreError> {
            Err(AuditStoreError::Status(500))
        }

        async fn count_regenerations(
            &self,
            _: &str,
            _: &[String],
            _: DateTime<Utc>,
        ) -> Result<u64, AuditStoreError> {
            Err(AuditStoreError::Status(500))
        }
    }

    struct CapturingStore {
        records: Mutex<Vec<AuditRecord>>,
    }

    #[async_trait]
    impl AuditStore for CapturingStore {
        async fn insert(&self, record: &AuditRecord) -> Result<(), AuditStoreError> {
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }

        async fn count_regenerations(
            &self,
            _: &str,
            _: &[String],
            _: DateTime<Utc>,
        ) -> Result<u64, AuditStoreError> {
            Ok(0)
        }
    }

    fn sample_record() -> AuditRecord {
        AuditRecord {
            request_id: "req-1".to_string(),
            route: "/api/chat".to_string(),
            user_id: None,
            environment: None,
            model_used: None,
            tokens_in: None,
            tokens_out: None,
            cost_estimate_usd: None,
            status: AuditStatus::Ok,
            http_status: 200,
            latency_ms: 12,
            error_code: None,
            error_message: None,
            is_regeneration: false,
        }
    }

    #[tokio::test]
    async fn test_store_rejection_is_swallowed() {
        let logger = AuditLogger::with_store(Arc::new(RejectingStore));
        logger.record(sample_record()).await;
    }

    #[tokio::test]
    async fn test_record_reaches_store() {
        let store = Arc::new(CapturingStore {
            records: Mutex::new(Vec::new()),
        });
        let logger = AuditLogger::with_store(store.clone());
        logger.record(sample_record()).await;

        let records = store.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].request_id, "req-1");
    }

    #[test]
    fn test_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(AuditStatus::GuardrailBlock).unwrap(),
            "guardrail_block"
        );
        assert_eq!(AuditStatus::RateLimited.as_str(), "rate_limited");
    }
}
