//! Regeneration quota tracking.
//!
//! The cap is derived, not stored: it is a count of prior successful
//! regeneration-route audit records for the user inside a rolling window.
//! Quota enforcement is advisory, not safety-critical, so every read
//! failure is fail-open (treated as zero).

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::audit::store::AuditStore;
use crate::config::RegenerationConfig;
use crate::http::messages::{ui_message, UiCode};
use crate::http::response::UiMessage;

/// Fixed coaching message returned when the cap is reached.
pub const COACHING_MESSAGE: &str = "We've made a lot of changes already. Constantly switching \
     programs won't help your progress — consistency is how results happen. Let's commit to \
     this plan for a bit and reassess soon.";

/// Outcome of a quota check.
#[derive(Debug, Clone, PartialEq)]
pub enum RegenerationVerdict {
    Allowed,
    Denied { message: String, ui: UiMessage },
}

/// Rolling-window cap on explicit regeneration requests.
pub struct RegenerationTracker {
    store: Option<Arc<dyn AuditStore>>,
    policy: RegenerationConfig,
}

impl RegenerationTracker {
    pub fn new(store: Option<Arc<dyn AuditStore>>, policy: RegenerationConfig) -> Self {
        Self { store, policy }
    }

    /// Whether successful requests on this route count as regenerations.
    pub fn is_regeneration_route(&self, path: &str) -> bool {
        self.policy.routes.iter().any(|r| r == path)
    }

    /// Successful regenerations for the user in the trailing window.
    /// Fail-open: missing identity, unconfigured store, or a failed query
    /// all count as zero.
    pub async fn count(&self, user_id: Option<&str>) -> u64 {
        let (Some(store), Some(user_id)) = (&self.store, user_id) else {
            return 0;
        };

        let since = Utc::now() - Duration::hours(self.policy.window_hours);
        match store
            .count_regenerations(user_id, &self.policy.routes, since)
            .await
        {
            Ok(count) => count,
            Err(err) => {
                tracing::warn!(
                    user_id = %user_id,
                    error = %err,
                    "Failed to get regeneration count, allowing request"
                );
                0
            }
        }
    }

    /// Check the quota. A no-op allow when the request does not declare
    /// regeneration intent.
    pub async fn check(&self, user_id: Option<&str>, is_regeneration: bool) -> RegenerationVerdict {
        if !is_regeneration {
            return RegenerationVerdict::Allowed;
        }

        let count = self.count(user_id).await;
        if count >= self.policy.limit {
            return RegenerationVerdict::Denied {
                message: COACHING_MESSAGE.to_string(),
                ui: ui_message(UiCode::RegenCoaching),
            };
        }

        RegenerationVerdict::Allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::DateTime;

    use crate::audit::store::AuditStoreError;
    use crate::audit::AuditRecord;

    struct CountStore(u64);

    #[async_trait]
    impl AuditStore for CountStore {
        async fn insert(&self, _: &AuditRecord) -> Result<(), AuditStoreError> {
            Ok(())
        }

        async fn count_regenerations(
            &self,
            _: &str,
            _: &[String],
            _: DateTime<Utc>,
        ) -> Result<u64, AuditStoreError> {
            Ok(self.0)
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl AuditStore for BrokenStore {
        async fn insert(&self, _: &AuditRecord) -> Result<(), AuditStoreError> {
            Ok(())
        }

        async fn count_regenerations(
            &self,
            _: &str,
            _: &[String],
            _: DateTime<Utc>,
        ) -> Result<u64, AuditStoreError> {
            Err(AuditStoreError::Status(503))
        }
    }

    fn tracker(store: Arc<dyn AuditStore>) -> RegenerationTracker {
        RegenerationTracker::new(Some(store), RegenerationConfig::default())
    }

    #[tokio::test]
    async fn test_no_intent_is_noop_allow() {
        let t = tracker(Arc::new(CountStore(100)));
        assert_eq!(
            t.check(Some("user-1"), false).await,
            RegenerationVerdict::Allowed
        );
    }

    #[tokio::test]
    async fn test_under_limit_allowed_at_limit_denied() {
        let t = tracker(Arc::new(CountStore(9)));
        assert_eq!(
            t.check(Some("user-1"), true).await,
            RegenerationVerdict::Allowed
        );

        let t = tracker(Arc::new(CountStore(10)));
        assert!(matches!(
            t.check(Some("user-1"), true).await,
            RegenerationVerdict::Denied { .. }
        ));
    }

    #[tokio::test]
    async fn test_store_failure_is_fail_open() {
        let t = tracker(Arc::new(BrokenStore));
        assert_eq!(
            t.check(Some("user-1"), true).await,
            RegenerationVerdict::Allowed
        );
    }

    #[tokio::test]
    async fn test_missing_identity_counts_as_zero() {
        let t = tracker(Arc::new(CountStore(100)));
        assert_eq!(t.check(None, true).await, RegenerationVerdict::Allowed);
    }

    #[test]
    fn test_regeneration_routes() {
        let t = RegenerationTracker::new(None, RegenerationConfig::default());
        assert!(t.is_regeneration_route("/api/generate-program"));
        assert!(t.is_regeneration_route("/api/generate-meal-plan"));
        assert!(!t.is_regeneration_route("/api/chat"));
    }
}
