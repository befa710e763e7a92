//! Read-only profile/context lookups.
//!
//! # Responsibilities
//! - Summarize a user's recent activity for the pass-through result
//! - Treat missing tables/relations as "no data", never as an error
//!
//! # Design Decisions
//! - Every lookup is fail-soft: an unreachable store yields the empty
//!   summary and the request proceeds
//! - Reads use the caller's bearer token when present, so row-level
//!   policies on the store apply to the caller, not the gateway

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::config::ProfileStoreConfig;

/// Activity counts attached to pass-through results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContextSummary {
    pub program_present: bool,
    pub sessions_14d_count: usize,
    pub sets_14d_count: usize,
    pub meals_7d_count: usize,
    pub weight_30d_count: usize,
}

/// Read-only context collaborator.
#[async_trait]
pub trait ContextStore: Send + Sync {
    /// Load the activity summary for a user. Infallible by contract; store
    /// problems degrade to the empty summary.
    async fn load_summary(&self, user_id: &str, bearer_token: Option<&str>) -> ContextSummary;
}

/// A store that always answers "no data". Used when no profile store is
/// configured.
pub struct EmptyContextStore;

#[async_trait]
impl ContextStore for EmptyContextStore {
    async fn load_summary(&self, _: &str, _: Option<&str>) -> ContextSummary {
        ContextSummary::default()
    }
}

/// PostgREST-compatible client.
pub struct RestContextStore {
    client: reqwest::Client,
    url: String,
    anon_key: String,
}

impl RestContextStore {
    pub fn new(config: &ProfileStoreConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
        }
    }

    /// One fail-soft select. Non-success answers and transport errors both
    /// degrade to `None`; a missing relation is indistinguishable from an
    /// empty one on purpose.
    async fn safe_select(
        &self,
        table: &str,
        query: &[(&str, &str)],
        bearer_token: Option<&str>,
    ) -> Option<Vec<Value>> {
        let mut request = self
            .client
            .get(format!("{}/rest/v1/{}", self.url, table))
            .header("apikey", &self.anon_key)
            .query(query);

        if let Some(token) = bearer_token {
            request = request.bearer_auth(token);
        } else {
            request = request.bearer_auth(&self.anon_key);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(table = %table, error = %err, "Context select failed");
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::warn!(
                table = %table,
                status = response.status().as_u16(),
                "Context select answered non-success"
            );
            return None;
        }

        response.json::<Vec<Value>>().await.ok()
    }
}

#[async_trait]
impl ContextStore for RestContextStore {
    async fn load_summary(&self, user_id: &str, bearer_token: Option<&str>) -> ContextSummary {
        let user_filter = format!("eq.{user_id}");
        let since_14d = format!("gte.{}", (Utc::now() - Duration::days(14)).to_rfc3339());
        let since_7d = format!("gte.{}", (Utc::now() - Duration::days(7)).to_rfc3339());
        let since_30d = format!("gte.{}", (Utc::now() - Duration::days(30)).to_rfc3339());

        let programs = self
            .safe_select(
                "programs",
                &[
                    ("select", "id"),
                    ("user_id", user_filter.as_str()),
                    ("order", "created_at.desc"),
                    ("limit", "1"),
                ],
                bearer_token,
            )
            .await
            .unwrap_or_default();

        let sessions = self
            .safe_select(
                "workout_sessions",
                &[
                    ("select", "id"),
                    ("user_id", user_filter.as_str()),
                    ("created_at", since_14d.as_str()),
                ],
                bearer_token,
            )
            .await
            .unwrap_or_default();

        let session_ids: Vec<String> = sessions
            .iter()
            .filter_map(|s| match s.get("id") {
                Some(Value::String(id)) => Some(id.clone()),
                Some(Value::Number(id)) => Some(id.to_string()),
                _ => None,
            })
            .collect();

        let sets = if session_ids.is_empty() {
            Vec::new()
        } else {
            let session_filter = format!("in.({})", session_ids.join(","));
            self.safe_select(
                "workout_sets",
                &[("select", "id"), ("session_id", session_filter.as_str())],
                bearer_token,
            )
            .await
            .unwrap_or_default()
        };

        let meals = self
            .safe_select(
                "meal_logs",
                &[
                    ("select", "id"),
                    ("user_id", user_filter.as_str()),
                    ("created_at", since_7d.as_str()),
                ],
                bearer_token,
            )
            .await
            .unwrap_or_default();

        let weights = self
            .safe_select(
                "weight_entries",
                &[
                    ("select", "id"),
                    ("user_id", user_filter.as_str()),
                    ("created_at", since_30d.as_str()),
                ],
                bearer_token,
            )
            .await
            .unwrap_or_default();

        ContextSummary {
            program_present: !programs.is_empty(),
            sessions_14d_count: sessions.len(),
            sets_14d_count: sets.len(),
            meals_7d_count: meals.len(),
            weight_30d_count: weights.len(),
        }
    }
}
