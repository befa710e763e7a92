//! Distributed rate limiting.
//!
//! # Responsibilities
//! - Enforce per-route, per-identity request quotas
//! - Build the bucket identity from caller headers
//! - Convert store failures into fail-open verdicts
//!
//! # Design Decisions
//! - Fixed window via atomic INCR + EXPIRE; correctness is delegated to the
//!   store's atomicity guarantee, no client-side locking
//! - Denial triggers strictly when the count exceeds the maximum, so the
//!   Nth request within the quota succeeds and the (N+1)th is denied
//! - Any failure to reach or parse the store is fail-open: a dead counter
//!   store must never take down the primary AI features
//! - Anonymous callers behind one proxy share a bucket (first forwarded
//!   address, else a constant), an accepted tradeoff for simplicity

pub mod store;

use std::sync::Arc;

use axum::http::HeaderMap;

use crate::config::{CounterStoreConfig, RouteConfig};
use crate::observability::metrics;

use store::{CounterStore, RestCounterStore};

/// Outcome of a rate-limit check. `Unavailable` is distinct from `Allowed`
/// so callers cannot conflate "store down" with "policy says yes".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitVerdict {
    Allowed,
    Denied { message: String },
    Unavailable,
}

/// Per-route, per-identity quota enforcement against an external counter.
pub struct RateLimiter {
    store: Option<Arc<dyn CounterStore>>,
}

impl RateLimiter {
    pub fn from_config(config: &CounterStoreConfig) -> Self {
        let store: Option<Arc<dyn CounterStore>> = if config.is_configured() {
            Some(Arc::new(RestCounterStore::new(config)))
        } else {
            None
        };
        Self { store }
    }

    #[cfg(test)]
    pub fn with_store(store: Arc<dyn CounterStore>) -> Self {
        Self { store: Some(store) }
    }

    /// Check the quota for one request. Never errors: an unreachable or
    /// unconfigured store yields `Unavailable`.
    pub async fn check(&self, route: &RouteConfig, headers: &HeaderMap) -> RateLimitVerdict {
        let Some(store) = &self.store else {
            return RateLimitVerdict::Unavailable;
        };

        let identity = bucket_identity(headers);
        let key = format!("ratelimit:{}:{}", route.path, identity);

        let count = match store
            .incr_with_expiry(&key, route.rate_limit.window_seconds)
            .await
        {
            Ok(count) => count,
            Err(err) => {
                tracing::warn!(
                    route = %route.path,
                    identity = %identity,
                    error = %err,
                    "Rate limit check failed, allowing request"
                );
                metrics::record_store_failure("counter");
                return RateLimitVerdict::Unavailable;
            }
        };

        if count > route.rate_limit.max_requests {
            tracing::warn!(
                route = %route.path,
                identity = %identity,
                count,
                max = route.rate_limit.max_requests,
                "Rate limit exceeded"
            );
            metrics::record_rate_limited(&route.path);
            let max = route.rate_limit.max_requests;
            let plural = if max == 1 { "" } else { "s" };
            return RateLimitVerdict::Denied {
                message: format!(
                    "Rate limit exceeded. Maximum {} request{} per {}.",
                    max,
                    plural,
                    format_window(route.rate_limit.window_seconds)
                ),
            };
        }

        RateLimitVerdict::Allowed
    }
}

/// Bucket identity preference order: explicit caller-supplied id, else the
/// first address in the forwarded chain, else a constant anonymous bucket.
pub fn bucket_identity(headers: &HeaderMap) -> String {
    if let Some(user_id) = headers.get("x-user-id").and_then(|v| v.to_str().ok()) {
        let trimmed = user_id.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let trimmed = first.trim();
            if !trimmed.is_empty() {
                return trimmed.to_string();
            }
        }
    }

    "unknown".to_string()
}

fn format_window(seconds: u64) -> String {
    match seconds {
        60 => "minute".to_string(),
        3_600 => "hour".to_string(),
        86_400 => "day".to_string(),
        other => format!("{other} seconds"),
    }
}
