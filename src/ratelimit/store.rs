//! Counter store client.
//!
//! The limiter's only synchronization point is an external Redis-compatible
//! store reached over a REST pipeline endpoint. One call sends
//! `[["INCR", key], ["EXPIRE", key, window]]`; the store executes the pair
//! as a single observable step, so the increment that creates a key also
//! arms its expiry and a window can never fail to expire.

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::CounterStoreConfig;

/// Failure reaching or understanding the counter store. Callers treat every
/// variant as "store unavailable", never as a denial.
#[derive(Debug, Error)]
pub enum CounterStoreError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("store answered status {0}")]
    Status(u16),

    #[error("unparseable store response")]
    Unparseable,
}

/// Atomic increment-with-expiry over some external store.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Increment `key`, arming a TTL of `window_seconds` on creation, and
    /// return the post-increment count.
    async fn incr_with_expiry(&self, key: &str, window_seconds: u64)
        -> Result<u64, CounterStoreError>;
}

/// REST pipeline client (Upstash-compatible).
pub struct RestCounterStore {
    client: reqwest::Client,
    url: String,
    token: String,
}

impl RestCounterStore {
    pub fn new(config: &CounterStoreConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: config.url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        }
    }
}

#[async_trait]
impl CounterStore for RestCounterStore {
    async fn incr_with_expiry(
        &self,
        key: &str,
        window_seconds: u64,
    ) -> Result<u64, CounterStoreError> {
        let commands = json!([
            ["INCR", key],
            ["EXPIRE", key, window_seconds.to_string()],
        ]);

        let response = self
            .client
            .post(format!("{}/pipeline", self.url))
            .bearer_auth(&self.token)
            .json(&commands)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CounterStoreError::Status(response.status().as_u16()));
        }

        let body: Value = response.json().await?;
        parse_pipeline_count(&body).ok_or(CounterStoreError::Unparseable)
    }
}

/// The INCR result is the first entry's `result` field:
/// `[{"result": <count>}, {"result": <expire-ack>}]`.
fn parse_pipeline_count(body: &Value) -> Option<u64> {
    body.as_array()?.first()?.get("result")?.as_u64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_pipeline_count() {
        let body = json!([{"result": 31}, {"result": 1}]);
        assert_eq!(parse_pipeline_count(&body), Some(31));
    }

    #[test]
    fn test_parse_rejects_unexpected_shapes() {
        assert_eq!(parse_pipeline_count(&json!([])), None);
        assert_eq!(parse_pipeline_count(&json!({"result": 3})), None);
        assert_eq!(parse_pipeline_count(&json!([{"error": "ERR"}])), None);
        assert_eq!(parse_pipeline_count(&json!([{"result": "OK"}])), None);
    }
}
