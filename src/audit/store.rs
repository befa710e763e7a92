//! Audit store client.
//!
//! Append-only inserts over a PostgREST-style transport, plus the one read
//! the regeneration tracker needs: a count of matching rows inside a rolling
//! window, taken from the `content-range` header of a zero-row range query.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::audit::AuditRecord;
use crate::config::AuditConfig;

#[derive(Debug, Error)]
pub enum AuditStoreError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("store answered status {0}")]
    Status(u16),

    #[error("unparseable store response")]
    Unparseable,
}

/// Append-only audit persistence plus the regeneration-count read.
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn insert(&self, record: &AuditRecord) -> Result<(), AuditStoreError>;

    /// Count successful regeneration records for a user since `since`.
    async fn count_regenerations(
        &self,
        user_id: &str,
        routes: &[String],
        since: DateTime<Utc>,
    ) -> Result<u64, AuditStoreError>;
}

/// PostgREST-compatible client.
pub struct RestAuditStore {
    client: reqwest::Client,
    url: String,
    service_key: String,
    table: String,
}

impl RestAuditStore {
    pub fn new(config: &AuditConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: config.url.trim_end_matches('/').to_string(),
            service_key: config.service_key.clone(),
            table: config.table.clone(),
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.url, self.table)
    }
}

#[async_trait]
impl AuditStore for RestAuditStore {
    async fn insert(&self, record: &AuditRecord) -> Result<(), AuditStoreError> {
        let response = self
            .client
            .post(self.table_url())
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AuditStoreError::Status(response.status().as_u16()));
        }
        Ok(())
    }

    async fn count_regenerations(
        &self,
        user_id: &str,
        routes: &[String],
        since: DateTime<Utc>,
    ) -> Result<u64, AuditStoreError> {
        let user_filter = format!("eq.{user_id}");
        let route_filter = format!("in.({})", routes.join(","));
        let since_filter = format!("gte.{}", since.to_rfc3339());
        let response = self
            .client
            .get(self.table_url())
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .header("Prefer", "count=exact")
            .header("Range", "0-0")
            .query(&[
                ("select", "request_id"),
                ("user_id", user_filter.as_str()),
                ("route", route_filter.as_str()),
                ("is_regeneration", "eq.true"),
                ("status", "eq.ok"),
                ("created_at", since_filter.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AuditStoreError::Status(response.status().as_u16()));
        }

        response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total)
            .ok_or(AuditStoreError::Unparseable)
    }
}

/// Total row count from a `content-range` header such as `0-0/42` or `*/0`.
fn parse_content_range_total(value: &str) -> Option<u64> {
    value.rsplit('/').next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_content_range_total() {
        assert_eq!(parse_content_range_total("0-0/42"), Some(42));
        assert_eq!(parse_content_range_total("*/0"), Some(0));
        assert_eq!(parse_content_range_total("0-24/3573"), Some(3573));
        assert_eq!(parse_content_range_total("0-0/*"), None);
        assert_eq!(parse_content_range_total("garbage"), None);
    }
}
