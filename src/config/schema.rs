//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.
//! Configuration is loaded once at startup and is read-only afterwards;
//! components receive it by reference or behind an `Arc`, never through
//! ambient global lookup.

use serde::{Deserialize, Serialize};

use crate::models::{ModelTier, TaskType};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, connection cap).
    pub listener: ListenerConfig,

    /// Feature flags gating the AI surface.
    pub features: FeatureFlags,

    /// Route descriptors, one per governed endpoint.
    pub routes: Vec<RouteConfig>,

    /// Per-tier model identifiers.
    pub models: ModelsConfig,

    /// Content-safety ceilings.
    pub safety: SafetyConfig,

    /// Regeneration quota policy.
    pub regeneration: RegenerationConfig,

    /// Distributed rate-limit counter store.
    pub counter_store: CounterStoreConfig,

    /// Append-only audit store.
    pub audit: AuditConfig,

    /// Read-only profile/context store.
    pub profile_store: ProfileStoreConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            features: FeatureFlags::default(),
            routes: default_routes(),
            models: ModelsConfig::default(),
            safety: SafetyConfig::default(),
            regeneration: RegenerationConfig::default(),
            counter_store: CounterStoreConfig::default(),
            audit: AuditConfig::default(),
            profile_store: ProfileStoreConfig::default(),
            timeouts: TimeoutConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Find the descriptor for a route path.
    pub fn route(&self, path: &str) -> Option<&RouteConfig> {
        self.routes.iter().find(|r| r.path == path)
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 10_000,
        }
    }
}

/// Feature flags. When `ai_enabled` is off every route answers 503; the chat
/// route additionally requires `chat_enabled`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FeatureFlags {
    pub ai_enabled: bool,
    pub chat_enabled: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            ai_enabled: true,
            chat_enabled: true,
        }
    }
}

/// Immutable descriptor for one governed endpoint. Created at process start;
/// never mutated.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route path (e.g., "/api/chat").
    pub path: String,

    /// Logical task the route serves.
    pub task_type: TaskType,

    /// Model tier used for this route.
    pub tier: ModelTier,

    /// Advisory request-body ceiling, checked against the declared
    /// content-length only.
    pub max_body_bytes: u64,

    /// Output-token budget before clamping.
    pub max_output_tokens: f64,

    /// Per-identity request quota.
    pub rate_limit: RouteLimit,

    /// Reject requests that resolve no identity.
    #[serde(default)]
    pub require_identity: bool,
}

/// Fixed-window request quota for one route.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteLimit {
    pub max_requests: u64,
    pub window_seconds: u64,
}

/// Default route table. Mirrors the production endpoints.
pub fn default_routes() -> Vec<RouteConfig> {
    vec![
        RouteConfig {
            path: "/api/chat".to_string(),
            task_type: TaskType::Chat,
            tier: ModelTier::Conversational,
            max_body_bytes: 100_000,
            max_output_tokens: 1_200.0,
            rate_limit: RouteLimit {
                max_requests: 30,
                window_seconds: 60,
            },
            require_identity: false,
        },
        RouteConfig {
            path: "/api/generate-program".to_string(),
            task_type: TaskType::GenerateProgram,
            tier: ModelTier::Planning,
            max_body_bytes: 50_000,
            max_output_tokens: 1_000.0,
            rate_limit: RouteLimit {
                max_requests: 3,
                window_seconds: 86_400,
            },
            require_identity: false,
        },
        RouteConfig {
            path: "/api/generate-meal-plan".to_string(),
            task_type: TaskType::GenerateMealPlan,
            tier: ModelTier::Planning,
            max_body_bytes: 30_000,
            max_output_tokens: 800.0,
            rate_limit: RouteLimit {
                max_requests: 3,
                window_seconds: 86_400,
            },
            require_identity: false,
        },
        RouteConfig {
            path: "/api/weekly-checkin".to_string(),
            task_type: TaskType::WeeklyCheckin,
            tier: ModelTier::Analytical,
            max_body_bytes: 10_000,
            max_output_tokens: 600.0,
            rate_limit: RouteLimit {
                max_requests: 5,
                window_seconds: 86_400,
            },
            require_identity: false,
        },
        RouteConfig {
            path: "/api/analyze-progress".to_string(),
            task_type: TaskType::AnalyzeProgress,
            tier: ModelTier::Analytical,
            max_body_bytes: 20_000,
            max_output_tokens: 700.0,
            rate_limit: RouteLimit {
                max_requests: 10,
                window_seconds: 86_400,
            },
            require_identity: false,
        },
    ]
}

/// Per-tier model identifiers with process-wide defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub fast_response: String,
    pub planning: String,
    pub conversational: String,
    pub analytical: String,
    pub fallback: String,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            fast_response: "gpt-5".to_string(),
            planning: "gpt-5-mini".to_string(),
            conversational: "gpt-5-mini".to_string(),
            analytical: "gpt-5-mini".to_string(),
            fallback: "gpt-5-mini".to_string(),
        }
    }
}

/// Numeric safety ceilings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SafetyConfig {
    /// Maximum allowed daily calorie deficit.
    pub max_calorie_deficit_per_day: f64,

    /// Maximum allowed weekly training-volume increase, as a fraction.
    pub max_weekly_volume_increase: f64,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            max_calorie_deficit_per_day: 1_000.0,
            max_weekly_volume_increase: 0.2,
        }
    }
}

/// Rolling-window cap on explicit regeneration requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RegenerationConfig {
    /// Successful regenerations allowed inside the window.
    pub limit: u64,

    /// Rolling window length in hours.
    pub window_hours: i64,

    /// Routes whose successful requests count as regenerations.
    pub routes: Vec<String>,
}

impl Default for RegenerationConfig {
    fn default() -> Self {
        Self {
            limit: 10,
            window_hours: 24,
            routes: vec![
                "/api/generate-program".to_string(),
                "/api/generate-meal-plan".to_string(),
            ],
        }
    }
}

/// Redis-compatible REST counter store (atomic INCR + EXPIRE pipeline).
/// Unset credentials mean "not configured": rate limiting is skipped.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CounterStoreConfig {
    pub enabled: bool,
    pub url: String,
    pub token: String,
}

impl Default for CounterStoreConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: String::new(),
            token: String::new(),
        }
    }
}

impl CounterStoreConfig {
    pub fn is_configured(&self) -> bool {
        self.enabled && !self.url.is_empty() && !self.token.is_empty()
    }
}

/// PostgREST-style append-only audit store.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuditConfig {
    pub enabled: bool,
    pub url: String,
    pub service_key: String,
    pub table: String,

    /// Deployment environment recorded on every audit row.
    pub environment: Option<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: String::new(),
            service_key: String::new(),
            table: "ai_request_logs".to_string(),
            environment: None,
        }
    }
}

impl AuditConfig {
    pub fn is_configured(&self) -> bool {
        self.enabled && !self.url.is_empty() && !self.service_key.is_empty()
    }
}

/// PostgREST-style read-only profile/context store.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProfileStoreConfig {
    pub url: String,
    pub anon_key: String,
}

impl ProfileStoreConfig {
    pub fn is_configured(&self) -> bool {
        !self.url.is_empty() && !self.anon_key.is_empty()
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
