//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::{
    AuditConfig, CounterStoreConfig, FeatureFlags, GatewayConfig, ListenerConfig, ModelsConfig,
    ObservabilityConfig, ProfileStoreConfig, RegenerationConfig, RouteConfig, RouteLimit,
    SafetyConfig, TimeoutConfig,
};
