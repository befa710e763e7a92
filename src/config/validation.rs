//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check route-table integrity (paths unique, limits sane)
//! - Validate value ranges (windows > 0, budgets > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;

use crate::config::schema::GatewayConfig;

/// A single semantic problem found in the configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("listener.bind_address must not be empty")]
    EmptyBindAddress,

    #[error("at least one route must be configured")]
    NoRoutes,

    #[error("route path {0:?} must start with '/'")]
    InvalidRoutePath(String),

    #[error("route path {0:?} is configured more than once")]
    DuplicateRoutePath(String),

    #[error("route {0:?}: rate_limit.max_requests must be greater than zero")]
    ZeroMaxRequests(String),

    #[error("route {0:?}: rate_limit.window_seconds must be greater than zero")]
    ZeroRateWindow(String),

    #[error("route {0:?}: max_body_bytes must be greater than zero")]
    ZeroBodyLimit(String),

    #[error("models.{0} must not be empty")]
    EmptyModelName(&'static str),

    #[error("regeneration.window_hours must be greater than zero")]
    ZeroRegenerationWindow,

    #[error("regeneration route {0:?} does not match any configured route")]
    UnknownRegenerationRoute(String),
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.trim().is_empty() {
        errors.push(ValidationError::EmptyBindAddress);
    }

    if config.routes.is_empty() {
        errors.push(ValidationError::NoRoutes);
    }

    let mut seen_paths = Vec::new();
    for route in &config.routes {
        if !route.path.starts_with('/') {
            errors.push(ValidationError::InvalidRoutePath(route.path.clone()));
        }
        if seen_paths.contains(&route.path.as_str()) {
            errors.push(ValidationError::DuplicateRoutePath(route.path.clone()));
        } else {
            seen_paths.push(route.path.as_str());
        }
        if route.rate_limit.max_requests == 0 {
            errors.push(ValidationError::ZeroMaxRequests(route.path.clone()));
        }
        if route.rate_limit.window_seconds == 0 {
            errors.push(ValidationError::ZeroRateWindow(route.path.clone()));
        }
        if route.max_body_bytes == 0 {
            errors.push(ValidationError::ZeroBodyLimit(route.path.clone()));
        }
    }

    let models = [
        ("fast_response", &config.models.fast_response),
        ("planning", &config.models.planning),
        ("conversational", &config.models.conversational),
        ("analytical", &config.models.analytical),
        ("fallback", &config.models.fallback),
    ];
    for (name, value) in models {
        if value.trim().is_empty() {
            errors.push(ValidationError::EmptyModelName(name));
        }
    }

    if config.regeneration.window_hours <= 0 {
        errors.push(ValidationError::ZeroRegenerationWindow);
    }
    for regen_route in &config.regeneration.routes {
        if config.route(regen_route).is_none() {
            errors.push(ValidationError::UnknownRegenerationRoute(
                regen_route.clone(),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
