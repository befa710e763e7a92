//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", format_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: GatewayConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: GatewayConfig = toml::from_str("").unwrap();
        assert_eq!(config.routes.len(), 5);
        assert_eq!(config.regeneration.limit, 10);
        assert!(config.features.ai_enabled);
    }

    #[test]
    fn test_partial_override() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [features]
            ai_enabled = false

            [models]
            planning = "gpt-5"
            "#,
        )
        .unwrap();
        assert!(!config.features.ai_enabled);
        assert!(config.features.chat_enabled);
        assert_eq!(config.models.planning, "gpt-5");
        assert_eq!(config.models.fallback, "gpt-5-mini");
    }
}
