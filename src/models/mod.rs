//! Model-tier routing.
//!
//! # Responsibilities
//! - Map a logical task tier to a configured model identifier
//! - Provide a process-wide fallback model
//! - Clamp the per-route output-token budget into the global range
//!
//! # Design Decisions
//! - Pure selection: no network call happens here
//! - Out-of-range or non-finite token budgets fall back to the floor

use serde::{Deserialize, Serialize};

use crate::config::{ModelsConfig, RouteConfig};

/// Floor of the output-token budget.
pub const MIN_OUTPUT_TOKENS: u32 = 256;

/// Ceiling of the output-token budget.
pub const MAX_OUTPUT_TOKENS: u32 = 4096;

/// Named class of model capability, distinct from a specific model identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelTier {
    FastResponse,
    Planning,
    Conversational,
    Analytical,
}

impl ModelTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelTier::FastResponse => "fast-response",
            ModelTier::Planning => "planning",
            ModelTier::Conversational => "conversational",
            ModelTier::Analytical => "analytical",
        }
    }
}

/// Logical task a route serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    GenerateProgram,
    GenerateMealPlan,
    WeeklyCheckin,
    Chat,
    AnalyzeProgress,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::GenerateProgram => "generate_program",
            TaskType::GenerateMealPlan => "generate_meal_plan",
            TaskType::WeeklyCheckin => "weekly_checkin",
            TaskType::Chat => "chat",
            TaskType::AnalyzeProgress => "analyze_progress",
        }
    }
}

/// Result of model selection for one request.
#[derive(Debug, Clone)]
pub struct ModelSelection {
    pub model_used: String,
    pub fallback_model: String,
    pub max_output_tokens: u32,
}

/// Select the model for a route. Looks up the configured identifier for the
/// route's tier and clamps the route's output-token budget.
pub fn select(models: &ModelsConfig, route: &RouteConfig) -> ModelSelection {
    let model_used = match route.tier {
        ModelTier::FastResponse => models.fast_response.clone(),
        ModelTier::Planning => models.planning.clone(),
        ModelTier::Conversational => models.conversational.clone(),
        ModelTier::Analytical => models.analytical.clone(),
    };

    ModelSelection {
        model_used,
        fallback_model: models.fallback.clone(),
        max_output_tokens: clamp_tokens(route.max_output_tokens),
    }
}

fn clamp_tokens(value: f64) -> u32 {
    if !value.is_finite() {
        return MIN_OUTPUT_TOKENS;
    }
    let floored = value.floor();
    if floored < f64::from(MIN_OUTPUT_TOKENS) {
        MIN_OUTPUT_TOKENS
    } else if floored > f64::from(MAX_OUTPUT_TOKENS) {
        MAX_OUTPUT_TOKENS
    } else {
        floored as u32
    }
}
