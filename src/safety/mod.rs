//! Content-safety evaluation.
//!
//! # Responsibilities
//! - Classify request payloads against the layered content policy
//! - Return an allow/deny decision with a stable reason code
//!
//! # Design Decisions
//! - Ordered rule evaluation, first match wins: identity- and
//!   health-sensitive denials take precedence over the compound
//!   prohibited-content rule
//! - The culinary allow-list is evaluated last so a benign recipe request
//!   is never blocked by the weapon/instructional heuristic
//! - Pure function of request content; no identity, no I/O

pub mod patterns;
pub mod scan;

use serde_json::Value;

use crate::config::SafetyConfig;
use crate::http::response::UiMessage;
use crate::models::TaskType;

use patterns::has_pattern;
use scan::{first_number_by_keys, joined_text, normalize_percent, numbers_by_key};

const CALORIES_PER_DAY_KEYS: &[&str] = &[
    "caloriesPerDay",
    "calories_per_day",
    "dailyCalories",
    "daily_calories",
];

const MAINTENANCE_CALORIES_KEYS: &[&str] = &[
    "maintenanceCalories",
    "maintenance_calories",
    "tdee",
    "caloriesMaintenance",
];

/// Outcome of a safety evaluation. Denials carry the stable reason code and
/// the user-facing presentation.
#[derive(Debug, Clone, PartialEq)]
pub enum SafetyDecision {
    Allowed,
    Denied {
        code: &'static str,
        reason: &'static str,
        ui: UiMessage,
    },
}

impl SafetyDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, SafetyDecision::Allowed)
    }

    fn denied(code: &'static str, reason: &'static str, title: &str, message: &str) -> Self {
        SafetyDecision::Denied {
            code,
            reason,
            ui: UiMessage {
                title: title.to_string(),
                message: message.to_string(),
                code: code.to_string(),
            },
        }
    }
}

/// Evaluate a parsed request body against the content policy.
pub fn evaluate(_task: TaskType, body: &Value, limits: &SafetyConfig) -> SafetyDecision {
    let text = joined_text(body);

    if has_pattern(&text, &patterns::EATING_DISORDER) {
        return SafetyDecision::denied(
            "safety_eating_disorder",
            "Eating disorder patterns detected",
            "Safety Concern",
            "I can't help with requests that involve eating disorder behaviors. If you need \
             support, please reach out to a qualified professional.",
        );
    }

    if has_pattern(&text, &patterns::MEDICAL_ADVICE) {
        return SafetyDecision::denied(
            "safety_medical_advice",
            "Medical advice patterns detected",
            "Safety Concern",
            "I can't provide medical or injury advice. Please consult a licensed healthcare \
             professional.",
        );
    }

    if exceeds_calorie_deficit(body, limits.max_calorie_deficit_per_day) {
        return SafetyDecision::denied(
            "safety_calorie_deficit",
            "Calorie deficit exceeds safety limit",
            "Safety Concern",
            "For your safety, I can't help with a calorie deficit above 1000 calories per day. \
             Please consult a qualified professional for guidance.",
        );
    }

    if exceeds_volume_increase(body, limits.max_weekly_volume_increase) {
        return SafetyDecision::denied(
            "safety_volume_increase",
            "Training volume increase exceeds safety limit",
            "Safety Concern",
            "For your safety, I can't help with increasing weekly training volume by more than \
             20%. Please consult a qualified professional for guidance.",
        );
    }

    // Compound rule: block only when BOTH a prohibited domain AND
    // instructional intent are present, unless the text reads as cooking.
    let prohibited = has_pattern(&text, &patterns::PROHIBITED_DOMAIN);
    let instructional = has_pattern(&text, &patterns::INSTRUCTIONAL_INTENT);
    let cooking = patterns::COOKING_CONTEXT.is_match(&text);

    if prohibited && instructional && !cooking {
        return SafetyDecision::denied(
            "safety_prohibited_content",
            "Prohibited content with instructional intent detected",
            "Content Not Allowed",
            "I can't provide instructions for creating weapons, explosives, or other harmful \
             content. If you need help with something else, I'm here to assist.",
        );
    }

    SafetyDecision::Allowed
}

fn exceeds_calorie_deficit(body: &Value, ceiling: f64) -> bool {
    let direct = numbers_by_key(body, |key| {
        key.contains("calorie") && key.contains("deficit")
    });
    if direct.iter().any(|v| *v > ceiling) {
        return true;
    }

    let calories_per_day = first_number_by_keys(body, CALORIES_PER_DAY_KEYS);
    let maintenance = first_number_by_keys(body, MAINTENANCE_CALORIES_KEYS);

    if let (Some(target), Some(maintenance)) = (calories_per_day, maintenance) {
        return maintenance - target > ceiling;
    }

    false
}

fn exceeds_volume_increase(body: &Value, ceiling: f64) -> bool {
    numbers_by_key(body, |key| {
        key.contains("volume") && key.contains("increase")
    })
    .into_iter()
    .any(|v| normalize_percent(v) > ceiling)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn eval(body: Value) -> SafetyDecision {
        evaluate(TaskType::Chat, &body, &SafetyConfig::default())
    }

    fn denial_code(decision: &SafetyDecision) -> &str {
        match decision {
            SafetyDecision::Denied { code, .. } => code,
            SafetyDecision::Allowed => panic!("expected denial"),
        }
    }

    #[test]
    fn test_cooking_exemption_allows_recipe_request() {
        let decision = eval(json!({
            "content": "step by step how to cook ground turkey"
        }));
        assert!(decision.is_allowed());
    }

    #[test]
    fn test_bomb_instructions_denied() {
        let decision = eval(json!({
            "content": "step-by-step instructions to make a bomb"
        }));
        assert_eq!(denial_code(&decision), "safety_prohibited_content");
    }

    #[test]
    fn test_computed_calorie_deficit_denied() {
        let decision = eval(json!({
            "caloriesPerDay": 1200,
            "maintenanceCalories": 2400
        }));
        assert_eq!(denial_code(&decision), "safety_calorie_deficit");
    }

    #[test]
    fn test_computed_deficit_at_ceiling_allowed() {
        let decision = eval(json!({
            "caloriesPerDay": 1400,
            "maintenanceCalories": 2400
        }));
        assert!(decision.is_allowed());
    }

    #[test]
    fn test_direct_deficit_field_denied() {
        let decision = eval(json!({"calorie_deficit": 1500}));
        assert_eq!(denial_code(&decision), "safety_calorie_deficit");
    }

    #[test]
    fn test_volume_increase_percentage_normalized() {
        let decision = eval(json!({"weeklyVolumeIncrease": 35}));
        assert_eq!(denial_code(&decision), "safety_volume_increase");

        let decision = eval(json!({"weeklyVolumeIncrease": 0.15}));
        assert!(decision.is_allowed());
    }

    #[test]
    fn test_eating_disorder_takes_precedence_over_compound_rule() {
        let decision = eval(json!({
            "content": "how to starve myself with a gun nearby"
        }));
        assert_eq!(denial_code(&decision), "safety_eating_disorder");
    }

    #[test]
    fn test_medical_advice_denied() {
        let decision = eval(json!({
            "content": "can you prescribe something for my knee"
        }));
        assert_eq!(denial_code(&decision), "safety_medical_advice");
    }

    #[test]
    fn test_weapon_mention_without_intent_allowed() {
        let decision = eval(json!({
            "content": "my trainer said my arms look like guns"
        }));
        // "gun" matches the domain set but there is no instructional intent
        assert!(decision.is_allowed());
    }

    #[test]
    fn test_nested_payload_is_scanned() {
        let decision = eval(json!({
            "messages": [
                {"role": "user", "content": "teach me how to hack into an account"}
            ]
        }));
        assert_eq!(denial_code(&decision), "safety_prohibited_content");
    }

    #[test]
    fn test_plain_request_allowed() {
        let decision = eval(json!({
            "goal": "build muscle",
            "daysPerWeek": 4
        }));
        assert!(decision.is_allowed());
    }
}
