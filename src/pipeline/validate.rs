//! Body parsing and structural validation.

use serde_json::Value;

use crate::models::TaskType;

/// Parse a request body as JSON. Malformed bodies are terminal
/// (`bad_request`), never a server error.
pub fn parse_body(bytes: &[u8]) -> Option<Value> {
    serde_json::from_slice(bytes).ok()
}

/// Validate the structure the pipeline itself depends on. Every route
/// requires a JSON object; chat additionally requires a non-empty
/// `messages` array.
pub fn validate_body(task: TaskType, body: &Value) -> Result<(), &'static str> {
    let Some(map) = body.as_object() else {
        return Err("Request body must be a JSON object");
    };

    if task == TaskType::Chat {
        match map.get("messages") {
            Some(Value::Array(messages)) if !messages.is_empty() => {}
            _ => return Err("Missing or empty messages array"),
        }
    }

    Ok(())
}

/// Explicit regeneration intent declared by the caller.
pub fn declares_regeneration(body: &Value) -> bool {
    body.get("is_regeneration").and_then(Value::as_bool) == Some(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_rejects_malformed_json() {
        assert!(parse_body(b"{\"a\": 1}").is_some());
        assert!(parse_body(b"not json").is_none());
        assert!(parse_body(b"").is_none());
    }

    #[test]
    fn test_body_must_be_object() {
        assert!(validate_body(TaskType::GenerateProgram, &json!({"goal": "cut"})).is_ok());
        assert!(validate_body(TaskType::GenerateProgram, &json!([1, 2])).is_err());
        assert!(validate_body(TaskType::GenerateProgram, &json!("text")).is_err());
    }

    #[test]
    fn test_chat_requires_messages() {
        assert!(validate_body(TaskType::Chat, &json!({})).is_err());
        assert!(validate_body(TaskType::Chat, &json!({"messages": []})).is_err());
        assert!(validate_body(
            TaskType::Chat,
            &json!({"messages": [{"role": "user", "content": "hi"}]})
        )
        .is_ok());
    }

    #[test]
    fn test_regeneration_intent_must_be_true() {
        assert!(declares_regeneration(&json!({"is_regeneration": true})));
        assert!(!declares_regeneration(&json!({"is_regeneration": false})));
        assert!(!declares_regeneration(&json!({"is_regeneration": "true"})));
        assert!(!declares_regeneration(&json!({})));
    }
}
