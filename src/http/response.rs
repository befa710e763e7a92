//! Response envelope construction.
//!
//! # Responsibilities
//! - Define the single wire format for success and error results
//! - Carry the correlation id on every outcome
//! - Attach CORS headers to every response, including preflight
//!
//! # Design Decisions
//! - Envelope construction is pure and total: every outcome produces the
//!   same shape
//! - The user-facing `ui` sub-object is distinct from the internal error code

use axum::body::Body;
use axum::http::{header, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// The only object serialized to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub request_id: String,
    pub route: String,
    pub model_used: Option<String>,
    pub tokens_in: Option<u64>,
    pub tokens_out: Option<u64>,
    pub cost_estimate_usd: Option<f64>,
    pub result: Option<Value>,
    pub error: Option<ErrorBody>,
}

/// Error payload carried by a terminal envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ui: Option<UiMessage>,
}

/// User-facing presentation of an error, distinct from the internal code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiMessage {
    pub title: String,
    pub message: String,
    pub code: String,
}

/// Optional usage metadata attached to an envelope.
#[derive(Debug, Clone, Default)]
pub struct ResponseMeta {
    pub model_used: Option<String>,
    pub tokens_in: Option<u64>,
    pub tokens_out: Option<u64>,
    pub cost_estimate_usd: Option<f64>,
}

impl ResponseMeta {
    pub fn for_model(model: &str) -> Self {
        Self {
            model_used: Some(model.to_string()),
            ..Self::default()
        }
    }
}

/// Generate a unique request ID.
pub fn new_request_id() -> String {
    Uuid::new_v4().to_string()
}

/// Build a success envelope.
pub fn ok(route: &str, request_id: &str, result: Value, meta: ResponseMeta) -> ResponseEnvelope {
    ResponseEnvelope {
        request_id: request_id.to_string(),
        route: route.to_string(),
        model_used: meta.model_used,
        tokens_in: meta.tokens_in,
        tokens_out: meta.tokens_out,
        cost_estimate_usd: meta.cost_estimate_usd,
        result: Some(result),
        error: None,
    }
}

/// Build an error envelope.
pub fn fail(
    route: &str,
    request_id: &str,
    code: &str,
    message: &str,
    ui: Option<UiMessage>,
    meta: ResponseMeta,
) -> ResponseEnvelope {
    ResponseEnvelope {
        request_id: request_id.to_string(),
        route: route.to_string(),
        model_used: meta.model_used,
        tokens_in: meta.tokens_in,
        tokens_out: meta.tokens_out,
        cost_estimate_usd: meta.cost_estimate_usd,
        result: None,
        error: Some(ErrorBody {
            code: code.to_string(),
            message: message.to_string(),
            ui,
        }),
    }
}

/// Serialize an envelope as a JSON response with CORS headers.
pub fn json_response(envelope: &ResponseEnvelope, status: StatusCode) -> Response<Body> {
    let body = serde_json::to_string(envelope)
        .unwrap_or_else(|_| "{\"error\":{\"code\":\"server_error\"}}".to_string());

    let mut builder = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json");
    builder = cors_headers(builder);

    builder
        .body(Body::from(body))
        .unwrap_or_else(|_| Response::new(Body::empty()))
}

/// CORS preflight response.
pub fn preflight() -> Response<Body> {
    cors_headers(Response::builder().status(StatusCode::NO_CONTENT))
        .body(Body::empty())
        .unwrap_or_else(|_| Response::new(Body::empty()))
}

fn cors_headers(builder: axum::http::response::Builder) -> axum::http::response::Builder {
    builder
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .header(header::ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS")
        .header(header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_envelope_round_trip() {
        let id = new_request_id();
        let envelope = ok(
            "/api/chat",
            &id,
            json!({"reply": "hi"}),
            ResponseMeta::for_model("gpt-5-mini"),
        );

        let text = serde_json::to_string(&envelope).unwrap();
        let parsed: ResponseEnvelope = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.request_id, id);
        assert!(!parsed.request_id.is_empty());
        assert_eq!(parsed.model_used.as_deref(), Some("gpt-5-mini"));
        assert!(parsed.error.is_none());
    }

    #[test]
    fn test_error_envelope_carries_ui() {
        let envelope = fail(
            "/api/chat",
            "req-1",
            "rate_limit_exceeded",
            "Rate limit exceeded.",
            Some(UiMessage {
                title: "Too Many Messages".to_string(),
                message: "Slow down.".to_string(),
                code: "rate_limited_chat".to_string(),
            }),
            ResponseMeta::default(),
        );

        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["error"]["ui"]["code"], "rate_limited_chat");
        assert_eq!(value["result"], Value::Null);
    }

    #[test]
    fn test_ui_omitted_when_absent() {
        let envelope = fail(
            "/api/chat",
            "req-2",
            "bad_request",
            "Invalid JSON body",
            None,
            ResponseMeta::default(),
        );
        let value = serde_json::to_value(&envelope).unwrap();
        assert!(value["error"].get("ui").is_none());
    }
}
