//! Gate orchestration.
//!
//! # Responsibilities
//! - Execute the policy gates in a fixed total order, short-circuiting on
//!   the first denial
//! - Guarantee exactly one audit record and one response per request
//! - Measure latency from pipeline entry for every terminal outcome
//!
//! # Gate order
//! ```text
//! method allow-list
//!     → feature flags
//!     → payload-size check (declared content-length only)
//!     → rate limit (fail-open)
//!     → body parse
//!     → structural validation
//!     → identity requirement
//!     → regeneration quota (declared intent only, fail-open)
//!     → content safety
//!     → pass-through completion
//! ```
//!
//! # Design Decisions
//! - No reordering or parallel gate evaluation: later gates depend on state
//!   resolved by earlier ones
//! - The audit write happens last, after the terminal outcome is decided,
//!   and can never alter the HTTP outcome
//! - Model selection is resolved before body parse so parse-failure audits
//!   carry the selected model

pub mod validate;

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, Response, StatusCode};
use serde_json::json;

use crate::audit::{AuditRecord, AuditStatus};
use crate::config::RouteConfig;
use crate::context::ContextSummary;
use crate::http::messages::{ui_message, UiCode};
use crate::http::response::{self, ResponseEnvelope, ResponseMeta, UiMessage};
use crate::http::server::AppState;
use crate::identity;
use crate::llm::{ChatMessage, CompletionRequest};
use crate::models::{self, ModelSelection, TaskType};
use crate::observability::metrics;
use crate::ratelimit::RateLimitVerdict;
use crate::regen::RegenerationVerdict;
use crate::safety::{self, SafetyDecision};

/// Hard cap on buffered request bodies. The per-route limit is advisory
/// (declared content-length only); this bound protects the buffer itself.
const MAX_BUFFERED_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Terminal result of the gate chain for one request.
struct Outcome {
    http_status: StatusCode,
    envelope: ResponseEnvelope,
    audit_status: AuditStatus,
    error_code: Option<String>,
    error_message: Option<String>,
    model_used: Option<String>,
    is_regeneration: bool,
}

impl Outcome {
    fn denied(
        route: &RouteConfig,
        request_id: &str,
        status: StatusCode,
        audit_status: AuditStatus,
        code: &str,
        message: &str,
        ui: Option<UiMessage>,
        model_used: Option<&str>,
    ) -> Self {
        let meta = match model_used {
            Some(model) => ResponseMeta::for_model(model),
            None => ResponseMeta::default(),
        };
        Self {
            http_status: status,
            envelope: response::fail(&route.path, request_id, code, message, ui, meta),
            audit_status,
            error_code: Some(code.to_string()),
            error_message: Some(message.to_string()),
            model_used: model_used.map(str::to_string),
            is_regeneration: false,
        }
    }
}

/// Entry point for every governed route. Runs the gates, writes the audit
/// record, records metrics, and serializes the envelope.
pub async fn handle(
    state: AppState,
    route: Arc<RouteConfig>,
    request: Request<Body>,
) -> Response<Body> {
    // CORS preflight short-circuits before the pipeline; no audit.
    if request.method() == Method::OPTIONS {
        return response::preflight();
    }

    let started = Instant::now();
    let request_id = response::new_request_id();
    let user_id = identity::resolve(request.headers());

    let outcome = run_gates(&state, &route, &request_id, user_id.as_deref(), request).await;

    let latency_ms = started.elapsed().as_millis() as u64;
    state
        .audit
        .record(AuditRecord {
            request_id: request_id.clone(),
            route: route.path.clone(),
            user_id,
            environment: None,
            model_used: outcome.model_used.clone(),
            tokens_in: None,
            tokens_out: None,
            cost_estimate_usd: None,
            status: outcome.audit_status,
            http_status: outcome.http_status.as_u16(),
            latency_ms,
            error_code: outcome.error_code.clone(),
            error_message: outcome.error_message.clone(),
            is_regeneration: outcome.is_regeneration,
        })
        .await;

    metrics::record_request(&route.path, outcome.http_status.as_u16(), started);

    response::json_response(&outcome.envelope, outcome.http_status)
}

async fn run_gates(
    state: &AppState,
    route: &RouteConfig,
    request_id: &str,
    user_id: Option<&str>,
    request: Request<Body>,
) -> Outcome {
    let headers = request.headers().clone();

    // (1) Method allow-list.
    if request.method() != Method::POST {
        return Outcome::denied(
            route,
            request_id,
            StatusCode::METHOD_NOT_ALLOWED,
            AuditStatus::BadRequest,
            "method_not_allowed",
            "Only POST method allowed",
            Some(ui_message(UiCode::MethodNotAllowed)),
            None,
        );
    }

    // (2) Feature flags.
    if !state.config.features.ai_enabled {
        return Outcome::denied(
            route,
            request_id,
            StatusCode::SERVICE_UNAVAILABLE,
            AuditStatus::GuardrailBlock,
            "service_unavailable",
            "AI features are temporarily unavailable. Please try again later.",
            Some(ui_message(UiCode::AiUnavailable)),
            None,
        );
    }
    if route.task_type == TaskType::Chat && !state.config.features.chat_enabled {
        return Outcome::denied(
            route,
            request_id,
            StatusCode::SERVICE_UNAVAILABLE,
            AuditStatus::GuardrailBlock,
            "service_unavailable",
            "Chat is temporarily unavailable. Please try again later.",
            Some(ui_message(UiCode::AiUnavailable)),
            None,
        );
    }

    // (3) Payload-size check. The declared content-length is advisory; a
    // missing or non-numeric header is treated as not-too-large.
    if declared_length_exceeds(&headers, route.max_body_bytes) {
        return Outcome::denied(
            route,
            request_id,
            StatusCode::PAYLOAD_TOO_LARGE,
            AuditStatus::GuardrailBlock,
            "payload_too_large",
            "Request body exceeds size limit.",
            Some(ui_message(UiCode::PayloadTooLarge)),
            None,
        );
    }

    // (4) Rate limit. `Unavailable` means the store could not answer and
    // the request proceeds.
    match state.limiter.check(route, &headers).await {
        RateLimitVerdict::Denied { message } => {
            let ui_code = if route.task_type == TaskType::Chat {
                UiCode::RateLimitedChat
            } else {
                UiCode::RateLimitedAction
            };
            let mut outcome = Outcome::denied(
                route,
                request_id,
                StatusCode::TOO_MANY_REQUESTS,
                AuditStatus::RateLimited,
                ui_code.as_str(),
                &message,
                Some(ui_message(ui_code)),
                None,
            );
            outcome.error_code = Some("rate_limit_exceeded".to_string());
            outcome.error_message = Some("Rate limit exceeded".to_string());
            return outcome;
        }
        RateLimitVerdict::Allowed | RateLimitVerdict::Unavailable => {}
    }

    // Model selection is pure and resolved here so later audits carry it.
    let selection = models::select(&state.config.models, route);

    // (5) Body parse.
    let bytes = match axum::body::to_bytes(request.into_body(), MAX_BUFFERED_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return Outcome::denied(
                route,
                request_id,
                StatusCode::BAD_REQUEST,
                AuditStatus::BadRequest,
                "bad_request",
                "Unable to read request body",
                Some(ui_message(UiCode::BadRequest)),
                Some(&selection.model_used),
            );
        }
    };
    let body = match validate::parse_body(&bytes) {
        Some(body) => body,
        None => {
            return Outcome::denied(
                route,
                request_id,
                StatusCode::BAD_REQUEST,
                AuditStatus::BadRequest,
                "bad_request",
                "Invalid JSON body",
                Some(ui_message(UiCode::BadRequest)),
                Some(&selection.model_used),
            );
        }
    };

    // (6) Structural validation.
    if let Err(message) = validate::validate_body(route.task_type, &body) {
        return Outcome::denied(
            route,
            request_id,
            StatusCode::BAD_REQUEST,
            AuditStatus::BadRequest,
            "bad_request",
            message,
            Some(ui_message(UiCode::BadRequest)),
            Some(&selection.model_used),
        );
    }

    // (7) Identity requirement.
    if route.require_identity && user_id.is_none() {
        return Outcome::denied(
            route,
            request_id,
            StatusCode::BAD_REQUEST,
            AuditStatus::BadRequest,
            "bad_request",
            "Missing user identity",
            Some(ui_message(UiCode::BadRequest)),
            Some(&selection.model_used),
        );
    }

    // (8) Regeneration quota, only on declared intent.
    let is_regeneration =
        state.regen.is_regeneration_route(&route.path) && validate::declares_regeneration(&body);
    if is_regeneration {
        if let RegenerationVerdict::Denied { message, ui } =
            state.regen.check(user_id, true).await
        {
            // Coaching response: a 200 success envelope, not an error.
            let result = json!({
                "message": message,
                "regeneration_blocked": true,
                "ui": ui,
            });
            return Outcome {
                http_status: StatusCode::OK,
                envelope: response::ok(&route.path, request_id, result, ResponseMeta::default()),
                audit_status: AuditStatus::GuardrailBlock,
                error_code: Some("regeneration_limit_exceeded".to_string()),
                error_message: Some(message),
                model_used: None,
                is_regeneration: true,
            };
        }
    }

    // Context lookup (fail-soft).
    let context_summary = match user_id {
        Some(id) => {
            let bearer = identity::bearer_token(&headers);
            state.context.load_summary(id, bearer).await
        }
        None => ContextSummary::default(),
    };

    // (9) Content safety.
    if let SafetyDecision::Denied { code, reason, ui } =
        safety::evaluate(route.task_type, &body, &state.config.safety)
    {
        metrics::record_safety_block(code);
        let mut outcome = Outcome::denied(
            route,
            request_id,
            StatusCode::UNPROCESSABLE_ENTITY,
            AuditStatus::GuardrailBlock,
            code,
            reason,
            Some(ui),
            Some(&selection.model_used),
        );
        outcome.is_regeneration = is_regeneration;
        return outcome;
    }

    // Pass-through completion carrying the resolved model selection.
    let completion_request = build_completion_request(route.task_type, &body, &selection);
    let completion = match state.completions.complete(completion_request).await {
        Ok(completion) => completion,
        Err(err) => {
            tracing::error!(
                request_id = %request_id,
                route = %route.path,
                error = %err,
                "Completion call failed"
            );
            let mut outcome = Outcome::denied(
                route,
                request_id,
                StatusCode::INTERNAL_SERVER_ERROR,
                AuditStatus::Error,
                "internal_error",
                "An unexpected error occurred",
                Some(ui_message(UiCode::ServerError)),
                Some(&selection.model_used),
            );
            outcome.is_regeneration = is_regeneration;
            return outcome;
        }
    };

    let result = success_result(route, &selection, &context_summary, &completion.content);
    Outcome {
        http_status: StatusCode::OK,
        envelope: response::ok(
            &route.path,
            request_id,
            result,
            ResponseMeta::for_model(&selection.model_used),
        ),
        audit_status: AuditStatus::Ok,
        error_code: None,
        error_message: None,
        model_used: Some(selection.model_used),
        is_regeneration,
    }
}

fn declared_length_exceeds(headers: &HeaderMap, max_bytes: u64) -> bool {
    let Some(value) = headers.get(axum::http::header::CONTENT_LENGTH) else {
        return false;
    };
    let Ok(text) = value.to_str() else {
        return false;
    };
    match text.trim().parse::<u64>() {
        Ok(size) => size > max_bytes,
        Err(_) => false,
    }
}

fn build_completion_request(
    task: TaskType,
    body: &serde_json::Value,
    selection: &ModelSelection,
) -> CompletionRequest {
    let user_messages = match task {
        TaskType::Chat => body
            .get("messages")
            .and_then(serde_json::Value::as_array)
            .map(|messages| {
                messages
                    .iter()
                    .map(|m| ChatMessage {
                        role: m
                            .get("role")
                            .and_then(serde_json::Value::as_str)
                            .unwrap_or("user")
                            .to_string(),
                        content: m
                            .get("content")
                            .and_then(serde_json::Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    };

    CompletionRequest {
        system_prompt: None,
        context_messages: Vec::new(),
        user_messages,
        model: selection.model_used.clone(),
        max_output_tokens: selection.max_output_tokens,
    }
}

fn success_result(
    route: &RouteConfig,
    selection: &ModelSelection,
    context_summary: &ContextSummary,
    reply: &str,
) -> serde_json::Value {
    match route.task_type {
        TaskType::Chat => json!({
            "status": "stub",
            "message": "chat wired",
            "reply": reply,
        }),
        task => json!({
            "stub": true,
            "model_tier": route.tier.as_str(),
            "task_type": task.as_str(),
            "fallback_model": selection.fallback_model,
            "max_output_tokens": selection.max_output_tokens,
            "changes_made": false,
            "reason_for_change": "No changes applied in stub response.",
            "context_summary": context_summary,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_declared_length_is_advisory() {
        let mut headers = HeaderMap::new();
        assert!(!declared_length_exceeds(&headers, 100));

        headers.insert(
            axum::http::header::CONTENT_LENGTH,
            HeaderValue::from_static("abc"),
        );
        assert!(!declared_length_exceeds(&headers, 100));

        headers.insert(
            axum::http::header::CONTENT_LENGTH,
            HeaderValue::from_static("100"),
        );
        assert!(!declared_length_exceeds(&headers, 100));

        headers.insert(
            axum::http::header::CONTENT_LENGTH,
            HeaderValue::from_static("101"),
        );
        assert!(declared_length_exceeds(&headers, 100));
    }
}
