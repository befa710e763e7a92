//! User-facing messages for pipeline denials and errors.

use crate::http::response::UiMessage;

/// Codes with a fixed user-facing presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiCode {
    BadRequest,
    MethodNotAllowed,
    PayloadTooLarge,
    RateLimitedChat,
    RateLimitedAction,
    AiUnavailable,
    RegenCoaching,
    ServerError,
}

impl UiCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            UiCode::BadRequest => "bad_request",
            UiCode::MethodNotAllowed => "method_not_allowed",
            UiCode::PayloadTooLarge => "payload_too_large",
            UiCode::RateLimitedChat => "rate_limited_chat",
            UiCode::RateLimitedAction => "rate_limited_action",
            UiCode::AiUnavailable => "ai_unavailable",
            UiCode::RegenCoaching => "regen_coaching",
            UiCode::ServerError => "server_error",
        }
    }
}

/// Get the user-facing message for a given code.
pub fn ui_message(code: UiCode) -> UiMessage {
    let (title, message) = match code {
        UiCode::BadRequest => (
            "Invalid Request",
            "Please check your request and try again.",
        ),
        UiCode::MethodNotAllowed => (
            "Method Not Allowed",
            "This endpoint only accepts POST requests.",
        ),
        UiCode::PayloadTooLarge => (
            "Request Too Large",
            "Your request is too large. Please reduce the size and try again.",
        ),
        UiCode::RateLimitedChat => (
            "Too Many Messages",
            "You're sending messages too quickly. Please slow down and try again in a moment.",
        ),
        UiCode::RateLimitedAction => (
            "Rate Limit Exceeded",
            "You've reached your limit for this action. Please try again later.",
        ),
        UiCode::AiUnavailable => (
            "Service Unavailable",
            "AI features are temporarily unavailable. Please try again later.",
        ),
        UiCode::RegenCoaching => (
            "Too Many Changes",
            "We've made a lot of changes already. Constantly switching programs won't help your \
             progress — consistency is how results happen. Let's commit to this plan for a bit \
             and reassess soon.",
        ),
        UiCode::ServerError => (
            "Something Went Wrong",
            "An unexpected error occurred. Please try again later.",
        ),
    };

    UiMessage {
        title: title.to_string(),
        message: message.to_string(),
        code: code.as_str().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_code_has_a_message() {
        let codes = [
            UiCode::BadRequest,
            UiCode::MethodNotAllowed,
            UiCode::PayloadTooLarge,
            UiCode::RateLimitedChat,
            UiCode::RateLimitedAction,
            UiCode::AiUnavailable,
            UiCode::RegenCoaching,
            UiCode::ServerError,
        ];
        for code in codes {
            let msg = ui_message(code);
            assert!(!msg.title.is_empty());
            assert!(!msg.message.is_empty());
            assert_eq!(msg.code, code.as_str());
        }
    }
}
