//! Caller identity resolution.
//!
//! Extracts a user id from a bearer credential or a fallback header. The
//! bearer token's payload is decoded without signature verification: the
//! resolved id is a correlation key, not an authentication assertion, and
//! nothing downstream may treat it as one.

use axum::http::HeaderMap;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use serde_json::{Map, Value};

/// Extract the raw bearer token from the Authorization header, if present.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get("authorization")?.to_str().ok()?;
    let mut parts = header.splitn(2, ' ');
    let scheme = parts.next()?;
    let token = parts.next()?.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

/// Decode the payload segment of a JWT as a generic key-value structure.
/// No signature verification is performed.
fn decode_jwt_payload(token: &str) -> Option<Map<String, Value>> {
    let mut segments = token.split('.');
    let _header = segments.next()?;
    let payload = segments.next()?;

    // base64url with padding restored
    let mut padded = payload.to_string();
    while padded.len() % 4 != 0 {
        padded.push('=');
    }

    let decoded = URL_SAFE.decode(padded.as_bytes()).ok()?;
    match serde_json::from_slice(&decoded).ok()? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Resolve a caller identity. Prefers the bearer token's `sub` claim; falls
/// back to the trimmed `x-user-id` header; returns `None` when neither
/// source yields a usable value.
pub fn resolve(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = bearer_token(headers) {
        if let Some(payload) = decode_jwt_payload(token) {
            if let Some(Value::String(sub)) = payload.get("sub") {
                if !sub.trim().is_empty() {
                    return Some(sub.clone());
                }
            }
        }
    }

    let fallback = headers.get("x-user-id")?.to_str().ok()?.trim();
    if fallback.is_empty() {
        None
    } else {
        Some(fallback.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    fn token_with_payload(payload: &str) -> String {
        let header = URL_SAFE_NO_PAD.encode(b"{\"alg\":\"none\"}");
        let body = URL_SAFE_NO_PAD.encode(payload.as_bytes());
        format!("{header}.{body}.sig")
    }

    fn headers(entries: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in entries {
            map.insert(
                axum::http::header::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn test_bearer_sub_preferred_over_header() {
        let token = token_with_payload("{\"sub\":\"user-from-token\"}");
        let headers = headers(&[
            ("authorization", &format!("Bearer {token}")),
            ("x-user-id", "user-from-header"),
        ]);

        assert_eq!(resolve(&headers).as_deref(), Some("user-from-token"));
    }

    #[test]
    fn test_falls_back_to_header_when_token_unusable() {
        let headers = headers(&[
            ("authorization", "Bearer not-a-jwt"),
            ("x-user-id", "  user-42  "),
        ]);

        assert_eq!(resolve(&headers).as_deref(), Some("user-42"));
    }

    #[test]
    fn test_empty_sub_is_not_an_identity() {
        let token = token_with_payload("{\"sub\":\"   \"}");
        let headers = headers(&[("authorization", &format!("Bearer {token}"))]);

        assert_eq!(resolve(&headers), None);
    }

    #[test]
    fn test_unpadded_payload_decodes() {
        // "{\"sub\":\"u1\"}" encodes to a length that needs padding
        let token = token_with_payload("{\"sub\":\"u1\"}");
        let headers = headers(&[("authorization", &format!("Bearer {token}"))]);

        assert_eq!(resolve(&headers).as_deref(), Some("u1"));
    }

    #[test]
    fn test_no_sources_yields_none() {
        assert_eq!(resolve(&HeaderMap::new()), None);
    }

    #[test]
    fn test_scheme_is_case_insensitive() {
        let token = token_with_payload("{\"sub\":\"u2\"}");
        let headers = headers(&[("authorization", &format!("bearer {token}"))]);

        assert_eq!(resolve(&headers).as_deref(), Some("u2"));
    }
}
