//! Shared plumbing for the collaborator HTTP clients

use std::time::Duration;

use serde_json::Value;
use url::Url;

use crate::error::{GateError, Result};

pub(crate) fn client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| GateError::Config(format!("HTTP client: {e}")))
}

/// Parse a base URL so that `join` appends rather than replaces
pub(crate) fn base_url(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    if raw.ends_with('/') {
        Ok(Url::parse(raw)?)
    } else {
        Ok(Url::parse(&format!("{raw}/"))?)
    }
}

/// Pull a human-readable message out of a provider error body.
///
/// Handles GoTrue (`error_description`, `msg`), PostgREST (`message`)
/// and Stripe (`{"error": {"message": ..}}`) shapes.
pub(crate) fn error_message(body: &Value) -> Option<String> {
    if let Some(nested) = body.get("error").and_then(|e| e.get("message")) {
        if let Some(msg) = nested.as_str().map(str::trim).filter(|s| !s.is_empty()) {
            return Some(msg.to_string());
        }
    }
    ["error_description", "msg", "message", "error"]
        .iter()
        .filter_map(|k| body.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_message_shapes() {
        assert_eq!(
            error_message(&json!({"error": "invalid_grant", "error_description": "Invalid login credentials"})),
            Some("Invalid login credentials".into())
        );
        assert_eq!(
            error_message(&json!({"error": {"type": "invalid_request_error", "message": "No such price"}})),
            Some("No such price".into())
        );
        assert_eq!(error_message(&json!({"code": 42})), None);
    }

    #[test]
    fn test_base_url_keeps_path() {
        let base = base_url("https://proxy.example.com/supabase").unwrap();
        assert_eq!(
            base.join("auth/v1/token").unwrap().as_str(),
            "https://proxy.example.com/supabase/auth/v1/token"
        );
    }
}
