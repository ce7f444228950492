//! Supabase Auth (GoTrue) identity provider

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};
use url::Url;

use crate::config::{GateConfig, SupabaseSettings};
use crate::error::{Collaborator, GateError, Result};
use crate::http;

use super::provider::IdentityProvider;
use super::types::{SocialProvider, UserRecord};

pub struct SupabaseIdentity {
    http: reqwest::Client,
    base: Url,
    anon_key: String,
}

impl SupabaseIdentity {
    pub fn new(settings: &SupabaseSettings, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            http: http::client(timeout_secs)?,
            base: http::base_url(&settings.url)?,
            anon_key: settings.anon_key.clone(),
        })
    }

    pub fn from_config(config: &GateConfig) -> Result<Self> {
        let settings = config
            .supabase
            .as_ref()
            .ok_or(GateError::NotConfigured(Collaborator::Identity))?;
        Self::new(settings, config.request_timeout_secs)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path)?)
    }

    async fn post(&self, url: Url, body: Value) -> Result<Value> {
        let response = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GateError::AuthenticationFailed(format!("identity provider unreachable: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GateError::AuthenticationFailed(format!("reading identity response: {e}")))?;
        let payload = match parse_body(&text) {
            Ok(payload) => payload,
            Err(e) if status.is_success() => {
                return Err(GateError::AuthenticationFailed(format!(
                    "unreadable identity response: {e}"
                )))
            }
            // Gateways and CDNs answer outages with HTML; the status is enough
            Err(_) => Value::Null,
        };

        if status.is_success() {
            Ok(payload)
        } else {
            Err(rejection(status, &payload))
        }
    }
}

fn parse_body(text: &str) -> std::result::Result<Value, serde_json::Error> {
    if text.trim().is_empty() {
        Ok(Value::Null)
    } else {
        serde_json::from_str(text)
    }
}

#[async_trait]
impl IdentityProvider for SupabaseIdentity {
    fn name(&self) -> &'static str {
        "supabase"
    }

    fn is_configured(&self) -> bool {
        !self.anon_key.trim().is_empty()
    }

    async fn verify_credentials(&self, email: &str, password: &str) -> Result<UserRecord> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        let payload = self
            .post(url, json!({"email": email, "password": password}))
            .await?;
        debug!("Supabase password grant accepted");
        parse_user(payload.get("user").unwrap_or(&Value::Null))
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<UserRecord> {
        let url = self.endpoint("auth/v1/signup")?;
        let payload = self
            .post(url, json!({"email": email, "password": password}))
            .await?;
        // Returns a session wrapper when auto-confirm is on, the bare user otherwise
        parse_user(payload.get("user").unwrap_or(&payload))
    }

    async fn send_password_reset(&self, email: &str) -> Result<()> {
        let url = self.endpoint("auth/v1/recover")?;
        self.post(url, json!({"email": email})).await?;
        Ok(())
    }

    fn authorize_url(&self, provider: SocialProvider) -> Result<String> {
        let mut url = self.endpoint("auth/v1/authorize")?;
        url.query_pairs_mut().append_pair("provider", provider.as_str());
        Ok(url.to_string())
    }
}

fn rejection(status: StatusCode, payload: &Value) -> GateError {
    let message = http::error_message(payload).unwrap_or_else(|| format!("HTTP {status}"));
    let invalid_grant = payload.get("error").and_then(Value::as_str) == Some("invalid_grant")
        || payload.get("error_code").and_then(Value::as_str) == Some("invalid_credentials");

    if status == StatusCode::BAD_REQUEST && invalid_grant {
        GateError::InvalidCredentials
    } else {
        warn!(status = %status, "Supabase rejected request");
        GateError::AuthenticationFailed(message)
    }
}

fn parse_user(value: &Value) -> Result<UserRecord> {
    let id = value
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| GateError::AuthenticationFailed("identity response has no user id".into()))?;
    let email = value.get("email").and_then(Value::as_str).unwrap_or_default();
    let metadata = value
        .get("user_metadata")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_else(Map::new);

    Ok(UserRecord::from_metadata(id, email, metadata))
}
