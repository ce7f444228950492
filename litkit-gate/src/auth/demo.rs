//! Demo-mode identity: accepts any non-empty credentials

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use crate::error::{GateError, Result};

use super::provider::IdentityProvider;
use super::types::UserRecord;

pub const DEMO_USER_ID: &str = "mock-user-id";
pub const DEMO_USER_NAME: &str = "Demo User";

/// Stand-in for a real identity backend while an app is being scaffolded
#[derive(Debug, Default, Clone)]
pub struct DemoIdentity;

impl DemoIdentity {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl IdentityProvider for DemoIdentity {
    fn name(&self) -> &'static str {
        "demo"
    }

    async fn verify_credentials(&self, email: &str, password: &str) -> Result<UserRecord> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(GateError::InvalidCredentials);
        }
        info!(provider = "demo", "Demo sign-in accepted");
        Ok(UserRecord::new(DEMO_USER_ID, email)
            .with_display_name(DEMO_USER_NAME)
            .with_metadata("name", json!(DEMO_USER_NAME)))
    }

    async fn sign_up(&self, email: &str, _password: &str) -> Result<UserRecord> {
        Ok(UserRecord::new(DEMO_USER_ID, email).with_display_name(DEMO_USER_NAME))
    }

    async fn send_password_reset(&self, _email: &str) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_any_credentials_work() {
        let user = DemoIdentity::new()
            .verify_credentials("someone@example.com", "whatever")
            .await
            .unwrap();
        assert_eq!(user.id, DEMO_USER_ID);
        assert_eq!(user.email, "someone@example.com");
        assert_eq!(user.display_name, DEMO_USER_NAME);
    }
}
