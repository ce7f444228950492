//! Identity collaborator contract

use async_trait::async_trait;

use crate::error::{GateError, Result};

use super::types::{SocialProvider, UserRecord};

/// Verifies credentials and issues user records.
///
/// Implementations do not retry; transient failures surface as errors.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Whether credentials are present; checked before every call
    fn is_configured(&self) -> bool {
        true
    }

    async fn verify_credentials(&self, email: &str, password: &str) -> Result<UserRecord>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<UserRecord>;

    async fn send_password_reset(&self, email: &str) -> Result<()>;

    /// URL starting the OAuth flow for `provider`
    fn authorize_url(&self, provider: SocialProvider) -> Result<String> {
        Err(GateError::UnsupportedProvider(format!(
            "{provider} sign-in requires a hosted identity provider"
        )))
    }
}
