//! Error types for litkit-gate: Railway Programming
//!
//! All operations return `Result<T, GateError>`.
//! No panics, no unwraps in production code paths.

use std::fmt;

use thiserror::Error;

/// External collaborator the gate depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collaborator {
    Identity,
    Billing,
}

impl Collaborator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Identity => "identity provider",
            Self::Billing => "billing provider",
        }
    }

    /// Setup text shown in place of a login form / upsell when unconfigured
    pub fn setup_instructions(&self) -> &'static str {
        match self {
            Self::Identity => {
                "Supabase is not configured.\n\
                 1. Sign up at https://supabase.com and create a project\n\
                 2. Go to Project Settings > API\n\
                 3. Set SUPABASE_URL and SUPABASE_KEY in your .env file"
            }
            Self::Billing => {
                "Stripe is not configured.\n\
                 1. Create an account at https://stripe.com\n\
                 2. Copy your test secret key from Developers > API keys\n\
                 3. Set STRIPE_API_KEY_TEST (and STRIPE_PAYMENT_MODE=test) in your .env file\n\
                 4. Create a product and set STRIPE_PRICE_ID to its price id"
            }
        }
    }
}

impl fmt::Display for Collaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse error classification used by callers to pick the fallback UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotConfigured,
    Auth,
    Billing,
    Validation,
    Internal,
}

/// Unified error type for all gate operations
#[derive(Error, Debug)]
pub enum GateError {
    // ─── Configuration Errors ───

    #[error("Not configured: {0}")]
    NotConfigured(Collaborator),

    // ─── Auth Errors ───

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Provider not supported: {0}")]
    UnsupportedProvider(String),

    // ─── Billing Errors ───

    #[error("Billing lookup failed: {0}")]
    Billing(String),

    #[error("Checkout failed: {0}")]
    Checkout(String),

    // ─── Validation Errors ───

    #[error("Validation error: {0}")]
    Validation(String),

    // ─── Infrastructure Errors ───

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotConfigured(_) => ErrorKind::NotConfigured,
            Self::AuthenticationFailed(_) | Self::InvalidCredentials | Self::UnsupportedProvider(_) => {
                ErrorKind::Auth
            }
            Self::Billing(_) | Self::Checkout(_) => ErrorKind::Billing,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Serialization(_) | Self::Config(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn is_not_configured(&self) -> bool {
        self.kind() == ErrorKind::NotConfigured
    }

    /// Text safe to show to end users
    pub fn user_message(&self) -> String {
        match self {
            Self::NotConfigured(c) => format!("The {c} is not configured"),
            Self::AuthenticationFailed(msg) => format!("Sign in failed: {msg}"),
            Self::InvalidCredentials => "Invalid email or password".to_string(),
            Self::UnsupportedProvider(p) => format!("Provider {p} not supported"),
            Self::Billing(msg) => format!("Could not check your subscription: {msg}"),
            Self::Checkout(msg) => format!("Error creating checkout session: {msg}"),
            Self::Validation(msg) => msg.clone(),
            Self::Serialization(_) | Self::Config(_) | Self::Internal(_) => {
                "An unexpected error occurred. Please try again later.".to_string()
            }
        }
    }
}

impl From<serde_json::Error> for GateError {
    fn from(err: serde_json::Error) -> Self {
        GateError::Serialization(err.to_string())
    }
}

impl From<url::ParseError> for GateError {
    fn from(err: url::ParseError) -> Self {
        GateError::Config(format!("URL parse error: {err}"))
    }
}

/// Result type alias for gate operations
pub type Result<T> = std::result::Result<T, GateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_are_distinct() {
        assert_eq!(
            GateError::NotConfigured(Collaborator::Identity).kind(),
            ErrorKind::NotConfigured
        );
        assert_eq!(GateError::InvalidCredentials.kind(), ErrorKind::Auth);
        assert_eq!(GateError::Billing("timeout".into()).kind(), ErrorKind::Billing);
        assert_eq!(GateError::Validation("empty".into()).kind(), ErrorKind::Validation);
        assert_eq!(GateError::Internal("boom".into()).kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let err = GateError::Serialization("expected value at line 1".into());
        assert!(!err.user_message().contains("line 1"));
        let err = GateError::Validation("Passwords do not match".into());
        assert_eq!(err.user_message(), "Passwords do not match");
    }

    #[test]
    fn test_url_error_is_config() {
        let err: GateError = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, GateError::Config(_)));
    }
}
