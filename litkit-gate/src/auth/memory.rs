//! In-process identity provider with Argon2 password hashes
//!
//! Useful for self-hosted apps without Supabase and for tests.
//!
//! # Usage
//!
//! ```rust,no_run
//! use litkit_gate::auth::{IdentityProvider, MemoryIdentity};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let identity = MemoryIdentity::new();
//!     identity.register("alice@example.com", "SecureP@ss1", Some("Alice"))?;
//!
//!     let user = identity.verify_credentials("alice@example.com", "SecureP@ss1").await?;
//!     assert_eq!(user.display_name, "Alice");
//!     Ok(())
//! }
//! ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{GateError, Result};

use super::provider::IdentityProvider;
use super::types::UserRecord;

pub const MIN_PASSWORD_LEN: usize = 8;

struct StoredUser {
    record: UserRecord,
    password_hash: String,
}

#[derive(Default)]
pub struct MemoryIdentity {
    /// Keyed by lowercased email
    users: DashMap<String, StoredUser>,
    reset_requests: DashMap<String, DateTime<Utc>>,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user directly
    pub fn register(&self, email: &str, password: &str, display_name: Option<&str>) -> Result<UserRecord> {
        validate_email(email)?;
        if password.len() < MIN_PASSWORD_LEN {
            return Err(GateError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| GateError::Internal(e.to_string()))?
            .to_string();

        let mut record = UserRecord::new(Uuid::new_v4().to_string(), email.trim());
        if let Some(name) = display_name.map(str::trim).filter(|n| !n.is_empty()) {
            record = record
                .with_display_name(name)
                .with_metadata("name", json!(name));
        }

        match self.users.entry(normalize(email)) {
            Entry::Occupied(_) => Err(GateError::AuthenticationFailed(format!(
                "User already registered: {}",
                email.trim()
            ))),
            Entry::Vacant(slot) => {
                slot.insert(StoredUser {
                    record: record.clone(),
                    password_hash,
                });
                info!(user_id = %record.id, "User registered");
                Ok(record)
            }
        }
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// When a reset was last requested for `email`, if ever
    pub fn reset_requested_at(&self, email: &str) -> Option<DateTime<Utc>> {
        self.reset_requests.get(&normalize(email)).map(|t| *t)
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn verify_credentials(&self, email: &str, password: &str) -> Result<UserRecord> {
        let stored = self
            .users
            .get(&normalize(email))
            .ok_or(GateError::InvalidCredentials)?;

        let parsed_hash = PasswordHash::new(&stored.password_hash)
            .map_err(|e| GateError::Internal(e.to_string()))?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| GateError::InvalidCredentials)?;

        // Lookup is case-insensitive; the record carries the address as submitted
        let mut record = stored.record.clone();
        record.email = email.trim().to_string();
        Ok(record)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<UserRecord> {
        self.register(email, password, None)
    }

    async fn send_password_reset(&self, email: &str) -> Result<()> {
        // Unknown addresses succeed too, so callers cannot probe for accounts
        if self.users.contains_key(&normalize(email)) {
            self.reset_requests.insert(normalize(email), Utc::now());
        } else {
            debug!("Password reset for unknown address ignored");
        }
        Ok(())
    }
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_email(email: &str) -> Result<()> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(GateError::Validation("Invalid email address".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_and_verify() {
        let identity = MemoryIdentity::new();
        let user = identity
            .register("Alice@Example.com", "StrongP@ss123", Some("Alice"))
            .unwrap();
        assert_eq!(user.display_name, "Alice");

        let verified = identity
            .verify_credentials("alice@example.com", "StrongP@ss123")
            .await
            .unwrap();
        assert_eq!(verified.id, user.id);
        assert_eq!(verified.email, "alice@example.com");
    }

    #[tokio::test]
    async fn test_verified_email_matches_submitted_address() {
        let identity = MemoryIdentity::new();
        identity.register("erin@example.com", "StrongP@ss123", None).unwrap();

        let verified = identity
            .verify_credentials("  ERIN@example.com ", "StrongP@ss123")
            .await
            .unwrap();
        assert_eq!(verified.email, "ERIN@example.com");
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user() {
        let identity = MemoryIdentity::new();
        identity.register("bob@example.com", "SecureP@ss99", None).unwrap();

        let err = identity
            .verify_credentials("bob@example.com", "wrong-password")
            .await
            .unwrap_err();
        assert!(matches!(err, GateError::InvalidCredentials));

        let err = identity
            .verify_credentials("nobody@example.com", "SecureP@ss99")
            .await
            .unwrap_err();
        assert!(matches!(err, GateError::InvalidCredentials));
    }

    #[test]
    fn test_registration_rules() {
        let identity = MemoryIdentity::new();
        assert!(matches!(
            identity.register("not-an-email", "StrongP@ss123", None),
            Err(GateError::Validation(_))
        ));
        assert!(matches!(
            identity.register("carol@example.com", "short", None),
            Err(GateError::Validation(_))
        ));

        identity.register("carol@example.com", "StrongP@ss123", None).unwrap();
        assert!(matches!(
            identity.register("CAROL@example.com", "StrongP@ss123", None),
            Err(GateError::AuthenticationFailed(_))
        ));
        assert_eq!(identity.user_count(), 1);
    }

    #[tokio::test]
    async fn test_password_reset_tracks_known_users_only() {
        let identity = MemoryIdentity::new();
        identity.register("dana@example.com", "StrongP@ss123", None).unwrap();

        identity.send_password_reset("dana@example.com").await.unwrap();
        identity.send_password_reset("ghost@example.com").await.unwrap();

        assert!(identity.reset_requested_at("dana@example.com").is_some());
        assert!(identity.reset_requested_at("ghost@example.com").is_none());
    }
}
