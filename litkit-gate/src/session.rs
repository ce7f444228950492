//! Per-client session state
//!
//! A `Session` belongs to one logical client and is only ever mutated
//! through `&mut`, so no locking is involved. The authentication keys are
//! typed; anything else a page wants to remember goes into the keyed
//! value store.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::auth::UserRecord;
use crate::error::Result;

/// Session lifecycle: `Anonymous -> Authenticated -> Anonymous`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Anonymous,
    Authenticated,
}

#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    created_at: DateTime<Utc>,
    authenticated: Option<bool>,
    user: Option<UserRecord>,
    values: HashMap<String, Value>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            authenticated: None,
            user: None,
            values: HashMap::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Missing key reads as `false`
    pub fn is_authenticated(&self) -> bool {
        self.authenticated.unwrap_or(false) && self.user.is_some()
    }

    /// The signed-in user, only while authenticated
    pub fn current_user(&self) -> Option<&UserRecord> {
        if self.is_authenticated() {
            self.user.as_ref()
        } else {
            None
        }
    }

    pub fn phase(&self) -> SessionPhase {
        if self.is_authenticated() {
            SessionPhase::Authenticated
        } else {
            SessionPhase::Anonymous
        }
    }

    /// Record a verified user; overwrites any previous sign-in
    pub fn establish(&mut self, user: UserRecord) {
        self.user = Some(user);
        self.authenticated = Some(true);
    }

    /// Drop the authentication keys. Idempotent.
    pub fn clear_auth(&mut self) {
        self.authenticated = None;
        self.user = None;
    }

    /// Drop everything, as on expiry
    pub fn clear(&mut self) {
        self.clear_auth();
        self.values.clear();
    }

    pub fn insert<T: Serialize>(&mut self, key: impl Into<String>, value: &T) -> Result<()> {
        self.values.insert(key.into(), serde_json::to_value(value)?);
        Ok(())
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.values
            .get(key)
            .map(|v| serde_json::from_value(v.clone()))
            .transpose()
            .map_err(Into::into)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_anonymous() {
        let session = Session::new();
        assert!(!session.is_authenticated());
        assert!(session.current_user().is_none());
        assert_eq!(session.phase(), SessionPhase::Anonymous);
    }

    #[test]
    fn test_establish_and_clear() {
        let mut session = Session::new();
        session.establish(UserRecord::new("u1", "a@b.com"));
        assert_eq!(session.phase(), SessionPhase::Authenticated);
        assert_eq!(session.current_user().unwrap().email, "a@b.com");

        session.clear_auth();
        session.clear_auth();
        assert!(session.current_user().is_none());
        assert_eq!(session.phase(), SessionPhase::Anonymous);
    }

    #[test]
    fn test_values_survive_sign_out_but_not_clear() {
        let mut session = Session::new();
        session.insert("theme", &"dark").unwrap();
        session.establish(UserRecord::new("u1", "a@b.com"));

        session.clear_auth();
        assert_eq!(session.get::<String>("theme").unwrap().as_deref(), Some("dark"));

        session.clear();
        assert!(!session.contains_key("theme"));
    }

    #[test]
    fn test_typed_get_mismatch_is_error() {
        let mut session = Session::new();
        session.insert("count", &3u32).unwrap();
        assert_eq!(session.get::<u32>("count").unwrap(), Some(3));
        assert!(session.get::<Vec<String>>("count").is_err());
        assert_eq!(session.get::<u32>("missing").unwrap(), None);
    }
}
