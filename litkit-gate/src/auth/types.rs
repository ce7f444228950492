//! Auth domain types: UserRecord, SocialProvider
//!
//! Serializable, cloneable, and cheap to pass around.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{GateError, Result};

/// User record: immutable snapshot issued by the identity provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub display_name: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl UserRecord {
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        let email = email.into();
        Self {
            id: id.into(),
            display_name: email.clone(),
            email,
            metadata: Map::new(),
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Build from a provider metadata blob, preferring `name` then `full_name`
    pub fn from_metadata(
        id: impl Into<String>,
        email: impl Into<String>,
        metadata: Map<String, Value>,
    ) -> Self {
        let email = email.into();
        let display_name = ["name", "full_name"]
            .iter()
            .filter_map(|k| metadata.get(*k).and_then(Value::as_str))
            .map(str::trim)
            .find(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| email.clone());

        Self {
            id: id.into(),
            email,
            display_name,
            metadata,
        }
    }
}

/// OAuth providers offered on the login screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocialProvider {
    Google,
    Github,
    Facebook,
    Twitter,
}

impl SocialProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Github => "github",
            Self::Facebook => "facebook",
            Self::Twitter => "twitter",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "github" => Ok(Self::Github),
            "facebook" => Ok(Self::Facebook),
            "twitter" => Ok(Self::Twitter),
            _ => Err(GateError::UnsupportedProvider(s.to_string())),
        }
    }
}

impl std::fmt::Display for SocialProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
