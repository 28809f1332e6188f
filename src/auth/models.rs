//! Authentication Models
//! Mission: Define identity claims, roles and the stored user record

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// User roles for RBAC. A user without a `role` field holds no role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UserRole {
    #[serde(rename = "admin")]
    Admin, // Dashboard + destructive operations
    #[serde(rename = "moderator")]
    Moderator, // Content moderation
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Moderator => "moderator",
        }
    }

    /// Exact match only: role values are compared case-sensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(UserRole::Admin),
            "moderator" => Some(UserRole::Moderator),
            _ => None,
        }
    }
}

/// JWT Claims payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub email: String,
    pub iat: usize, // issued-at timestamp
    pub exp: usize, // expiration timestamp
}

/// Token request body (`POST /jwt`). Extra fields sent by the client are ignored.
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub email: String,
}

/// Token response
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Stored user document as the gates see it.
///
/// Only `email` and `role` are structural; everything else the client sent
/// at sign-up (name, photo, provider payload) rides along in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserRecord {
    pub email: String,
    #[serde(
        default,
        deserialize_with = "lenient_role",
        skip_serializing_if = "Option::is_none"
    )]
    pub role: Option<UserRole>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserRecord {
    pub fn has_role(&self, role: UserRole) -> bool {
        self.role == Some(role)
    }
}

// Unknown role strings (or non-strings) mean "no role" rather than a decode failure.
fn lenient_role<'de, D>(deserializer: D) -> Result<Option<UserRole>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(Value::as_str).and_then(UserRole::parse))
}
