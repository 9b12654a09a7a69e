use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Application error codes returned to clients as `{ "errorCode": ... }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    AccountAlreadyExists,
    InvalidLinkRequest,
    LinkRequestExpired,
    LinkVerificationFailed,
    PasswordBad,
    LegacyApiModeEnabled,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccountAlreadyExists => "ACCOUNT_ALREADY_EXISTS",
            Self::InvalidLinkRequest => "INVALID_LINK_REQUEST",
            Self::LinkRequestExpired => "LINK_REQUEST_EXPIRED",
            Self::LinkVerificationFailed => "LINK_VERIFICATION_FAILED",
            Self::PasswordBad => "PASSWORD_BAD",
            Self::LegacyApiModeEnabled => "LEGACY_API_MODE_ENABLED",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pending link between a legacy ModDB account and a local user.
///
/// `link_token` is public (the user posts it as a comment), `secret` never
/// leaves the requesting browser's cookie jar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountLinkRequest {
    pub username: String,
    pub email: String,
    pub link_token: String,
    pub secret: String,
    pub time_created_utc: DateTime<Utc>,
    pub time_verified_utc: Option<DateTime<Utc>>,
}

impl AccountLinkRequest {
    pub fn is_expired(&self, now: DateTime<Utc>, expiration_minutes: i64) -> bool {
        now - self.time_created_utc >= Duration::minutes(expiration_minutes)
    }

    pub fn is_verified(&self) -> bool {
        self.time_verified_utc.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: Option<String>,
    /// The user's id on the legacy ModDB.
    pub mod_db_user_id: Option<i64>,
    pub time_created_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub username: String,
    pub email: String,
    pub mod_db_user_id: Option<i64>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        UserProfile {
            username: user.username.clone(),
            email: user.email.clone(),
            mod_db_user_id: user.mod_db_user_id,
        }
    }
}
