// ================
// common/src/lib.rs
// ================
//! Common types shared between the `passgate` core and its callers.
//! Requests carry user input into the account service, responses carry
//! issued tokens and account/session views back out.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier bound into every token.
///
/// The core never interprets the value; the account service uses the
/// account UUID rendered as a string.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Subject(String);

impl Subject {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Uuid> for Subject {
    fn from(id: Uuid) -> Self {
        Self(id.hyphenated().to_string())
    }
}

impl From<&str> for Subject {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Subject {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Independent signing context of a token.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TokenDomain {
    /// Short-lived token presented on every protected request
    Access,
    /// Long-lived token used only to mint new access tokens
    Refresh,
}

impl TokenDomain {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenDomain::Access => "access",
            TokenDomain::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no token domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTokenDomainError(String);

impl fmt::Display for ParseTokenDomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown token domain '{}', expected 'access' or 'refresh'", self.0)
    }
}

impl std::error::Error for ParseTokenDomainError {}

impl FromStr for TokenDomain {
    type Err = ParseTokenDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "access" => Ok(TokenDomain::Access),
            "refresh" => Ok(TokenDomain::Refresh),
            _ => Err(ParseTokenDomainError(s.to_string())),
        }
    }
}

/// Registration request
/// # Fields
/// * `email` - Account email, unique across all accounts
/// * `username` - Display/login name, unique across all accounts
/// * `password` - Plaintext password, checked against the password policy
#[derive(Serialize, Deserialize, Clone)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Login request
/// # Fields
/// * `identifier` - Email (anything containing `@`) or username
/// * `password` - Plaintext password
/// * `ip_address` - Client address, recorded on the session
/// * `user_agent` - Client user agent, recorded on the session
#[derive(Serialize, Deserialize, Clone)]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("identifier", &self.identifier)
            .field("password", &"<redacted>")
            .field("ip_address", &self.ip_address)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Password change request
#[derive(Serialize, Deserialize, Clone)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

impl fmt::Debug for ChangePasswordRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ChangePasswordRequest { <redacted> }")
    }
}

/// Username change request
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ChangeUsernameRequest {
    pub new_username: String,
}

/// Tokens handed to the caller after login or refresh.
/// How they are transported (cookie, header) is up to the caller.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub access_expires_in: u64,
    /// Refresh token lifetime in seconds
    pub refresh_expires_in: u64,
}

/// A live login session as shown to its owner
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub id: Uuid,
    pub subject: Subject,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Public view of an account. Never carries the credential.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AccountView {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}
