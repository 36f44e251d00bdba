// ============================
// crates/backend-lib/src/validation/mod.rs
// ============================
//! Account identifier validation.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321 SMTP limit

// Letters, digits, '_' and '.', 3-32 characters
static USERNAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_.]{3,32}$").expect("username regex is valid"));
static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email regex is valid")
});

/// Possible validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("username must be 3-32 characters and only contain letters, numbers, underscores, or dots")]
    InvalidUsername,

    #[error("invalid email format")]
    InvalidEmail,
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validate a username
pub fn validate_username(username: &str) -> ValidationResult<&str> {
    if !USERNAME_REGEX.is_match(username) {
        return Err(ValidationError::InvalidUsername);
    }
    Ok(username)
}

/// Validate an email address
pub fn validate_email(email: &str) -> ValidationResult<&str> {
    if email.is_empty() || email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::InvalidEmail);
    }
    if !EMAIL_REGEX.is_match(email) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(email)
}

/// Whether a login identifier names an email rather than a username
pub fn is_email_identifier(identifier: &str) -> bool {
    identifier.contains('@')
}
