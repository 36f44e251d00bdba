// ============================
// passgate-lib/src/auth/policy.rs
// ============================
//! Password strength policy.
use thiserror::Error;

/// Minimum password length, in characters
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length, in characters
pub const MAX_PASSWORD_LENGTH: usize = 64;

/// Special characters a password may contain, and must contain at least one of
pub const SPECIAL_CHARACTERS: &str = "@$!%*?&.";

/// Reasons a password is rejected. Only the first failing rule is reported.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyError {
    #[error("password must be at least {MIN_PASSWORD_LENGTH} characters long")]
    TooShort,

    #[error("password must not exceed {MAX_PASSWORD_LENGTH} characters")]
    TooLong,

    #[error("password contains invalid characters")]
    InvalidCharacter,

    #[error("password must contain at least 1 uppercase letter")]
    MissingUppercase,

    #[error("password must contain at least 1 lowercase letter")]
    MissingLowercase,

    #[error("password must contain at least 1 number")]
    MissingDigit,

    #[error("password must contain at least 1 special character ({SPECIAL_CHARACTERS})")]
    MissingSpecial,
}

fn is_special(c: char) -> bool {
    SPECIAL_CHARACTERS.contains(c)
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || is_special(c)
}

/// Fixed password policy.
///
/// Rules are checked in this order and the first failure wins:
/// length, allowed character set, uppercase, lowercase, digit, special.
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordPolicy;

impl PasswordPolicy {
    pub fn new() -> Self {
        Self
    }

    /// Check a password against every rule.
    pub fn validate(&self, password: &str) -> Result<(), PolicyError> {
        let length = password.chars().count();
        if length < MIN_PASSWORD_LENGTH {
            return Err(PolicyError::TooShort);
        }
        if length > MAX_PASSWORD_LENGTH {
            return Err(PolicyError::TooLong);
        }

        if !password.chars().all(is_allowed) {
            return Err(PolicyError::InvalidCharacter);
        }

        if !password.chars().any(|c| c.is_ascii_uppercase()) {
            return Err(PolicyError::MissingUppercase);
        }
        if !password.chars().any(|c| c.is_ascii_lowercase()) {
            return Err(PolicyError::MissingLowercase);
        }
        if !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(PolicyError::MissingDigit);
        }
        if !password.chars().any(is_special) {
            return Err(PolicyError::MissingSpecial);
        }

        Ok(())
    }
}

/// Validate a password with the default policy
pub fn validate_password(password: &str) -> Result<(), PolicyError> {
    PasswordPolicy.validate(password)
}
