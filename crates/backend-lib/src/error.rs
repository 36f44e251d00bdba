// crates/backend-lib/src/error.rs

//! Central error type.
use thiserror::Error;

use crate::auth::password::HashError;
use crate::auth::policy::PolicyError;
use crate::auth::token::TokenError;
use crate::validation::ValidationError;

/// Application error types with error codes and context
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Password rejected: {0}")]
    Policy(#[from] PolicyError),

    #[error("Token rejected: {0}")]
    Token(TokenError),

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email already registered")]
    EmailTaken,

    #[error("Username already taken")]
    UsernameTaken,

    #[error("Account not found")]
    AccountNotFound,

    #[error("Session not found")]
    SessionNotFound,

    #[error("Session has been revoked")]
    SessionRevoked,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP-equivalent status code a caller should surface
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Policy(_) | AppError::Validation(_) => 400,
            AppError::Token(TokenError::Internal(_)) => 500,
            AppError::Token(_) | AppError::InvalidCredentials | AppError::SessionRevoked => 401,
            AppError::AccountNotFound | AppError::SessionNotFound => 404,
            AppError::EmailTaken | AppError::UsernameTaken => 409,
            AppError::Config(_) | AppError::Internal(_) => 500,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidCredentials => "AUTH_001",
            AppError::Token(TokenError::Expired) => "AUTH_002",
            AppError::Token(TokenError::Internal(_)) => "INT_002",
            AppError::Token(_) => "AUTH_003",
            AppError::SessionRevoked => "AUTH_004",
            AppError::Policy(_) => "VAL_001",
            AppError::Validation(_) => "VAL_002",
            AppError::EmailTaken => "ACC_001",
            AppError::UsernameTaken => "ACC_002",
            AppError::AccountNotFound => "NF_001",
            AppError::SessionNotFound => "NF_002",
            AppError::Config(_) => "CFG_001",
            AppError::Internal(_) => "INT_001",
        }
    }

    /// Get a sanitized message suitable for clients.
    /// Policy and validation messages are meant for the user and pass through.
    pub fn sanitized_message(&self) -> String {
        match self {
            AppError::Policy(e) => e.to_string(),
            AppError::Validation(e) => e.to_string(),
            AppError::InvalidCredentials => "Invalid credentials".to_string(),
            AppError::Token(TokenError::Expired) => "Session expired, please log in again".to_string(),
            AppError::Token(TokenError::Internal(_)) => {
                "An internal server error occurred".to_string()
            },
            AppError::Token(_) => "Invalid token".to_string(),
            AppError::SessionRevoked => "Session expired, please log in again".to_string(),
            AppError::EmailTaken => "Email already registered".to_string(),
            AppError::UsernameTaken => "Username already taken".to_string(),
            AppError::AccountNotFound => "User not found".to_string(),
            AppError::SessionNotFound => "Session not found".to_string(),
            AppError::Config(_) | AppError::Internal(_) => {
                "An internal server error occurred".to_string()
            },
        }
    }

    /// Whether this is an unexpected failure rather than a rejected request
    pub fn is_internal(&self) -> bool {
        self.status_code() >= 500
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        AppError::Token(err)
    }
}

impl From<HashError> for AppError {
    fn from(err: HashError) -> Self {
        match err {
            HashError::Policy(e) => AppError::Policy(e),
            HashError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<figment::Error> for AppError {
    fn from(err: figment::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("background task failed: {err}"))
    }
}
