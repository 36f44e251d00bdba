// =========================
// tests/unit/error_tests.rs
// =========================
//! Error codes and client-facing messages
use passgate_lib::auth::{PolicyError, TokenError};
use passgate_lib::error::AppError;
use passgate_lib::validation::ValidationError;

#[test]
fn test_status_codes() {
    assert_eq!(AppError::from(PolicyError::TooShort).status_code(), 400);
    assert_eq!(AppError::from(ValidationError::InvalidEmail).status_code(), 400);
    assert_eq!(AppError::InvalidCredentials.status_code(), 401);
    assert_eq!(AppError::from(TokenError::Expired).status_code(), 401);
    assert_eq!(AppError::from(TokenError::BadSignature).status_code(), 401);
    assert_eq!(AppError::SessionRevoked.status_code(), 401);
    assert_eq!(AppError::AccountNotFound.status_code(), 404);
    assert_eq!(AppError::EmailTaken.status_code(), 409);
    assert_eq!(AppError::Internal("boom".to_string()).status_code(), 500);
    assert_eq!(
        AppError::from(TokenError::Internal("encode".to_string())).status_code(),
        500
    );
}

#[test]
fn test_error_codes() {
    assert_eq!(AppError::InvalidCredentials.error_code(), "AUTH_001");
    assert_eq!(AppError::from(TokenError::Expired).error_code(), "AUTH_002");
    assert_eq!(AppError::from(TokenError::Malformed).error_code(), "AUTH_003");
    assert_eq!(AppError::SessionRevoked.error_code(), "AUTH_004");
    assert_eq!(AppError::from(PolicyError::MissingDigit).error_code(), "VAL_001");
    assert_eq!(AppError::UsernameTaken.error_code(), "ACC_002");
    assert_eq!(AppError::SessionNotFound.error_code(), "NF_002");
}

#[test]
fn test_token_failures_share_a_message() {
    let malformed = AppError::from(TokenError::Malformed).sanitized_message();
    let wrong_alg = AppError::from(TokenError::WrongAlgorithm).sanitized_message();
    let bad_sig = AppError::from(TokenError::BadSignature).sanitized_message();

    assert_eq!(malformed, "Invalid token");
    assert_eq!(malformed, wrong_alg);
    assert_eq!(malformed, bad_sig);
}

#[test]
fn test_internal_details_are_hidden() {
    let err = AppError::Internal("argon2 params rejected".to_string());
    assert!(err.is_internal());
    assert!(!err.sanitized_message().contains("argon2"));

    let err = AppError::from(PolicyError::MissingSpecial);
    assert!(!err.is_internal());
    assert_eq!(err.sanitized_message(), PolicyError::MissingSpecial.to_string());
}
