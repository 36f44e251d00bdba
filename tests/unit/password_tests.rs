// ============================
// tests/unit/password_tests.rs
// ============================
//! Password policy and hashing through the public API
use passgate_lib::auth::{
    hash_password, validate_password, verify_password, CredentialHasher, HashError,
    HashedCredential, PolicyError,
};

#[test]
fn test_hash_and_verify() {
    let hash = hash_password("Abcdef1!").unwrap();

    assert!(hash.as_str().starts_with("$argon2id$"));
    assert!(verify_password(&hash, "Abcdef1!"));
    assert!(!verify_password(&hash, "Abcdef1?"));
}

#[test]
fn test_same_password_hashes_differently() {
    let hasher = CredentialHasher::new();
    let first = hasher.hash("Str0ng.Password").unwrap();
    let second = hasher.hash("Str0ng.Password").unwrap();

    assert_ne!(first, second);
    assert!(hasher.verify(&first, "Str0ng.Password"));
    assert!(hasher.verify(&second, "Str0ng.Password"));
}

#[test]
fn test_policy_runs_before_hashing() {
    assert_eq!(
        hash_password("abc").unwrap_err(),
        HashError::Policy(PolicyError::TooShort)
    );
    assert_eq!(
        hash_password("abcdefg1!").unwrap_err(),
        HashError::Policy(PolicyError::MissingUppercase)
    );
}

#[test]
fn test_policy_rules() {
    assert!(validate_password("Abcdef1!").is_ok());
    assert!(validate_password("Zz9&zzzz").is_ok());

    assert_eq!(validate_password("Ab1!"), Err(PolicyError::TooShort));
    assert_eq!(
        validate_password(&format!("Ab1!{}", "x".repeat(61))),
        Err(PolicyError::TooLong)
    );
    assert_eq!(validate_password("Abcdef1! "), Err(PolicyError::InvalidCharacter));
    assert_eq!(validate_password("ABCDEF1!"), Err(PolicyError::MissingLowercase));
    assert_eq!(validate_password("Abcdefg!"), Err(PolicyError::MissingDigit));
    assert_eq!(validate_password("Abcdefg1"), Err(PolicyError::MissingSpecial));
}

#[test]
fn test_policy_length_bounds() {
    let at_min = "Abcde1!x";
    let at_max = format!("Abc1!{}", "x".repeat(59));
    assert_eq!(at_min.len(), 8);
    assert_eq!(at_max.len(), 64);

    assert!(validate_password(at_min).is_ok());
    assert!(validate_password(&at_max).is_ok());
}

#[test]
fn test_unparseable_hash_never_verifies() {
    for stored in ["", "plaintext", "$argon2id$broken", "$2a$10$abcdefghijklmnopqrstuv"] {
        let stored = HashedCredential::from_phc(stored);
        assert!(!verify_password(&stored, "Abcdef1!"));
    }
}
