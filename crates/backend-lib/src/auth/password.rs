// ============================
// passgate-lib/src/auth/password.rs
// ============================
//! Password hashing and verification.
use std::fmt;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use scrypt::Scrypt;
use thiserror::Error;

use super::policy::{PasswordPolicy, PolicyError};

/// Errors from hashing a password
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HashError {
    /// The plaintext failed the password policy
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// The hashing backend failed
    #[error("password hashing failed: {0}")]
    Internal(String),
}

/// A stored password hash in PHC string format. Never holds plaintext.
#[derive(Clone, PartialEq, Eq)]
pub struct HashedCredential(String);

impl HashedCredential {
    /// Wrap a PHC string loaded from storage. The value is not parsed here;
    /// a malformed hash simply never verifies.
    pub fn from_phc(phc: impl Into<String>) -> Self {
        Self(phc.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for HashedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HashedCredential(<redacted>)")
    }
}

/// Turns policy-approved passwords into salted Argon2id hashes and checks
/// candidates against stored hashes.
///
/// Verification also accepts scrypt PHC strings so credentials created by
/// older deployments keep working. New hashes are always Argon2id with the
/// library's default cost parameters.
#[derive(Clone, Default)]
pub struct CredentialHasher {
    policy: PasswordPolicy,
    argon2: Argon2<'static>,
}

impl CredentialHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `password` against the policy, then hash it with a fresh salt.
    pub fn hash(&self, password: &str) -> Result<HashedCredential, HashError> {
        self.policy.validate(password)?;

        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                tracing::error!(error = %e, "password hashing failed");
                HashError::Internal(e.to_string())
            })?
            .to_string();

        Ok(HashedCredential(hash))
    }

    /// Verify a candidate password against a stored hash.
    /// Returns false for a mismatch and for a stored value that does not parse.
    pub fn verify(&self, stored: &HashedCredential, candidate: &str) -> bool {
        let parsed = match PasswordHash::new(stored.as_str()) {
            Ok(h) => h,
            Err(_) => return false,
        };
        let verifiers: [&dyn PasswordVerifier; 2] = [&self.argon2, &Scrypt];
        parsed.verify_password(&verifiers, candidate.as_bytes()).is_ok()
    }
}

/// Hash a password with the default hasher
pub fn hash_password(plain: &str) -> Result<HashedCredential, HashError> {
    CredentialHasher::default().hash(plain)
}

/// Verify a password against a hash with the default hasher
pub fn verify_password(hash: &HashedCredential, plain: &str) -> bool {
    CredentialHasher::default().verify(hash, plain)
}
