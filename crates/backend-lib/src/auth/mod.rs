// ============================
// passgate-lib/src/auth/mod.rs
// ============================
//! Authentication module.
//!
//! The core (`policy`, `password`, `token`) is stateless and safe to share
//! across tasks. `session` and the `AuthService` implementation build the
//! account flows on top of it.

pub mod clock;
pub mod password;
pub mod policy;
pub mod secret_generator;
pub mod session;
pub mod token;
mod service;
mod service_impl;

pub use clock::{Clock, ManualClock, SystemClock};
pub use password::{hash_password, verify_password, CredentialHasher, HashError, HashedCredential};
pub use policy::{validate_password, PasswordPolicy, PolicyError, MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};
pub use secret_generator::generate_secret;
pub use service::AuthService;
pub use service_impl::DefaultAuth;
pub use session::{SessionRecord, SessionRegistry};
pub use token::{
    IssuedToken, Secret, SigningAlgorithm, TokenClaims, TokenError, TokenIssuer, TokenKeys,
    TokenValidator,
};
