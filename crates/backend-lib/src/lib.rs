// ============================
// passgate-lib/src/lib.rs
// ============================
//! Credential and token lifecycle for `passgate`.
//!
//! Password policy, password hashing and signed access/refresh tokens, plus
//! the account service that registers users, logs them in and manages
//! their sessions.

pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;
pub mod storage;
pub mod validation;

use std::sync::Arc;

use crate::auth::session::SESSION_CLEANUP_INTERVAL;
use crate::auth::{AuthService, DefaultAuth, SessionRegistry, TokenIssuer, TokenKeys, TokenValidator};
use crate::config::Settings;
use crate::error::AppError;
use crate::storage::{AccountStore, MemoryAccountStore};

pub use passgate_common as common;

/// Application state shared across all callers
#[derive(Clone)]
pub struct AppState {
    /// Account and session operations
    pub auth: Arc<dyn AuthService>,
    /// Live sessions, shared with `auth`
    pub sessions: SessionRegistry,
    /// Token issuer for callers that mint tokens directly
    pub issuer: TokenIssuer,
    /// Token validator for request authentication
    pub validator: TokenValidator,
    /// Settings the state was built from
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Create a new application state over the given account store.
    ///
    /// Inside a Tokio runtime this also starts the periodic sweep of expired
    /// sessions.
    pub fn new(store: Arc<dyn AccountStore>, settings: Settings) -> Result<Self, AppError> {
        settings.validate()?;

        let keys = Arc::new(TokenKeys::from_settings(&settings.tokens));
        let auth = DefaultAuth::new(store, keys);
        let sessions = auth.sessions().clone();
        let issuer = auth.issuer().clone();
        let validator = auth.validator().clone();

        if tokio::runtime::Handle::try_current().is_ok() {
            sessions.spawn_cleanup(SESSION_CLEANUP_INTERVAL);
        }

        Ok(Self {
            auth: Arc::new(auth),
            sessions,
            issuer,
            validator,
            settings: Arc::new(settings),
        })
    }

    /// Create a new application state backed by an in-memory store
    pub fn in_memory(settings: Settings) -> Result<Self, AppError> {
        Self::new(Arc::new(MemoryAccountStore::new()), settings)
    }
}
