// =============
// crates/backend-lib/src/auth/service.rs
// =============
//! The `AuthService` trait: account and session operations built on the
//! password and token core.
use async_trait::async_trait;
use passgate_common::{
    AccountView, ChangePasswordRequest, ChangeUsernameRequest, LoginRequest, RegisterRequest,
    SessionInfo, Subject, TokenPair,
};
use uuid::Uuid;

use crate::error::AppError;

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Create an account after validating identifiers and password
    async fn register(&self, req: RegisterRequest) -> Result<AccountView, AppError>;

    /// Check credentials and open a session
    async fn login(&self, req: LoginRequest) -> Result<TokenPair, AppError>;

    /// Mint a new access token from a live refresh token
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AppError>;

    /// Close the session named by a refresh token. Never fails on a bad token.
    async fn logout(&self, refresh_token: &str) -> Result<(), AppError>;

    /// Resolve an access token to its subject
    async fn authenticate(&self, access_token: &str) -> Result<Subject, AppError>;

    async fn profile(&self, subject: &Subject) -> Result<AccountView, AppError>;

    async fn change_password(
        &self,
        subject: &Subject,
        req: ChangePasswordRequest,
    ) -> Result<(), AppError>;

    async fn change_username(
        &self,
        subject: &Subject,
        req: ChangeUsernameRequest,
    ) -> Result<AccountView, AppError>;

    /// Soft delete the account and revoke its sessions
    async fn delete_account(&self, subject: &Subject) -> Result<(), AppError>;

    /// Undo a soft delete
    async fn restore_account(&self, subject: &Subject) -> Result<AccountView, AppError>;

    async fn list_sessions(&self, subject: &Subject) -> Result<Vec<SessionInfo>, AppError>;

    async fn logout_session(&self, subject: &Subject, session_id: Uuid) -> Result<(), AppError>;
}
