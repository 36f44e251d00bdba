// ============================
// passgate-lib/src/storage.rs
// ============================
//! Account storage abstraction with an in-memory implementation.
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use passgate_common::{AccountView, Subject};
use uuid::Uuid;

use crate::auth::password::HashedCredential;
use crate::error::AppError;
use crate::validation::is_email_identifier;

/// A stored account
#[derive(Debug, Clone)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub credential: HashedCredential,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set when the account is soft deleted
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Account {
    /// New active account with a fresh id
    pub fn new(
        email: impl Into<String>,
        username: impl Into<String>,
        credential: HashedCredential,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            username: username.into(),
            credential,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Token subject for this account
    pub fn subject(&self) -> Subject {
        Subject::from(self.id)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn view(&self) -> AccountView {
        AccountView {
            id: self.id,
            email: self.email.clone(),
            username: self.username.clone(),
            created_at: self.created_at,
        }
    }
}

/// Trait for account storage backends.
///
/// Lookups return soft-deleted accounts too; callers decide what a deleted
/// account may do. Email and username stay reserved while an account is
/// soft deleted.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Find by email (identifier contains `@`) or by username
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<Account>, AppError>;

    /// Find by account id
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError>;

    /// Insert a new account. Fails with `EmailTaken` or `UsernameTaken`.
    async fn insert(&self, account: Account) -> Result<(), AppError>;

    /// Replace the stored credential, stamping `updated_at`
    async fn update_credential(
        &self,
        id: Uuid,
        credential: HashedCredential,
        updated_at: DateTime<Utc>,
    ) -> Result<(), AppError>;

    /// Rename an account. Fails with `UsernameTaken`.
    async fn update_username(
        &self,
        id: Uuid,
        username: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), AppError>;

    /// Soft delete (`Some`) or restore (`None`) an account
    async fn set_deleted(
        &self,
        id: Uuid,
        deleted_at: Option<DateTime<Utc>>,
        updated_at: DateTime<Utc>,
    ) -> Result<(), AppError>;
}

#[derive(Default)]
struct Inner {
    accounts: HashMap<Uuid, Account>,
    by_email: HashMap<String, Uuid>,
    by_username: HashMap<String, Uuid>,
}

/// In-memory implementation of the AccountStore trait
#[derive(Default)]
pub struct MemoryAccountStore {
    inner: RwLock<Inner>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored accounts, soft-deleted ones included
    pub fn len(&self) -> usize {
        self.inner.read().accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<Account>, AppError> {
        let inner = self.inner.read();
        let index = if is_email_identifier(identifier) {
            &inner.by_email
        } else {
            &inner.by_username
        };
        Ok(index
            .get(identifier)
            .and_then(|id| inner.accounts.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError> {
        Ok(self.inner.read().accounts.get(&id).cloned())
    }

    async fn insert(&self, account: Account) -> Result<(), AppError> {
        let mut inner = self.inner.write();
        if inner.by_email.contains_key(&account.email) {
            return Err(AppError::EmailTaken);
        }
        if inner.by_username.contains_key(&account.username) {
            return Err(AppError::UsernameTaken);
        }

        inner.by_email.insert(account.email.clone(), account.id);
        inner.by_username.insert(account.username.clone(), account.id);
        inner.accounts.insert(account.id, account);
        Ok(())
    }

    async fn update_credential(
        &self,
        id: Uuid,
        credential: HashedCredential,
        updated_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut inner = self.inner.write();
        let account = inner.accounts.get_mut(&id).ok_or(AppError::AccountNotFound)?;
        account.credential = credential;
        account.updated_at = updated_at;
        Ok(())
    }

    async fn update_username(
        &self,
        id: Uuid,
        username: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut inner = self.inner.write();
        if let Some(owner) = inner.by_username.get(username) {
            if *owner == id {
                return Ok(());
            }
            return Err(AppError::UsernameTaken);
        }

        let account = inner.accounts.get_mut(&id).ok_or(AppError::AccountNotFound)?;
        let previous = std::mem::replace(&mut account.username, username.to_string());
        account.updated_at = updated_at;

        inner.by_username.remove(&previous);
        inner.by_username.insert(username.to_string(), id);
        Ok(())
    }

    async fn set_deleted(
        &self,
        id: Uuid,
        deleted_at: Option<DateTime<Utc>>,
        updated_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut inner = self.inner.write();
        let account = inner.accounts.get_mut(&id).ok_or(AppError::AccountNotFound)?;
        account.deleted_at = deleted_at;
        account.updated_at = updated_at;
        Ok(())
    }
}
