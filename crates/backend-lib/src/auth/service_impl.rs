use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::counter;
use passgate_common::{
    AccountView, ChangePasswordRequest, ChangeUsernameRequest, LoginRequest, RegisterRequest,
    SessionInfo, Subject, TokenDomain, TokenPair,
};
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::auth::clock::{Clock, SystemClock};
use crate::auth::password::{CredentialHasher, HashedCredential};
use crate::auth::session::{SessionRecord, SessionRegistry};
use crate::auth::token::{TokenError, TokenIssuer, TokenKeys, TokenValidator};
use crate::auth::AuthService;
use crate::error::AppError;
use crate::metrics as metric_names;
use crate::storage::{Account, AccountStore};
use crate::validation::{validate_email, validate_username};

/// Verified against when a login names no account, so a miss costs as much
/// as a wrong password.
static DUMMY_CREDENTIAL: LazyLock<Option<HashedCredential>> =
    LazyLock::new(|| CredentialHasher::new().hash("Dummy.Passw0rd").ok());

/// Default `AuthService` over an account store and the token keys.
///
/// Password hashing and verification run on the blocking pool so that their
/// deliberate cost never stalls the async runtime.
pub struct DefaultAuth {
    store: Arc<dyn AccountStore>,
    hasher: CredentialHasher,
    keys: Arc<TokenKeys>,
    issuer: TokenIssuer,
    validator: TokenValidator,
    sessions: SessionRegistry,
    clock: Arc<dyn Clock>,
}

impl DefaultAuth {
    pub fn new(store: Arc<dyn AccountStore>, keys: Arc<TokenKeys>) -> Self {
        Self::with_clock(store, keys, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<dyn AccountStore>,
        keys: Arc<TokenKeys>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            hasher: CredentialHasher::new(),
            issuer: TokenIssuer::with_clock(keys.clone(), clock.clone()),
            validator: TokenValidator::with_clock(keys.clone(), clock.clone()),
            sessions: SessionRegistry::new(clock.clone()),
            keys,
            clock,
        }
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    pub fn validator(&self) -> &TokenValidator {
        &self.validator
    }

    async fn hash_blocking(&self, password: Zeroizing<String>) -> Result<HashedCredential, AppError> {
        let hasher = self.hasher.clone();
        let credential = tokio::task::spawn_blocking(move || hasher.hash(&password)).await??;
        Ok(credential)
    }

    /// Verify `candidate` against `stored`. Without a stored credential the
    /// dummy one is checked instead and the result is always `false`.
    async fn verify_blocking(
        &self,
        stored: Option<HashedCredential>,
        candidate: Zeroizing<String>,
    ) -> Result<bool, AppError> {
        let hasher = self.hasher.clone();
        let ok = tokio::task::spawn_blocking(move || match stored {
            Some(stored) => hasher.verify(&stored, &candidate),
            None => {
                if let Some(dummy) = DUMMY_CREDENTIAL.as_ref() {
                    let _ = hasher.verify(dummy, &candidate);
                }
                false
            },
        })
        .await?;
        Ok(ok)
    }

    /// Load the account behind `subject`, treating soft-deleted accounts as absent
    async fn active_account(&self, subject: &Subject) -> Result<Account, AppError> {
        let id = account_id(subject)?;
        match self.store.find_by_id(id).await? {
            Some(account) if !account.is_deleted() => Ok(account),
            _ => Err(AppError::AccountNotFound),
        }
    }

    fn ttl_secs(&self, domain: TokenDomain) -> u64 {
        self.keys.ttl(domain).as_secs()
    }
}

fn account_id(subject: &Subject) -> Result<Uuid, AppError> {
    Uuid::parse_str(subject.as_str()).map_err(|_| AppError::AccountNotFound)
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>, AppError> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| AppError::Internal(format!("timestamp {secs} out of range")))
}

#[async_trait]
impl AuthService for DefaultAuth {
    async fn register(&self, req: RegisterRequest) -> Result<AccountView, AppError> {
        let RegisterRequest {
            email,
            username,
            password,
        } = req;
        let password = Zeroizing::new(password);

        validate_email(&email)?;
        validate_username(&username)?;

        if self.store.find_by_identifier(&email).await?.is_some() {
            return Err(AppError::EmailTaken);
        }
        if self.store.find_by_identifier(&username).await?.is_some() {
            return Err(AppError::UsernameTaken);
        }

        let credential = self.hash_blocking(password).await?;
        let account = Account::new(email, username, credential, self.clock.now());
        let view = account.view();
        self.store.insert(account).await?;

        counter!(metric_names::ACCOUNT_REGISTERED).increment(1);
        tracing::info!(account_id = %view.id, "account registered");
        Ok(view)
    }

    async fn login(&self, req: LoginRequest) -> Result<TokenPair, AppError> {
        let LoginRequest {
            identifier,
            password,
            ip_address,
            user_agent,
        } = req;
        let password = Zeroizing::new(password);

        let account = match self.store.find_by_identifier(&identifier).await? {
            Some(account) if !account.is_deleted() => Some(account),
            _ => None,
        };
        let stored = account.as_ref().map(|account| account.credential.clone());
        let verified = self.verify_blocking(stored, password).await?;
        let account = match account {
            Some(account) if verified => account,
            _ => {
                counter!(metric_names::LOGIN_FAILURE).increment(1);
                tracing::warn!(%identifier, "failed login attempt");
                return Err(AppError::InvalidCredentials);
            },
        };

        let subject = account.subject();
        let access = self.issuer.issue(&subject, TokenDomain::Access)?;
        let refresh = self.issuer.issue_with_claims(&subject, TokenDomain::Refresh)?;
        let session_id = refresh
            .claims
            .token_id()
            .ok_or_else(|| AppError::Internal("refresh token id is not a UUID".to_string()))?;

        self.sessions.record(SessionRecord {
            id: session_id,
            subject: subject.clone(),
            created_at: timestamp(refresh.claims.iat)?,
            expires_at: timestamp(refresh.claims.exp)?,
            ip_address,
            user_agent,
        });

        counter!(metric_names::LOGIN_SUCCESS).increment(1);
        tracing::info!(%subject, %session_id, "login successful");
        Ok(TokenPair {
            access_token: access,
            refresh_token: refresh.token,
            access_expires_in: self.ttl_secs(TokenDomain::Access),
            refresh_expires_in: self.ttl_secs(TokenDomain::Refresh),
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AppError> {
        let claims = self
            .validator
            .validate_claims(refresh_token, TokenDomain::Refresh)?;
        let session_id = claims.token_id().ok_or(AppError::Token(TokenError::Malformed))?;

        if !self.sessions.contains(session_id, &claims.sub) {
            tracing::debug!(subject = %claims.sub, %session_id, "refresh with revoked session");
            return Err(AppError::SessionRevoked);
        }
        self.active_account(&claims.sub).await?;

        let access = self.issuer.issue(&claims.sub, TokenDomain::Access)?;
        let remaining = claims.exp.saturating_sub(self.clock.unix_timestamp()).max(0);

        counter!(metric_names::TOKEN_REFRESHED).increment(1);
        Ok(TokenPair {
            access_token: access,
            refresh_token: refresh_token.to_string(),
            access_expires_in: self.ttl_secs(TokenDomain::Access),
            refresh_expires_in: u64::try_from(remaining).unwrap_or(0),
        })
    }

    async fn logout(&self, refresh_token: &str) -> Result<(), AppError> {
        let claims = match self
            .validator
            .validate_claims(refresh_token, TokenDomain::Refresh)
        {
            Ok(claims) => claims,
            Err(TokenError::Expired) => {
                // an expired token no longer names its session; sweep every expired one
                self.sessions.prune_expired();
                return Ok(());
            },
            Err(_) => return Ok(()),
        };

        if let Some(session_id) = claims.token_id() {
            if self.sessions.revoke(session_id, &claims.sub) {
                counter!(metric_names::LOGOUT).increment(1);
                tracing::info!(subject = %claims.sub, %session_id, "logged out");
            }
        }
        Ok(())
    }

    async fn authenticate(&self, access_token: &str) -> Result<Subject, AppError> {
        Ok(self.validator.validate(access_token, TokenDomain::Access)?)
    }

    async fn profile(&self, subject: &Subject) -> Result<AccountView, AppError> {
        Ok(self.active_account(subject).await?.view())
    }

    async fn change_password(
        &self,
        subject: &Subject,
        req: ChangePasswordRequest,
    ) -> Result<(), AppError> {
        let old_password = Zeroizing::new(req.old_password);
        let new_password = Zeroizing::new(req.new_password);
        let account = self.active_account(subject).await?;

        if !self.verify_blocking(Some(account.credential), old_password).await? {
            tracing::warn!(%subject, "incorrect old password on password change");
            return Err(AppError::InvalidCredentials);
        }

        let credential = self.hash_blocking(new_password).await?;
        self.store
            .update_credential(account.id, credential, self.clock.now())
            .await?;

        tracing::info!(%subject, "password updated");
        Ok(())
    }

    async fn change_username(
        &self,
        subject: &Subject,
        req: ChangeUsernameRequest,
    ) -> Result<AccountView, AppError> {
        validate_username(&req.new_username)?;
        let mut account = self.active_account(subject).await?;

        self.store
            .update_username(account.id, &req.new_username, self.clock.now())
            .await?;
        account.username = req.new_username;

        tracing::info!(%subject, username = %account.username, "username updated");
        Ok(account.view())
    }

    async fn delete_account(&self, subject: &Subject) -> Result<(), AppError> {
        let account = self.active_account(subject).await?;
        let now = self.clock.now();
        self.store.set_deleted(account.id, Some(now), now).await?;
        let revoked = self.sessions.revoke_all(subject);

        tracing::info!(%subject, revoked, "account soft deleted");
        Ok(())
    }

    async fn restore_account(&self, subject: &Subject) -> Result<AccountView, AppError> {
        let id = account_id(subject)?;
        let mut account = self.store.find_by_id(id).await?.ok_or(AppError::AccountNotFound)?;

        if account.is_deleted() {
            self.store.set_deleted(id, None, self.clock.now()).await?;
            account.deleted_at = None;
            tracing::info!(%subject, "account restored");
        }
        Ok(account.view())
    }

    async fn list_sessions(&self, subject: &Subject) -> Result<Vec<SessionInfo>, AppError> {
        Ok(self.sessions.list(subject))
    }

    async fn logout_session(&self, subject: &Subject, session_id: Uuid) -> Result<(), AppError> {
        if !self.sessions.revoke(session_id, subject) {
            return Err(AppError::SessionNotFound);
        }
        tracing::info!(%subject, %session_id, "session logged out");
        Ok(())
    }
}
