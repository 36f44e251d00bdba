// ==================================
// tests/integration/auth_flow_tests.rs
// ==================================
//! Account and session flows end to end over the in-memory store
use std::sync::Arc;
use std::time::Duration;

use passgate_common::{
    ChangePasswordRequest, ChangeUsernameRequest, LoginRequest, RegisterRequest, Subject,
    TokenDomain,
};
use passgate_lib::auth::{
    AuthService, DefaultAuth, ManualClock, Secret, SigningAlgorithm, TokenError, TokenKeys,
};
use passgate_lib::error::AppError;
use passgate_lib::storage::MemoryAccountStore;
use uuid::Uuid;

const PASSWORD: &str = "Abcdef1!";

fn setup() -> (DefaultAuth, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::starting_now());
    let keys = Arc::new(TokenKeys::new(
        SigningAlgorithm::HS256,
        &Secret::from("integration-access-secret-0123456789"),
        Duration::from_secs(3600),
        &Secret::from("integration-refresh-secret-0123456789"),
        Duration::from_secs(7 * 24 * 3600),
    ));
    let store = Arc::new(MemoryAccountStore::new());
    (DefaultAuth::with_clock(store, keys, clock.clone()), clock)
}

fn register(email: &str, username: &str) -> RegisterRequest {
    RegisterRequest {
        email: email.to_string(),
        username: username.to_string(),
        password: PASSWORD.to_string(),
    }
}

fn login(identifier: &str, password: &str) -> LoginRequest {
    LoginRequest {
        identifier: identifier.to_string(),
        password: password.to_string(),
        ip_address: Some("10.0.0.1".to_string()),
        user_agent: Some("integration-test".to_string()),
    }
}

#[tokio::test]
async fn test_register_and_login_by_email_or_username() {
    let (auth, _clock) = setup();
    let account = auth.register(register("bob@example.com", "bob")).await.unwrap();
    assert_eq!(account.username, "bob");

    for identifier in ["bob", "bob@example.com"] {
        let tokens = auth.login(login(identifier, PASSWORD)).await.unwrap();
        let subject = auth.authenticate(&tokens.access_token).await.unwrap();
        assert_eq!(subject, Subject::from(account.id));
    }

    let profile = auth.profile(&Subject::from(account.id)).await.unwrap();
    assert_eq!(profile, account);
}

#[tokio::test]
async fn test_registration_rejections() {
    let (auth, _clock) = setup();
    auth.register(register("bob@example.com", "bob")).await.unwrap();

    assert!(matches!(
        auth.register(register("bob@example.com", "robert")).await,
        Err(AppError::EmailTaken)
    ));
    assert!(matches!(
        auth.register(register("robert@example.com", "bob")).await,
        Err(AppError::UsernameTaken)
    ));
    assert!(matches!(
        auth.register(register("not-an-email", "robert")).await,
        Err(AppError::Validation(_))
    ));
    assert!(matches!(
        auth.register(register("robert@example.com", "r")).await,
        Err(AppError::Validation(_))
    ));

    let weak = RegisterRequest {
        password: "password".to_string(),
        ..register("robert@example.com", "robert")
    };
    assert!(matches!(auth.register(weak).await, Err(AppError::Policy(_))));
}

#[tokio::test]
async fn test_access_token_is_not_a_refresh_token() {
    let (auth, _clock) = setup();
    auth.register(register("bob@example.com", "bob")).await.unwrap();
    let tokens = auth.login(login("bob", PASSWORD)).await.unwrap();

    assert!(matches!(
        auth.refresh(&tokens.access_token).await,
        Err(AppError::Token(TokenError::BadSignature))
    ));
    assert!(matches!(
        auth.authenticate(&tokens.refresh_token).await,
        Err(AppError::Token(TokenError::BadSignature))
    ));
}

#[tokio::test]
async fn test_expiry_follows_the_clock() {
    let (auth, clock) = setup();
    auth.register(register("bob@example.com", "bob")).await.unwrap();
    let tokens = auth.login(login("bob", PASSWORD)).await.unwrap();

    clock.advance(3600);
    assert!(matches!(
        auth.authenticate(&tokens.access_token).await,
        Err(AppError::Token(TokenError::Expired))
    ));

    // the refresh token outlives the access token
    let refreshed = auth.refresh(&tokens.refresh_token).await.unwrap();
    assert!(auth.authenticate(&refreshed.access_token).await.is_ok());
    assert_eq!(refreshed.refresh_expires_in, 7 * 24 * 3600 - 3600);

    clock.advance(7 * 24 * 3600);
    assert!(matches!(
        auth.refresh(&tokens.refresh_token).await,
        Err(AppError::Token(TokenError::Expired))
    ));
}

#[tokio::test]
async fn test_change_password() {
    let (auth, _clock) = setup();
    let account = auth.register(register("bob@example.com", "bob")).await.unwrap();
    let subject = Subject::from(account.id);

    let wrong_old = ChangePasswordRequest {
        old_password: "Wrong.Pass1".to_string(),
        new_password: "N3w.Password".to_string(),
    };
    assert!(matches!(
        auth.change_password(&subject, wrong_old).await,
        Err(AppError::InvalidCredentials)
    ));

    let weak_new = ChangePasswordRequest {
        old_password: PASSWORD.to_string(),
        new_password: "short".to_string(),
    };
    assert!(matches!(
        auth.change_password(&subject, weak_new).await,
        Err(AppError::Policy(_))
    ));

    let change = ChangePasswordRequest {
        old_password: PASSWORD.to_string(),
        new_password: "N3w.Password".to_string(),
    };
    auth.change_password(&subject, change).await.unwrap();

    assert!(matches!(
        auth.login(login("bob", PASSWORD)).await,
        Err(AppError::InvalidCredentials)
    ));
    assert!(auth.login(login("bob", "N3w.Password")).await.is_ok());
}

#[tokio::test]
async fn test_change_username() {
    let (auth, _clock) = setup();
    let bob = auth.register(register("bob@example.com", "bob")).await.unwrap();
    auth.register(register("carol@example.com", "carol")).await.unwrap();
    let subject = Subject::from(bob.id);

    let taken = ChangeUsernameRequest {
        new_username: "carol".to_string(),
    };
    assert!(matches!(
        auth.change_username(&subject, taken).await,
        Err(AppError::UsernameTaken)
    ));

    let renamed = auth
        .change_username(
            &subject,
            ChangeUsernameRequest {
                new_username: "robert.b".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.username, "robert.b");

    assert!(auth.login(login("robert.b", PASSWORD)).await.is_ok());
    assert!(matches!(
        auth.login(login("bob", PASSWORD)).await,
        Err(AppError::InvalidCredentials)
    ));
}

#[tokio::test]
async fn test_soft_delete_and_restore() {
    let (auth, _clock) = setup();
    let account = auth.register(register("bob@example.com", "bob")).await.unwrap();
    let subject = Subject::from(account.id);
    let tokens = auth.login(login("bob", PASSWORD)).await.unwrap();

    auth.delete_account(&subject).await.unwrap();

    assert!(matches!(auth.profile(&subject).await, Err(AppError::AccountNotFound)));
    assert!(matches!(
        auth.login(login("bob", PASSWORD)).await,
        Err(AppError::InvalidCredentials)
    ));
    assert!(matches!(
        auth.refresh(&tokens.refresh_token).await,
        Err(AppError::SessionRevoked)
    ));
    // identifiers stay reserved while the account is deleted
    assert!(matches!(
        auth.register(register("bob@example.com", "bobby")).await,
        Err(AppError::EmailTaken)
    ));

    let restored = auth.restore_account(&subject).await.unwrap();
    assert_eq!(restored.id, account.id);
    assert!(auth.login(login("bob", PASSWORD)).await.is_ok());
}

#[tokio::test]
async fn test_sessions_listing_and_logout() {
    let (auth, clock) = setup();
    let account = auth.register(register("bob@example.com", "bob")).await.unwrap();
    let subject = Subject::from(account.id);

    let first = auth.login(login("bob", PASSWORD)).await.unwrap();
    clock.advance(5);
    let second = auth.login(login("bob", PASSWORD)).await.unwrap();

    let sessions = auth.list_sessions(&subject).await.unwrap();
    assert_eq!(sessions.len(), 2);
    assert!(sessions[0].created_at > sessions[1].created_at);
    assert_eq!(sessions[0].ip_address.as_deref(), Some("10.0.0.1"));

    // closing the newest session leaves the first one usable
    auth.logout_session(&subject, sessions[0].id).await.unwrap();
    assert!(matches!(
        auth.refresh(&second.refresh_token).await,
        Err(AppError::SessionRevoked)
    ));
    assert!(auth.refresh(&first.refresh_token).await.is_ok());

    assert!(matches!(
        auth.logout_session(&subject, sessions[0].id).await,
        Err(AppError::SessionNotFound)
    ));

    auth.logout(&first.refresh_token).await.unwrap();
    assert!(auth.list_sessions(&subject).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_other_users_sessions_are_off_limits() {
    let (auth, _clock) = setup();
    let bob = auth.register(register("bob@example.com", "bob")).await.unwrap();
    let carol = auth.register(register("carol@example.com", "carol")).await.unwrap();

    let tokens = auth.login(login("bob", PASSWORD)).await.unwrap();
    let bob_sessions = auth.list_sessions(&Subject::from(bob.id)).await.unwrap();

    assert!(matches!(
        auth.logout_session(&Subject::from(carol.id), bob_sessions[0].id)
            .await,
        Err(AppError::SessionNotFound)
    ));
    assert!(auth.refresh(&tokens.refresh_token).await.is_ok());
}

#[tokio::test]
async fn test_issuer_and_service_share_keys() {
    let (auth, _clock) = setup();
    let token = auth
        .issuer()
        .issue(&Subject::from("u-123"), TokenDomain::Access)
        .unwrap();

    assert_eq!(
        auth.authenticate(&token).await.unwrap(),
        Subject::from("u-123")
    );
    // a subject without an account has no profile
    assert!(matches!(
        auth.profile(&Subject::from("u-123")).await,
        Err(AppError::AccountNotFound)
    ));
}

#[tokio::test]
async fn test_restore_unknown_account() {
    let (auth, _clock) = setup();

    assert!(matches!(
        auth.restore_account(&Subject::from(Uuid::new_v4())).await,
        Err(AppError::AccountNotFound)
    ));
    assert!(matches!(
        auth.restore_account(&Subject::from("u-123")).await,
        Err(AppError::AccountNotFound)
    ));

    // restoring an active account leaves it as it is
    let account = auth.register(register("bob@example.com", "bob")).await.unwrap();
    let restored = auth.restore_account(&Subject::from(account.id)).await.unwrap();
    assert_eq!(restored, account);
}

#[tokio::test]
async fn test_logout_unknown_session() {
    let (auth, _clock) = setup();
    let account = auth.register(register("bob@example.com", "bob")).await.unwrap();
    let subject = Subject::from(account.id);
    auth.login(login("bob", PASSWORD)).await.unwrap();

    assert!(matches!(
        auth.logout_session(&subject, Uuid::new_v4()).await,
        Err(AppError::SessionNotFound)
    ));
    assert_eq!(auth.list_sessions(&subject).await.unwrap().len(), 1);
}
