// ======================================
// tests/integration/auth_flow_tests.rs
// ======================================
//! Full session lifecycles through `AuthService`
use std::sync::Arc;

use auth_lib::auth::{LoginRateLimiter, ScryptFallbackHasher, SessionManager, TokenIssuer};
use auth_lib::error::{AuthError, ErrorKind};
use auth_lib::storage::{MemoryUserStore, UserStore};
use tokenwarden_common::REFRESH_COOKIE_NAME;

use crate::test_utils::{
    flat_file_state, login_request, memory_state, signup_request, test_settings,
};

#[tokio::test]
async fn test_auth_service_flow() {
    let state = memory_state();
    let auth = &state.auth;

    let signup = auth
        .signup(signup_request("ada@example.com", "Secure123"))
        .await
        .unwrap();
    let user_id = signup.user.id;
    let wire = serde_json::to_value(&signup.user).unwrap();
    assert!(wire.get("passwordHash").is_none());
    assert!(wire.get("refreshTokenHash").is_none());

    let login = auth
        .login(Some("127.0.0.1"), login_request("ada@example.com", "Secure123"))
        .await
        .unwrap();
    assert_ne!(login.access_token, signup.access_token);

    let rotated = auth.refresh(user_id, &login.refresh_token).await.unwrap();

    let stale = auth.refresh(user_id, &login.refresh_token).await.unwrap_err();
    assert!(matches!(stale, AuthError::InvalidRefreshToken));
    assert_eq!(stale.kind(), ErrorKind::Unauthorized);
    assert_eq!(stale.to_string(), "Refresh token is invalid.");

    auth.logout(user_id).await.unwrap();
    assert!(matches!(
        auth.refresh(user_id, &rotated.refresh_token).await,
        Err(AuthError::InvalidRefreshToken)
    ));

    // access tokens outlive logout until they expire
    assert_eq!(auth.authenticate(&rotated.access_token).await.unwrap().id, user_id);
}

#[tokio::test]
async fn test_duplicate_signup_is_case_insensitive() {
    let state = memory_state();
    state
        .auth
        .signup(signup_request("ada@example.com", "Secure123"))
        .await
        .unwrap();

    let err = state
        .auth
        .signup(signup_request(" Ada@Example.com ", "Other123"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::DuplicateAccount));
    assert_eq!(err.to_string(), "An account with this email already exists.");
}

#[tokio::test]
async fn test_refresh_hash_never_equals_token() {
    let state = memory_state();
    let signup = state
        .auth
        .signup(signup_request("ada@example.com", "Secure123"))
        .await
        .unwrap();

    let stored = state.store.find_by_id(signup.user.id).await.unwrap().unwrap();
    let hash = stored.refresh_token_hash.unwrap();
    assert_ne!(hash, signup.refresh_token);
    assert!(!hash.contains(&signup.refresh_token));
}

#[tokio::test]
async fn test_cookie_flow_with_flat_file_store() {
    let (state, _temp_dir) = flat_file_state();
    let signup = state
        .auth
        .signup(signup_request("grace@example.com", "Secure123"))
        .await
        .unwrap();

    let options = state.auth.refresh_cookie_options();
    assert_eq!(REFRESH_COOKIE_NAME, "refresh_token");
    assert_eq!(options.path, "/auth");
    assert!(options.http_only);

    let rotated = state
        .auth
        .refresh_with_token(&signup.refresh_token)
        .await
        .unwrap();
    assert!(state
        .auth
        .refresh_with_token(&signup.refresh_token)
        .await
        .is_err());

    let stored = state.store.find_by_id(signup.user.id).await.unwrap().unwrap();
    assert!(stored.refresh_token_hash.is_some());

    state.auth.logout(signup.user.id).await.unwrap();
    assert!(state.auth.refresh_with_token(&rotated.refresh_token).await.is_err());
}

#[tokio::test]
async fn test_lifecycle_on_fallback_hasher() {
    let settings = test_settings();
    let store = Arc::new(MemoryUserStore::new());
    let sessions = SessionManager::new(
        store.clone(),
        Arc::new(ScryptFallbackHasher),
        TokenIssuer::from_settings(&settings).unwrap(),
        Arc::new(LoginRateLimiter::default()),
        &settings,
    );

    let signup = sessions
        .signup(signup_request("ada@example.com", "Secure123"))
        .await
        .unwrap();
    let user_id = signup.user.id;
    let stored = store.find_by_id(user_id).await.unwrap().unwrap();
    assert!(stored.password_hash.starts_with("fallback:4:"));
    assert!(stored
        .refresh_token_hash
        .as_deref()
        .is_some_and(|hash| hash.starts_with("fallback:4:")));

    assert!(matches!(
        sessions
            .login(None, login_request("ada@example.com", "Secure124"))
            .await,
        Err(AuthError::InvalidCredentials)
    ));
    let login = sessions
        .login(None, login_request("ada@example.com", "Secure123"))
        .await
        .unwrap();

    let rotated = sessions.refresh(user_id, &login.refresh_token).await.unwrap();
    assert!(matches!(
        sessions.refresh(user_id, &login.refresh_token).await,
        Err(AuthError::InvalidRefreshToken)
    ));

    sessions.logout(user_id).await.unwrap();
    assert!(matches!(
        sessions.refresh(user_id, &rotated.refresh_token).await,
        Err(AuthError::InvalidRefreshToken)
    ));
}
