// ===========================================
// tests/integration/login_throttle_tests.rs
// ===========================================
//! Login attempts against the limiter wired into the session manager
use auth_lib::error::{AuthError, ErrorKind};

use crate::test_utils::{login_request, memory_state, signup_request};

const ORIGIN: Option<&str> = Some("203.0.113.7");

#[tokio::test]
async fn test_sixth_failed_login_is_throttled() {
    let state = memory_state();
    state
        .auth
        .signup(signup_request("ada@example.com", "Secure123"))
        .await
        .unwrap();

    for _ in 0..5 {
        let err = state
            .auth
            .login(ORIGIN, login_request("ada@example.com", "wrong"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    let err = state
        .auth
        .login(ORIGIN, login_request("ada@example.com", "Secure123"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::TooManyAttempts));
    assert_eq!(err.kind(), ErrorKind::TooManyRequests);
    assert_eq!(
        err.to_string(),
        "Too many login attempts detected. Please try again in a few minutes."
    );

    // another origin is tracked separately
    assert!(state
        .auth
        .login(Some("198.51.100.1"), login_request("ada@example.com", "Secure123"))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_success_before_limit_clears_counter() {
    let state = memory_state();
    state
        .auth
        .signup(signup_request("ada@example.com", "Secure123"))
        .await
        .unwrap();

    for _ in 0..4 {
        let _ = state
            .auth
            .login(ORIGIN, login_request("ada@example.com", "wrong"))
            .await;
    }
    state
        .auth
        .login(ORIGIN, login_request("ada@example.com", "Secure123"))
        .await
        .unwrap();
    assert_eq!(state.rate_limiter.tracked_keys(), 0);

    for _ in 0..5 {
        let _ = state
            .auth
            .login(ORIGIN, login_request("ADA@example.com", "wrong"))
            .await;
    }
    assert!(matches!(
        state
            .auth
            .login(ORIGIN, login_request("ada@example.com", "Secure123"))
            .await,
        Err(AuthError::TooManyAttempts)
    ));
}

#[tokio::test]
async fn test_unknown_emails_are_throttled_too() {
    let state = memory_state();

    for _ in 0..5 {
        let err = state
            .auth
            .login(None, login_request("ghost@example.com", "whatever"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }
    assert!(matches!(
        state
            .auth
            .login(None, login_request("ghost@example.com", "whatever"))
            .await,
        Err(AuthError::TooManyAttempts)
    ));
    assert_eq!(
        state.rate_limiter.attempts_for("unknown:ghost@example.com"),
        5
    );
}
