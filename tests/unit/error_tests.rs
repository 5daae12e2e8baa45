// =========================
// tests/unit/error_tests.rs
// =========================
//! Unit tests for the error module
use auth_lib::error::{AuthError, ErrorKind, StoreError};

#[test]
fn test_error_kinds() {
    let cases = [
        (AuthError::DuplicateAccount, ErrorKind::Conflict),
        (AuthError::InvalidCredentials, ErrorKind::Unauthorized),
        (AuthError::InvalidRefreshToken, ErrorKind::Unauthorized),
        (AuthError::InvalidAccessToken, ErrorKind::Unauthorized),
        (AuthError::TooManyAttempts, ErrorKind::TooManyRequests),
        (AuthError::UserNotFound, ErrorKind::NotFound),
        (AuthError::PasswordConfirmationMismatch, ErrorKind::BadRequest),
        (AuthError::Internal("boom".into()), ErrorKind::Internal),
    ];
    for (err, kind) in cases {
        assert_eq!(err.kind(), kind, "{err}");
    }
}

#[test]
fn test_error_codes_are_unique() {
    let codes = [
        AuthError::DuplicateAccount.error_code(),
        AuthError::InvalidCredentials.error_code(),
        AuthError::InvalidRefreshToken.error_code(),
        AuthError::InvalidAccessToken.error_code(),
        AuthError::TooManyAttempts.error_code(),
        AuthError::UserNotFound.error_code(),
        AuthError::PasswordConfirmationMismatch.error_code(),
        AuthError::MisconfiguredSecret(String::new()).error_code(),
        AuthError::Hashing(String::new()).error_code(),
        AuthError::Internal(String::new()).error_code(),
    ];
    let mut sorted = codes.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(sorted.len(), codes.len());
}

#[test]
fn test_storage_failures_are_sanitized() {
    let err = AuthError::from(StoreError::Io(std::io::Error::other("disk full")));
    assert_eq!(err.error_code(), "STORE_001");
    assert!(!err.sanitized_message().contains("disk full"));
}
