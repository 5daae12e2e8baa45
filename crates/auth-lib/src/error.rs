// ============================
// crates/auth-lib/src/error.rs
// ============================
//! Central error type for the credential core.
//!
//! The core never speaks a wire protocol, so instead of status codes every
//! error maps onto an [`ErrorKind`] that the boundary translates.
use thiserror::Error;

/// Transport-neutral failure classes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadRequest,
    Unauthorized,
    NotFound,
    Conflict,
    TooManyRequests,
    Internal,
}

/// Failures raised by a [`UserStore`](crate::storage::UserStore) backend
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("User not found")]
    NotFound,

    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Application error types with error codes
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("An account with this email already exists.")]
    DuplicateAccount,

    #[error("Invalid credentials.")]
    InvalidCredentials,

    #[error("Refresh token is invalid.")]
    InvalidRefreshToken,

    #[error("Access token is invalid.")]
    InvalidAccessToken,

    #[error("Too many login attempts detected. Please try again in a few minutes.")]
    TooManyAttempts,

    #[error("User not found")]
    UserNotFound,

    #[error("Confirm password must match password.")]
    PasswordConfirmationMismatch,

    #[error("Signing secret misconfigured: {0}")]
    MisconfiguredSecret(String),

    #[error("Hashing error: {0}")]
    Hashing(String),

    #[error("Token signing error: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("Storage error: {0}")]
    Storage(StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Failure class for the boundary layer
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::DuplicateAccount => ErrorKind::Conflict,
            AuthError::InvalidCredentials
            | AuthError::InvalidRefreshToken
            | AuthError::InvalidAccessToken => ErrorKind::Unauthorized,
            AuthError::TooManyAttempts => ErrorKind::TooManyRequests,
            AuthError::UserNotFound => ErrorKind::NotFound,
            AuthError::PasswordConfirmationMismatch => ErrorKind::BadRequest,
            _ => ErrorKind::Internal,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::DuplicateAccount => "AUTH_001",
            AuthError::InvalidCredentials => "AUTH_002",
            AuthError::InvalidRefreshToken => "AUTH_003",
            AuthError::InvalidAccessToken => "AUTH_004",
            AuthError::TooManyAttempts => "RATE_001",
            AuthError::UserNotFound => "NF_001",
            AuthError::PasswordConfirmationMismatch => "VAL_001",
            AuthError::MisconfiguredSecret(_) => "CFG_001",
            AuthError::Hashing(_) => "HASH_001",
            AuthError::Signing(_) => "JWT_001",
            AuthError::Storage(_) => "STORE_001",
            AuthError::Internal(_) => "INT_001",
        }
    }

    /// Get a sanitized message suitable for production use
    pub fn sanitized_message(&self) -> String {
        match self.kind() {
            ErrorKind::Internal => "An internal server error occurred".to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AuthError::UserNotFound,
            StoreError::DuplicateEmail(_) => AuthError::DuplicateAccount,
            other => AuthError::Storage(other),
        }
    }
}

impl From<tokio::task::JoinError> for AuthError {
    fn from(err: tokio::task::JoinError) -> Self {
        AuthError::Internal(format!("blocking task failed: {err}"))
    }
}
