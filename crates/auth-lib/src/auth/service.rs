// ============================
// crates/auth-lib/src/auth/service.rs
// ============================
use async_trait::async_trait;
use tokenwarden_common::{
    AuthResponse, LoginRequest, RefreshCookieOptions, SafeUser, SignupRequest, TokenPair,
};
use uuid::Uuid;

use super::SessionManager;
use crate::error::AuthError;

/// What the HTTP boundary needs from the credential core
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn signup(&self, request: SignupRequest) -> Result<AuthResponse, AuthError>;
    async fn login(
        &self,
        origin: Option<&str>,
        request: LoginRequest,
    ) -> Result<AuthResponse, AuthError>;
    async fn refresh(&self, user_id: Uuid, refresh_token: &str) -> Result<TokenPair, AuthError>;
    /// Refresh from the cookie value alone
    async fn refresh_with_token(&self, refresh_token: &str) -> Result<TokenPair, AuthError>;
    async fn logout(&self, user_id: Uuid) -> Result<(), AuthError>;
    async fn authenticate(&self, access_token: &str) -> Result<SafeUser, AuthError>;
    fn refresh_cookie_options(&self) -> RefreshCookieOptions;
}

#[async_trait]
impl AuthService for SessionManager {
    async fn signup(&self, request: SignupRequest) -> Result<AuthResponse, AuthError> {
        SessionManager::signup(self, request).await
    }

    async fn login(
        &self,
        origin: Option<&str>,
        request: LoginRequest,
    ) -> Result<AuthResponse, AuthError> {
        SessionManager::login(self, origin, request).await
    }

    async fn refresh(&self, user_id: Uuid, refresh_token: &str) -> Result<TokenPair, AuthError> {
        SessionManager::refresh(self, user_id, refresh_token).await
    }

    async fn refresh_with_token(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        SessionManager::refresh_with_token(self, refresh_token).await
    }

    async fn logout(&self, user_id: Uuid) -> Result<(), AuthError> {
        SessionManager::logout(self, user_id).await
    }

    async fn authenticate(&self, access_token: &str) -> Result<SafeUser, AuthError> {
        SessionManager::authenticate(self, access_token).await
    }

    fn refresh_cookie_options(&self) -> RefreshCookieOptions {
        SessionManager::refresh_cookie_options(self)
    }
}
