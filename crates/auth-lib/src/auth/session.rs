// ============================
// crates/auth-lib/src/auth/session.rs
// ============================
//! Session lifecycle over a user's stored refresh-token hash.
//!
//! A user is either without a session (`refresh_token_hash` is `None`) or has
//! exactly one active refresh token, whose hash is stored. Signup and login
//! open a session, refresh rotates it, logout closes it.
use std::sync::Arc;

use metrics::counter;
use tokio::sync::OnceCell;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use zeroize::Zeroize;

use tokenwarden_common::{
    AuthResponse, LoginRequest, RefreshCookieOptions, SafeUser, SameSite, SignupRequest,
    TokenPair, REFRESH_COOKIE_PATH,
};

use super::password::CredentialHasher;
use super::rate_limit::{attempt_key, AttemptOutcome, LoginRateLimiter};
use super::tokens::TokenIssuer;
use crate::config::Settings;
use crate::error::AuthError;
use crate::metrics::{
    LOGIN_FAILED, LOGIN_SUCCEEDED, LOGOUT, REFRESH_REJECTED, REFRESH_ROTATED, SIGNUP_COMPLETED,
};
use crate::storage::{NewUser, StoredUser, UserStore};

/// Verified against when a login names an unknown email
const DUMMY_PASSWORD: &str = "tokenwarden-dummy-password";

/// Session manager for signup, login, refresh and logout
pub struct SessionManager {
    store: Arc<dyn UserStore>,
    hasher: Arc<dyn CredentialHasher>,
    tokens: TokenIssuer,
    limiter: Arc<LoginRateLimiter>,
    hash_cost: u32,
    secure_cookies: bool,
    cookie_domain: Option<String>,
    dummy_hash: OnceCell<String>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("hasher", &self.hasher.name())
            .field("tokens", &self.tokens)
            .field("hash_cost", &self.hash_cost)
            .field("secure_cookies", &self.secure_cookies)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(
        store: Arc<dyn UserStore>,
        hasher: Arc<dyn CredentialHasher>,
        tokens: TokenIssuer,
        limiter: Arc<LoginRateLimiter>,
        settings: &Settings,
    ) -> Self {
        Self {
            store,
            hasher,
            tokens,
            limiter,
            hash_cost: settings.hash_cost,
            secure_cookies: settings.secure_cookies(),
            cookie_domain: settings
                .refresh_cookie_domain
                .clone()
                .filter(|domain| !domain.trim().is_empty()),
            dummy_hash: OnceCell::new(),
        }
    }

    /// Register an account and open its first session.
    ///
    /// Creating the user and opening its session are separate store calls. If
    /// the second fails the account exists without a session: a retried signup
    /// reads `DuplicateAccount`, and a login opens the session instead.
    #[instrument(skip_all)]
    pub async fn signup(&self, request: SignupRequest) -> Result<AuthResponse, AuthError> {
        let SignupRequest {
            first_name,
            last_name,
            email,
            mut password,
            mut confirm_password,
            phone,
            bio,
        } = request;

        let confirmed = password == confirm_password;
        confirm_password.zeroize();
        if !confirmed {
            password.zeroize();
            return Err(AuthError::PasswordConfirmationMismatch);
        }

        if self.store.find_by_email(&email).await?.is_some() {
            password.zeroize();
            return Err(AuthError::DuplicateAccount);
        }

        let password_hash = self.hash_secret(password).await?;
        let user = self
            .store
            .create_user(NewUser {
                first_name,
                last_name,
                email,
                password_hash,
                phone,
                bio,
                profile_image_url: None,
            })
            .await?;

        let tokens = match self.open_session(&user).await {
            Ok(tokens) => tokens,
            Err(err) => {
                warn!(user_id = %user.id, error = %err, "account created without a session");
                return Err(err);
            }
        };
        info!(user_id = %user.id, "account created");
        counter!(SIGNUP_COMPLETED).increment(1);

        Ok(AuthResponse {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            user: user.to_safe_user(),
        })
    }

    /// Check credentials and open a new session, replacing any existing one.
    ///
    /// Throttled per `origin:email`; every failure reads `InvalidCredentials`
    /// regardless of whether the email exists.
    #[instrument(skip(self, request))]
    pub async fn login(
        &self,
        origin: Option<&str>,
        request: LoginRequest,
    ) -> Result<AuthResponse, AuthError> {
        let key = attempt_key(origin, Some(&request.email));
        let permit = self.limiter.check_and_record(&key)?;

        let result = self.authenticate_credentials(request).await;
        match &result {
            Ok(response) => {
                permit.settle(AttemptOutcome::Succeeded);
                info!(user_id = %response.user.id, "login succeeded");
                counter!(LOGIN_SUCCEEDED).increment(1);
            }
            Err(err) => {
                permit.settle(AttemptOutcome::Failed);
                warn!(key = %key, error = %err, "login failed");
                counter!(LOGIN_FAILED).increment(1);
            }
        }
        result
    }

    async fn authenticate_credentials(
        &self,
        request: LoginRequest,
    ) -> Result<AuthResponse, AuthError> {
        let LoginRequest { email, password } = request;

        let Some(user) = self.store.find_by_email(&email).await? else {
            // Pay for one verification so unknown emails cost the same.
            let dummy = self.dummy_hash().await?.clone();
            self.verify_secret(password, dummy).await?;
            return Err(AuthError::InvalidCredentials);
        };

        if !self
            .verify_secret(password, user.password_hash.clone())
            .await?
        {
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.open_session(&user).await?;
        Ok(AuthResponse {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            user: user.to_safe_user(),
        })
    }

    /// Rotate the session of `user_id`.
    ///
    /// The presented token must be a valid refresh JWT for that user and match
    /// the stored hash; the previous token stops verifying once this returns.
    #[instrument(skip(self, presented_token))]
    pub async fn refresh(
        &self,
        user_id: Uuid,
        presented_token: &str,
    ) -> Result<TokenPair, AuthError> {
        let result = self.rotate(user_id, presented_token).await;
        match &result {
            Ok(_) => {
                info!("refresh token rotated");
                counter!(REFRESH_ROTATED).increment(1);
            }
            Err(AuthError::InvalidRefreshToken) => {
                warn!("refresh token rejected");
                counter!(REFRESH_REJECTED).increment(1);
            }
            Err(_) => {}
        }
        result
    }

    /// Rotate using only the presented token, taking the user from its claims
    pub async fn refresh_with_token(&self, presented_token: &str) -> Result<TokenPair, AuthError> {
        let claims = match self.tokens.verify_refresh_token(presented_token) {
            Ok(claims) => claims,
            Err(err) => {
                counter!(REFRESH_REJECTED).increment(1);
                return Err(err);
            }
        };
        self.refresh(claims.sub, presented_token).await
    }

    async fn rotate(&self, user_id: Uuid, presented_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self.tokens.verify_refresh_token(presented_token)?;
        if claims.sub != user_id {
            return Err(AuthError::InvalidRefreshToken);
        }

        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;
        let Some(stored_hash) = user.refresh_token_hash.clone() else {
            return Err(AuthError::InvalidRefreshToken);
        };

        if !self
            .verify_secret(presented_token.to_string(), stored_hash)
            .await?
        {
            return Err(AuthError::InvalidRefreshToken);
        }

        self.open_session(&user).await
    }

    /// Close the session of `user_id`. Idempotent; unknown ids are fine.
    #[instrument(skip(self))]
    pub async fn logout(&self, user_id: Uuid) -> Result<(), AuthError> {
        self.store.set_refresh_token_hash(user_id, None).await?;
        info!("session closed");
        counter!(LOGOUT).increment(1);
        Ok(())
    }

    /// Resolve an access token to the user it was issued for
    pub async fn authenticate(&self, access_token: &str) -> Result<SafeUser, AuthError> {
        let claims = self.tokens.verify_access_token(access_token)?;
        let user = self
            .store
            .find_by_id(claims.sub)
            .await?
            .ok_or(AuthError::InvalidAccessToken)?;
        Ok(user.to_safe_user())
    }

    /// Attributes for the cookie carrying the refresh token
    pub fn refresh_cookie_options(&self) -> RefreshCookieOptions {
        RefreshCookieOptions {
            http_only: true,
            secure: self.secure_cookies,
            same_site: SameSite::Lax,
            path: REFRESH_COOKIE_PATH.to_string(),
            max_age: self.tokens.refresh_ttl().as_millis() as u64,
            domain: self.cookie_domain.clone(),
        }
    }

    /// Mint a pair for `user` and store the refresh token's hash
    async fn open_session(&self, user: &StoredUser) -> Result<TokenPair, AuthError> {
        let tokens = self.tokens.issue_pair(user.id, &user.email)?;
        let refresh_hash = self.hash_secret(tokens.refresh_token.clone()).await?;
        self.store
            .set_refresh_token_hash(user.id, Some(refresh_hash))
            .await?;
        Ok(tokens)
    }

    async fn dummy_hash(&self) -> Result<&String, AuthError> {
        self.dummy_hash
            .get_or_try_init(|| self.hash_secret(DUMMY_PASSWORD.to_string()))
            .await
    }

    /// Hash on the blocking pool; the plaintext is wiped afterwards
    async fn hash_secret(&self, mut value: String) -> Result<String, AuthError> {
        let hasher = Arc::clone(&self.hasher);
        let cost = self.hash_cost;
        tokio::task::spawn_blocking(move || {
            let hashed = hasher.hash(&value, cost);
            value.zeroize();
            hashed
        })
        .await?
    }

    async fn verify_secret(&self, mut value: String, hash: String) -> Result<bool, AuthError> {
        let hasher = Arc::clone(&self.hasher);
        let matched = tokio::task::spawn_blocking(move || {
            let matched = hasher.verify(&value, &hash);
            value.zeroize();
            matched
        })
        .await?;
        Ok(matched)
    }
}
