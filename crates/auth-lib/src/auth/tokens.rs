// ============================
// crates/auth-lib/src/auth/tokens.rs
// ============================
//! Signed access and refresh tokens.
//!
//! Both are HS256 JWTs, signed with two distinct secrets so that neither kind
//! can be replayed as the other. Access tokens live 15 minutes; refresh tokens
//! live 7 days and carry a random `tokenId` so every issued value is unique,
//! which is what makes the stored refresh hash change on each rotation.
//!
//! The issuer is stateless: persisting the refresh token's hash is the
//! session manager's job.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokenwarden_common::TokenPair;
use uuid::Uuid;

use crate::config::Settings;
use crate::error::AuthError;

/// Access token lifetime
pub const ACCESS_TOKEN_TTL: Duration = Duration::from_secs(15 * 60);

/// Refresh token lifetime
pub const REFRESH_TOKEN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Claims embedded in every access token
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AccessClaims {
    /// Subject, the user id
    pub sub: Uuid,
    pub email: String,
    /// Unique per token, so two tokens minted in the same second still differ
    pub jti: Uuid,
    /// Issued-at (UTC Unix timestamp)
    pub iat: i64,
    /// Expiration (UTC Unix timestamp)
    pub exp: i64,
}

/// Claims embedded in every refresh token
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RefreshClaims {
    pub sub: Uuid,
    pub email: String,
    #[serde(rename = "tokenId")]
    pub token_id: Uuid,
    pub iat: i64,
    pub exp: i64,
}

struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKey {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// Mints and checks both token kinds
#[derive(Clone)]
pub struct TokenIssuer {
    access: Arc<SigningKey>,
    refresh: Arc<SigningKey>,
    access_ttl: Duration,
    refresh_ttl: Duration,
    validation: Validation,
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    /// Build an issuer with the default lifetimes.
    ///
    /// Fails with `MisconfiguredSecret` when either secret is empty or both
    /// are the same; this is a startup error, never a per-request one.
    pub fn new(access_secret: &str, refresh_secret: &str) -> Result<Self, AuthError> {
        Self::with_lifetimes(access_secret, refresh_secret, ACCESS_TOKEN_TTL, REFRESH_TOKEN_TTL)
    }

    pub fn with_lifetimes(
        access_secret: &str,
        refresh_secret: &str,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Result<Self, AuthError> {
        if access_secret.trim().is_empty() {
            return Err(AuthError::MisconfiguredSecret(
                "access token secret is empty".to_string(),
            ));
        }
        if refresh_secret.trim().is_empty() {
            return Err(AuthError::MisconfiguredSecret(
                "refresh token secret is empty".to_string(),
            ));
        }
        if access_secret == refresh_secret {
            return Err(AuthError::MisconfiguredSecret(
                "access and refresh token secrets must differ".to_string(),
            ));
        }

        Ok(Self {
            access: Arc::new(SigningKey::from_secret(access_secret)),
            refresh: Arc::new(SigningKey::from_secret(refresh_secret)),
            access_ttl,
            refresh_ttl,
            validation: Validation::new(Algorithm::HS256),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, AuthError> {
        Self::new(&settings.access_token_secret, &settings.refresh_token_secret)
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Mint a short-lived access token
    pub fn issue_access_token(&self, user_id: Uuid, email: &str) -> Result<String, AuthError> {
        let (iat, exp) = window(self.access_ttl);
        let claims = AccessClaims {
            sub: user_id,
            email: email.to_string(),
            jti: Uuid::new_v4(),
            iat,
            exp,
        };
        Ok(encode(&Header::default(), &claims, &self.access.encoding)?)
    }

    /// Mint a refresh token with a fresh `tokenId`
    pub fn issue_refresh_token(&self, user_id: Uuid, email: &str) -> Result<String, AuthError> {
        let (iat, exp) = window(self.refresh_ttl);
        let claims = RefreshClaims {
            sub: user_id,
            email: email.to_string(),
            token_id: Uuid::new_v4(),
            iat,
            exp,
        };
        Ok(encode(&Header::default(), &claims, &self.refresh.encoding)?)
    }

    pub fn issue_pair(&self, user_id: Uuid, email: &str) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access_token: self.issue_access_token(user_id, email)?,
            refresh_token: self.issue_refresh_token(user_id, email)?,
        })
    }

    /// Check signature and expiry of an access token
    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, AuthError> {
        self.decode(token, &self.access.decoding)
            .ok_or(AuthError::InvalidAccessToken)
    }

    /// Check signature and expiry of a refresh token
    pub fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaims, AuthError> {
        self.decode(token, &self.refresh.decoding)
            .ok_or(AuthError::InvalidRefreshToken)
    }

    fn decode<T: DeserializeOwned>(&self, token: &str, key: &DecodingKey) -> Option<T> {
        match decode::<T>(token, key, &self.validation) {
            Ok(data) => Some(data.claims),
            Err(err) => {
                tracing::debug!(error = %err, "token rejected");
                None
            }
        }
    }
}

fn window(ttl: Duration) -> (i64, i64) {
    let now = chrono::Utc::now().timestamp();
    (now, now + ttl.as_secs() as i64)
}
