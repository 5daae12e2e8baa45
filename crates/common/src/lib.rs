// ============================
// crates/common/src/lib.rs
// ============================
//! Common types exchanged between the credential core and the
//! HTTP boundary that fronts it.
//! Every struct here is wire-facing: field names are camelCase on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name of the cookie that carries the refresh token.
pub const REFRESH_COOKIE_NAME: &str = "refresh_token";

/// Path the refresh cookie is scoped to.
pub const REFRESH_COOKIE_PATH: &str = "/auth";

/// Account registration payload
/// # Fields
/// * `email` - Login email, compared case-insensitively
/// * `password` - Plaintext password, zeroized once hashed
/// * `confirm_password` - Must equal `password`
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

/// Credentials presented at login
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Freshly minted access/refresh pair. Never persisted as-is.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// User view with every credential hash stripped
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SafeUser {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub profile_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of signup and login.
///
/// The boundary is expected to move `refresh_token` into the refresh cookie
/// and only serialize `access_token` and `user` into the response body.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: SafeUser,
}

/// `SameSite` cookie attribute
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

/// Attributes the boundary applies to the refresh cookie
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RefreshCookieOptions {
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
    pub path: String,
    /// Lifetime in milliseconds
    pub max_age: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}
