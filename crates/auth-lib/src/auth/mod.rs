// ============================
// crates/auth-lib/src/auth/mod.rs
// ============================
//! Credential core: hashing, throttling, token minting and the session lifecycle.

pub mod password;
pub mod rate_limit;
pub mod session;
pub mod tokens;
mod service;

pub use password::{select_hasher, CredentialHasher, ScryptFallbackHasher, FALLBACK_PREFIX};
#[cfg(feature = "bcrypt")]
pub use password::BcryptHasher;
pub use rate_limit::{attempt_key, AttemptOutcome, AttemptPermit, ClearPolicy, LoginRateLimiter};
pub use service::AuthService;
pub use session::SessionManager;
pub use tokens::{AccessClaims, RefreshClaims, TokenIssuer, ACCESS_TOKEN_TTL, REFRESH_TOKEN_TTL};
