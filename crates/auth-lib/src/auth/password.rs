// ============================
// crates/auth-lib/src/auth/password.rs
// ============================
//! One-way hashing for passwords and refresh tokens.
//!
//! Two backends implement [`CredentialHasher`]:
//!
//! * [`BcryptHasher`], the primary, available with the `bcrypt` feature.
//! * [`ScryptFallbackHasher`], used only when bcrypt is not compiled in.
//!   It emulates a work factor by repeating the input before running scrypt,
//!   which is strictly weaker than bcrypt's exponential cost.
//!
//! The backend is chosen once, by [`select_hasher`].
use std::sync::Arc;

use scrypt::Params;
use subtle::ConstantTimeEq;

use crate::error::AuthError;

/// Tag that starts every fallback hash
pub const FALLBACK_PREFIX: &str = "fallback";

const SALT_LEN: usize = 16;
const KEY_LEN: usize = 64;
const SCRYPT_LOG_N: u8 = 14;
const SCRYPT_R: u32 = 8;
const SCRYPT_P: u32 = 1;

/// Upper bound on fallback rounds, for hashing and parsing alike
const MAX_FALLBACK_ROUNDS: u32 = 64;

/// Hash + verify capability shared by passwords and refresh tokens
pub trait CredentialHasher: Send + Sync + std::fmt::Debug {
    /// Backend name, for logs
    fn name(&self) -> &'static str;

    /// Hash `value` with a fresh random salt
    fn hash(&self, value: &str, cost: u32) -> Result<String, AuthError>;

    /// Check `value` against `hash`. Malformed hashes verify as `false`.
    fn verify(&self, value: &str, hash: &str) -> bool;
}

/// Pick the hashing backend for this process
#[cfg(feature = "bcrypt")]
pub fn select_hasher() -> Arc<dyn CredentialHasher> {
    tracing::info!(backend = "bcrypt", "password hasher selected");
    Arc::new(BcryptHasher)
}

/// Pick the hashing backend for this process
#[cfg(not(feature = "bcrypt"))]
pub fn select_hasher() -> Arc<dyn CredentialHasher> {
    tracing::warn!(
        backend = "scrypt-fallback",
        "bcrypt backend not compiled in, using the weaker scrypt fallback"
    );
    Arc::new(ScryptFallbackHasher)
}

/// bcrypt over a SHA-256 pre-digest of the value.
///
/// bcrypt only reads 72 bytes; signed refresh tokens for one user share a
/// longer prefix than that, so the whole value is digested first.
#[cfg(feature = "bcrypt")]
#[derive(Debug, Clone, Copy, Default)]
pub struct BcryptHasher;

#[cfg(feature = "bcrypt")]
impl BcryptHasher {
    fn prehash(value: &str) -> String {
        use base64::{engine::general_purpose::STANDARD, Engine as _};
        use sha2::{Digest, Sha256};

        STANDARD.encode(Sha256::digest(value.as_bytes()))
    }
}

#[cfg(feature = "bcrypt")]
impl CredentialHasher for BcryptHasher {
    fn name(&self) -> &'static str {
        "bcrypt"
    }

    fn hash(&self, value: &str, cost: u32) -> Result<String, AuthError> {
        bcrypt::hash(Self::prehash(value), cost).map_err(|e| AuthError::Hashing(e.to_string()))
    }

    fn verify(&self, value: &str, hash: &str) -> bool {
        if is_fallback_hash(hash) {
            return ScryptFallbackHasher.verify(value, hash);
        }
        bcrypt::verify(Self::prehash(value), hash).unwrap_or(false)
    }
}

/// scrypt with repetition standing in for a work factor
#[derive(Debug, Clone, Copy, Default)]
pub struct ScryptFallbackHasher;

impl ScryptFallbackHasher {
    fn derive(value: &str, rounds: u32, salt: &str) -> Result<[u8; KEY_LEN], AuthError> {
        let payload = value.repeat(rounds as usize);
        let params = Params::new(SCRYPT_LOG_N, SCRYPT_R, SCRYPT_P, KEY_LEN)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;

        let mut key = [0u8; KEY_LEN];
        scrypt::scrypt(payload.as_bytes(), salt.as_bytes(), &params, &mut key)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;
        Ok(key)
    }
}

impl CredentialHasher for ScryptFallbackHasher {
    fn name(&self) -> &'static str {
        "scrypt-fallback"
    }

    /// A cost of 0 is floored to one round; above the ceiling is an error.
    fn hash(&self, value: &str, cost: u32) -> Result<String, AuthError> {
        let rounds = cost.max(1);
        if rounds > MAX_FALLBACK_ROUNDS {
            return Err(AuthError::Hashing(format!(
                "fallback rounds {rounds} exceed {MAX_FALLBACK_ROUNDS}"
            )));
        }
        let salt = hex::encode(rand::random::<[u8; SALT_LEN]>());
        let key = Self::derive(value, rounds, &salt)?;
        Ok(format!("{FALLBACK_PREFIX}:{rounds}:{salt}:{}", hex::encode(key)))
    }

    fn verify(&self, value: &str, hash: &str) -> bool {
        let Some((rounds, salt, stored)) = parse_fallback(hash) else {
            return false;
        };
        match Self::derive(value, rounds, salt) {
            Ok(key) => key[..].ct_eq(&stored[..]).into(),
            Err(_) => false,
        }
    }
}

#[cfg(feature = "bcrypt")]
fn is_fallback_hash(hash: &str) -> bool {
    hash.strip_prefix(FALLBACK_PREFIX)
        .is_some_and(|rest| rest.starts_with(':'))
}

/// Split `fallback:<rounds>:<salt>:<hex-digest>`
fn parse_fallback(hash: &str) -> Option<(u32, &str, Vec<u8>)> {
    let rest = hash.strip_prefix(FALLBACK_PREFIX)?.strip_prefix(':')?;
    let mut parts = rest.split(':');
    let rounds = parts.next().filter(|s| !s.is_empty())?;
    let salt = parts.next().filter(|s| !s.is_empty())?;
    let digest = parts.next().filter(|s| !s.is_empty())?;
    if parts.next().is_some() {
        return None;
    }

    let rounds: u32 = rounds.parse().ok()?;
    if !(1..=MAX_FALLBACK_ROUNDS).contains(&rounds) {
        return None;
    }
    let digest = hex::decode(digest).ok()?;
    Some((rounds, salt, digest))
}
