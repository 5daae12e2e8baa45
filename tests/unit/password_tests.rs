// ============================
// tests/unit/password_tests.rs
// ============================
//! Hashing behaviour shared by passwords and refresh tokens
use auth_lib::auth::{select_hasher, CredentialHasher, ScryptFallbackHasher, FALLBACK_PREFIX};

use crate::test_utils::TEST_HASH_COST;

#[test]
fn test_hashes_are_salted() {
    let hasher = select_hasher();
    let first = hasher.hash("Secure123", TEST_HASH_COST).unwrap();
    let second = hasher.hash("Secure123", TEST_HASH_COST).unwrap();

    assert_ne!(first, second);
    assert_ne!(first, "Secure123");
    assert!(hasher.verify("Secure123", &first));
    assert!(hasher.verify("Secure123", &second));
    assert!(!hasher.verify("Secure1234", &first));
}

#[test]
fn test_fallback_format_is_stable() {
    let hash = ScryptFallbackHasher.hash("Secure123", 3).unwrap();
    let mut parts = hash.split(':');

    assert_eq!(parts.next(), Some(FALLBACK_PREFIX));
    assert_eq!(parts.next(), Some("3"));
    assert_eq!(parts.next().map(str::len), Some(32));
    assert_eq!(parts.next().map(str::len), Some(128));
    assert_eq!(parts.next(), None);
}

#[test]
fn test_fallback_hashes_verify_under_selected_backend() {
    let legacy = ScryptFallbackHasher.hash("Secure123", TEST_HASH_COST).unwrap();
    let hasher = select_hasher();
    assert!(hasher.verify("Secure123", &legacy));
    assert!(!hasher.verify("secure123", &legacy));
}

#[test]
fn test_garbage_hashes_never_verify() {
    let hasher = select_hasher();
    for garbage in ["", "plain", "fallback:abc", "$2b$", "fallback:1:aa:zz"] {
        assert!(!hasher.verify("Secure123", garbage), "{garbage:?}");
    }
}
