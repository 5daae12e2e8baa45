// ==========================
// tests/unit/token_tests.rs
// ==========================
use auth_lib::auth::{TokenIssuer, ACCESS_TOKEN_TTL, REFRESH_TOKEN_TTL};
use auth_lib::error::AuthError;
use uuid::Uuid;

use crate::test_utils::test_settings;

#[test]
fn test_lifetimes() {
    assert_eq!(ACCESS_TOKEN_TTL.as_secs(), 900);
    assert_eq!(REFRESH_TOKEN_TTL.as_secs(), 604_800);
}

#[test]
fn test_refresh_claims_carry_token_id() {
    let issuer = TokenIssuer::from_settings(&test_settings()).unwrap();
    let user_id = Uuid::new_v4();
    let token = issuer.issue_refresh_token(user_id, "ada@example.com").unwrap();

    let claims = issuer.verify_refresh_token(&token).unwrap();
    let json = serde_json::to_value(&claims).unwrap();
    assert_eq!(json["sub"], user_id.to_string());
    assert!(json.get("tokenId").is_some());
}

#[test]
fn test_rotated_secret_invalidates_tokens() {
    let settings = test_settings();
    let issuer = TokenIssuer::from_settings(&settings).unwrap();
    let pair = issuer.issue_pair(Uuid::new_v4(), "ada@example.com").unwrap();

    let rotated = TokenIssuer::new(&settings.access_token_secret, "new-refresh-secret").unwrap();
    assert!(rotated.verify_access_token(&pair.access_token).is_ok());
    assert!(matches!(
        rotated.verify_refresh_token(&pair.refresh_token),
        Err(AuthError::InvalidRefreshToken)
    ));
}
