use uuid::Uuid;

use aula_auth::{JwtConfig, create_access_token, verify_token};
use aula_models::enums::UserRole;

fn test_config() -> JwtConfig {
    JwtConfig {
        secret: "integration-test-secret-32-characters!!".to_string(),
        access_token_expiry: 3600,
    }
}

#[test]
fn test_create_and_verify_token() {
    let config = test_config();
    let user_id = Uuid::new_v4();

    let token = create_access_token(user_id, "jdoe", UserRole::Coordinator, &config).unwrap();
    let claims = verify_token(&token, &config).unwrap();

    assert_eq!(claims.sub, user_id.to_string());
    assert_eq!(claims.username, "jdoe");
    assert_eq!(claims.role, UserRole::Coordinator);
}

#[test]
fn test_token_carries_expiry_window() {
    let config = test_config();

    let token = create_access_token(Uuid::new_v4(), "jdoe", UserRole::Teacher, &config).unwrap();
    let claims = verify_token(&token, &config).unwrap();

    assert_eq!(claims.exp - claims.iat, 3600);
}

#[test]
fn test_verify_with_wrong_secret_fails() {
    let config = test_config();
    let other = JwtConfig {
        secret: "a-completely-different-secret-key!!!!!!".to_string(),
        access_token_expiry: 3600,
    };

    let token = create_access_token(Uuid::new_v4(), "jdoe", UserRole::Admin, &config).unwrap();

    assert!(verify_token(&token, &other).is_err());
}

#[test]
fn test_verify_tampered_token_fails() {
    let config = test_config();

    let token = create_access_token(Uuid::new_v4(), "jdoe", UserRole::Admin, &config).unwrap();
    let mut tampered = token.clone();
    tampered.push('x');

    assert!(verify_token(&tampered, &config).is_err());
}

#[test]
fn test_verify_garbage_fails() {
    assert!(verify_token("definitely.not.a-jwt", &test_config()).is_err());
}
