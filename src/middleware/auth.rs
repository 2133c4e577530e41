use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use aula_auth::{Claims, verify_token};
use aula_core::AppError;
use aula_models::enums::UserRole;
use aula_models::ids::UserId;

use crate::state::AppState;

/// Extractor that validates the Bearer JWT and yields the caller's claims.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// The caller's role, as carried in the token.
    pub fn role(&self) -> UserRole {
        self.0.role
    }

    /// The caller's user ID parsed from the subject claim.
    pub fn user_id(&self) -> Result<UserId, AppError> {
        self.0
            .sub
            .parse::<UserId>()
            .map_err(|_| AppError::unauthorized("Invalid user ID in token".to_string()))
    }

    /// The caller's username.
    pub fn username(&self) -> &str {
        &self.0.username
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing authorization header".to_string()))?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::unauthorized("Invalid authorization header format".to_string())
        })?;

        let claims = verify_token(token, &state.jwt_config)?;

        Ok(AuthUser(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn claims_with_role(role: UserRole) -> Claims {
        Claims {
            sub: Uuid::new_v4().to_string(),
            username: "test".to_string(),
            role,
            exp: 9999999999,
            iat: 1234567890,
        }
    }

    #[test]
    fn test_role_accessor() {
        let auth_user = AuthUser(claims_with_role(UserRole::Coordinator));
        assert_eq!(auth_user.role(), UserRole::Coordinator);
    }

    #[test]
    fn test_user_id_parses_subject() {
        let uuid = Uuid::new_v4();
        let mut claims = claims_with_role(UserRole::Teacher);
        claims.sub = uuid.to_string();
        let auth_user = AuthUser(claims);
        assert_eq!(auth_user.user_id().unwrap().into_inner(), uuid);
    }

    #[test]
    fn test_user_id_rejects_garbage_subject() {
        let mut claims = claims_with_role(UserRole::Teacher);
        claims.sub = "not-a-uuid".to_string();
        let auth_user = AuthUser(claims);
        assert!(auth_user.user_id().is_err());
    }
}
