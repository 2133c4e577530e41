//! Staff user models and authentication DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::enums::UserRole;
use crate::ids::UserId;

/// A staff user account.
///
/// The password hash never leaves the auth service; this struct is the
/// safe-to-serialize projection used everywhere else.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// DTO for registering a new user.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterRequestDto {
    /// Unique username (3-50 chars, letters/digits/underscore/dash)
    #[validate(length(min = 3, max = 50), custom(function = validate_username))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    /// At least 8 chars with an uppercase, a lowercase and a digit
    #[validate(length(min = 8, max = 100), custom(function = validate_password_strength))]
    pub password: String,
    #[validate(length(min = 3, max = 200))]
    pub full_name: String,
    pub role: UserRole,
}

/// DTO for logging in.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    #[validate(length(min = 1, max = 100))]
    pub password: String,
}

/// JWT issued after a successful login.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    /// Seconds until the token expires
    pub expires_in: i64,
}

/// DTO for changing the current user's password.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordDto {
    #[validate(length(min = 1, max = 100))]
    pub current_password: String,
    #[validate(length(min = 8, max = 100), custom(function = validate_password_strength))]
    pub new_password: String,
}

/// Generic message payload.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

fn validate_username(username: &str) -> Result<(), ValidationError> {
    let valid = username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("username_format").with_message(
            "username may only contain letters, digits, underscores and dashes".into(),
        ))
    }
}

fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if has_upper && has_lower && has_digit {
        Ok(())
    } else {
        Err(ValidationError::new("password_strength").with_message(
            "password must contain an uppercase letter, a lowercase letter and a digit".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_dto(username: &str, password: &str) -> RegisterRequestDto {
        RegisterRequestDto {
            username: username.to_string(),
            email: "user@example.com".to_string(),
            password: password.to_string(),
            full_name: "Test User".to_string(),
            role: UserRole::Teacher,
        }
    }

    #[test]
    fn test_register_dto_valid() {
        assert!(register_dto("jdoe", "Passw0rd!").validate().is_ok());
    }

    #[test]
    fn test_register_rejects_bad_username() {
        assert!(register_dto("j doe", "Passw0rd!").validate().is_err());
        assert!(register_dto("jd", "Passw0rd!").validate().is_err());
    }

    #[test]
    fn test_register_rejects_weak_password() {
        // Missing digit
        assert!(register_dto("jdoe", "Password!").validate().is_err());
        // Missing uppercase
        assert!(register_dto("jdoe", "passw0rd!").validate().is_err());
        // Too short
        assert!(register_dto("jdoe", "Pw0rd").validate().is_err());
    }

    #[test]
    fn test_change_password_requires_strong_new_password() {
        let dto = ChangePasswordDto {
            current_password: "old".to_string(),
            new_password: "weak".to_string(),
        };
        assert!(dto.validate().is_err());

        let dto = ChangePasswordDto {
            current_password: "old".to_string(),
            new_password: "NewPassw0rd".to_string(),
        };
        assert!(dto.validate().is_ok());
    }
}
