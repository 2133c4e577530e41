use sqlx::PgPool;
use tracing::instrument;

use aula_auth::JwtConfig;
use aula_auth::jwt::create_access_token;
use aula_core::AppError;
use aula_core::password::{hash_password, verify_password};
use aula_models::enums::UserRole;
use aula_models::ids::UserId;

use crate::modules::auth::model::{
    ChangePasswordDto, LoginRequest, RegisterRequestDto, TokenResponse, User,
};

const USER_COLUMNS: &str =
    "id, username, email, full_name, role, is_active, created_at, updated_at";

pub struct AuthService;

impl AuthService {
    /// Register a new staff user.
    ///
    /// Usernames are stored lowercased; username and email must both be
    /// unique.
    #[instrument(skip(db, dto))]
    pub async fn register_user(db: &PgPool, dto: RegisterRequestDto) -> Result<User, AppError> {
        let username = dto.username.to_lowercase();

        let taken = sqlx::query_as::<_, (String, String)>(
            "SELECT username, email FROM users WHERE username = $1 OR email = $2",
        )
        .bind(&username)
        .bind(&dto.email)
        .fetch_optional(db)
        .await?;

        if let Some((existing_username, _)) = taken {
            if existing_username == username {
                return Err(AppError::bad_request(anyhow::anyhow!(
                    "Username is already registered"
                )));
            }
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Email is already registered"
            )));
        }

        let hashed_password = hash_password(&dto.password)?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"INSERT INTO users (username, email, password_hash, full_name, role)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING {USER_COLUMNS}"#
        ))
        .bind(&username)
        .bind(&dto.email)
        .bind(&hashed_password)
        .bind(&dto.full_name)
        .bind(dto.role)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                return AppError::bad_request(anyhow::anyhow!(
                    "Username or email is already registered"
                ));
            }
            AppError::from(e)
        })?;

        Ok(user)
    }

    /// Authenticate with username and password and issue a JWT.
    #[instrument(skip(db, dto, jwt_config))]
    pub async fn login_user(
        db: &PgPool,
        dto: LoginRequest,
        jwt_config: &JwtConfig,
    ) -> Result<TokenResponse, AppError> {
        #[derive(sqlx::FromRow)]
        struct UserWithPassword {
            id: UserId,
            username: String,
            password_hash: String,
            role: UserRole,
            is_active: bool,
        }

        let user = sqlx::query_as::<_, UserWithPassword>(
            "SELECT id, username, password_hash, role, is_active FROM users WHERE username = $1",
        )
        .bind(dto.username.to_lowercase())
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::unauthorized("Invalid username or password".to_string()))?;

        let is_valid = verify_password(&dto.password, &user.password_hash)?;
        if !is_valid {
            return Err(AppError::unauthorized(
                "Invalid username or password".to_string(),
            ));
        }

        if !user.is_active {
            return Err(AppError::forbidden("User account is inactive".to_string()));
        }

        let access_token =
            create_access_token(user.id.into_inner(), &user.username, user.role, jwt_config)?;

        Ok(TokenResponse {
            access_token,
            token_type: "bearer".to_string(),
            expires_in: jwt_config.access_token_expiry,
        })
    }

    /// Fetch the authenticated user's profile.
    #[instrument(skip(db))]
    pub async fn get_user_by_id(db: &PgPool, user_id: UserId) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))?;

        Ok(user)
    }

    /// Change the authenticated user's password after verifying the
    /// current one.
    #[instrument(skip(db, dto))]
    pub async fn change_password(
        db: &PgPool,
        user_id: UserId,
        dto: ChangePasswordDto,
    ) -> Result<(), AppError> {
        let current_hash = sqlx::query_scalar::<_, String>(
            "SELECT password_hash FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))?;

        let is_valid = verify_password(&dto.current_password, &current_hash)?;
        if !is_valid {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Current password is incorrect"
            )));
        }

        if dto.new_password == dto.current_password {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "New password must differ from the current one"
            )));
        }

        let new_hash = hash_password(&dto.new_password)?;

        sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
            .bind(&new_hash)
            .bind(user_id)
            .execute(db)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use uuid::Uuid;

    fn register_dto(username: &str, email: &str) -> RegisterRequestDto {
        RegisterRequestDto {
            username: username.to_string(),
            email: email.to_string(),
            password: "Passw0rd!".to_string(),
            full_name: "Test User".to_string(),
            role: UserRole::Teacher,
        }
    }

    fn test_jwt_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            access_token_expiry: 3600,
        }
    }

    fn unique_name() -> String {
        format!("user{}", &Uuid::new_v4().simple().to_string()[..12])
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_register_and_login(pool: PgPool) {
        let name = unique_name();
        let user =
            AuthService::register_user(&pool, register_dto(&name, &format!("{name}@test.com")))
                .await
                .unwrap();

        assert_eq!(user.username, name);
        assert_eq!(user.role, UserRole::Teacher);
        assert!(user.is_active);

        let token = AuthService::login_user(
            &pool,
            LoginRequest {
                username: name,
                password: "Passw0rd!".to_string(),
            },
            &test_jwt_config(),
        )
        .await
        .unwrap();

        assert_eq!(token.token_type, "bearer");
        assert_eq!(token.expires_in, 3600);
        assert!(!token.access_token.is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_register_lowercases_username(pool: PgPool) {
        let name = unique_name().to_uppercase();
        let user =
            AuthService::register_user(&pool, register_dto(&name, "upper@test.com"))
                .await
                .unwrap();
        assert_eq!(user.username, name.to_lowercase());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_register_duplicate_username(pool: PgPool) {
        let name = unique_name();
        AuthService::register_user(&pool, register_dto(&name, "first@test.com"))
            .await
            .unwrap();

        let err = AuthService::register_user(&pool, register_dto(&name, "second@test.com"))
            .await
            .unwrap_err();

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.error.to_string().contains("Username"));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_register_duplicate_email(pool: PgPool) {
        AuthService::register_user(&pool, register_dto(&unique_name(), "same@test.com"))
            .await
            .unwrap();

        let err = AuthService::register_user(&pool, register_dto(&unique_name(), "same@test.com"))
            .await
            .unwrap_err();

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.error.to_string().contains("Email"));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_login_wrong_password(pool: PgPool) {
        let name = unique_name();
        AuthService::register_user(&pool, register_dto(&name, &format!("{name}@test.com")))
            .await
            .unwrap();

        let err = AuthService::login_user(
            &pool,
            LoginRequest {
                username: name,
                password: "WrongPassw0rd".to_string(),
            },
            &test_jwt_config(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_login_unknown_user(pool: PgPool) {
        let err = AuthService::login_user(
            &pool,
            LoginRequest {
                username: "ghost".to_string(),
                password: "Passw0rd!".to_string(),
            },
            &test_jwt_config(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_login_inactive_user(pool: PgPool) {
        let name = unique_name();
        let user =
            AuthService::register_user(&pool, register_dto(&name, &format!("{name}@test.com")))
                .await
                .unwrap();

        sqlx::query("UPDATE users SET is_active = FALSE WHERE id = $1")
            .bind(user.id)
            .execute(&pool)
            .await
            .unwrap();

        let err = AuthService::login_user(
            &pool,
            LoginRequest {
                username: name,
                password: "Passw0rd!".to_string(),
            },
            &test_jwt_config(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status, StatusCode::FORBIDDEN);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_change_password(pool: PgPool) {
        let name = unique_name();
        let user =
            AuthService::register_user(&pool, register_dto(&name, &format!("{name}@test.com")))
                .await
                .unwrap();

        // Wrong current password
        let err = AuthService::change_password(
            &pool,
            user.id,
            ChangePasswordDto {
                current_password: "nope".to_string(),
                new_password: "NewPassw0rd".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        // Correct current password
        AuthService::change_password(
            &pool,
            user.id,
            ChangePasswordDto {
                current_password: "Passw0rd!".to_string(),
                new_password: "NewPassw0rd".to_string(),
            },
        )
        .await
        .unwrap();

        // Old password no longer works, new one does
        let err = AuthService::login_user(
            &pool,
            LoginRequest {
                username: name.clone(),
                password: "Passw0rd!".to_string(),
            },
            &test_jwt_config(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);

        let token = AuthService::login_user(
            &pool,
            LoginRequest {
                username: name,
                password: "NewPassw0rd".to_string(),
            },
            &test_jwt_config(),
        )
        .await;
        assert!(token.is_ok());
    }
}
