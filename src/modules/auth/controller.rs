use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use aula_core::AppError;

use crate::middleware::auth::AuthUser;
use crate::modules::auth::model::{
    ChangePasswordDto, LoginRequest, MessageResponse, RegisterRequestDto, TokenResponse, User,
};
use crate::modules::auth::service::AuthService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Register a new staff user
#[utoipa::path(
    post,
    path = "/api/auth/register",
    summary = "Register user",
    request_body = RegisterRequestDto,
    responses(
        (status = 201, description = "User registered successfully", body = User),
        (status = 400, description = "Validation failed or username/email taken")
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RegisterRequestDto>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = AuthService::register_user(&state.db, dto).await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Log in with username and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    summary = "Login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "JWT issued", body = TokenResponse),
        (status = 401, description = "Invalid username or password"),
        (status = 403, description = "User account is inactive")
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let token = AuthService::login_user(&state.db, dto, &state.jwt_config).await?;

    Ok(Json(token))
}

/// Get the authenticated user's profile
#[utoipa::path(
    get,
    path = "/api/auth/me",
    summary = "Current user",
    responses(
        (status = 200, description = "Authenticated user", body = User),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Authentication",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<User>, AppError> {
    let user = AuthService::get_user_by_id(&state.db, auth_user.user_id()?).await?;

    Ok(Json(user))
}

/// Change the authenticated user's password
#[utoipa::path(
    post,
    path = "/api/auth/change-password",
    summary = "Change password",
    request_body = ChangePasswordDto,
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 400, description = "Current password incorrect or new password invalid"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Authentication",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn change_password(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<ChangePasswordDto>,
) -> Result<Json<MessageResponse>, AppError> {
    AuthService::change_password(&state.db, auth_user.user_id()?, dto).await?;

    Ok(Json(MessageResponse {
        message: "Password updated successfully".to_string(),
    }))
}
