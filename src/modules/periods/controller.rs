use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use aula_core::AppError;
use aula_models::ids::PeriodId;

use crate::middleware::auth::AuthUser;
use crate::middleware::role::RequireAdminOrCoordinator;
use crate::modules::periods::model::{
    CreatePeriodDto, Period, PeriodFilterParams, UpdatePeriodDto,
};
use crate::modules::periods::service::PeriodService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Create a new period
#[utoipa::path(
    post,
    path = "/api/periods",
    summary = "Create period",
    request_body = CreatePeriodDto,
    responses(
        (status = 201, description = "Period created", body = Period),
        (status = 400, description = "Dates invalid or overlapping"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin or coordinator role"),
        (status = 404, description = "Academic year not found")
    ),
    tag = "Periods",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_period(
    State(state): State<AppState>,
    RequireAdminOrCoordinator(_auth_user): RequireAdminOrCoordinator,
    ValidatedJson(dto): ValidatedJson<CreatePeriodDto>,
) -> Result<(StatusCode, Json<Period>), AppError> {
    let period = PeriodService::create(&state.db, dto).await?;

    Ok((StatusCode::CREATED, Json(period)))
}

/// List periods
#[utoipa::path(
    get,
    path = "/api/periods",
    summary = "List periods",
    params(PeriodFilterParams),
    responses(
        (status = 200, description = "List of periods", body = Vec<Period>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Periods",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_periods(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(filters): Query<PeriodFilterParams>,
) -> Result<Json<Vec<Period>>, AppError> {
    let periods = PeriodService::get_all(&state.db, filters).await?;

    Ok(Json(periods))
}

/// Get a period by ID
#[utoipa::path(
    get,
    path = "/api/periods/{id}",
    summary = "Get period by ID",
    params(
        ("id" = Uuid, Path, description = "Period ID")
    ),
    responses(
        (status = 200, description = "Period details", body = Period),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Period not found")
    ),
    tag = "Periods",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_period(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Period>, AppError> {
    let period = PeriodService::get_by_id(&state.db, PeriodId::from(id)).await?;

    Ok(Json(period))
}

/// Update a period
#[utoipa::path(
    put,
    path = "/api/periods/{id}",
    summary = "Update period",
    params(
        ("id" = Uuid, Path, description = "Period ID")
    ),
    request_body = UpdatePeriodDto,
    responses(
        (status = 200, description = "Period updated", body = Period),
        (status = 400, description = "Dates invalid or overlapping"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin or coordinator role"),
        (status = 404, description = "Period not found")
    ),
    tag = "Periods",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_period(
    State(state): State<AppState>,
    RequireAdminOrCoordinator(_auth_user): RequireAdminOrCoordinator,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdatePeriodDto>,
) -> Result<Json<Period>, AppError> {
    let period = PeriodService::update(&state.db, PeriodId::from(id), dto).await?;

    Ok(Json(period))
}

/// Activate a period within its academic year
#[utoipa::path(
    post,
    path = "/api/periods/{id}/activate",
    summary = "Activate period",
    params(
        ("id" = Uuid, Path, description = "Period ID")
    ),
    responses(
        (status = 200, description = "Period activated", body = Period),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin or coordinator role"),
        (status = 404, description = "Period not found")
    ),
    tag = "Periods",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn activate_period(
    State(state): State<AppState>,
    RequireAdminOrCoordinator(_auth_user): RequireAdminOrCoordinator,
    Path(id): Path<Uuid>,
) -> Result<Json<Period>, AppError> {
    let period = PeriodService::activate(&state.db, PeriodId::from(id)).await?;

    Ok(Json(period))
}

/// Delete a period
#[utoipa::path(
    delete,
    path = "/api/periods/{id}",
    summary = "Delete period",
    params(
        ("id" = Uuid, Path, description = "Period ID")
    ),
    responses(
        (status = 204, description = "Period deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin or coordinator role"),
        (status = 404, description = "Period not found")
    ),
    tag = "Periods",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_period(
    State(state): State<AppState>,
    RequireAdminOrCoordinator(_auth_user): RequireAdminOrCoordinator,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    PeriodService::delete(&state.db, PeriodId::from(id)).await?;

    Ok(StatusCode::NO_CONTENT)
}
