use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use aula_core::AppError;
use aula_models::ids::AcademicYearId;

use crate::middleware::auth::AuthUser;
use crate::middleware::role::RequireAdminOrCoordinator;
use crate::modules::academic_years::model::{
    AcademicYear, CreateAcademicYearDto, UpdateAcademicYearDto,
};
use crate::modules::academic_years::service::AcademicYearService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Create a new academic year
#[utoipa::path(
    post,
    path = "/api/academic-years",
    summary = "Create academic year",
    request_body = CreateAcademicYearDto,
    responses(
        (status = 201, description = "Academic year created", body = AcademicYear),
        (status = 400, description = "Year already exists or validation failed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin or coordinator role")
    ),
    tag = "Academic Years",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_academic_year(
    State(state): State<AppState>,
    RequireAdminOrCoordinator(_auth_user): RequireAdminOrCoordinator,
    ValidatedJson(dto): ValidatedJson<CreateAcademicYearDto>,
) -> Result<(StatusCode, Json<AcademicYear>), AppError> {
    let year = AcademicYearService::create(&state.db, dto).await?;

    Ok((StatusCode::CREATED, Json(year)))
}

/// List academic years, newest first
#[utoipa::path(
    get,
    path = "/api/academic-years",
    summary = "List academic years",
    responses(
        (status = 200, description = "List of academic years", body = Vec<AcademicYear>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Academic Years",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_academic_years(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> Result<Json<Vec<AcademicYear>>, AppError> {
    let years = AcademicYearService::get_all(&state.db).await?;

    Ok(Json(years))
}

/// Get the currently active academic year
#[utoipa::path(
    get,
    path = "/api/academic-years/active",
    summary = "Get active academic year",
    responses(
        (status = 200, description = "Active academic year, if any", body = Option<AcademicYear>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Academic Years",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_active_academic_year(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> Result<Json<Option<AcademicYear>>, AppError> {
    let year = AcademicYearService::get_active(&state.db).await?;

    Ok(Json(year))
}

/// Get an academic year by ID
#[utoipa::path(
    get,
    path = "/api/academic-years/{id}",
    summary = "Get academic year by ID",
    params(
        ("id" = Uuid, Path, description = "Academic year ID")
    ),
    responses(
        (status = 200, description = "Academic year details", body = AcademicYear),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Academic year not found")
    ),
    tag = "Academic Years",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_academic_year(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<AcademicYear>, AppError> {
    let year = AcademicYearService::get_by_id(&state.db, AcademicYearId::from(id)).await?;

    Ok(Json(year))
}

/// Update an academic year
#[utoipa::path(
    put,
    path = "/api/academic-years/{id}",
    summary = "Update academic year",
    params(
        ("id" = Uuid, Path, description = "Academic year ID")
    ),
    request_body = UpdateAcademicYearDto,
    responses(
        (status = 200, description = "Academic year updated", body = AcademicYear),
        (status = 400, description = "Year already exists or validation failed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin or coordinator role"),
        (status = 404, description = "Academic year not found")
    ),
    tag = "Academic Years",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_academic_year(
    State(state): State<AppState>,
    RequireAdminOrCoordinator(_auth_user): RequireAdminOrCoordinator,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateAcademicYearDto>,
) -> Result<Json<AcademicYear>, AppError> {
    let year = AcademicYearService::update(&state.db, AcademicYearId::from(id), dto).await?;

    Ok(Json(year))
}

/// Activate an academic year, deactivating all others
#[utoipa::path(
    post,
    path = "/api/academic-years/{id}/activate",
    summary = "Activate academic year",
    params(
        ("id" = Uuid, Path, description = "Academic year ID")
    ),
    responses(
        (status = 200, description = "Academic year activated", body = AcademicYear),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin or coordinator role"),
        (status = 404, description = "Academic year not found")
    ),
    tag = "Academic Years",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn activate_academic_year(
    State(state): State<AppState>,
    RequireAdminOrCoordinator(_auth_user): RequireAdminOrCoordinator,
    Path(id): Path<Uuid>,
) -> Result<Json<AcademicYear>, AppError> {
    let year = AcademicYearService::activate(&state.db, AcademicYearId::from(id)).await?;

    Ok(Json(year))
}

/// Delete an academic year
#[utoipa::path(
    delete,
    path = "/api/academic-years/{id}",
    summary = "Delete academic year",
    params(
        ("id" = Uuid, Path, description = "Academic year ID")
    ),
    responses(
        (status = 204, description = "Academic year deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin or coordinator role"),
        (status = 404, description = "Academic year not found"),
        (status = 409, description = "Dependent records exist")
    ),
    tag = "Academic Years",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_academic_year(
    State(state): State<AppState>,
    RequireAdminOrCoordinator(_auth_user): RequireAdminOrCoordinator,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    AcademicYearService::delete(&state.db, AcademicYearId::from(id)).await?;

    Ok(StatusCode::NO_CONTENT)
}
