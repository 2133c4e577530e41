use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use aula_core::AppError;
use aula_models::ids::GradeId;

use crate::middleware::auth::AuthUser;
use crate::middleware::role::RequireAdminOrCoordinator;
use crate::modules::grades::model::{CreateGradeDto, Grade, GradeFilterParams, UpdateGradeDto};
use crate::modules::grades::service::GradeService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Create a new grade
#[utoipa::path(
    post,
    path = "/api/grades",
    summary = "Create grade",
    request_body = CreateGradeDto,
    responses(
        (status = 201, description = "Grade created", body = Grade),
        (status = 400, description = "Level already exists for the year"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin or coordinator role"),
        (status = 404, description = "Academic year not found")
    ),
    tag = "Grades",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_grade(
    State(state): State<AppState>,
    RequireAdminOrCoordinator(_auth_user): RequireAdminOrCoordinator,
    ValidatedJson(dto): ValidatedJson<CreateGradeDto>,
) -> Result<(StatusCode, Json<Grade>), AppError> {
    let grade = GradeService::create(&state.db, dto).await?;

    Ok((StatusCode::CREATED, Json(grade)))
}

/// List grades ordered by level
#[utoipa::path(
    get,
    path = "/api/grades",
    summary = "List grades",
    params(GradeFilterParams),
    responses(
        (status = 200, description = "List of grades", body = Vec<Grade>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Grades",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_grades(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(filters): Query<GradeFilterParams>,
) -> Result<Json<Vec<Grade>>, AppError> {
    let grades = GradeService::get_all(&state.db, filters).await?;

    Ok(Json(grades))
}

/// Get a grade by ID
#[utoipa::path(
    get,
    path = "/api/grades/{id}",
    summary = "Get grade by ID",
    params(
        ("id" = Uuid, Path, description = "Grade ID")
    ),
    responses(
        (status = 200, description = "Grade details", body = Grade),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Grade not found")
    ),
    tag = "Grades",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_grade(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Grade>, AppError> {
    let grade = GradeService::get_by_id(&state.db, GradeId::from(id)).await?;

    Ok(Json(grade))
}

/// Update a grade
#[utoipa::path(
    put,
    path = "/api/grades/{id}",
    summary = "Update grade",
    params(
        ("id" = Uuid, Path, description = "Grade ID")
    ),
    request_body = UpdateGradeDto,
    responses(
        (status = 200, description = "Grade updated", body = Grade),
        (status = 400, description = "Level already exists for the year"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin or coordinator role"),
        (status = 404, description = "Grade not found")
    ),
    tag = "Grades",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_grade(
    State(state): State<AppState>,
    RequireAdminOrCoordinator(_auth_user): RequireAdminOrCoordinator,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateGradeDto>,
) -> Result<Json<Grade>, AppError> {
    let grade = GradeService::update(&state.db, GradeId::from(id), dto).await?;

    Ok(Json(grade))
}

/// Delete a grade (rejected while it still has groups)
#[utoipa::path(
    delete,
    path = "/api/grades/{id}",
    summary = "Delete grade",
    params(
        ("id" = Uuid, Path, description = "Grade ID")
    ),
    responses(
        (status = 204, description = "Grade deleted"),
        (status = 400, description = "Grade still has groups"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin or coordinator role"),
        (status = 404, description = "Grade not found")
    ),
    tag = "Grades",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_grade(
    State(state): State<AppState>,
    RequireAdminOrCoordinator(_auth_user): RequireAdminOrCoordinator,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    GradeService::delete(&state.db, GradeId::from(id)).await?;

    Ok(StatusCode::NO_CONTENT)
}
