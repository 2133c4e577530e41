use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use aula_core::AppError;
use aula_models::ids::AssignmentId;

use crate::middleware::auth::AuthUser;
use crate::middleware::role::RequireAdminOrCoordinator;
use crate::modules::teacher_assignments::model::{
    AssignmentFilterParams, AssignmentWithNames, CreateAssignmentDto, TeacherGroupAssignment,
    UpdateAssignmentDto,
};
use crate::modules::teacher_assignments::service::TeacherAssignmentService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Assign a teacher to a group for one subject
#[utoipa::path(
    post,
    path = "/api/teacher-assignments",
    summary = "Create teacher assignment",
    request_body = CreateAssignmentDto,
    responses(
        (status = 201, description = "Assignment created", body = TeacherGroupAssignment),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin or coordinator role"),
        (status = 404, description = "Teacher, group or period not found"),
        (status = 409, description = "Assignment tuple already exists"),
        (status = 422, description = "Ineligible teacher role or blank subject")
    ),
    tag = "Teacher Assignments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_assignment(
    State(state): State<AppState>,
    RequireAdminOrCoordinator(_auth_user): RequireAdminOrCoordinator,
    ValidatedJson(dto): ValidatedJson<CreateAssignmentDto>,
) -> Result<(StatusCode, Json<TeacherGroupAssignment>), AppError> {
    let assignment = TeacherAssignmentService::create(&state.db, dto).await?;

    Ok((StatusCode::CREATED, Json(assignment)))
}

/// List assignments with teacher and group display fields
#[utoipa::path(
    get,
    path = "/api/teacher-assignments",
    summary = "List teacher assignments",
    params(AssignmentFilterParams),
    responses(
        (status = 200, description = "List of assignments", body = Vec<AssignmentWithNames>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Teacher Assignments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_assignments(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(filters): Query<AssignmentFilterParams>,
) -> Result<Json<Vec<AssignmentWithNames>>, AppError> {
    let assignments = TeacherAssignmentService::get_all(&state.db, filters).await?;

    Ok(Json(assignments))
}

/// Get an assignment by ID
#[utoipa::path(
    get,
    path = "/api/teacher-assignments/{id}",
    summary = "Get teacher assignment by ID",
    params(
        ("id" = Uuid, Path, description = "Assignment ID")
    ),
    responses(
        (status = 200, description = "Assignment details", body = AssignmentWithNames),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Assignment not found")
    ),
    tag = "Teacher Assignments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_assignment(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<AssignmentWithNames>, AppError> {
    let assignment =
        TeacherAssignmentService::get_by_id(&state.db, AssignmentId::from(id)).await?;

    Ok(Json(assignment))
}

/// Update an assignment
#[utoipa::path(
    put,
    path = "/api/teacher-assignments/{id}",
    summary = "Update teacher assignment",
    params(
        ("id" = Uuid, Path, description = "Assignment ID")
    ),
    request_body = UpdateAssignmentDto,
    responses(
        (status = 200, description = "Assignment updated", body = TeacherGroupAssignment),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin or coordinator role"),
        (status = 404, description = "Assignment or period not found"),
        (status = 409, description = "Resulting tuple collides with another assignment"),
        (status = 422, description = "Blank subject")
    ),
    tag = "Teacher Assignments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_assignment(
    State(state): State<AppState>,
    RequireAdminOrCoordinator(_auth_user): RequireAdminOrCoordinator,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateAssignmentDto>,
) -> Result<Json<TeacherGroupAssignment>, AppError> {
    let assignment =
        TeacherAssignmentService::update(&state.db, AssignmentId::from(id), dto).await?;

    Ok(Json(assignment))
}

/// Delete an assignment
#[utoipa::path(
    delete,
    path = "/api/teacher-assignments/{id}",
    summary = "Delete teacher assignment",
    params(
        ("id" = Uuid, Path, description = "Assignment ID")
    ),
    responses(
        (status = 204, description = "Assignment deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin or coordinator role"),
        (status = 404, description = "Assignment not found")
    ),
    tag = "Teacher Assignments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_assignment(
    State(state): State<AppState>,
    RequireAdminOrCoordinator(_auth_user): RequireAdminOrCoordinator,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    TeacherAssignmentService::delete(&state.db, AssignmentId::from(id)).await?;

    Ok(StatusCode::NO_CONTENT)
}
