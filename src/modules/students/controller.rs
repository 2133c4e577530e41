use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use aula_core::AppError;
use aula_models::ids::StudentId;

use crate::middleware::auth::AuthUser;
use crate::middleware::role::RequireAdminOrCoordinator;
use crate::modules::students::model::{
    CreateStudentDto, PaginatedStudentsResponse, Student, StudentFilterParams, UpdateStudentDto,
};
use crate::modules::students::service::StudentService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Enroll a new student
#[utoipa::path(
    post,
    path = "/api/students",
    summary = "Create student",
    request_body = CreateStudentDto,
    responses(
        (status = 201, description = "Student created", body = Student),
        (status = 400, description = "Identification already registered"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin or coordinator role"),
        (status = 404, description = "Subgroup not found")
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_student(
    State(state): State<AppState>,
    RequireAdminOrCoordinator(_auth_user): RequireAdminOrCoordinator,
    ValidatedJson(dto): ValidatedJson<CreateStudentDto>,
) -> Result<(StatusCode, Json<Student>), AppError> {
    let student = StudentService::create(&state.db, dto).await?;

    Ok((StatusCode::CREATED, Json(student)))
}

/// List students with search and pagination
#[utoipa::path(
    get,
    path = "/api/students",
    summary = "List students",
    params(StudentFilterParams),
    responses(
        (status = 200, description = "Paginated students", body = PaginatedStudentsResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_students(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(filters): Query<StudentFilterParams>,
) -> Result<Json<PaginatedStudentsResponse>, AppError> {
    let students = StudentService::get_all(&state.db, filters).await?;

    Ok(Json(students))
}

/// Get a student by ID
#[utoipa::path(
    get,
    path = "/api/students/{id}",
    summary = "Get student by ID",
    params(
        ("id" = Uuid, Path, description = "Student ID")
    ),
    responses(
        (status = 200, description = "Student details", body = Student),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Student not found")
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_student(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Student>, AppError> {
    let student = StudentService::get_by_id(&state.db, StudentId::from(id)).await?;

    Ok(Json(student))
}

/// Update a student
#[utoipa::path(
    put,
    path = "/api/students/{id}",
    summary = "Update student",
    params(
        ("id" = Uuid, Path, description = "Student ID")
    ),
    request_body = UpdateStudentDto,
    responses(
        (status = 200, description = "Student updated", body = Student),
        (status = 400, description = "Identification already registered"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin or coordinator role"),
        (status = 404, description = "Student or subgroup not found")
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_student(
    State(state): State<AppState>,
    RequireAdminOrCoordinator(_auth_user): RequireAdminOrCoordinator,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateStudentDto>,
) -> Result<Json<Student>, AppError> {
    let student = StudentService::update(&state.db, StudentId::from(id), dto).await?;

    Ok(Json(student))
}

/// Deactivate a student (soft delete)
#[utoipa::path(
    delete,
    path = "/api/students/{id}",
    summary = "Delete student",
    params(
        ("id" = Uuid, Path, description = "Student ID")
    ),
    responses(
        (status = 204, description = "Student deactivated"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin or coordinator role"),
        (status = 404, description = "Student not found")
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_student(
    State(state): State<AppState>,
    RequireAdminOrCoordinator(_auth_user): RequireAdminOrCoordinator,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    StudentService::delete(&state.db, StudentId::from(id)).await?;

    Ok(StatusCode::NO_CONTENT)
}
