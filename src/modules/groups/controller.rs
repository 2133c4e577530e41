use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use aula_core::AppError;
use aula_models::ids::{GroupId, SubgroupId};
use aula_models::students::Student;

use crate::middleware::auth::AuthUser;
use crate::middleware::role::RequireAdminOrCoordinator;
use crate::modules::groups::model::{
    CreateGroupDto, CreateSubgroupDto, Group, GroupFilterParams, GroupWithStudentCount, Subgroup,
    UpdateGroupDto, UpdateSubgroupDto,
};
use crate::modules::groups::service::GroupService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Create a new group
#[utoipa::path(
    post,
    path = "/api/groups",
    summary = "Create group",
    request_body = CreateGroupDto,
    responses(
        (status = 201, description = "Group created", body = Group),
        (status = 400, description = "Name already used in the grade"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin or coordinator role"),
        (status = 404, description = "Grade not found")
    ),
    tag = "Groups",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_group(
    State(state): State<AppState>,
    RequireAdminOrCoordinator(_auth_user): RequireAdminOrCoordinator,
    ValidatedJson(dto): ValidatedJson<CreateGroupDto>,
) -> Result<(StatusCode, Json<Group>), AppError> {
    let group = GroupService::create(&state.db, dto).await?;

    Ok((StatusCode::CREATED, Json(group)))
}

/// List groups with student counts
#[utoipa::path(
    get,
    path = "/api/groups",
    summary = "List groups",
    params(GroupFilterParams),
    responses(
        (status = 200, description = "List of groups", body = Vec<GroupWithStudentCount>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Groups",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_groups(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(filters): Query<GroupFilterParams>,
) -> Result<Json<Vec<GroupWithStudentCount>>, AppError> {
    let groups = GroupService::get_all(&state.db, filters).await?;

    Ok(Json(groups))
}

/// Get a group by ID
#[utoipa::path(
    get,
    path = "/api/groups/{id}",
    summary = "Get group by ID",
    params(
        ("id" = Uuid, Path, description = "Group ID")
    ),
    responses(
        (status = 200, description = "Group details", body = GroupWithStudentCount),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Group not found")
    ),
    tag = "Groups",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_group(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<GroupWithStudentCount>, AppError> {
    let group = GroupService::get_by_id(&state.db, GroupId::from(id)).await?;

    Ok(Json(group))
}

/// List the active students of a group
#[utoipa::path(
    get,
    path = "/api/groups/{id}/students",
    summary = "List group students",
    params(
        ("id" = Uuid, Path, description = "Group ID")
    ),
    responses(
        (status = 200, description = "Students of the group", body = Vec<Student>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Group not found")
    ),
    tag = "Groups",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_group_students(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Student>>, AppError> {
    let students = GroupService::get_students(&state.db, GroupId::from(id)).await?;

    Ok(Json(students))
}

/// Update a group
#[utoipa::path(
    put,
    path = "/api/groups/{id}",
    summary = "Update group",
    params(
        ("id" = Uuid, Path, description = "Group ID")
    ),
    request_body = UpdateGroupDto,
    responses(
        (status = 200, description = "Group updated", body = Group),
        (status = 400, description = "Name collision or capacity below enrollment"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin or coordinator role"),
        (status = 404, description = "Group not found")
    ),
    tag = "Groups",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_group(
    State(state): State<AppState>,
    RequireAdminOrCoordinator(_auth_user): RequireAdminOrCoordinator,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateGroupDto>,
) -> Result<Json<Group>, AppError> {
    let group = GroupService::update(&state.db, GroupId::from(id), dto).await?;

    Ok(Json(group))
}

/// Delete a group (rejected while student records reference it)
#[utoipa::path(
    delete,
    path = "/api/groups/{id}",
    summary = "Delete group",
    params(
        ("id" = Uuid, Path, description = "Group ID")
    ),
    responses(
        (status = 204, description = "Group deleted"),
        (status = 400, description = "Group still has student records"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin or coordinator role"),
        (status = 404, description = "Group not found")
    ),
    tag = "Groups",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_group(
    State(state): State<AppState>,
    RequireAdminOrCoordinator(_auth_user): RequireAdminOrCoordinator,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    GroupService::delete(&state.db, GroupId::from(id)).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// List the subgroups of a group
#[utoipa::path(
    get,
    path = "/api/groups/{id}/subgroups",
    summary = "List subgroups",
    params(
        ("id" = Uuid, Path, description = "Group ID")
    ),
    responses(
        (status = 200, description = "Subgroups of the group", body = Vec<Subgroup>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Group not found")
    ),
    tag = "Groups",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_subgroups(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Subgroup>>, AppError> {
    let subgroups = GroupService::get_subgroups(&state.db, GroupId::from(id)).await?;

    Ok(Json(subgroups))
}

/// Create a subgroup under a group
#[utoipa::path(
    post,
    path = "/api/groups/{id}/subgroups",
    summary = "Create subgroup",
    params(
        ("id" = Uuid, Path, description = "Group ID")
    ),
    request_body = CreateSubgroupDto,
    responses(
        (status = 201, description = "Subgroup created", body = Subgroup),
        (status = 400, description = "Name already used in the group"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin or coordinator role"),
        (status = 404, description = "Group not found")
    ),
    tag = "Groups",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_subgroup(
    State(state): State<AppState>,
    RequireAdminOrCoordinator(_auth_user): RequireAdminOrCoordinator,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<CreateSubgroupDto>,
) -> Result<(StatusCode, Json<Subgroup>), AppError> {
    let subgroup = GroupService::create_subgroup(&state.db, GroupId::from(id), dto).await?;

    Ok((StatusCode::CREATED, Json(subgroup)))
}

/// Rename a subgroup
#[utoipa::path(
    put,
    path = "/api/subgroups/{id}",
    summary = "Update subgroup",
    params(
        ("id" = Uuid, Path, description = "Subgroup ID")
    ),
    request_body = UpdateSubgroupDto,
    responses(
        (status = 200, description = "Subgroup updated", body = Subgroup),
        (status = 400, description = "Name already used in the group"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin or coordinator role"),
        (status = 404, description = "Subgroup not found")
    ),
    tag = "Groups",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_subgroup(
    State(state): State<AppState>,
    RequireAdminOrCoordinator(_auth_user): RequireAdminOrCoordinator,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateSubgroupDto>,
) -> Result<Json<Subgroup>, AppError> {
    let subgroup = GroupService::update_subgroup(&state.db, SubgroupId::from(id), dto).await?;

    Ok(Json(subgroup))
}

/// Delete a subgroup (rejected while student records reference it)
#[utoipa::path(
    delete,
    path = "/api/subgroups/{id}",
    summary = "Delete subgroup",
    params(
        ("id" = Uuid, Path, description = "Subgroup ID")
    ),
    responses(
        (status = 204, description = "Subgroup deleted"),
        (status = 400, description = "Subgroup still has student records"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin or coordinator role"),
        (status = 404, description = "Subgroup not found")
    ),
    tag = "Groups",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_subgroup(
    State(state): State<AppState>,
    RequireAdminOrCoordinator(_auth_user): RequireAdminOrCoordinator,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    GroupService::delete_subgroup(&state.db, SubgroupId::from(id)).await?;

    Ok(StatusCode::NO_CONTENT)
}
