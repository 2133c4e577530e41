use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use aula_core::AppError;
use aula_models::ids::TimeSlotId;

use crate::middleware::auth::AuthUser;
use crate::middleware::role::RequireAdminOrCoordinator;
use crate::modules::time_slots::model::{
    CreateTimeSlotDto, SeedTemplateRequest, SeedTemplateResponse, TimeSlotFilterParams,
    TimeSlotResponse, UpdateTimeSlotDto,
};
use crate::modules::time_slots::service::TimeSlotService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Create a new time slot
#[utoipa::path(
    post,
    path = "/api/time-slots",
    summary = "Create time slot",
    request_body = CreateTimeSlotDto,
    responses(
        (status = 201, description = "Time slot created successfully", body = TimeSlotResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin or coordinator role"),
        (status = 409, description = "Overlaps an existing block or duplicates its name"),
        (status = 422, description = "Invalid time range or lesson type")
    ),
    tag = "Time Slots",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_time_slot(
    State(state): State<AppState>,
    RequireAdminOrCoordinator(_auth_user): RequireAdminOrCoordinator,
    ValidatedJson(dto): ValidatedJson<CreateTimeSlotDto>,
) -> Result<(StatusCode, Json<TimeSlotResponse>), AppError> {
    let slot = TimeSlotService::create(&state.db, dto).await?;

    Ok((StatusCode::CREATED, Json(slot.into())))
}

/// List time slots, ordered by weekday then start time
#[utoipa::path(
    get,
    path = "/api/time-slots",
    summary = "List time slots",
    params(TimeSlotFilterParams),
    responses(
        (status = 200, description = "List of time slots", body = Vec<TimeSlotResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires a staff role")
    ),
    tag = "Time Slots",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_time_slots(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(filters): Query<TimeSlotFilterParams>,
) -> Result<Json<Vec<TimeSlotResponse>>, AppError> {
    let slots = TimeSlotService::get_all(&state.db, filters).await?;

    Ok(Json(slots.into_iter().map(Into::into).collect()))
}

/// Get a time slot by ID
#[utoipa::path(
    get,
    path = "/api/time-slots/{id}",
    summary = "Get time slot by ID",
    params(
        ("id" = Uuid, Path, description = "Time slot ID")
    ),
    responses(
        (status = 200, description = "Time slot details", body = TimeSlotResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Time slot not found")
    ),
    tag = "Time Slots",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_time_slot(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<TimeSlotResponse>, AppError> {
    let slot = TimeSlotService::get_by_id(&state.db, TimeSlotId::from(id)).await?;

    Ok(Json(slot.into()))
}

/// Update a time slot
#[utoipa::path(
    put,
    path = "/api/time-slots/{id}",
    summary = "Update time slot",
    params(
        ("id" = Uuid, Path, description = "Time slot ID")
    ),
    request_body = UpdateTimeSlotDto,
    responses(
        (status = 200, description = "Time slot updated successfully", body = TimeSlotResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin or coordinator role"),
        (status = 404, description = "Time slot not found"),
        (status = 409, description = "Resulting slot overlaps an existing block"),
        (status = 422, description = "Resulting slot is inconsistent")
    ),
    tag = "Time Slots",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_time_slot(
    State(state): State<AppState>,
    RequireAdminOrCoordinator(_auth_user): RequireAdminOrCoordinator,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateTimeSlotDto>,
) -> Result<Json<TimeSlotResponse>, AppError> {
    let slot = TimeSlotService::update(&state.db, TimeSlotId::from(id), dto).await?;

    Ok(Json(slot.into()))
}

/// Delete a time slot
#[utoipa::path(
    delete,
    path = "/api/time-slots/{id}",
    summary = "Delete time slot",
    params(
        ("id" = Uuid, Path, description = "Time slot ID")
    ),
    responses(
        (status = 204, description = "Time slot deleted successfully"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin or coordinator role"),
        (status = 404, description = "Time slot not found")
    ),
    tag = "Time Slots",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_time_slot(
    State(state): State<AppState>,
    RequireAdminOrCoordinator(_auth_user): RequireAdminOrCoordinator,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    TimeSlotService::delete(&state.db, TimeSlotId::from(id)).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Seed the default weekly template for a session
#[utoipa::path(
    post,
    path = "/api/time-slots/seed-template",
    summary = "Seed default schedule template",
    request_body = SeedTemplateRequest,
    responses(
        (status = 201, description = "Template seeded", body = SeedTemplateResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin or coordinator role"),
        (status = 409, description = "Template conflicts with pre-existing blocks; nothing was written")
    ),
    tag = "Time Slots",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn seed_default_template(
    State(state): State<AppState>,
    RequireAdminOrCoordinator(_auth_user): RequireAdminOrCoordinator,
    ValidatedJson(request): ValidatedJson<SeedTemplateRequest>,
) -> Result<(StatusCode, Json<SeedTemplateResponse>), AppError> {
    let result = TimeSlotService::seed_template(&state.db, request).await?;

    Ok((StatusCode::CREATED, Json(result)))
}
