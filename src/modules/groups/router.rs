use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

use super::controller::{
    create_group, create_subgroup, delete_group, delete_subgroup, get_group, get_group_students,
    get_groups, get_subgroups, update_group, update_subgroup,
};

/// Initialize the groups router
/// Routes: POST /, GET /, GET|PUT|DELETE /{id}, GET /{id}/students,
/// GET|POST /{id}/subgroups
pub fn init_groups_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_group).get(get_groups))
        .route(
            "/{id}",
            get(get_group).put(update_group).delete(delete_group),
        )
        .route("/{id}/students", get(get_group_students))
        .route("/{id}/subgroups", get(get_subgroups).post(create_subgroup))
}

/// Initialize the standalone subgroups router
/// Routes: PUT /{id}, DELETE /{id}
pub fn init_subgroups_router() -> Router<AppState> {
    Router::new().route("/{id}", put(update_subgroup).delete(delete_subgroup))
}
