use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    create_time_slot, delete_time_slot, get_time_slot, get_time_slots, seed_default_template,
    update_time_slot,
};

/// Initialize the time slots router
/// Routes: POST /, GET /, POST /seed-template, GET|PUT|DELETE /{id}
pub fn init_time_slots_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_time_slot).get(get_time_slots))
        .route("/seed-template", post(seed_default_template))
        .route(
            "/{id}",
            get(get_time_slot)
                .put(update_time_slot)
                .delete(delete_time_slot),
        )
}
