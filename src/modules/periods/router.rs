use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    activate_period, create_period, delete_period, get_period, get_periods, update_period,
};

/// Initialize the periods router
/// Routes: POST /, GET /, GET|PUT|DELETE /{id}, POST /{id}/activate
pub fn init_periods_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_period).get(get_periods))
        .route(
            "/{id}",
            get(get_period).put(update_period).delete(delete_period),
        )
        .route("/{id}/activate", post(activate_period))
}
