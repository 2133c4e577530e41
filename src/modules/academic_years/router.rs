use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    activate_academic_year, create_academic_year, delete_academic_year, get_academic_year,
    get_academic_years, get_active_academic_year, update_academic_year,
};

/// Initialize the academic years router
/// Routes: POST /, GET /, GET /active, GET|PUT|DELETE /{id}, POST /{id}/activate
pub fn init_academic_years_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_academic_year).get(get_academic_years))
        .route("/active", get(get_active_academic_year))
        .route(
            "/{id}",
            get(get_academic_year)
                .put(update_academic_year)
                .delete(delete_academic_year),
        )
        .route("/{id}/activate", post(activate_academic_year))
}
