use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    create_assignment, delete_assignment, get_assignment, get_assignments, update_assignment,
};

/// Initialize the teacher assignments router
/// Routes: POST /, GET /, GET|PUT|DELETE /{id}
pub fn init_teacher_assignments_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_assignment).get(get_assignments))
        .route(
            "/{id}",
            get(get_assignment)
                .put(update_assignment)
                .delete(delete_assignment),
        )
}
