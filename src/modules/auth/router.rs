use axum::{Router, routing::get, routing::post};

use crate::state::AppState;

use super::controller::{change_password, login, me, register};

/// Initialize the authentication router
/// Routes: POST /register, POST /login, GET /me, POST /change-password
pub fn init_auth_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
        .route("/change-password", post(change_password))
}
