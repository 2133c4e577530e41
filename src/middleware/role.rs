//! Role-based authorization for the API.
//!
//! Two complementary mechanisms, both reading the role from the verified
//! JWT claims:
//!
//! 1. Layer middleware (`require_staff`) applied to whole routers
//! 2. Extractors (`RequireAdminOrCoordinator`) for individual handlers
//!    that mutate state

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};

use aula_core::AppError;
use aula_models::enums::UserRole;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Roles allowed to read academic data: any authenticated staff member.
pub const STAFF_ROLES: [UserRole; 3] =
    [UserRole::Admin, UserRole::Coordinator, UserRole::Teacher];

/// Roles allowed to mutate academic data: admins and coordinators.
pub const MANAGEMENT_ROLES: [UserRole; 2] = [UserRole::Admin, UserRole::Coordinator];

/// Middleware checking that the authenticated caller has one of the
/// allowed roles.
pub async fn require_roles(
    State(state): State<AppState>,
    req: Request,
    next: Next,
    allowed_roles: &[UserRole],
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let auth_user = AuthUser::from_request_parts(&mut parts, &state).await?;

    if !allowed_roles.contains(&auth_user.role()) {
        return Err(AppError::forbidden(format!(
            "Insufficient permissions. Required roles: {}",
            role_list(allowed_roles)
        )));
    }

    let req = Request::from_parts(parts, body);
    Ok(next.run(req).await)
}

/// Layer for routers readable by any staff member (admin, coordinator,
/// teacher).
pub async fn require_staff(State(state): State<AppState>, req: Request, next: Next) -> Response {
    match require_roles(State(state), req, next, &STAFF_ROLES).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

/// Extractor for handlers restricted to admins and coordinators.
///
/// Mutating handlers take this instead of [`AuthUser`]; the role check
/// happens before the handler body runs.
#[derive(Debug, Clone)]
pub struct RequireAdminOrCoordinator(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdminOrCoordinator {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_user = AuthUser::from_request_parts(parts, state).await?;

        if !MANAGEMENT_ROLES.contains(&auth_user.role()) {
            return Err(AppError::forbidden(format!(
                "Insufficient permissions. Required roles: {}",
                role_list(&MANAGEMENT_ROLES)
            )));
        }

        Ok(RequireAdminOrCoordinator(auth_user))
    }
}

fn role_list(roles: &[UserRole]) -> String {
    roles
        .iter()
        .map(|r| r.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_sets() {
        assert!(STAFF_ROLES.contains(&UserRole::Teacher));
        assert!(!STAFF_ROLES.contains(&UserRole::Student));
        assert!(MANAGEMENT_ROLES.contains(&UserRole::Coordinator));
        assert!(!MANAGEMENT_ROLES.contains(&UserRole::Teacher));
    }

    #[test]
    fn test_role_list_formatting() {
        assert_eq!(role_list(&MANAGEMENT_ROLES), "admin, coordinator");
    }
}
