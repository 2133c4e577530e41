//! JWT claim structure for access tokens.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use aula_models::enums::UserRole;

/// Claims embedded in access tokens.
///
/// Carries everything the role middleware needs, so authorization
/// decisions require no database lookup.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    /// User ID (subject claim)
    pub sub: String,
    /// Username, for diagnostics and display
    pub username: String,
    /// Role used for authorization decisions
    pub role: UserRole,
    /// Token expiration timestamp (Unix timestamp)
    pub exp: usize,
    /// Token issued-at timestamp (Unix timestamp)
    pub iat: usize,
}
