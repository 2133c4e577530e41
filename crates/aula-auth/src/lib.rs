//! # Aula Auth
//!
//! Authentication types and JWT utilities for the Aula API.
//!
//! - [`claims`]: access-token claim structure
//! - [`jwt`]: token creation/verification and JWT configuration

pub mod claims;
pub mod jwt;

pub use claims::Claims;
pub use jwt::{JwtConfig, create_access_token, verify_token};
