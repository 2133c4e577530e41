//! Configuration modules for the Aula API.
//!
//! Each submodule handles one aspect of configuration, loaded from
//! environment variables:
//!
//! - [`cors`]: allowed CORS origins
//! - [`database`]: PostgreSQL connection pool initialization
//! - [`rate_limit`]: API rate limiting configuration
//!
//! JWT configuration lives in the `aula-auth` crate next to the token
//! utilities that consume it.

pub mod cors;
pub mod database;
pub mod rate_limit;
