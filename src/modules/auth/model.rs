//! Authentication data models and DTOs.
//!
//! Re-exports the user and auth models from the `aula-models` crate.

pub use aula_models::users::*;
