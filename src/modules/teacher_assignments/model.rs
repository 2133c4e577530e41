//! Teacher-group assignment data models and DTOs.
//!
//! Re-exports the assignment models from the `aula-models` crate.

pub use aula_models::assignments::*;
