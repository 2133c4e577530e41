//! Student data models and DTOs.
//!
//! Re-exports the student models from the `aula-models` crate.

pub use aula_models::students::*;
