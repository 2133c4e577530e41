//! Time slot data models and DTOs.
//!
//! Re-exports the schedule models from the `aula-models` crate.

pub use aula_models::schedule::*;
