//! Grade data models and DTOs.
//!
//! Re-exports the grade models from the `aula-models` crate.

pub use aula_models::academic::{CreateGradeDto, Grade, GradeFilterParams, UpdateGradeDto};
