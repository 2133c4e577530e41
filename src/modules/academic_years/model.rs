//! Academic year data models and DTOs.
//!
//! Re-exports the academic hierarchy models from the `aula-models` crate.

pub use aula_models::academic::{AcademicYear, CreateAcademicYearDto, UpdateAcademicYearDto};
