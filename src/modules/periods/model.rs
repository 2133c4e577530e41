//! Period data models and DTOs.
//!
//! Re-exports the period models from the `aula-models` crate.

pub use aula_models::academic::{CreatePeriodDto, Period, PeriodFilterParams, UpdatePeriodDto};
