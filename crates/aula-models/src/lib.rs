//! # Aula Models
//!
//! Domain models and DTOs for the Aula API.
//!
//! - [`ids`]: strongly-typed UUID newtypes per entity
//! - [`enums`]: closed tagged enums for roles, sessions, slot and lesson types
//! - [`users`]: staff user accounts and auth DTOs
//! - [`academic`]: academic year / period / grade / group / subgroup hierarchy
//! - [`students`]: student records
//! - [`schedule`]: weekly time-slot calendar and template seeding
//! - [`assignments`]: teacher-to-group subject assignments

pub mod academic;
pub mod assignments;
pub mod enums;
pub mod ids;
pub mod schedule;
pub mod students;
pub mod users;
