pub mod academic_years;
pub mod auth;
pub mod grades;
pub mod groups;
pub mod periods;
pub mod students;
pub mod teacher_assignments;
pub mod time_slots;
