//! Closed tagged enums for the domain's categorical values.
//!
//! These replace free-form strings at every boundary: serde rejects unknown
//! tags on the way in, and sqlx refuses to decode a row carrying a value
//! outside the closed set, so an invalid tag can never be persisted or
//! observed.

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Role of a staff user account.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "VARCHAR", rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Coordinator,
    Teacher,
    Student,
}

impl UserRole {
    /// Roles allowed to hold teacher-group assignments.
    pub const ASSIGNABLE: [UserRole; 3] =
        [UserRole::Teacher, UserRole::Coordinator, UserRole::Admin];

    pub fn is_assignable(self) -> bool {
        Self::ASSIGNABLE.contains(&self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Coordinator => "coordinator",
            UserRole::Teacher => "teacher",
            UserRole::Student => "student",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// School session (shift) a schedule or assignment belongs to.
///
/// A scheduling partition independent of weekday: day (diurnal) and night
/// (nocturnal) calendars never interact.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "VARCHAR", rename_all = "lowercase")]
pub enum Session {
    Day,
    Night,
}

impl Session {
    pub fn as_str(self) -> &'static str {
        match self {
            Session::Day => "day",
            Session::Night => "night",
        }
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a time slot holds: a lesson, a break, or lunch.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "VARCHAR", rename_all = "lowercase")]
pub enum SlotType {
    Lesson,
    Break,
    Lunch,
}

/// Kind of lesson; present iff the slot type is `lesson`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "VARCHAR", rename_all = "lowercase")]
pub enum LessonType {
    /// Academic subjects, taught in 40-minute blocks.
    Academic,
    /// Technical subjects, taught in 60-minute blocks.
    Technical,
}

/// Day of the week, ISO-style: Monday = 0 ... Sunday = 6.
///
/// Stored as SMALLINT; JSON representation is the bare integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[repr(i16)]
pub enum Weekday {
    Monday = 0,
    Tuesday = 1,
    Wednesday = 2,
    Thursday = 3,
    Friday = 4,
    Saturday = 5,
    Sunday = 6,
}

impl Weekday {
    /// Monday through Friday, the default seeding range.
    pub const MONDAY_TO_FRIDAY: [Weekday; 5] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
    ];

    pub const fn as_i16(self) -> i16 {
        self as i16
    }
}

impl TryFrom<i16> for Weekday {
    type Error = InvalidWeekday;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Weekday::Monday),
            1 => Ok(Weekday::Tuesday),
            2 => Ok(Weekday::Wednesday),
            3 => Ok(Weekday::Thursday),
            4 => Ok(Weekday::Friday),
            5 => Ok(Weekday::Saturday),
            6 => Ok(Weekday::Sunday),
            other => Err(InvalidWeekday(other)),
        }
    }
}

impl From<Weekday> for i16 {
    fn from(day: Weekday) -> i16 {
        day.as_i16()
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i16())
    }
}

/// Error for weekday values outside 0..=6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidWeekday(pub i16);

impl fmt::Display for InvalidWeekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "weekday must be between 0 and 6, got {}", self.0)
    }
}

impl std::error::Error for InvalidWeekday {}

impl Serialize for Weekday {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i16(self.as_i16())
    }
}

impl<'de> Deserialize<'de> for Weekday {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = i16::deserialize(deserializer)?;
        Weekday::try_from(value).map_err(serde::de::Error::custom)
    }
}
