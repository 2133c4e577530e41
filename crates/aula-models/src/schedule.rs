//! Weekly schedule domain: time slots, overlap detection, and academic
//! minute equivalence.
//!
//! A [`TimeSlot`] is one block of the school day (a lesson, a break, or
//! lunch) pinned to a `(weekday, session)` partition. Active slots within a
//! partition must never overlap; intervals are half-open, so a block ending
//! at 07:40 does not conflict with one starting at 07:40.
//!
//! The equivalence rule encodes the institutional convention that 4
//! technical lessons count as 6 academic lessons (240 real minutes equal
//! 240 academic minutes at 40 minutes per academic lesson), giving the 1.5
//! technical-to-academic ratio.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use aula_core::AppError;

use crate::enums::{LessonType, Session, SlotType, Weekday};
use crate::ids::TimeSlotId;

/// Minutes-equivalence ratio: one technical minute counts as 1.5 academic
/// minutes (4 technical lessons of 60 min equal 6 academic lessons of 40 min).
pub const TECHNICAL_TO_ACADEMIC_RATIO: f64 = 1.5;

// ---------------------------------------------------------------------------
// Time value utilities
// ---------------------------------------------------------------------------

/// True iff `[a_start, a_end)` overlaps `[b_start, b_end)`.
///
/// Half-open semantics: touching endpoints do not overlap.
pub fn times_overlap(
    a_start: NaiveTime,
    a_end: NaiveTime,
    b_start: NaiveTime,
    b_end: NaiveTime,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// Wall-clock duration of `[start, end)` in minutes.
///
/// The caller guarantees `end > start`; this layer does not re-check.
pub fn duration_minutes(start: NaiveTime, end: NaiveTime) -> i64 {
    use chrono::Timelike;
    let start = i64::from(start.hour()) * 60 + i64::from(start.minute());
    let end = i64::from(end.hour()) * 60 + i64::from(end.minute());
    end - start
}

/// Academic-equivalent minutes for a block.
///
/// Breaks and lunch contribute nothing; academic lessons count 1:1;
/// technical lessons count at [`TECHNICAL_TO_ACADEMIC_RATIO`].
pub fn academic_equivalent_minutes(
    slot_type: SlotType,
    lesson_type: Option<LessonType>,
    duration_minutes: i64,
) -> f64 {
    if slot_type != SlotType::Lesson {
        return 0.0;
    }
    match lesson_type {
        Some(LessonType::Technical) => duration_minutes as f64 * TECHNICAL_TO_ACADEMIC_RATIO,
        _ => duration_minutes as f64,
    }
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// One block of the weekly schedule.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct TimeSlot {
    /// Unique identifier for the slot
    pub id: TimeSlotId,
    /// Display label, unique within its `(weekday, session)` partition
    pub name: String,
    /// Start of the block (inclusive)
    pub start_time: NaiveTime,
    /// End of the block (exclusive)
    pub end_time: NaiveTime,
    /// What the block holds: lesson, break, or lunch
    pub slot_type: SlotType,
    /// Lesson kind; present iff `slot_type` is lesson
    pub lesson_type: Option<LessonType>,
    /// Day of the week (0 = Monday ... 6 = Sunday)
    #[schema(value_type = i32, minimum = 0, maximum = 6)]
    pub weekday: Weekday,
    /// Scheduling partition: day or night session
    pub session: Session,
    /// Only active slots participate in overlap checks
    pub is_active: bool,
    /// Timestamp when the slot was created
    pub created_at: DateTime<Utc>,
    /// Timestamp when the slot was last updated
    pub updated_at: DateTime<Utc>,
}

impl TimeSlot {
    /// Wall-clock duration of the block in minutes.
    pub fn duration_minutes(&self) -> i64 {
        duration_minutes(self.start_time, self.end_time)
    }

    /// Academic-equivalent minutes of the block.
    pub fn academic_equivalent_minutes(&self) -> f64 {
        academic_equivalent_minutes(self.slot_type, self.lesson_type, self.duration_minutes())
    }

    /// True iff this slot overlaps `other` within the same partition.
    pub fn overlaps_with(&self, other: &TimeSlot) -> bool {
        if self.weekday != other.weekday || self.session != other.session {
            return false;
        }
        times_overlap(
            self.start_time,
            self.end_time,
            other.start_time,
            other.end_time,
        )
    }
}

// ---------------------------------------------------------------------------
// Invariant checker
// ---------------------------------------------------------------------------

/// Rejects a candidate whose field combination can never be committed:
/// lessons require a lesson type, non-lessons forbid one, and the interval
/// must be non-empty.
pub fn validate_slot_consistency(
    slot_type: SlotType,
    lesson_type: Option<LessonType>,
    start_time: NaiveTime,
    end_time: NaiveTime,
) -> Result<(), ScheduleError> {
    if end_time <= start_time {
        return Err(ScheduleError::InvalidTimeRange);
    }
    if slot_type == SlotType::Lesson && lesson_type.is_none() {
        return Err(ScheduleError::InvalidLessonType {
            detail: "lesson_type is required when slot_type is 'lesson'",
        });
    }
    if slot_type != SlotType::Lesson && lesson_type.is_some() {
        return Err(ScheduleError::InvalidLessonType {
            detail: "lesson_type only applies when slot_type is 'lesson'",
        });
    }
    Ok(())
}

/// Scans `existing` for an active slot overlapping `[start_time, end_time)`,
/// ignoring `exclude` (the slot being updated, so it never conflicts with
/// itself). Callers pass the rows of a single `(weekday, session)`
/// partition; the first conflict found is returned.
pub fn find_overlap<'a>(
    start_time: NaiveTime,
    end_time: NaiveTime,
    existing: &'a [TimeSlot],
    exclude: Option<TimeSlotId>,
) -> Option<&'a TimeSlot> {
    existing
        .iter()
        .filter(|slot| slot.is_active)
        .filter(|slot| Some(slot.id) != exclude)
        .find(|slot| times_overlap(start_time, end_time, slot.start_time, slot.end_time))
}

/// Validation failures of the scheduling invariants.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("end_time must be after start_time")]
    InvalidTimeRange,

    #[error("{detail}")]
    InvalidLessonType { detail: &'static str },

    #[error("block '{name}' ({start}\u{2013}{end}) overlaps the requested time range")]
    OverlapConflict {
        name: String,
        start: NaiveTime,
        end: NaiveTime,
    },

    #[error("time slot {0} not found")]
    NotFound(TimeSlotId),
}

impl ScheduleError {
    /// Conflict error naming the slot the candidate collides with.
    pub fn conflict_with(slot: &TimeSlot) -> Self {
        ScheduleError::OverlapConflict {
            name: slot.name.clone(),
            start: slot.start_time,
            end: slot.end_time,
        }
    }
}

impl From<ScheduleError> for AppError {
    fn from(err: ScheduleError) -> Self {
        match &err {
            ScheduleError::InvalidTimeRange | ScheduleError::InvalidLessonType { .. } => {
                AppError::unprocessable(err)
            }
            ScheduleError::OverlapConflict { .. } => AppError::conflict(err),
            ScheduleError::NotFound(_) => AppError::not_found(err),
        }
    }
}

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

/// DTO for creating a time slot.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateTimeSlotDto {
    /// Display label (e.g. "Bloque 1", "Recreo")
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Start of the block (HH:MM)
    pub start_time: NaiveTime,
    /// End of the block (HH:MM), must be after start_time
    pub end_time: NaiveTime,
    /// lesson | break | lunch
    pub slot_type: SlotType,
    /// academic | technical; required iff slot_type is lesson
    pub lesson_type: Option<LessonType>,
    /// Day of the week (0 = Monday ... 6 = Sunday)
    #[schema(value_type = i32, minimum = 0, maximum = 6)]
    pub weekday: Weekday,
    /// day | night
    pub session: Session,
    /// Defaults to true
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// DTO for partially updating a time slot. Unspecified fields are retained.
///
/// `lesson_type` distinguishes "absent" from "set to null" via the double
/// Option: the outer layer is presence in the payload, the inner the value.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateTimeSlotDto {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub slot_type: Option<SlotType>,
    #[serde(default, with = "double_option")]
    #[schema(value_type = Option<LessonType>)]
    pub lesson_type: Option<Option<LessonType>>,
    #[schema(value_type = Option<i32>, minimum = 0, maximum = 6)]
    pub weekday: Option<Weekday>,
    pub session: Option<Session>,
    pub is_active: Option<bool>,
}

/// Serde helper: maps a present-but-null field to `Some(None)` and an
/// absent field to `None` (via `#[serde(default)]`).
mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

/// Query parameters for filtering time slots.
#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
pub struct TimeSlotFilterParams {
    /// Filter by day of the week (0 = Monday ... 6 = Sunday)
    #[param(value_type = Option<i32>, minimum = 0, maximum = 6)]
    #[schema(value_type = Option<i32>)]
    pub weekday: Option<Weekday>,
    /// Filter by session: day | night
    pub session: Option<Session>,
    /// Filter by slot type: lesson | break | lunch
    pub slot_type: Option<SlotType>,
    /// Filter by active flag
    pub is_active: Option<bool>,
}

/// Response shape for a time slot, including the derived minute values.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TimeSlotResponse {
    pub id: TimeSlotId,
    pub name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub slot_type: SlotType,
    pub lesson_type: Option<LessonType>,
    #[schema(value_type = i32, minimum = 0, maximum = 6)]
    pub weekday: Weekday,
    pub session: Session,
    pub is_active: bool,
    /// Wall-clock duration in minutes
    pub duration_minutes: i64,
    /// Academic-equivalent minutes (technical counts at 1.5)
    pub academic_equivalent_minutes: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TimeSlot> for TimeSlotResponse {
    fn from(slot: TimeSlot) -> Self {
        let duration = slot.duration_minutes();
        let equivalent = slot.academic_equivalent_minutes();
        Self {
            id: slot.id,
            name: slot.name,
            start_time: slot.start_time,
            end_time: slot.end_time,
            slot_type: slot.slot_type,
            lesson_type: slot.lesson_type,
            weekday: slot.weekday,
            session: slot.session,
            is_active: slot.is_active,
            duration_minutes: duration,
            academic_equivalent_minutes: equivalent,
            created_at: slot.created_at,
            updated_at: slot.updated_at,
        }
    }
}

/// Request to seed the default weekly template.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SeedTemplateRequest {
    /// Session to generate: day | night
    pub session: Session,
    /// Weekdays to generate (default: Monday through Friday)
    #[serde(default = "default_seed_weekdays")]
    #[schema(value_type = Vec<i32>)]
    pub weekdays: Vec<Weekday>,
    /// When true, existing template blocks are deleted and re-created
    #[serde(default)]
    pub overwrite: bool,
}

fn default_seed_weekdays() -> Vec<Weekday> {
    Weekday::MONDAY_TO_FRIDAY.to_vec()
}

/// Outcome of a template seeding call.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SeedTemplateResponse {
    pub created: u32,
    pub skipped: u32,
    pub overwritten: u32,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn slot(name: &str, start: NaiveTime, end: NaiveTime) -> TimeSlot {
        TimeSlot {
            id: TimeSlotId::new(),
            name: name.to_string(),
            start_time: start,
            end_time: end,
            slot_type: SlotType::Lesson,
            lesson_type: Some(LessonType::Academic),
            weekday: Weekday::Monday,
            session: Session::Day,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_times_overlap_half_open() {
        // Touching endpoints do not overlap
        assert!(!times_overlap(t(7, 0), t(7, 40), t(7, 40), t(8, 20)));
        assert!(!times_overlap(t(7, 40), t(8, 20), t(7, 0), t(7, 40)));
        // Partial overlap does
        assert!(times_overlap(t(7, 0), t(7, 40), t(7, 20), t(8, 0)));
        // Containment does
        assert!(times_overlap(t(7, 0), t(9, 0), t(7, 30), t(8, 0)));
        // Disjoint does not
        assert!(!times_overlap(t(7, 0), t(7, 40), t(9, 0), t(9, 20)));
    }

    #[test]
    fn test_duration_minutes() {
        assert_eq!(duration_minutes(t(7, 0), t(7, 40)), 40);
        assert_eq!(duration_minutes(t(11, 20), t(12, 20)), 60);
        assert_eq!(duration_minutes(t(9, 0), t(9, 20)), 20);
    }

    #[test]
    fn test_academic_equivalent_minutes() {
        // 40-minute academic lesson counts 1:1
        assert_eq!(
            academic_equivalent_minutes(SlotType::Lesson, Some(LessonType::Academic), 40),
            40.0
        );
        // 60-minute technical lesson counts at 1.5
        assert_eq!(
            academic_equivalent_minutes(SlotType::Lesson, Some(LessonType::Technical), 60),
            90.0
        );
        // Breaks and lunch contribute nothing regardless of duration
        assert_eq!(academic_equivalent_minutes(SlotType::Break, None, 20), 0.0);
        assert_eq!(academic_equivalent_minutes(SlotType::Lunch, None, 60), 0.0);
    }

    #[test]
    fn test_slot_computed_properties() {
        let mut block = slot("Bloque 7", t(12, 20), t(13, 20));
        block.lesson_type = Some(LessonType::Technical);
        assert_eq!(block.duration_minutes(), 60);
        assert_eq!(block.academic_equivalent_minutes(), 90.0);
    }

    #[test]
    fn test_overlaps_with_respects_partition() {
        let a = slot("Bloque 1", t(7, 0), t(7, 40));
        let mut b = slot("Bloque 1", t(7, 0), t(7, 40));
        b.session = Session::Night;
        assert!(!a.overlaps_with(&b));

        let mut c = slot("Bloque 1", t(7, 0), t(7, 40));
        c.weekday = Weekday::Tuesday;
        assert!(!a.overlaps_with(&c));

        let d = slot("Bloque X", t(7, 20), t(8, 0));
        assert!(a.overlaps_with(&d));
    }

    #[test]
    fn test_consistency_lesson_requires_lesson_type() {
        let err =
            validate_slot_consistency(SlotType::Lesson, None, t(7, 0), t(7, 40)).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidLessonType { .. }));
    }

    #[test]
    fn test_consistency_break_forbids_lesson_type() {
        let err = validate_slot_consistency(
            SlotType::Break,
            Some(LessonType::Academic),
            t(9, 0),
            t(9, 20),
        )
        .unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidLessonType { .. }));
    }

    #[test]
    fn test_consistency_rejects_empty_interval() {
        let err = validate_slot_consistency(
            SlotType::Lesson,
            Some(LessonType::Academic),
            t(8, 0),
            t(8, 0),
        )
        .unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidTimeRange));

        let err = validate_slot_consistency(
            SlotType::Lesson,
            Some(LessonType::Academic),
            t(8, 0),
            t(7, 0),
        )
        .unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidTimeRange));
    }

    #[test]
    fn test_find_overlap_reports_first_conflict() {
        let existing = vec![
            slot("Bloque 1", t(7, 0), t(7, 40)),
            slot("Bloque 2", t(7, 40), t(8, 20)),
        ];
        let hit = find_overlap(t(7, 20), t(8, 0), &existing, None).unwrap();
        assert_eq!(hit.name, "Bloque 1");
    }

    #[test]
    fn test_find_overlap_skips_inactive() {
        let mut inactive = slot("Bloque 1", t(7, 0), t(7, 40));
        inactive.is_active = false;
        let existing = vec![inactive];
        assert!(find_overlap(t(7, 0), t(7, 40), &existing, None).is_none());
    }

    #[test]
    fn test_find_overlap_excludes_self() {
        let me = slot("Bloque 1", t(7, 0), t(7, 40));
        let my_id = me.id;
        let existing = vec![me];
        // Re-validating my own interval must not conflict with myself
        assert!(find_overlap(t(7, 0), t(7, 40), &existing, Some(my_id)).is_none());
        // But without the exclusion it would
        assert!(find_overlap(t(7, 0), t(7, 40), &existing, None).is_some());
    }

    #[test]
    fn test_update_dto_lesson_type_tri_state() {
        // Absent field: lesson_type untouched
        let dto: UpdateTimeSlotDto = serde_json::from_str(r#"{"name":"Bloque 1"}"#).unwrap();
        assert_eq!(dto.lesson_type, None);

        // Explicit null: clear the lesson type
        let dto: UpdateTimeSlotDto = serde_json::from_str(r#"{"lesson_type":null}"#).unwrap();
        assert_eq!(dto.lesson_type, Some(None));

        // Explicit value
        let dto: UpdateTimeSlotDto =
            serde_json::from_str(r#"{"lesson_type":"technical"}"#).unwrap();
        assert_eq!(dto.lesson_type, Some(Some(LessonType::Technical)));
    }

    #[test]
    fn test_seed_request_defaults() {
        let req: SeedTemplateRequest = serde_json::from_str(r#"{"session":"day"}"#).unwrap();
        assert_eq!(req.weekdays, Weekday::MONDAY_TO_FRIDAY.to_vec());
        assert!(!req.overwrite);
    }

    #[test]
    fn test_response_carries_derived_fields() {
        let block = slot("Bloque 1", t(7, 0), t(7, 40));
        let response = TimeSlotResponse::from(block);
        assert_eq!(response.duration_minutes, 40);
        assert_eq!(response.academic_equivalent_minutes, 40.0);
        assert_eq!(response.start_time.minute(), 0);
    }
}
