use std::collections::HashSet;

use chrono::NaiveTime;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::instrument;

use aula_core::AppError;
use aula_models::enums::{LessonType, Session, SlotType, Weekday};
use aula_models::ids::TimeSlotId;

use crate::modules::time_slots::model::{
    CreateTimeSlotDto, ScheduleError, SeedTemplateRequest, SeedTemplateResponse, TimeSlot,
    TimeSlotFilterParams, UpdateTimeSlotDto, find_overlap, validate_slot_consistency,
};

/// Advisory-lock namespace for `(weekday, session)` partitions.
const PARTITION_LOCK_SPACE: i32 = 0x534C4F54; // "SLOT"

const SLOT_COLUMNS: &str = "id, name, start_time, end_time, slot_type, lesson_type, \
                            weekday, session, is_active, created_at, updated_at";

pub struct TimeSlotService;

impl TimeSlotService {
    /// Serializes writers of one `(weekday, session)` partition.
    ///
    /// Overlap validation and the following insert/update must act as a
    /// unit; without the lock two concurrent writers could each pass the
    /// scan and commit overlapping slots.
    async fn lock_partition(
        tx: &mut Transaction<'_, Postgres>,
        weekday: Weekday,
        session: Session,
    ) -> Result<(), AppError> {
        let partition_key = i32::from(weekday.as_i16()) * 2
            + match session {
                Session::Day => 0,
                Session::Night => 1,
            };

        sqlx::query("SELECT pg_advisory_xact_lock($1, $2)")
            .bind(PARTITION_LOCK_SPACE)
            .bind(partition_key)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    /// All slots (active and inactive) of one partition.
    async fn partition_slots(
        tx: &mut Transaction<'_, Postgres>,
        weekday: Weekday,
        session: Session,
    ) -> Result<Vec<TimeSlot>, AppError> {
        let slots = sqlx::query_as::<_, TimeSlot>(&format!(
            "SELECT {SLOT_COLUMNS} FROM time_slots WHERE weekday = $1 AND session = $2"
        ))
        .bind(weekday)
        .bind(session)
        .fetch_all(&mut **tx)
        .await?;

        Ok(slots)
    }

    async fn insert_slot(
        tx: &mut Transaction<'_, Postgres>,
        name: &str,
        start_time: NaiveTime,
        end_time: NaiveTime,
        slot_type: SlotType,
        lesson_type: Option<LessonType>,
        weekday: Weekday,
        session: Session,
        is_active: bool,
    ) -> Result<TimeSlot, AppError> {
        let slot = sqlx::query_as::<_, TimeSlot>(&format!(
            r#"INSERT INTO time_slots
                   (name, start_time, end_time, slot_type, lesson_type, weekday, session, is_active)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
               RETURNING {SLOT_COLUMNS}"#
        ))
        .bind(name)
        .bind(start_time)
        .bind(end_time)
        .bind(slot_type)
        .bind(lesson_type)
        .bind(weekday)
        .bind(session)
        .bind(is_active)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
                && db_err.message().contains("unique_slot_name_per_day_session")
            {
                return AppError::conflict(anyhow::anyhow!(
                    "A block named '{}' already exists for this weekday and session",
                    name
                ));
            }
            AppError::from(e)
        })?;

        Ok(slot)
    }

    /// Create a time slot, validating lesson-type consistency and the
    /// non-overlap invariant of its partition.
    #[instrument(skip(db))]
    pub async fn create(db: &PgPool, dto: CreateTimeSlotDto) -> Result<TimeSlot, AppError> {
        validate_slot_consistency(dto.slot_type, dto.lesson_type, dto.start_time, dto.end_time)?;

        let mut tx = db.begin().await?;
        Self::lock_partition(&mut tx, dto.weekday, dto.session).await?;

        let existing = Self::partition_slots(&mut tx, dto.weekday, dto.session).await?;
        if let Some(conflict) = find_overlap(dto.start_time, dto.end_time, &existing, None) {
            return Err(ScheduleError::conflict_with(conflict).into());
        }

        let slot = Self::insert_slot(
            &mut tx,
            &dto.name,
            dto.start_time,
            dto.end_time,
            dto.slot_type,
            dto.lesson_type,
            dto.weekday,
            dto.session,
            dto.is_active,
        )
        .await?;

        tx.commit().await?;
        Ok(slot)
    }

    /// List time slots with optional filters, ordered by weekday then
    /// start time.
    #[instrument(skip(db))]
    pub async fn get_all(
        db: &PgPool,
        filters: TimeSlotFilterParams,
    ) -> Result<Vec<TimeSlot>, AppError> {
        let mut query = format!("SELECT {SLOT_COLUMNS} FROM time_slots WHERE 1=1");

        if let Some(weekday) = filters.weekday {
            query.push_str(&format!(" AND weekday = {}", weekday.as_i16()));
        }
        if let Some(session) = filters.session {
            query.push_str(&format!(" AND session = '{}'", session.as_str()));
        }
        if let Some(slot_type) = filters.slot_type {
            let tag = match slot_type {
                SlotType::Lesson => "lesson",
                SlotType::Break => "break",
                SlotType::Lunch => "lunch",
            };
            query.push_str(&format!(" AND slot_type = '{}'", tag));
        }
        if let Some(is_active) = filters.is_active {
            query.push_str(&format!(" AND is_active = {}", is_active));
        }

        query.push_str(" ORDER BY weekday, start_time");

        let slots = sqlx::query_as::<_, TimeSlot>(&query).fetch_all(db).await?;
        Ok(slots)
    }

    /// Get a time slot by ID.
    #[instrument(skip(db))]
    pub async fn get_by_id(db: &PgPool, slot_id: TimeSlotId) -> Result<TimeSlot, AppError> {
        let slot = sqlx::query_as::<_, TimeSlot>(&format!(
            "SELECT {SLOT_COLUMNS} FROM time_slots WHERE id = $1"
        ))
        .bind(slot_id)
        .fetch_optional(db)
        .await?
        .ok_or(ScheduleError::NotFound(slot_id))?;

        Ok(slot)
    }

    /// Apply a partial update, re-validating consistency and overlap on
    /// the resulting slot. The slot itself is excluded from the overlap
    /// scan so an update that keeps its own time range never conflicts
    /// with itself.
    #[instrument(skip(db))]
    pub async fn update(
        db: &PgPool,
        slot_id: TimeSlotId,
        dto: UpdateTimeSlotDto,
    ) -> Result<TimeSlot, AppError> {
        let existing = Self::get_by_id(db, slot_id).await?;

        let name = dto.name.unwrap_or(existing.name);
        let start_time = dto.start_time.unwrap_or(existing.start_time);
        let end_time = dto.end_time.unwrap_or(existing.end_time);
        let slot_type = dto.slot_type.unwrap_or(existing.slot_type);
        let lesson_type = match dto.lesson_type {
            Some(value) => value,
            None => existing.lesson_type,
        };
        let weekday = dto.weekday.unwrap_or(existing.weekday);
        let session = dto.session.unwrap_or(existing.session);
        let is_active = dto.is_active.unwrap_or(existing.is_active);

        validate_slot_consistency(slot_type, lesson_type, start_time, end_time)?;

        let mut tx = db.begin().await?;
        Self::lock_partition(&mut tx, weekday, session).await?;

        let neighbours = Self::partition_slots(&mut tx, weekday, session).await?;
        if is_active
            && let Some(conflict) = find_overlap(start_time, end_time, &neighbours, Some(slot_id))
        {
            return Err(ScheduleError::conflict_with(conflict).into());
        }

        let slot = sqlx::query_as::<_, TimeSlot>(&format!(
            r#"UPDATE time_slots
               SET name = $1, start_time = $2, end_time = $3, slot_type = $4,
                   lesson_type = $5, weekday = $6, session = $7, is_active = $8,
                   updated_at = NOW()
               WHERE id = $9
               RETURNING {SLOT_COLUMNS}"#
        ))
        .bind(&name)
        .bind(start_time)
        .bind(end_time)
        .bind(slot_type)
        .bind(lesson_type)
        .bind(weekday)
        .bind(session)
        .bind(is_active)
        .bind(slot_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
                && db_err.message().contains("unique_slot_name_per_day_session")
            {
                return AppError::conflict(anyhow::anyhow!(
                    "A block named '{}' already exists for this weekday and session",
                    name
                ));
            }
            AppError::from(e)
        })?;

        tx.commit().await?;
        Ok(slot)
    }

    /// Hard-delete a time slot.
    #[instrument(skip(db))]
    pub async fn delete(db: &PgPool, slot_id: TimeSlotId) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM time_slots WHERE id = $1")
            .bind(slot_id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ScheduleError::NotFound(slot_id).into());
        }

        Ok(())
    }

    /// Seed the default weekly template for a session.
    ///
    /// For each requested weekday, template entries are matched by
    /// `(name, weekday, session)`: absent entries are created, present
    /// ones are skipped or, with `overwrite`, deleted and re-created.
    /// The whole call runs in one transaction; a conflict with a
    /// pre-existing non-template slot aborts and rolls back everything.
    #[instrument(skip(db))]
    pub async fn seed_template(
        db: &PgPool,
        request: SeedTemplateRequest,
    ) -> Result<SeedTemplateResponse, AppError> {
        let template = template_for(request.session);
        let template_names: HashSet<&str> = template.iter().map(|entry| entry.name).collect();

        // Sorted and deduplicated so concurrent seeders take partition
        // locks in a stable order.
        let mut weekdays = request.weekdays.clone();
        weekdays.sort_by_key(|w| w.as_i16());
        weekdays.dedup();

        let mut created = 0u32;
        let mut skipped = 0u32;
        let mut overwritten = 0u32;

        let mut tx = db.begin().await?;

        for &weekday in &weekdays {
            Self::lock_partition(&mut tx, weekday, request.session).await?;
            let existing = Self::partition_slots(&mut tx, weekday, request.session).await?;

            // Rows the template does not own; the template itself is
            // non-overlapping by construction, so only these can conflict.
            let external: Vec<TimeSlot> = existing
                .iter()
                .filter(|slot| !template_names.contains(slot.name.as_str()))
                .cloned()
                .collect();

            for entry in &template {
                match existing.iter().find(|slot| slot.name == entry.name) {
                    Some(_) if !request.overwrite => {
                        skipped += 1;
                        continue;
                    }
                    Some(slot) => {
                        sqlx::query("DELETE FROM time_slots WHERE id = $1")
                            .bind(slot.id)
                            .execute(&mut *tx)
                            .await?;
                        overwritten += 1;
                    }
                    None => {
                        created += 1;
                    }
                }

                if let Some(conflict) =
                    find_overlap(entry.start_time, entry.end_time, &external, None)
                {
                    return Err(ScheduleError::conflict_with(conflict).into());
                }

                Self::insert_slot(
                    &mut tx,
                    entry.name,
                    entry.start_time,
                    entry.end_time,
                    entry.slot_type,
                    entry.lesson_type,
                    weekday,
                    request.session,
                    true,
                )
                .await?;
            }
        }

        tx.commit().await?;

        let total = created + skipped + overwritten;
        let message = format!(
            "{} created, {} overwritten, {} skipped of {} blocks across {} weekdays.",
            created,
            overwritten,
            skipped,
            total,
            weekdays.len()
        );

        Ok(SeedTemplateResponse {
            created,
            skipped,
            overwritten,
            message,
        })
    }
}

/// One entry of the fixed weekly template.
struct TemplateEntry {
    name: &'static str,
    start_time: NaiveTime,
    end_time: NaiveTime,
    slot_type: SlotType,
    lesson_type: Option<LessonType>,
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("template times are valid")
}

fn lesson(
    name: &'static str,
    start: NaiveTime,
    end: NaiveTime,
    lesson_type: LessonType,
) -> TemplateEntry {
    TemplateEntry {
        name,
        start_time: start,
        end_time: end,
        slot_type: SlotType::Lesson,
        lesson_type: Some(lesson_type),
    }
}

fn pause(name: &'static str, start: NaiveTime, end: NaiveTime, slot_type: SlotType) -> TemplateEntry {
    TemplateEntry {
        name,
        start_time: start,
        end_time: end,
        slot_type,
        lesson_type: None,
    }
}

/// The fixed "default school day" per session.
///
/// Day: 6 academic lessons (40 min), 4 technical lessons (60 min), 2
/// breaks and lunch, 07:00-16:40. Night: 3 technical lessons, 1 academic
/// lesson and a break, 18:00-22:00.
fn template_for(session: Session) -> Vec<TemplateEntry> {
    use LessonType::{Academic, Technical};

    match session {
        Session::Day => vec![
            lesson("Bloque 1", hm(7, 0), hm(7, 40), Academic),
            lesson("Bloque 2", hm(7, 40), hm(8, 20), Academic),
            lesson("Bloque 3", hm(8, 20), hm(9, 0), Academic),
            pause("Recreo", hm(9, 0), hm(9, 20), SlotType::Break),
            lesson("Bloque 4", hm(9, 20), hm(10, 0), Academic),
            lesson("Bloque 5", hm(10, 0), hm(10, 40), Academic),
            lesson("Bloque 6", hm(10, 40), hm(11, 20), Academic),
            pause("Almuerzo", hm(11, 20), hm(12, 20), SlotType::Lunch),
            lesson("Bloque 7", hm(12, 20), hm(13, 20), Technical),
            lesson("Bloque 8", hm(13, 20), hm(14, 20), Technical),
            pause("Recreo 2", hm(14, 20), hm(14, 40), SlotType::Break),
            lesson("Bloque 9", hm(14, 40), hm(15, 40), Technical),
            lesson("Bloque 10", hm(15, 40), hm(16, 40), Technical),
        ],
        Session::Night => vec![
            lesson("Bloque 1", hm(18, 0), hm(19, 0), Technical),
            lesson("Bloque 2", hm(19, 0), hm(20, 0), Technical),
            pause("Recreo", hm(20, 0), hm(20, 20), SlotType::Break),
            lesson("Bloque 3", hm(20, 20), hm(21, 20), Technical),
            lesson("Bloque 4", hm(21, 20), hm(22, 0), Academic),
        ],
    }
}
