use chrono::NaiveDate;
use sqlx::PgPool;
use tracing::instrument;

use aula_core::AppError;
use aula_models::ids::{AcademicYearId, PeriodId};

use crate::modules::periods::model::{CreatePeriodDto, Period, PeriodFilterParams, UpdatePeriodDto};

const PERIOD_COLUMNS: &str =
    "id, academic_year_id, name, start_date, end_date, is_active, created_at, updated_at";

pub struct PeriodService;

impl PeriodService {
    /// Date ranges touch-or-overlap check. Periods use inclusive dates,
    /// so sharing a boundary day counts as overlap.
    fn dates_overlap(
        start1: NaiveDate,
        end1: NaiveDate,
        start2: NaiveDate,
        end2: NaiveDate,
    ) -> bool {
        start1 <= end2 && start2 <= end1
    }

    /// Validate period dates against the other periods of the same year.
    async fn validate_dates(
        db: &PgPool,
        academic_year_id: AcademicYearId,
        start_date: NaiveDate,
        end_date: NaiveDate,
        exclude_period_id: Option<PeriodId>,
    ) -> Result<(), AppError> {
        if start_date >= end_date {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Start date must be before end date"
            )));
        }

        let existing = sqlx::query_as::<_, Period>(&format!(
            "SELECT {PERIOD_COLUMNS} FROM periods WHERE academic_year_id = $1"
        ))
        .bind(academic_year_id)
        .fetch_all(db)
        .await?;

        for period in existing {
            if let Some(exclude_id) = exclude_period_id
                && period.id == exclude_id
            {
                continue;
            }

            if Self::dates_overlap(start_date, end_date, period.start_date, period.end_date) {
                return Err(AppError::bad_request(anyhow::anyhow!(
                    "Period dates overlap with existing period: {} ({} to {})",
                    period.name,
                    period.start_date,
                    period.end_date
                )));
            }
        }

        Ok(())
    }

    /// List periods, optionally filtered by year, ordered by start date.
    #[instrument(skip(db))]
    pub async fn get_all(
        db: &PgPool,
        filters: PeriodFilterParams,
    ) -> Result<Vec<Period>, AppError> {
        let mut query = format!("SELECT {PERIOD_COLUMNS} FROM periods WHERE 1=1");

        if let Some(year_id) = filters.academic_year_id {
            query.push_str(&format!(" AND academic_year_id = '{}'", year_id));
        }
        if let Some(is_active) = filters.is_active {
            query.push_str(&format!(" AND is_active = {}", is_active));
        }

        query.push_str(" ORDER BY start_date");

        let periods = sqlx::query_as::<_, Period>(&query).fetch_all(db).await?;
        Ok(periods)
    }

    #[instrument(skip(db))]
    pub async fn get_by_id(db: &PgPool, period_id: PeriodId) -> Result<Period, AppError> {
        let period = sqlx::query_as::<_, Period>(&format!(
            "SELECT {PERIOD_COLUMNS} FROM periods WHERE id = $1"
        ))
        .bind(period_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Period not found")))?;

        Ok(period)
    }

    /// Create a period within an academic year.
    #[instrument(skip(db))]
    pub async fn create(db: &PgPool, dto: CreatePeriodDto) -> Result<Period, AppError> {
        let year_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM academic_years WHERE id = $1)",
        )
        .bind(dto.academic_year_id)
        .fetch_one(db)
        .await?;

        if !year_exists {
            return Err(AppError::not_found(anyhow::anyhow!(
                "Academic year not found"
            )));
        }

        Self::validate_dates(db, dto.academic_year_id, dto.start_date, dto.end_date, None).await?;

        let mut tx = db.begin().await?;

        if dto.is_active {
            sqlx::query(
                "UPDATE periods SET is_active = FALSE, updated_at = NOW()
                 WHERE academic_year_id = $1 AND is_active = TRUE",
            )
            .bind(dto.academic_year_id)
            .execute(&mut *tx)
            .await?;
        }

        let period = sqlx::query_as::<_, Period>(&format!(
            r#"INSERT INTO periods (academic_year_id, name, start_date, end_date, is_active)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING {PERIOD_COLUMNS}"#
        ))
        .bind(dto.academic_year_id)
        .bind(&dto.name)
        .bind(dto.start_date)
        .bind(dto.end_date)
        .bind(dto.is_active)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                return AppError::bad_request(anyhow::anyhow!(
                    "A period named '{}' already exists in this academic year",
                    dto.name
                ));
            }
            AppError::from(e)
        })?;

        tx.commit().await?;
        Ok(period)
    }

    /// Apply a partial update, re-validating the resulting date range.
    #[instrument(skip(db))]
    pub async fn update(
        db: &PgPool,
        period_id: PeriodId,
        dto: UpdatePeriodDto,
    ) -> Result<Period, AppError> {
        let existing = Self::get_by_id(db, period_id).await?;

        let name = dto.name.unwrap_or(existing.name);
        let start_date = dto.start_date.unwrap_or(existing.start_date);
        let end_date = dto.end_date.unwrap_or(existing.end_date);

        Self::validate_dates(
            db,
            existing.academic_year_id,
            start_date,
            end_date,
            Some(period_id),
        )
        .await?;

        let period = sqlx::query_as::<_, Period>(&format!(
            r#"UPDATE periods
               SET name = $1, start_date = $2, end_date = $3, updated_at = NOW()
               WHERE id = $4
               RETURNING {PERIOD_COLUMNS}"#
        ))
        .bind(&name)
        .bind(start_date)
        .bind(end_date)
        .bind(period_id)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                return AppError::bad_request(anyhow::anyhow!(
                    "A period named '{}' already exists in this academic year",
                    name
                ));
            }
            AppError::from(e)
        })?;

        Ok(period)
    }

    /// Activate a period, deactivating its siblings in the same year
    /// atomically.
    #[instrument(skip(db))]
    pub async fn activate(db: &PgPool, period_id: PeriodId) -> Result<Period, AppError> {
        let existing = Self::get_by_id(db, period_id).await?;

        let mut tx = db.begin().await?;

        sqlx::query(
            "UPDATE periods SET is_active = FALSE, updated_at = NOW()
             WHERE academic_year_id = $1 AND is_active = TRUE",
        )
        .bind(existing.academic_year_id)
        .execute(&mut *tx)
        .await?;

        let period = sqlx::query_as::<_, Period>(&format!(
            r#"UPDATE periods
               SET is_active = TRUE, updated_at = NOW()
               WHERE id = $1
               RETURNING {PERIOD_COLUMNS}"#
        ))
        .bind(period_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(period)
    }

    /// Delete a period.
    #[instrument(skip(db))]
    pub async fn delete(db: &PgPool, period_id: PeriodId) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM periods WHERE id = $1")
            .bind(period_id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Period not found")));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    async fn create_test_year(pool: &PgPool, year: i32) -> AcademicYearId {
        sqlx::query_scalar::<_, AcademicYearId>(
            "INSERT INTO academic_years (year, name) VALUES ($1, $2) RETURNING id",
        )
        .bind(year)
        .bind(format!("Año {year}"))
        .fetch_one(pool)
        .await
        .unwrap()
    }

    fn d(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn dto(
        year_id: AcademicYearId,
        name: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> CreatePeriodDto {
        CreatePeriodDto {
            academic_year_id: year_id,
            name: name.to_string(),
            start_date: start,
            end_date: end,
            is_active: false,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_period(pool: PgPool) {
        let year_id = create_test_year(&pool, 2026).await;

        let period = PeriodService::create(
            &pool,
            dto(year_id, "Trimestre 1", d(2026, 2, 1), d(2026, 4, 30)),
        )
        .await
        .unwrap();

        assert_eq!(period.name, "Trimestre 1");
        assert!(!period.is_active);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_rejects_inverted_dates(pool: PgPool) {
        let year_id = create_test_year(&pool, 2026).await;

        let err = PeriodService::create(
            &pool,
            dto(year_id, "Trimestre 1", d(2026, 4, 30), d(2026, 2, 1)),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_rejects_overlapping_dates(pool: PgPool) {
        let year_id = create_test_year(&pool, 2026).await;

        PeriodService::create(
            &pool,
            dto(year_id, "Trimestre 1", d(2026, 2, 1), d(2026, 4, 30)),
        )
        .await
        .unwrap();

        let err = PeriodService::create(
            &pool,
            dto(year_id, "Trimestre 2", d(2026, 4, 15), d(2026, 7, 15)),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.error.to_string().contains("overlap"));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_update_self_exclusion(pool: PgPool) {
        let year_id = create_test_year(&pool, 2026).await;

        let period = PeriodService::create(
            &pool,
            dto(year_id, "Trimestre 1", d(2026, 2, 1), d(2026, 4, 30)),
        )
        .await
        .unwrap();

        // Extending its own range must not conflict with itself
        let updated = PeriodService::update(
            &pool,
            period.id,
            UpdatePeriodDto {
                end_date: Some(d(2026, 5, 15)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.end_date, d(2026, 5, 15));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_activate_deactivates_siblings(pool: PgPool) {
        let year_id = create_test_year(&pool, 2026).await;

        let first = PeriodService::create(
            &pool,
            CreatePeriodDto {
                is_active: true,
                ..dto(year_id, "Trimestre 1", d(2026, 2, 1), d(2026, 4, 30))
            },
        )
        .await
        .unwrap();
        assert!(first.is_active);

        let second = PeriodService::create(
            &pool,
            dto(year_id, "Trimestre 2", d(2026, 5, 1), d(2026, 7, 31)),
        )
        .await
        .unwrap();

        let activated = PeriodService::activate(&pool, second.id).await.unwrap();
        assert!(activated.is_active);

        let first = PeriodService::get_by_id(&pool, first.id).await.unwrap();
        assert!(!first.is_active);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_periods_in_different_years_may_overlap(pool: PgPool) {
        let year_2026 = create_test_year(&pool, 2026).await;
        let year_2027 = create_test_year(&pool, 2027).await;

        PeriodService::create(
            &pool,
            dto(year_2026, "Trimestre 1", d(2026, 2, 1), d(2026, 4, 30)),
        )
        .await
        .unwrap();

        let result = PeriodService::create(
            &pool,
            dto(year_2027, "Trimestre 1", d(2026, 2, 1), d(2026, 4, 30)),
        )
        .await;

        assert!(result.is_ok());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_missing_year_is_404(pool: PgPool) {
        let err = PeriodService::create(
            &pool,
            dto(AcademicYearId::new(), "T1", d(2026, 2, 1), d(2026, 4, 30)),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
