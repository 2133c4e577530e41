use sqlx::PgPool;
use tracing::instrument;

use aula_core::AppError;
use aula_models::ids::AcademicYearId;

use crate::modules::academic_years::model::{
    AcademicYear, CreateAcademicYearDto, UpdateAcademicYearDto,
};

const YEAR_COLUMNS: &str = "id, year, name, is_active, created_at, updated_at";

pub struct AcademicYearService;

impl AcademicYearService {
    /// All academic years, newest first.
    #[instrument(skip(db))]
    pub async fn get_all(db: &PgPool) -> Result<Vec<AcademicYear>, AppError> {
        let years = sqlx::query_as::<_, AcademicYear>(&format!(
            "SELECT {YEAR_COLUMNS} FROM academic_years ORDER BY year DESC"
        ))
        .fetch_all(db)
        .await?;

        Ok(years)
    }

    #[instrument(skip(db))]
    pub async fn get_by_id(db: &PgPool, year_id: AcademicYearId) -> Result<AcademicYear, AppError> {
        let year = sqlx::query_as::<_, AcademicYear>(&format!(
            "SELECT {YEAR_COLUMNS} FROM academic_years WHERE id = $1"
        ))
        .bind(year_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Academic year not found")))?;

        Ok(year)
    }

    /// The currently active year, if any.
    #[instrument(skip(db))]
    pub async fn get_active(db: &PgPool) -> Result<Option<AcademicYear>, AppError> {
        let year = sqlx::query_as::<_, AcademicYear>(&format!(
            "SELECT {YEAR_COLUMNS} FROM academic_years WHERE is_active = TRUE"
        ))
        .fetch_optional(db)
        .await?;

        Ok(year)
    }

    /// Create a new academic year. When `is_active` is requested, every
    /// other year is deactivated in the same transaction.
    #[instrument(skip(db))]
    pub async fn create(db: &PgPool, dto: CreateAcademicYearDto) -> Result<AcademicYear, AppError> {
        let mut tx = db.begin().await?;

        if dto.is_active {
            sqlx::query("UPDATE academic_years SET is_active = FALSE, updated_at = NOW() WHERE is_active = TRUE")
                .execute(&mut *tx)
                .await?;
        }

        let year = sqlx::query_as::<_, AcademicYear>(&format!(
            r#"INSERT INTO academic_years (year, name, is_active)
               VALUES ($1, $2, $3)
               RETURNING {YEAR_COLUMNS}"#
        ))
        .bind(dto.year)
        .bind(&dto.name)
        .bind(dto.is_active)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                return AppError::bad_request(anyhow::anyhow!(
                    "Academic year {} already exists",
                    dto.year
                ));
            }
            AppError::from(e)
        })?;

        tx.commit().await?;
        Ok(year)
    }

    /// Update year number and name. Activation is not an update concern;
    /// it goes through [`Self::activate`].
    #[instrument(skip(db))]
    pub async fn update(
        db: &PgPool,
        year_id: AcademicYearId,
        dto: UpdateAcademicYearDto,
    ) -> Result<AcademicYear, AppError> {
        let existing = Self::get_by_id(db, year_id).await?;

        let year = dto.year.unwrap_or(existing.year);
        let name = dto.name.unwrap_or(existing.name);

        let updated = sqlx::query_as::<_, AcademicYear>(&format!(
            r#"UPDATE academic_years
               SET year = $1, name = $2, updated_at = NOW()
               WHERE id = $3
               RETURNING {YEAR_COLUMNS}"#
        ))
        .bind(year)
        .bind(&name)
        .bind(year_id)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                return AppError::bad_request(anyhow::anyhow!(
                    "Academic year {} already exists",
                    year
                ));
            }
            AppError::from(e)
        })?;

        Ok(updated)
    }

    /// Activate a year, deactivating all other years atomically.
    #[instrument(skip(db))]
    pub async fn activate(db: &PgPool, year_id: AcademicYearId) -> Result<AcademicYear, AppError> {
        let mut tx = db.begin().await?;

        sqlx::query("UPDATE academic_years SET is_active = FALSE, updated_at = NOW() WHERE is_active = TRUE")
            .execute(&mut *tx)
            .await?;

        let year = sqlx::query_as::<_, AcademicYear>(&format!(
            r#"UPDATE academic_years
               SET is_active = TRUE, updated_at = NOW()
               WHERE id = $1
               RETURNING {YEAR_COLUMNS}"#
        ))
        .bind(year_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Academic year not found")))?;

        tx.commit().await?;
        Ok(year)
    }

    /// Delete a year and (via cascading constraints) its periods, grades,
    /// groups and subgroups. Fails while enrolled students still reference
    /// the hierarchy.
    #[instrument(skip(db))]
    pub async fn delete(db: &PgPool, year_id: AcademicYearId) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM academic_years WHERE id = $1")
            .bind(year_id)
            .execute(db)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e
                    && db_err.is_foreign_key_violation()
                {
                    return AppError::conflict(anyhow::anyhow!(
                        "Cannot delete academic year: dependent records exist"
                    ));
                }
                AppError::from(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!(
                "Academic year not found"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn dto(year: i32, is_active: bool) -> CreateAcademicYearDto {
        CreateAcademicYearDto {
            year,
            name: format!("Año {}", year),
            is_active,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_and_get(pool: PgPool) {
        let year = AcademicYearService::create(&pool, dto(2026, false))
            .await
            .unwrap();
        assert_eq!(year.year, 2026);
        assert!(!year.is_active);

        let fetched = AcademicYearService::get_by_id(&pool, year.id).await.unwrap();
        assert_eq!(fetched.id, year.id);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_duplicate_year_rejected(pool: PgPool) {
        AcademicYearService::create(&pool, dto(2026, false))
            .await
            .unwrap();

        let err = AcademicYearService::create(&pool, dto(2026, false))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_activation_deactivates_siblings(pool: PgPool) {
        let first = AcademicYearService::create(&pool, dto(2025, true))
            .await
            .unwrap();
        assert!(first.is_active);

        let second = AcademicYearService::create(&pool, dto(2026, true))
            .await
            .unwrap();
        assert!(second.is_active);

        // The first year lost its active flag when the second took it
        let first = AcademicYearService::get_by_id(&pool, first.id).await.unwrap();
        assert!(!first.is_active);

        let active = AcademicYearService::get_active(&pool).await.unwrap().unwrap();
        assert_eq!(active.id, second.id);

        // Explicit activate flips it back
        AcademicYearService::activate(&pool, first.id).await.unwrap();
        let active = AcademicYearService::get_active(&pool).await.unwrap().unwrap();
        assert_eq!(active.id, first.id);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_update_does_not_touch_active_flag(pool: PgPool) {
        let year = AcademicYearService::create(&pool, dto(2026, true))
            .await
            .unwrap();

        let updated = AcademicYearService::update(
            &pool,
            year.id,
            UpdateAcademicYearDto {
                name: Some("Lectivo 2026".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.name, "Lectivo 2026");
        assert!(updated.is_active);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_delete_missing_year(pool: PgPool) {
        let err = AcademicYearService::delete(&pool, AcademicYearId::new())
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_ordering_newest_first(pool: PgPool) {
        AcademicYearService::create(&pool, dto(2024, false))
            .await
            .unwrap();
        AcademicYearService::create(&pool, dto(2026, false))
            .await
            .unwrap();
        AcademicYearService::create(&pool, dto(2025, false))
            .await
            .unwrap();

        let years = AcademicYearService::get_all(&pool).await.unwrap();
        let numbers: Vec<i32> = years.iter().map(|y| y.year).collect();
        assert_eq!(numbers, vec![2026, 2025, 2024]);
    }
}
