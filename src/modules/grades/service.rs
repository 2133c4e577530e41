use sqlx::PgPool;
use tracing::instrument;

use aula_core::AppError;
use aula_models::ids::{AcademicYearId, GradeId};

use crate::modules::grades::model::{CreateGradeDto, Grade, GradeFilterParams, UpdateGradeDto};

const GRADE_COLUMNS: &str =
    "id, academic_year_id, name, level, description, created_at, updated_at";

pub struct GradeService;

impl GradeService {
    /// List grades, optionally filtered by year, ordered by level.
    #[instrument(skip(db))]
    pub async fn get_all(db: &PgPool, filters: GradeFilterParams) -> Result<Vec<Grade>, AppError> {
        let mut query = format!("SELECT {GRADE_COLUMNS} FROM grades WHERE 1=1");

        if let Some(year_id) = filters.academic_year_id {
            query.push_str(&format!(" AND academic_year_id = '{}'", year_id));
        }

        query.push_str(" ORDER BY level");

        let grades = sqlx::query_as::<_, Grade>(&query).fetch_all(db).await?;
        Ok(grades)
    }

    #[instrument(skip(db))]
    pub async fn get_by_id(db: &PgPool, grade_id: GradeId) -> Result<Grade, AppError> {
        let grade = sqlx::query_as::<_, Grade>(&format!(
            "SELECT {GRADE_COLUMNS} FROM grades WHERE id = $1"
        ))
        .bind(grade_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Grade not found")))?;

        Ok(grade)
    }

    /// Create a grade. `level` must be unique within the academic year.
    #[instrument(skip(db))]
    pub async fn create(db: &PgPool, dto: CreateGradeDto) -> Result<Grade, AppError> {
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

        let grade = sqlx::query_as::<_, Grade>(&format!(
            r#"INSERT INTO grades (academic_year_id, name, level, description)
               VALUES ($1, $2, $3, $4)
               RETURNING {GRADE_COLUMNS}"#
        ))
        .bind(dto.academic_year_id)
        .bind(&dto.name)
        .bind(dto.level)
        .bind(&dto.description)
        .fetch_one(db)
        .await
        .map_err(|e| Self::map_unique_level(e, dto.level))?;

        Ok(grade)
    }

    /// Apply a partial update; a level change re-checks uniqueness.
    #[instrument(skip(db))]
    pub async fn update(
        db: &PgPool,
        grade_id: GradeId,
        dto: UpdateGradeDto,
    ) -> Result<Grade, AppError> {
        let existing = Self::get_by_id(db, grade_id).await?;

        let name = dto.name.unwrap_or(existing.name);
        let level = dto.level.unwrap_or(existing.level);
        let description = if dto.description.is_some() {
            dto.description
        } else {
            existing.description
        };

        let grade = sqlx::query_as::<_, Grade>(&format!(
            r#"UPDATE grades
               SET name = $1, level = $2, description = $3, updated_at = NOW()
               WHERE id = $4
               RETURNING {GRADE_COLUMNS}"#
        ))
        .bind(&name)
        .bind(level)
        .bind(&description)
        .bind(grade_id)
        .fetch_one(db)
        .await
        .map_err(|e| Self::map_unique_level(e, level))?;

        Ok(grade)
    }

    /// Delete a grade. Rejected while groups still belong to it.
    #[instrument(skip(db))]
    pub async fn delete(db: &PgPool, grade_id: GradeId) -> Result<(), AppError> {
        let has_groups = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM groups WHERE grade_id = $1)",
        )
        .bind(grade_id)
        .fetch_one(db)
        .await?;

        if has_groups {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Cannot delete grade with existing groups"
            )));
        }

        let result = sqlx::query("DELETE FROM grades WHERE id = $1")
            .bind(grade_id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Grade not found")));
        }

        Ok(())
    }

    fn map_unique_level(e: sqlx::Error, level: i32) -> AppError {
        if let sqlx::Error::Database(db_err) = &e
            && db_err.is_unique_violation()
        {
            return AppError::bad_request(anyhow::anyhow!(
                "Grade level {} already exists for this academic year",
                level
            ));
        }
        AppError::from(e)
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

    fn dto(year_id: AcademicYearId, name: &str, level: i32) -> CreateGradeDto {
        CreateGradeDto {
            academic_year_id: year_id,
            name: name.to_string(),
            level,
            description: None,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_grade(pool: PgPool) {
        let year_id = create_test_year(&pool, 2026).await;

        let grade = GradeService::create(&pool, dto(year_id, "7mo", 7)).await.unwrap();
        assert_eq!(grade.level, 7);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_duplicate_level_per_year(pool: PgPool) {
        let year_id = create_test_year(&pool, 2026).await;
        GradeService::create(&pool, dto(year_id, "7mo", 7)).await.unwrap();

        let err = GradeService::create(&pool, dto(year_id, "Septimo", 7))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        // Same level in another year is fine
        let other_year = create_test_year(&pool, 2027).await;
        assert!(GradeService::create(&pool, dto(other_year, "7mo", 7)).await.is_ok());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_delete_with_groups_rejected(pool: PgPool) {
        let year_id = create_test_year(&pool, 2026).await;
        let grade = GradeService::create(&pool, dto(year_id, "7mo", 7)).await.unwrap();

        sqlx::query("INSERT INTO groups (grade_id, name) VALUES ($1, $2)")
            .bind(grade.id)
            .bind("Seccion A")
            .execute(&pool)
            .await
            .unwrap();

        let err = GradeService::delete(&pool, grade.id).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_update_level_collision(pool: PgPool) {
        let year_id = create_test_year(&pool, 2026).await;
        GradeService::create(&pool, dto(year_id, "7mo", 7)).await.unwrap();
        let eighth = GradeService::create(&pool, dto(year_id, "8vo", 8)).await.unwrap();

        let err = GradeService::update(
            &pool,
            eighth.id,
            UpdateGradeDto {
                level: Some(7),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
