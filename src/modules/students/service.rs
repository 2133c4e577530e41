use sqlx::PgPool;
use tracing::instrument;

use aula_core::{AppError, PaginationMeta};
use aula_models::ids::{StudentId, SubgroupId};

use crate::modules::students::model::{
    CreateStudentDto, PaginatedStudentsResponse, Student, StudentFilterParams, UpdateStudentDto,
};

const STUDENT_COLUMNS: &str = "id, identification, first_name, last_name, date_of_birth, \
                               subgroup_id, is_active, created_at, updated_at";

pub struct StudentService;

impl StudentService {
    async fn validate_subgroup(db: &PgPool, subgroup_id: SubgroupId) -> Result<(), AppError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM subgroups WHERE id = $1)")
                .bind(subgroup_id)
                .fetch_one(db)
                .await?;

        if !exists {
            return Err(AppError::not_found(anyhow::anyhow!("Subgroup not found")));
        }

        Ok(())
    }

    /// Enroll a new student into a subgroup.
    #[instrument(skip(db))]
    pub async fn create(db: &PgPool, dto: CreateStudentDto) -> Result<Student, AppError> {
        Self::validate_subgroup(db, dto.subgroup_id).await?;

        let student = sqlx::query_as::<_, Student>(&format!(
            r#"INSERT INTO students (identification, first_name, last_name, date_of_birth, subgroup_id)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING {STUDENT_COLUMNS}"#
        ))
        .bind(&dto.identification)
        .bind(&dto.first_name)
        .bind(&dto.last_name)
        .bind(dto.date_of_birth)
        .bind(dto.subgroup_id)
        .fetch_one(db)
        .await
        .map_err(|e| Self::map_unique_identification(e, &dto.identification))?;

        Ok(student)
    }

    /// Paginated student listing with optional search and filters.
    ///
    /// `q` matches identification, first name or last name
    /// case-insensitively.
    #[instrument(skip(db))]
    pub async fn get_all(
        db: &PgPool,
        filters: StudentFilterParams,
    ) -> Result<PaginatedStudentsResponse, AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();

        let mut where_clause = String::from(" WHERE 1=1");

        if let Some(is_active) = filters.is_active {
            where_clause.push_str(&format!(" AND st.is_active = {}", is_active));
        }
        if let Some(subgroup_id) = filters.subgroup_id {
            where_clause.push_str(&format!(" AND st.subgroup_id = '{}'", subgroup_id));
        }
        if let Some(group_id) = filters.group_id {
            where_clause.push_str(&format!(" AND sg.group_id = '{}'", group_id));
        }

        let search_pattern = filters
            .q
            .as_ref()
            .filter(|q| !q.trim().is_empty())
            .map(|q| format!("%{}%", q.trim()));
        if search_pattern.is_some() {
            where_clause.push_str(
                " AND (st.identification ILIKE $1 OR st.first_name ILIKE $1 OR st.last_name ILIKE $1)",
            );
        }

        let from_clause = "FROM students st JOIN subgroups sg ON sg.id = st.subgroup_id";

        let count_query = format!("SELECT COUNT(*) {from_clause}{where_clause}");
        let mut count = sqlx::query_scalar::<_, i64>(&count_query);
        if let Some(pattern) = &search_pattern {
            count = count.bind(pattern);
        }
        let total = count.fetch_one(db).await?;

        let data_query = format!(
            "SELECT st.id, st.identification, st.first_name, st.last_name, st.date_of_birth, \
                    st.subgroup_id, st.is_active, st.created_at, st.updated_at \
             {from_clause}{where_clause} \
             ORDER BY st.last_name, st.first_name LIMIT {limit} OFFSET {offset}"
        );
        let mut data = sqlx::query_as::<_, Student>(&data_query);
        if let Some(pattern) = &search_pattern {
            data = data.bind(pattern);
        }
        let students = data.fetch_all(db).await?;

        let has_more = offset + limit < total;

        Ok(PaginatedStudentsResponse {
            data: students,
            meta: PaginationMeta {
                total,
                limit,
                offset: Some(offset),
                page: filters.pagination.page(),
                has_more,
            },
        })
    }

    #[instrument(skip(db))]
    pub async fn get_by_id(db: &PgPool, student_id: StudentId) -> Result<Student, AppError> {
        let student = sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE id = $1"
        ))
        .bind(student_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Student not found")))?;

        Ok(student)
    }

    /// Apply a partial update; a subgroup change re-checks existence.
    #[instrument(skip(db))]
    pub async fn update(
        db: &PgPool,
        student_id: StudentId,
        dto: UpdateStudentDto,
    ) -> Result<Student, AppError> {
        let existing = Self::get_by_id(db, student_id).await?;

        let identification = dto.identification.unwrap_or(existing.identification);
        let first_name = dto.first_name.unwrap_or(existing.first_name);
        let last_name = dto.last_name.unwrap_or(existing.last_name);
        let date_of_birth = dto.date_of_birth.unwrap_or(existing.date_of_birth);
        let subgroup_id = match dto.subgroup_id {
            Some(subgroup_id) => {
                Self::validate_subgroup(db, subgroup_id).await?;
                subgroup_id
            }
            None => existing.subgroup_id,
        };
        let is_active = dto.is_active.unwrap_or(existing.is_active);

        let student = sqlx::query_as::<_, Student>(&format!(
            r#"UPDATE students
               SET identification = $1, first_name = $2, last_name = $3,
                   date_of_birth = $4, subgroup_id = $5, is_active = $6, updated_at = NOW()
               WHERE id = $7
               RETURNING {STUDENT_COLUMNS}"#
        ))
        .bind(&identification)
        .bind(&first_name)
        .bind(&last_name)
        .bind(date_of_birth)
        .bind(subgroup_id)
        .bind(is_active)
        .bind(student_id)
        .fetch_one(db)
        .await
        .map_err(|e| Self::map_unique_identification(e, &identification))?;

        Ok(student)
    }

    /// Soft-delete: the record is deactivated, not removed.
    #[instrument(skip(db))]
    pub async fn delete(db: &PgPool, student_id: StudentId) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE students SET is_active = FALSE, updated_at = NOW() WHERE id = $1",
        )
        .bind(student_id)
        .execute(db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Student not found")));
        }

        Ok(())
    }

    fn map_unique_identification(e: sqlx::Error, identification: &str) -> AppError {
        if let sqlx::Error::Database(db_err) = &e
            && db_err.is_unique_violation()
        {
            return AppError::bad_request(anyhow::anyhow!(
                "A student with identification '{}' already exists",
                identification
            ));
        }
        AppError::from(e)
    }
}
