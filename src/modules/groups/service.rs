use sqlx::PgPool;
use tracing::instrument;

use aula_core::AppError;
use aula_models::ids::{GroupId, SubgroupId};
use aula_models::students::Student;

use crate::modules::groups::model::{
    CreateGroupDto, CreateSubgroupDto, Group, GroupFilterParams, GroupWithStudentCount, Subgroup,
    UpdateGroupDto, UpdateSubgroupDto,
};

const GROUP_COLUMNS: &str = "id, grade_id, name, capacity, created_at, updated_at";

const SUBGROUP_COLUMNS: &str = "id, group_id, name, created_at, updated_at";

/// Columns for group rows carrying the computed active-student count.
const COUNTED_COLUMNS: &str = "g.id, g.grade_id, g.name, g.capacity, \
     (SELECT COUNT(*) FROM students st
        JOIN subgroups sg ON st.subgroup_id = sg.id
       WHERE sg.group_id = g.id AND st.is_active = TRUE) AS student_count, \
     g.created_at, g.updated_at";

pub struct GroupService;

impl GroupService {
    /// Active students enrolled in any subgroup of the group.
    async fn student_count(db: &PgPool, group_id: GroupId) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM students st
             JOIN subgroups sg ON st.subgroup_id = sg.id
             WHERE sg.group_id = $1 AND st.is_active = TRUE",
        )
        .bind(group_id)
        .fetch_one(db)
        .await?;

        Ok(count)
    }

    /// List groups with student counts, optionally filtered by grade or
    /// academic year, ordered by name.
    #[instrument(skip(db))]
    pub async fn get_all(
        db: &PgPool,
        filters: GroupFilterParams,
    ) -> Result<Vec<GroupWithStudentCount>, AppError> {
        let mut query = format!(
            "SELECT {COUNTED_COLUMNS}
             FROM groups g
             JOIN grades gr ON gr.id = g.grade_id
             WHERE 1=1"
        );

        if let Some(grade_id) = filters.grade_id {
            query.push_str(&format!(" AND g.grade_id = '{}'", grade_id));
        }
        if let Some(year_id) = filters.academic_year_id {
            query.push_str(&format!(" AND gr.academic_year_id = '{}'", year_id));
        }

        query.push_str(" ORDER BY g.name");

        let groups = sqlx::query_as::<_, GroupWithStudentCount>(&query)
            .fetch_all(db)
            .await?;

        Ok(groups)
    }

    #[instrument(skip(db))]
    pub async fn get_by_id(
        db: &PgPool,
        group_id: GroupId,
    ) -> Result<GroupWithStudentCount, AppError> {
        let group = sqlx::query_as::<_, GroupWithStudentCount>(&format!(
            "SELECT {COUNTED_COLUMNS} FROM groups g WHERE g.id = $1"
        ))
        .bind(group_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Group not found")))?;

        Ok(group)
    }

    /// Active students of the group, ordered by name.
    #[instrument(skip(db))]
    pub async fn get_students(db: &PgPool, group_id: GroupId) -> Result<Vec<Student>, AppError> {
        // Surface a 404 for unknown groups rather than an empty list
        Self::get_by_id(db, group_id).await?;

        let students = sqlx::query_as::<_, Student>(
            "SELECT st.id, st.identification, st.first_name, st.last_name, st.date_of_birth,
                    st.subgroup_id, st.is_active, st.created_at, st.updated_at
             FROM students st
             JOIN subgroups sg ON st.subgroup_id = sg.id
             WHERE sg.group_id = $1 AND st.is_active = TRUE
             ORDER BY st.last_name, st.first_name",
        )
        .bind(group_id)
        .fetch_all(db)
        .await?;

        Ok(students)
    }

    /// Create a group under a grade. The name must be unique per grade.
    #[instrument(skip(db))]
    pub async fn create(db: &PgPool, dto: CreateGroupDto) -> Result<Group, AppError> {
        let grade_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM grades WHERE id = $1)")
                .bind(dto.grade_id)
                .fetch_one(db)
                .await?;

        if !grade_exists {
            return Err(AppError::not_found(anyhow::anyhow!("Grade not found")));
        }

        let group = sqlx::query_as::<_, Group>(&format!(
            r#"INSERT INTO groups (grade_id, name, capacity)
               VALUES ($1, $2, $3)
               RETURNING {GROUP_COLUMNS}"#
        ))
        .bind(dto.grade_id)
        .bind(&dto.name)
        .bind(dto.capacity)
        .fetch_one(db)
        .await
        .map_err(|e| Self::map_unique_name(e, &dto.name))?;

        Ok(group)
    }

    /// Apply a partial update. Shrinking `capacity` below the current
    /// active-student count is rejected.
    #[instrument(skip(db))]
    pub async fn update(
        db: &PgPool,
        group_id: GroupId,
        dto: UpdateGroupDto,
    ) -> Result<Group, AppError> {
        let existing = sqlx::query_as::<_, Group>(&format!(
            "SELECT {GROUP_COLUMNS} FROM groups WHERE id = $1"
        ))
        .bind(group_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Group not found")))?;

        let name = dto.name.unwrap_or(existing.name);
        let capacity = dto.capacity.or(existing.capacity);

        if let Some(capacity) = capacity {
            let enrolled = Self::student_count(db, group_id).await?;
            if i64::from(capacity) < enrolled {
                return Err(AppError::bad_request(anyhow::anyhow!(
                    "Capacity {} is below the current number of students ({})",
                    capacity,
                    enrolled
                )));
            }
        }

        let group = sqlx::query_as::<_, Group>(&format!(
            r#"UPDATE groups
               SET name = $1, capacity = $2, updated_at = NOW()
               WHERE id = $3
               RETURNING {GROUP_COLUMNS}"#
        ))
        .bind(&name)
        .bind(capacity)
        .bind(group_id)
        .fetch_one(db)
        .await
        .map_err(|e| Self::map_unique_name(e, &name))?;

        Ok(group)
    }

    /// Delete a group; subgroups are removed with it. Rejected while any
    /// student record (active or not) still references the group, since
    /// soft-deleted students keep their subgroup reference.
    #[instrument(skip(db))]
    pub async fn delete(db: &PgPool, group_id: GroupId) -> Result<(), AppError> {
        let referenced = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM students st
             JOIN subgroups sg ON st.subgroup_id = sg.id
             WHERE sg.group_id = $1",
        )
        .bind(group_id)
        .fetch_one(db)
        .await?;

        if referenced > 0 {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Cannot delete group with student records"
            )));
        }

        let result = sqlx::query("DELETE FROM groups WHERE id = $1")
            .bind(group_id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Group not found")));
        }

        Ok(())
    }

    fn map_unique_name(e: sqlx::Error, name: &str) -> AppError {
        if let sqlx::Error::Database(db_err) = &e
            && db_err.is_unique_violation()
        {
            return AppError::bad_request(anyhow::anyhow!(
                "A group or subgroup named '{}' already exists here",
                name
            ));
        }
        AppError::from(e)
    }

    // ------------------------------------------------------------------
    // Subgroups
    // ------------------------------------------------------------------

    /// Subgroups of a group, ordered by name.
    #[instrument(skip(db))]
    pub async fn get_subgroups(db: &PgPool, group_id: GroupId) -> Result<Vec<Subgroup>, AppError> {
        Self::get_by_id(db, group_id).await?;

        let subgroups = sqlx::query_as::<_, Subgroup>(&format!(
            "SELECT {SUBGROUP_COLUMNS} FROM subgroups WHERE group_id = $1 ORDER BY name"
        ))
        .bind(group_id)
        .fetch_all(db)
        .await?;

        Ok(subgroups)
    }

    /// Create a subgroup under a group.
    #[instrument(skip(db))]
    pub async fn create_subgroup(
        db: &PgPool,
        group_id: GroupId,
        dto: CreateSubgroupDto,
    ) -> Result<Subgroup, AppError> {
        Self::get_by_id(db, group_id).await?;

        let subgroup = sqlx::query_as::<_, Subgroup>(&format!(
            r#"INSERT INTO subgroups (group_id, name)
               VALUES ($1, $2)
               RETURNING {SUBGROUP_COLUMNS}"#
        ))
        .bind(group_id)
        .bind(&dto.name)
        .fetch_one(db)
        .await
        .map_err(|e| Self::map_unique_name(e, &dto.name))?;

        Ok(subgroup)
    }

    /// Rename a subgroup.
    #[instrument(skip(db))]
    pub async fn update_subgroup(
        db: &PgPool,
        subgroup_id: SubgroupId,
        dto: UpdateSubgroupDto,
    ) -> Result<Subgroup, AppError> {
        let subgroup = sqlx::query_as::<_, Subgroup>(&format!(
            r#"UPDATE subgroups
               SET name = $1, updated_at = NOW()
               WHERE id = $2
               RETURNING {SUBGROUP_COLUMNS}"#
        ))
        .bind(&dto.name)
        .bind(subgroup_id)
        .fetch_optional(db)
        .await
        .map_err(|e| Self::map_unique_name(e, &dto.name))?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Subgroup not found")))?;

        Ok(subgroup)
    }

    /// Delete a subgroup. Rejected while any student record (active or
    /// not) still references it.
    #[instrument(skip(db))]
    pub async fn delete_subgroup(db: &PgPool, subgroup_id: SubgroupId) -> Result<(), AppError> {
        let referenced = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM students WHERE subgroup_id = $1",
        )
        .bind(subgroup_id)
        .fetch_one(db)
        .await?;

        if referenced > 0 {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Cannot delete subgroup with student records"
            )));
        }

        let result = sqlx::query("DELETE FROM subgroups WHERE id = $1")
            .bind(subgroup_id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Subgroup not found")));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use aula_models::ids::{AcademicYearId, GradeId};

    async fn create_test_grade(pool: &PgPool) -> GradeId {
        let year_id = sqlx::query_scalar::<_, AcademicYearId>(
            "INSERT INTO academic_years (year, name) VALUES ($1, $2) RETURNING id",
        )
        .bind(2026)
        .bind("Año 2026")
        .fetch_one(pool)
        .await
        .unwrap();

        sqlx::query_scalar::<_, GradeId>(
            "INSERT INTO grades (academic_year_id, name, level) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(year_id)
        .bind("7mo")
        .bind(7)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    async fn enroll_student(pool: &PgPool, subgroup_id: SubgroupId, identification: &str) {
        sqlx::query(
            "INSERT INTO students (identification, first_name, last_name, date_of_birth, subgroup_id)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(identification)
        .bind("Ana")
        .bind("Mora")
        .bind(chrono::NaiveDate::from_ymd_opt(2012, 3, 14).unwrap())
        .bind(subgroup_id)
        .execute(pool)
        .await
        .unwrap();
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_group_and_subgroup(pool: PgPool) {
        let grade_id = create_test_grade(&pool).await;

        let group = GroupService::create(
            &pool,
            CreateGroupDto {
                grade_id,
                name: "Seccion A".to_string(),
                capacity: Some(30),
            },
        )
        .await
        .unwrap();

        let subgroup = GroupService::create_subgroup(
            &pool,
            group.id,
            CreateSubgroupDto {
                name: "Equipo 1".to_string(),
            },
        )
        .await
        .unwrap();

        assert_eq!(subgroup.group_id, group.id);

        let fetched = GroupService::get_by_id(&pool, group.id).await.unwrap();
        assert_eq!(fetched.student_count, 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_duplicate_group_name_per_grade(pool: PgPool) {
        let grade_id = create_test_grade(&pool).await;

        let dto = CreateGroupDto {
            grade_id,
            name: "Seccion A".to_string(),
            capacity: None,
        };
        GroupService::create(&pool, dto.clone()).await.unwrap();

        let err = GroupService::create(&pool, dto).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_student_count_and_group_students(pool: PgPool) {
        let grade_id = create_test_grade(&pool).await;
        let group = GroupService::create(
            &pool,
            CreateGroupDto {
                grade_id,
                name: "Seccion A".to_string(),
                capacity: None,
            },
        )
        .await
        .unwrap();
        let subgroup = GroupService::create_subgroup(
            &pool,
            group.id,
            CreateSubgroupDto {
                name: "Equipo 1".to_string(),
            },
        )
        .await
        .unwrap();

        enroll_student(&pool, subgroup.id, "A-100").await;
        enroll_student(&pool, subgroup.id, "A-101").await;

        let fetched = GroupService::get_by_id(&pool, group.id).await.unwrap();
        assert_eq!(fetched.student_count, 2);

        let students = GroupService::get_students(&pool, group.id).await.unwrap();
        assert_eq!(students.len(), 2);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_capacity_cannot_undercut_enrollment(pool: PgPool) {
        let grade_id = create_test_grade(&pool).await;
        let group = GroupService::create(
            &pool,
            CreateGroupDto {
                grade_id,
                name: "Seccion A".to_string(),
                capacity: Some(30),
            },
        )
        .await
        .unwrap();
        let subgroup = GroupService::create_subgroup(
            &pool,
            group.id,
            CreateSubgroupDto {
                name: "Equipo 1".to_string(),
            },
        )
        .await
        .unwrap();

        enroll_student(&pool, subgroup.id, "A-100").await;
        enroll_student(&pool, subgroup.id, "A-101").await;

        let err = GroupService::update(
            &pool,
            group.id,
            UpdateGroupDto {
                capacity: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_delete_guards(pool: PgPool) {
        let grade_id = create_test_grade(&pool).await;
        let group = GroupService::create(
            &pool,
            CreateGroupDto {
                grade_id,
                name: "Seccion A".to_string(),
                capacity: None,
            },
        )
        .await
        .unwrap();
        let subgroup = GroupService::create_subgroup(
            &pool,
            group.id,
            CreateSubgroupDto {
                name: "Equipo 1".to_string(),
            },
        )
        .await
        .unwrap();

        enroll_student(&pool, subgroup.id, "A-100").await;

        let err = GroupService::delete(&pool, group.id).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err = GroupService::delete_subgroup(&pool, subgroup.id).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        // Removing the student record unblocks both
        sqlx::query("DELETE FROM students")
            .execute(&pool)
            .await
            .unwrap();

        GroupService::delete_subgroup(&pool, subgroup.id).await.unwrap();
        GroupService::delete(&pool, group.id).await.unwrap();
    }
}
