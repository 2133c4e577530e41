use sqlx::PgPool;
use tracing::instrument;

use aula_core::AppError;
use aula_models::enums::{Session, UserRole};
use aula_models::ids::{AssignmentId, GroupId, PeriodId, UserId};

use crate::modules::teacher_assignments::model::{
    AssignmentError, AssignmentFilterParams, AssignmentWithNames, CreateAssignmentDto,
    TeacherGroupAssignment, UpdateAssignmentDto,
};

const ASSIGNMENT_COLUMNS: &str = "id, teacher_id, group_id, subject, session, period_id, \
                                  is_active, created_at, updated_at";

const JOINED_COLUMNS: &str = "a.id, a.teacher_id, a.group_id, a.subject, a.session, \
                              a.period_id, a.is_active, u.username AS teacher_username, \
                              u.full_name AS teacher_full_name, g.name AS group_name, \
                              a.created_at, a.updated_at";

pub struct TeacherAssignmentService;

impl TeacherAssignmentService {
    /// Reject the assignment unless the referenced user exists and holds
    /// a role eligible to teach.
    async fn validate_teacher(db: &PgPool, teacher_id: UserId) -> Result<(), AppError> {
        let teacher = sqlx::query_as::<_, (String, UserRole)>(
            "SELECT username, role FROM users WHERE id = $1",
        )
        .bind(teacher_id)
        .fetch_optional(db)
        .await?
        .ok_or(AssignmentError::TeacherNotFound(teacher_id))?;

        let (username, role) = teacher;
        if !role.is_assignable() {
            return Err(AssignmentError::InvalidRole { username, role }.into());
        }

        Ok(())
    }

    async fn validate_group(db: &PgPool, group_id: GroupId) -> Result<(), AppError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM groups WHERE id = $1)")
                .bind(group_id)
                .fetch_one(db)
                .await?;

        if !exists {
            return Err(AssignmentError::GroupNotFound(group_id).into());
        }

        Ok(())
    }

    async fn validate_period(db: &PgPool, period_id: Option<PeriodId>) -> Result<(), AppError> {
        let Some(period_id) = period_id else {
            return Ok(());
        };

        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM periods WHERE id = $1)")
                .bind(period_id)
                .fetch_one(db)
                .await?;

        if !exists {
            return Err(AssignmentError::PeriodNotFound(period_id).into());
        }

        Ok(())
    }

    /// Create an assignment, validating teacher role, group and period
    /// references, then translating a uniqueness violation on
    /// `(teacher_id, group_id, subject, session)` into a duplicate error.
    #[instrument(skip(db))]
    pub async fn create(
        db: &PgPool,
        dto: CreateAssignmentDto,
    ) -> Result<TeacherGroupAssignment, AppError> {
        let subject = dto.subject.trim().to_string();
        if subject.is_empty() {
            return Err(AssignmentError::InvalidSubject.into());
        }

        Self::validate_teacher(db, dto.teacher_id).await?;
        Self::validate_group(db, dto.group_id).await?;
        Self::validate_period(db, dto.period_id).await?;

        let assignment = sqlx::query_as::<_, TeacherGroupAssignment>(&format!(
            r#"INSERT INTO teacher_group_assignments
                   (teacher_id, group_id, subject, session, period_id, is_active)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING {ASSIGNMENT_COLUMNS}"#
        ))
        .bind(dto.teacher_id)
        .bind(dto.group_id)
        .bind(&subject)
        .bind(dto.session)
        .bind(dto.period_id)
        .bind(dto.is_active)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                return AssignmentError::DuplicateAssignment {
                    teacher_id: dto.teacher_id,
                    group_id: dto.group_id,
                    subject: subject.clone(),
                    session: dto.session,
                }
                .into();
            }
            AppError::from(e)
        })?;

        Ok(assignment)
    }

    /// List assignments with optional filters, joined with teacher and
    /// group display fields, ordered by group then subject.
    #[instrument(skip(db))]
    pub async fn get_all(
        db: &PgPool,
        filters: AssignmentFilterParams,
    ) -> Result<Vec<AssignmentWithNames>, AppError> {
        let mut query = format!(
            "SELECT {JOINED_COLUMNS}
             FROM teacher_group_assignments a
             JOIN users u ON u.id = a.teacher_id
             JOIN groups g ON g.id = a.group_id
             WHERE 1=1"
        );

        if let Some(teacher_id) = filters.teacher_id {
            query.push_str(&format!(" AND a.teacher_id = '{}'", teacher_id));
        }
        if let Some(group_id) = filters.group_id {
            query.push_str(&format!(" AND a.group_id = '{}'", group_id));
        }
        if let Some(session) = filters.session {
            query.push_str(&format!(" AND a.session = '{}'", session.as_str()));
        }
        if let Some(is_active) = filters.is_active {
            query.push_str(&format!(" AND a.is_active = {}", is_active));
        }

        query.push_str(" ORDER BY a.group_id, a.subject");

        let assignments = sqlx::query_as::<_, AssignmentWithNames>(&query)
            .fetch_all(db)
            .await?;

        Ok(assignments)
    }

    /// Get an assignment by ID with joined display fields.
    #[instrument(skip(db))]
    pub async fn get_by_id(
        db: &PgPool,
        assignment_id: AssignmentId,
    ) -> Result<AssignmentWithNames, AppError> {
        let assignment = sqlx::query_as::<_, AssignmentWithNames>(&format!(
            "SELECT {JOINED_COLUMNS}
             FROM teacher_group_assignments a
             JOIN users u ON u.id = a.teacher_id
             JOIN groups g ON g.id = a.group_id
             WHERE a.id = $1"
        ))
        .bind(assignment_id)
        .fetch_optional(db)
        .await?
        .ok_or(AssignmentError::NotFound(assignment_id))?;

        Ok(assignment)
    }

    /// Apply a partial update; a resulting tuple collision with another
    /// assignment is a duplicate error.
    #[instrument(skip(db))]
    pub async fn update(
        db: &PgPool,
        assignment_id: AssignmentId,
        dto: UpdateAssignmentDto,
    ) -> Result<TeacherGroupAssignment, AppError> {
        let existing = sqlx::query_as::<_, TeacherGroupAssignment>(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM teacher_group_assignments WHERE id = $1"
        ))
        .bind(assignment_id)
        .fetch_optional(db)
        .await?
        .ok_or(AssignmentError::NotFound(assignment_id))?;

        let subject = match dto.subject {
            Some(subject) => {
                let trimmed = subject.trim().to_string();
                if trimmed.is_empty() {
                    return Err(AssignmentError::InvalidSubject.into());
                }
                trimmed
            }
            None => existing.subject,
        };
        let session = dto.session.unwrap_or(existing.session);
        let period_id = match dto.period_id {
            Some(period_id) => {
                Self::validate_period(db, Some(period_id)).await?;
                Some(period_id)
            }
            None => existing.period_id,
        };
        let is_active = dto.is_active.unwrap_or(existing.is_active);

        let assignment = sqlx::query_as::<_, TeacherGroupAssignment>(&format!(
            r#"UPDATE teacher_group_assignments
               SET subject = $1, session = $2, period_id = $3, is_active = $4,
                   updated_at = NOW()
               WHERE id = $5
               RETURNING {ASSIGNMENT_COLUMNS}"#
        ))
        .bind(&subject)
        .bind(session)
        .bind(period_id)
        .bind(is_active)
        .bind(assignment_id)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                return AssignmentError::DuplicateAssignment {
                    teacher_id: existing.teacher_id,
                    group_id: existing.group_id,
                    subject: subject.clone(),
                    session,
                }
                .into();
            }
            AppError::from(e)
        })?;

        Ok(assignment)
    }

    /// Hard-delete an assignment.
    #[instrument(skip(db))]
    pub async fn delete(db: &PgPool, assignment_id: AssignmentId) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM teacher_group_assignments WHERE id = $1")
            .bind(assignment_id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AssignmentError::NotFound(assignment_id).into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use uuid::Uuid;

    use aula_core::hash_password;
    use aula_models::ids::{AcademicYearId, GradeId, SubgroupId};

    async fn create_test_user(pool: &PgPool, role: &str) -> UserId {
        let suffix = Uuid::new_v4().simple().to_string();
        let hashed = hash_password("Passw0rd!").unwrap();
        sqlx::query_scalar::<_, UserId>(
            r#"INSERT INTO users (username, email, password_hash, full_name, role)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING id"#,
        )
        .bind(format!("user{}", &suffix[..12]))
        .bind(format!("{}@test.com", &suffix[..12]))
        .bind(hashed)
        .bind("Test User")
        .bind(role)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    async fn create_test_group(pool: &PgPool) -> GroupId {
        let year_id = sqlx::query_scalar::<_, AcademicYearId>(
            "INSERT INTO academic_years (year, name) VALUES ($1, $2) RETURNING id",
        )
        .bind(2000 + rand_suffix())
        .bind("Test Year")
        .fetch_one(pool)
        .await
        .unwrap();

        let grade_id = sqlx::query_scalar::<_, GradeId>(
            "INSERT INTO grades (academic_year_id, name, level) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(year_id)
        .bind("7mo")
        .bind(7)
        .fetch_one(pool)
        .await
        .unwrap();

        sqlx::query_scalar::<_, GroupId>(
            "INSERT INTO groups (grade_id, name) VALUES ($1, $2) RETURNING id",
        )
        .bind(grade_id)
        .bind("Seccion A")
        .fetch_one(pool)
        .await
        .unwrap()
    }

    fn rand_suffix() -> i32 {
        (Uuid::new_v4().as_u128() % 100) as i32
    }

    fn dto(teacher_id: UserId, group_id: GroupId, subject: &str) -> CreateAssignmentDto {
        CreateAssignmentDto {
            teacher_id,
            group_id,
            subject: subject.to_string(),
            session: Session::Day,
            period_id: None,
            is_active: true,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_assignment_success(pool: PgPool) {
        let teacher_id = create_test_user(&pool, "teacher").await;
        let group_id = create_test_group(&pool).await;

        let assignment = TeacherAssignmentService::create(&pool, dto(teacher_id, group_id, "Math"))
            .await
            .unwrap();

        assert_eq!(assignment.subject, "Math");
        assert_eq!(assignment.session, Session::Day);
        assert!(assignment.period_id.is_none());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_duplicate_assignment_rejected(pool: PgPool) {
        let teacher_id = create_test_user(&pool, "teacher").await;
        let group_id = create_test_group(&pool).await;

        TeacherAssignmentService::create(&pool, dto(teacher_id, group_id, "Math"))
            .await
            .unwrap();

        let err = TeacherAssignmentService::create(&pool, dto(teacher_id, group_id, "Math"))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);

        // Same teacher and group with a different subject is fine
        let other = TeacherAssignmentService::create(&pool, dto(teacher_id, group_id, "Physics"))
            .await;
        assert!(other.is_ok());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_student_role_is_ineligible(pool: PgPool) {
        let student_id = create_test_user(&pool, "student").await;
        let group_id = create_test_group(&pool).await;

        let err = TeacherAssignmentService::create(&pool, dto(student_id, group_id, "Math"))
            .await
            .unwrap_err();

        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(err.error.to_string().contains("student"));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_coordinator_and_admin_are_eligible(pool: PgPool) {
        let group_id = create_test_group(&pool).await;

        for role in ["coordinator", "admin"] {
            let user_id = create_test_user(&pool, role).await;
            let result =
                TeacherAssignmentService::create(&pool, dto(user_id, group_id, role)).await;
            assert!(result.is_ok(), "role {} should be assignable", role);
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_blank_subject_rejected(pool: PgPool) {
        let teacher_id = create_test_user(&pool, "teacher").await;
        let group_id = create_test_group(&pool).await;

        let err = TeacherAssignmentService::create(&pool, dto(teacher_id, group_id, "   "))
            .await
            .unwrap_err();

        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_subject_is_trimmed(pool: PgPool) {
        let teacher_id = create_test_user(&pool, "teacher").await;
        let group_id = create_test_group(&pool).await;

        let assignment =
            TeacherAssignmentService::create(&pool, dto(teacher_id, group_id, "  Math  "))
                .await
                .unwrap();
        assert_eq!(assignment.subject, "Math");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_missing_references(pool: PgPool) {
        let teacher_id = create_test_user(&pool, "teacher").await;
        let group_id = create_test_group(&pool).await;

        let err = TeacherAssignmentService::create(&pool, dto(UserId::new(), group_id, "Math"))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let err = TeacherAssignmentService::create(&pool, dto(teacher_id, GroupId::new(), "Math"))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let mut with_period = dto(teacher_id, group_id, "Math");
        with_period.period_id = Some(PeriodId::new());
        let err = TeacherAssignmentService::create(&pool, with_period)
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_update_collision_is_duplicate(pool: PgPool) {
        let teacher_id = create_test_user(&pool, "teacher").await;
        let group_id = create_test_group(&pool).await;

        TeacherAssignmentService::create(&pool, dto(teacher_id, group_id, "Math"))
            .await
            .unwrap();
        let other = TeacherAssignmentService::create(&pool, dto(teacher_id, group_id, "Physics"))
            .await
            .unwrap();

        // Renaming Physics to Math collides with the existing tuple
        let err = TeacherAssignmentService::update(
            &pool,
            other.id,
            UpdateAssignmentDto {
                subject: Some("Math".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

        assert_eq!(err.status, StatusCode::CONFLICT);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_list_filters_and_join(pool: PgPool) {
        let teacher_id = create_test_user(&pool, "teacher").await;
        let group_id = create_test_group(&pool).await;

        TeacherAssignmentService::create(&pool, dto(teacher_id, group_id, "Math"))
            .await
            .unwrap();
        let mut night = dto(teacher_id, group_id, "Math");
        night.session = Session::Night;
        TeacherAssignmentService::create(&pool, night).await.unwrap();

        let all = TeacherAssignmentService::get_all(&pool, AssignmentFilterParams::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].group_name, "Seccion A");
        assert_eq!(all[0].teacher_full_name, "Test User");

        let day_only = TeacherAssignmentService::get_all(
            &pool,
            AssignmentFilterParams {
                session: Some(Session::Day),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(day_only.len(), 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_delete_assignment(pool: PgPool) {
        let teacher_id = create_test_user(&pool, "teacher").await;
        let group_id = create_test_group(&pool).await;

        let assignment = TeacherAssignmentService::create(&pool, dto(teacher_id, group_id, "Math"))
            .await
            .unwrap();

        TeacherAssignmentService::delete(&pool, assignment.id)
            .await
            .unwrap();

        let err = TeacherAssignmentService::delete(&pool, assignment.id)
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
