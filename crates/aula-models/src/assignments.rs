//! Teacher-group assignment models and DTOs.
//!
//! An assignment binds a staff member to a group for one subject within a
//! session, optionally scoped to a period (null means the whole year). The
//! tuple `(teacher_id, group_id, subject, session)` is unique across all
//! assignments, active or not.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use aula_core::AppError;

use crate::enums::{Session, UserRole};
use crate::ids::{AssignmentId, GroupId, PeriodId, UserId};

/// Teacher-group assignment entity.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct TeacherGroupAssignment {
    pub id: AssignmentId,
    pub teacher_id: UserId,
    pub group_id: GroupId,
    pub subject: String,
    pub session: Session,
    /// Period this assignment applies to; None means the whole year
    pub period_id: Option<PeriodId>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Assignment joined with teacher and group display fields.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AssignmentWithNames {
    pub id: AssignmentId,
    pub teacher_id: UserId,
    pub group_id: GroupId,
    pub subject: String,
    pub session: Session,
    pub period_id: Option<PeriodId>,
    pub is_active: bool,
    pub teacher_username: String,
    pub teacher_full_name: String,
    pub group_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// DTO for creating an assignment.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateAssignmentDto {
    pub teacher_id: UserId,
    pub group_id: GroupId,
    /// Subject taught (non-blank; surrounding whitespace is trimmed)
    #[validate(length(min = 1, max = 100))]
    pub subject: String,
    pub session: Session,
    pub period_id: Option<PeriodId>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// DTO for updating an assignment; only provided fields are applied.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateAssignmentDto {
    #[validate(length(min = 1, max = 100))]
    pub subject: Option<String>,
    pub session: Option<Session>,
    pub period_id: Option<PeriodId>,
    pub is_active: Option<bool>,
}

/// Query parameters for filtering assignments.
#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
pub struct AssignmentFilterParams {
    pub teacher_id: Option<UserId>,
    pub group_id: Option<GroupId>,
    pub session: Option<Session>,
    pub is_active: Option<bool>,
}

/// Validation failures of the assignment rules.
#[derive(Debug, Error)]
pub enum AssignmentError {
    #[error("user {0} not found")]
    TeacherNotFound(UserId),

    #[error("group {0} not found")]
    GroupNotFound(GroupId),

    #[error("period {0} not found")]
    PeriodNotFound(PeriodId),

    #[error("assignment {0} not found")]
    NotFound(AssignmentId),

    #[error(
        "user '{username}' has role '{role}'; only teacher, coordinator or admin \
         can be assigned to groups"
    )]
    InvalidRole { username: String, role: UserRole },

    #[error("subject must not be blank")]
    InvalidSubject,

    #[error(
        "an assignment already exists for teacher_id={teacher_id}, group_id={group_id}, \
         subject='{subject}', session='{session}'"
    )]
    DuplicateAssignment {
        teacher_id: UserId,
        group_id: GroupId,
        subject: String,
        session: Session,
    },
}

impl From<AssignmentError> for AppError {
    fn from(err: AssignmentError) -> Self {
        match &err {
            AssignmentError::TeacherNotFound(_)
            | AssignmentError::GroupNotFound(_)
            | AssignmentError::PeriodNotFound(_)
            | AssignmentError::NotFound(_) => AppError::not_found(err),
            AssignmentError::InvalidRole { .. } | AssignmentError::InvalidSubject => {
                AppError::unprocessable(err)
            }
            AssignmentError::DuplicateAssignment { .. } => AppError::conflict(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_dto_rejects_empty_subject() {
        let dto = CreateAssignmentDto {
            teacher_id: UserId::new(),
            group_id: GroupId::new(),
            subject: "".to_string(),
            session: Session::Day,
            period_id: None,
            is_active: true,
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_create_dto_defaults_active() {
        let json = format!(
            r#"{{"teacher_id":"{}","group_id":"{}","subject":"Math","session":"day"}}"#,
            UserId::new(),
            GroupId::new()
        );
        let dto: CreateAssignmentDto = serde_json::from_str(&json).unwrap();
        assert!(dto.is_active);
        assert!(dto.period_id.is_none());
    }

    #[test]
    fn test_invalid_role_message_names_user() {
        let err = AssignmentError::InvalidRole {
            username: "jdoe".to_string(),
            role: UserRole::Student,
        };
        let message = err.to_string();
        assert!(message.contains("jdoe"));
        assert!(message.contains("student"));
    }
}
