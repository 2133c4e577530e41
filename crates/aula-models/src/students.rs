//! Student record models and DTOs.
//!
//! Students are records (not login accounts) attached to a subgroup in the
//! academic hierarchy. Deletion is a soft-delete: the record is deactivated
//! and drops out of default listings.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use aula_core::{PaginationMeta, PaginationParams};

use crate::ids::{GroupId, StudentId, SubgroupId};

/// Student entity.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Student {
    pub id: StudentId,
    /// National/institutional identification number, globally unique
    pub identification: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub subgroup_id: SubgroupId,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Student {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// DTO for enrolling a student.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateStudentDto {
    #[validate(length(min = 1, max = 50))]
    pub identification: String,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub subgroup_id: SubgroupId,
}

/// DTO for updating a student.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateStudentDto {
    #[validate(length(min = 1, max = 50))]
    pub identification: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub subgroup_id: Option<SubgroupId>,
    pub is_active: Option<bool>,
}

/// Query parameters for listing students.
#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
pub struct StudentFilterParams {
    /// Case-insensitive match on identification, first or last name
    pub q: Option<String>,
    pub subgroup_id: Option<SubgroupId>,
    pub group_id: Option<GroupId>,
    pub is_active: Option<bool>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

impl Default for StudentFilterParams {
    fn default() -> Self {
        Self {
            q: None,
            subgroup_id: None,
            group_id: None,
            is_active: None,
            pagination: PaginationParams::default(),
        }
    }
}

/// Paginated students response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginatedStudentsResponse {
    pub data: Vec<Student>,
    pub meta: PaginationMeta,
}
