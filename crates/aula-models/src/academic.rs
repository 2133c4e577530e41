//! Academic hierarchy models: years, periods, grades, groups, subgroups.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::ids::{AcademicYearId, GradeId, GroupId, PeriodId, SubgroupId};

// ---------------------------------------------------------------------------
// Academic years
// ---------------------------------------------------------------------------

/// A school year (e.g. 2026). At most one year is active at a time;
/// activation is an explicit operation that deactivates all siblings.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AcademicYear {
    pub id: AcademicYearId,
    pub year: i32,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// DTO for creating an academic year.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateAcademicYearDto {
    #[validate(range(min = 2000, max = 2100))]
    pub year: i32,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// When true, all other years are deactivated in the same transaction
    #[serde(default)]
    pub is_active: bool,
}

/// DTO for updating an academic year.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateAcademicYearDto {
    #[validate(range(min = 2000, max = 2100))]
    pub year: Option<i32>,
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
}

// ---------------------------------------------------------------------------
// Periods
// ---------------------------------------------------------------------------

/// A grading period (trimester, bimester, ...) within an academic year.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Period {
    pub id: PeriodId,
    pub academic_year_id: AcademicYearId,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// DTO for creating a period.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreatePeriodDto {
    pub academic_year_id: AcademicYearId,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub start_date: NaiveDate,
    /// Must be after start_date
    pub end_date: NaiveDate,
    #[serde(default)]
    pub is_active: bool,
}

/// DTO for updating a period.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdatePeriodDto {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Query parameters for filtering periods.
#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
pub struct PeriodFilterParams {
    pub academic_year_id: Option<AcademicYearId>,
    pub is_active: Option<bool>,
}

// ---------------------------------------------------------------------------
// Grades
// ---------------------------------------------------------------------------

/// A grade level (7th, 8th, ...) within an academic year.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Grade {
    pub id: GradeId,
    pub academic_year_id: AcademicYearId,
    pub name: String,
    pub level: i32,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// DTO for creating a grade.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateGradeDto {
    pub academic_year_id: AcademicYearId,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Unique within the academic year
    #[validate(range(min = 1))]
    pub level: i32,
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

/// DTO for updating a grade.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateGradeDto {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(range(min = 1))]
    pub level: Option<i32>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

/// Query parameters for filtering grades.
#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
pub struct GradeFilterParams {
    pub academic_year_id: Option<AcademicYearId>,
}

// ---------------------------------------------------------------------------
// Groups and subgroups
// ---------------------------------------------------------------------------

/// A class group ("Seccion A", "Grupo 1") within a grade.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Group {
    pub id: GroupId,
    pub grade_id: GradeId,
    pub name: String,
    pub capacity: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Group with its computed student count.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct GroupWithStudentCount {
    pub id: GroupId,
    pub grade_id: GradeId,
    pub name: String,
    pub capacity: Option<i32>,
    pub student_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// DTO for creating a group.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateGroupDto {
    pub grade_id: GradeId,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(range(min = 1))]
    pub capacity: Option<i32>,
}

/// DTO for updating a group.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateGroupDto {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(range(min = 1))]
    pub capacity: Option<i32>,
}

/// Query parameters for filtering groups.
#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
pub struct GroupFilterParams {
    pub grade_id: Option<GradeId>,
    pub academic_year_id: Option<AcademicYearId>,
}

/// A working subgroup within a class group.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Subgroup {
    pub id: SubgroupId,
    pub group_id: GroupId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// DTO for creating a subgroup under a group.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateSubgroupDto {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

/// DTO for renaming a subgroup.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateSubgroupDto {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_year_dto_validation() {
        let dto = CreateAcademicYearDto {
            year: 2026,
            name: "2026".to_string(),
            is_active: false,
        };
        assert!(dto.validate().is_ok());

        let dto = CreateAcademicYearDto {
            year: 1990,
            name: "1990".to_string(),
            is_active: false,
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_create_grade_dto_validation() {
        let dto = CreateGradeDto {
            academic_year_id: AcademicYearId::new(),
            name: "7mo".to_string(),
            level: 7,
            description: None,
        };
        assert!(dto.validate().is_ok());

        let dto = CreateGradeDto {
            academic_year_id: AcademicYearId::new(),
            name: "".to_string(),
            level: 0,
            description: None,
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_create_group_dto_capacity_bounds() {
        let dto = CreateGroupDto {
            grade_id: GradeId::new(),
            name: "Seccion A".to_string(),
            capacity: Some(0),
        };
        assert!(dto.validate().is_err());
    }
}
