use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use aula_core::{PaginationMeta, PaginationParams};
use aula_models::academic::{
    AcademicYear, CreateAcademicYearDto, CreateGradeDto, CreateGroupDto, CreatePeriodDto,
    CreateSubgroupDto, Grade, Group, GroupWithStudentCount, Period, Subgroup,
    UpdateAcademicYearDto, UpdateGradeDto, UpdateGroupDto, UpdatePeriodDto, UpdateSubgroupDto,
};
use aula_models::assignments::{
    AssignmentWithNames, CreateAssignmentDto, TeacherGroupAssignment, UpdateAssignmentDto,
};
use aula_models::enums::{LessonType, Session, SlotType, UserRole};
use aula_models::schedule::{
    CreateTimeSlotDto, SeedTemplateRequest, SeedTemplateResponse, TimeSlotResponse,
    UpdateTimeSlotDto,
};
use aula_models::students::{
    CreateStudentDto, PaginatedStudentsResponse, Student, UpdateStudentDto,
};
use aula_models::users::{
    ChangePasswordDto, LoginRequest, MessageResponse, RegisterRequestDto, TokenResponse, User,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::register,
        crate::modules::auth::controller::login,
        crate::modules::auth::controller::me,
        crate::modules::auth::controller::change_password,
        crate::modules::academic_years::controller::create_academic_year,
        crate::modules::academic_years::controller::get_academic_years,
        crate::modules::academic_years::controller::get_active_academic_year,
        crate::modules::academic_years::controller::get_academic_year,
        crate::modules::academic_years::controller::update_academic_year,
        crate::modules::academic_years::controller::activate_academic_year,
        crate::modules::academic_years::controller::delete_academic_year,
        crate::modules::periods::controller::create_period,
        crate::modules::periods::controller::get_periods,
        crate::modules::periods::controller::get_period,
        crate::modules::periods::controller::update_period,
        crate::modules::periods::controller::activate_period,
        crate::modules::periods::controller::delete_period,
        crate::modules::grades::controller::create_grade,
        crate::modules::grades::controller::get_grades,
        crate::modules::grades::controller::get_grade,
        crate::modules::grades::controller::update_grade,
        crate::modules::grades::controller::delete_grade,
        crate::modules::groups::controller::create_group,
        crate::modules::groups::controller::get_groups,
        crate::modules::groups::controller::get_group,
        crate::modules::groups::controller::get_group_students,
        crate::modules::groups::controller::update_group,
        crate::modules::groups::controller::delete_group,
        crate::modules::groups::controller::get_subgroups,
        crate::modules::groups::controller::create_subgroup,
        crate::modules::groups::controller::update_subgroup,
        crate::modules::groups::controller::delete_subgroup,
        crate::modules::students::controller::create_student,
        crate::modules::students::controller::get_students,
        crate::modules::students::controller::get_student,
        crate::modules::students::controller::update_student,
        crate::modules::students::controller::delete_student,
        crate::modules::time_slots::controller::create_time_slot,
        crate::modules::time_slots::controller::get_time_slots,
        crate::modules::time_slots::controller::get_time_slot,
        crate::modules::time_slots::controller::update_time_slot,
        crate::modules::time_slots::controller::delete_time_slot,
        crate::modules::time_slots::controller::seed_default_template,
        crate::modules::teacher_assignments::controller::create_assignment,
        crate::modules::teacher_assignments::controller::get_assignments,
        crate::modules::teacher_assignments::controller::get_assignment,
        crate::modules::teacher_assignments::controller::update_assignment,
        crate::modules::teacher_assignments::controller::delete_assignment,
    ),
    components(
        schemas(
            User,
            UserRole,
            RegisterRequestDto,
            LoginRequest,
            TokenResponse,
            ChangePasswordDto,
            MessageResponse,
            AcademicYear,
            CreateAcademicYearDto,
            UpdateAcademicYearDto,
            Period,
            CreatePeriodDto,
            UpdatePeriodDto,
            Grade,
            CreateGradeDto,
            UpdateGradeDto,
            Group,
            GroupWithStudentCount,
            CreateGroupDto,
            UpdateGroupDto,
            Subgroup,
            CreateSubgroupDto,
            UpdateSubgroupDto,
            Student,
            CreateStudentDto,
            UpdateStudentDto,
            PaginatedStudentsResponse,
            Session,
            SlotType,
            LessonType,
            TimeSlotResponse,
            CreateTimeSlotDto,
            UpdateTimeSlotDto,
            SeedTemplateRequest,
            SeedTemplateResponse,
            TeacherGroupAssignment,
            AssignmentWithNames,
            CreateAssignmentDto,
            UpdateAssignmentDto,
            PaginationMeta,
            PaginationParams,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "User authentication endpoints"),
        (name = "Academic Years", description = "Academic year management"),
        (name = "Periods", description = "Grading period management"),
        (name = "Grades", description = "Grade level management"),
        (name = "Groups", description = "Class group and subgroup management"),
        (name = "Students", description = "Student record management"),
        (name = "Time Slots", description = "Weekly schedule blocks and template seeding"),
        (name = "Teacher Assignments", description = "Teacher-to-group subject assignments")
    ),
    info(
        title = "Aula API",
        version = "0.1.0",
        description = "School administration backend: academic hierarchy, student records, teacher assignments and weekly schedule management.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
