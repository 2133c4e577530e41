//! Group and subgroup data models and DTOs.
//!
//! Re-exports the group models from the `aula-models` crate.

pub use aula_models::academic::{
    CreateGroupDto, CreateSubgroupDto, Group, GroupFilterParams, GroupWithStudentCount, Subgroup,
    UpdateGroupDto, UpdateSubgroupDto,
};
