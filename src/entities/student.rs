//! Student entity - A pupil enrolled in exactly one classroom year.
//!
//! Roll numbers are unique within a year; that rule lives in `core::student`
//! rather than in the schema, since the same roll number may be reused across years.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Student database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "students")]
pub struct Model {
    /// Unique identifier for the student
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Full name as shown on reports
    pub name: String,
    /// School roll number, kept as text (imports may contain "12A")
    pub roll_number: String,
    /// Section label within the year (e.g. "A")
    pub section: String,
    /// ID of the classroom this student belongs to
    pub classroom_id: i64,
}

/// Defines relationships between Student and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each student belongs to one classroom
    #[sea_orm(
        belongs_to = "super::classroom::Entity",
        from = "Column::ClassroomId",
        to = "super::classroom::Column::Id"
    )]
    Classroom,
    /// One student has many attendance records
    #[sea_orm(has_many = "super::attendance::Entity")]
    Attendance,
}

impl Related<super::classroom::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Classroom.def()
    }
}

impl Related<super::attendance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attendance.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
