//! Subject entity - A course taught to one classroom year.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Subject database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subjects")]
pub struct Model {
    /// Unique identifier for the subject
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Subject name (e.g. "Mathematics")
    pub name: String,
    /// ID of the classroom this subject is taught in
    pub classroom_id: i64,
}

/// Defines relationships between Subject and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each subject belongs to one classroom
    #[sea_orm(
        belongs_to = "super::classroom::Entity",
        from = "Column::ClassroomId",
        to = "super::classroom::Column::Id"
    )]
    Classroom,
    /// One subject has many attendance records
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
