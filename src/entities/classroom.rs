//! Classroom entity - The year grouping that owns students and subjects.
//!
//! A classroom is identified by its year label (e.g. "3rd Year"), which is the
//! partition key for every roster listing and attendance report.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Classroom database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "classrooms")]
pub struct Model {
    /// Unique identifier for the classroom
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Unique year label, e.g. "1st Year"
    #[sea_orm(unique)]
    pub year: String,
}

/// Defines relationships between Classroom and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One classroom has many students
    #[sea_orm(has_many = "super::student::Entity")]
    Students,
    /// One classroom has many subjects
    #[sea_orm(has_many = "super::subject::Entity")]
    Subjects,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Students.def()
    }
}

impl Related<super::subject::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subjects.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
