//! Attendance entity - One (student, subject, date, present) fact.
//!
//! A marking session writes one row per student for a `subject_id` and `date`.
//! Re-submitting the same session replaces those rows; nothing in the schema
//! prevents duplicates, so `core::attendance` is the only writer.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Attendance database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "attendance")]
pub struct Model {
    /// Unique identifier for the record
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the student this record is about
    pub student_id: i64,
    /// ID of the subject the session was for
    pub subject_id: i64,
    /// Calendar day of the session
    pub date: Date,
    /// `true` when the student was present
    pub present: bool,
}

/// Defines relationships between Attendance and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each record references one student
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::Id"
    )]
    Student,
    /// Each record references one subject
    #[sea_orm(
        belongs_to = "super::subject::Entity",
        from = "Column::SubjectId",
        to = "super::subject::Column::Id"
    )]
    Subject,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl Related<super::subject::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subject.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
