//! Classroom business logic - Handles all classroom-related operations.
//!
//! Classrooms are looked up by surrogate id or by their unique year label.
//! Deleting a classroom removes its students, subjects and every attendance
//! row that hangs off them, in that order, inside one transaction.

use crate::{
    core::attendance,
    entities::{Classroom, Student, Subject, classroom, student, subject},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{info, instrument};

/// Rows removed by [`delete_classroom`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassroomDeletion {
    /// Students removed with the classroom
    pub students: u64,
    /// Subjects removed with the classroom
    pub subjects: u64,
    /// Attendance rows removed with those students and subjects
    pub attendance: u64,
}

/// Retrieves every classroom, in creation order.
pub async fn get_all_classrooms(db: &DatabaseConnection) -> Result<Vec<classroom::Model>> {
    Classroom::find()
        .order_by_asc(classroom::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a classroom by its year label.
pub async fn get_classroom_by_year<C>(db: &C, year: &str) -> Result<Option<classroom::Model>>
where
    C: ConnectionTrait,
{
    Classroom::find()
        .filter(classroom::Column::Year.eq(year))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a classroom by its unique ID.
pub async fn get_classroom_by_id<C>(db: &C, classroom_id: i64) -> Result<Option<classroom::Model>>
where
    C: ConnectionTrait,
{
    Classroom::find_by_id(classroom_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Like [`get_classroom_by_year`], but a missing year is an error.
pub async fn require_classroom_by_year<C>(db: &C, year: &str) -> Result<classroom::Model>
where
    C: ConnectionTrait,
{
    get_classroom_by_year(db, year)
        .await?
        .ok_or_else(|| Error::ClassroomNotFound {
            key: year.to_string(),
        })
}

/// Like [`get_classroom_by_id`], but a missing id is an error.
pub async fn require_classroom_by_id<C>(db: &C, classroom_id: i64) -> Result<classroom::Model>
where
    C: ConnectionTrait,
{
    get_classroom_by_id(db, classroom_id)
        .await?
        .ok_or_else(|| Error::ClassroomNotFound {
            key: classroom_id.to_string(),
        })
}

/// Creates a classroom with a trimmed, non-empty, unused year label.
pub async fn create_classroom(db: &DatabaseConnection, year: String) -> Result<classroom::Model> {
    let year = normalized_year(&year)?;

    if get_classroom_by_year(db, &year).await?.is_some() {
        return Err(Error::DuplicateClassroom { year });
    }

    let classroom = classroom::ActiveModel {
        year: Set(year),
        ..Default::default()
    };

    let result = classroom.insert(db).await?;
    info!("Created classroom '{}' (id {})", result.year, result.id);
    Ok(result)
}

/// Renames a classroom. The new label must not belong to another classroom.
pub async fn update_classroom(
    db: &DatabaseConnection,
    classroom_id: i64,
    year: String,
) -> Result<classroom::Model> {
    let year = normalized_year(&year)?;
    let existing = require_classroom_by_id(db, classroom_id).await?;

    if let Some(other) = get_classroom_by_year(db, &year).await? {
        if other.id != classroom_id {
            return Err(Error::DuplicateClassroom { year });
        }
    }

    let mut active: classroom::ActiveModel = existing.into();
    active.year = Set(year);
    active.update(db).await.map_err(Into::into)
}

/// Deletes a classroom and everything that belongs to it.
#[instrument(skip(db))]
pub async fn delete_classroom(
    db: &DatabaseConnection,
    classroom_id: i64,
) -> Result<(classroom::Model, ClassroomDeletion)> {
    let txn = db.begin().await?;

    let classroom = require_classroom_by_id(&txn, classroom_id).await?;

    let student_ids: Vec<i64> = Student::find()
        .filter(student::Column::ClassroomId.eq(classroom_id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|s| s.id)
        .collect();
    let subject_ids: Vec<i64> = Subject::find()
        .filter(subject::Column::ClassroomId.eq(classroom_id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|s| s.id)
        .collect();

    let mut removed = ClassroomDeletion {
        attendance: attendance::delete_attendance_for_students(&txn, &student_ids).await?,
        ..ClassroomDeletion::default()
    };
    removed.attendance += attendance::delete_attendance_for_subjects(&txn, &subject_ids).await?;

    removed.students = Student::delete_many()
        .filter(student::Column::ClassroomId.eq(classroom_id))
        .exec(&txn)
        .await?
        .rows_affected;
    removed.subjects = Subject::delete_many()
        .filter(subject::Column::ClassroomId.eq(classroom_id))
        .exec(&txn)
        .await?
        .rows_affected;

    Classroom::delete_by_id(classroom_id).exec(&txn).await?;
    txn.commit().await?;

    info!(
        "Deleted classroom '{}' with {} students, {} subjects, {} attendance rows",
        classroom.year, removed.students, removed.subjects, removed.attendance
    );
    Ok((classroom, removed))
}

fn normalized_year(year: &str) -> Result<String> {
    let year = year.trim();
    if year.is_empty() {
        return Err(Error::Validation {
            message: "Classroom year cannot be empty".to_string(),
        });
    }
    Ok(year.to_string())
}
