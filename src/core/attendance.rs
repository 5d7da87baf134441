//! Attendance business logic - Marking sessions and bulk removal.
//!
//! A marking session is the set of rows for one subject on one date. Saving a
//! session deletes whatever was recorded for that (subject, date) and inserts
//! the new rows, so the last submission wins.

use crate::{
    core::{student, subject},
    entities::{Attendance, Student, attendance, student as student_entity, subject as subject_entity},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use std::collections::BTreeSet;
use tracing::{debug, info, instrument};

/// One submitted marking session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkSession {
    /// Subject the session was held for
    pub subject_id: i64,
    /// Day of the session
    pub date: NaiveDate,
    /// Every student on the sheet
    pub student_ids: Vec<i64>,
    /// The subset of `student_ids` marked present
    pub present_student_ids: Vec<i64>,
}

/// What [`save_session`] wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedSession {
    /// The subject the rows were recorded for
    pub subject: subject_entity::Model,
    /// Rows written (one per distinct student)
    pub recorded: usize,
    /// How many of those were marked present
    pub present: usize,
    /// Rows from an earlier submission that were replaced
    pub replaced: u64,
}

/// Rows recorded for one subject on one date.
pub async fn get_attendance_for_session<C>(
    db: &C,
    subject_id: i64,
    date: NaiveDate,
) -> Result<Vec<attendance::Model>>
where
    C: ConnectionTrait,
{
    Attendance::find()
        .filter(attendance::Column::SubjectId.eq(subject_id))
        .filter(attendance::Column::Date.eq(date))
        .order_by_asc(attendance::Column::StudentId)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Every row recorded for any of the given students.
pub async fn get_attendance_for_students<C>(
    db: &C,
    student_ids: &[i64],
) -> Result<Vec<attendance::Model>>
where
    C: ConnectionTrait,
{
    if student_ids.is_empty() {
        return Ok(Vec::new());
    }

    Attendance::find()
        .filter(attendance::Column::StudentId.is_in(student_ids.iter().copied()))
        .order_by_asc(attendance::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Rows recorded for one student in one subject.
pub async fn get_attendance_for_student_and_subject<C>(
    db: &C,
    student_id: i64,
    subject_id: i64,
) -> Result<Vec<attendance::Model>>
where
    C: ConnectionTrait,
{
    Attendance::find()
        .filter(attendance::Column::StudentId.eq(student_id))
        .filter(attendance::Column::SubjectId.eq(subject_id))
        .all(db)
        .await
        .map_err(Into::into)
}

/// Records a marking session, replacing any earlier submission for the same
/// subject and date.
///
/// Duplicate ids in `student_ids` are recorded once. Ids in
/// `present_student_ids` that are not on the sheet are ignored.
///
/// # Errors
/// - [`Error::SubjectNotFound`] if the subject does not exist
/// - [`Error::StudentNotFound`] if any listed student does not exist
/// - [`Error::Validation`] if a listed student is in another classroom
#[instrument(skip(db, session), fields(subject_id = session.subject_id, date = %session.date))]
pub async fn save_session(db: &DatabaseConnection, session: &MarkSession) -> Result<SavedSession> {
    let txn = db.begin().await?;

    let subject = subject::require_subject_by_id(&txn, session.subject_id).await?;

    let roster: BTreeSet<i64> = session.student_ids.iter().copied().collect();
    let present: BTreeSet<i64> = session.present_student_ids.iter().copied().collect();

    let students = Student::find()
        .filter(student_entity::Column::Id.is_in(roster.iter().copied()))
        .all(&txn)
        .await?;
    let known: BTreeSet<i64> = students.iter().map(|s| s.id).collect();
    if let Some(missing) = roster.difference(&known).next() {
        return Err(Error::StudentNotFound {
            key: missing.to_string(),
        });
    }
    if let Some(outsider) = students
        .iter()
        .find(|s| s.classroom_id != subject.classroom_id)
    {
        return Err(Error::Validation {
            message: format!(
                "Student '{}' is not enrolled in the classroom of subject '{}'",
                outsider.name, subject.name
            ),
        });
    }

    let replaced = Attendance::delete_many()
        .filter(attendance::Column::SubjectId.eq(subject.id))
        .filter(attendance::Column::Date.eq(session.date))
        .exec(&txn)
        .await?
        .rows_affected;
    debug!("Removed {} earlier rows for this session", replaced);

    let rows: Vec<attendance::ActiveModel> = roster
        .iter()
        .map(|&student_id| attendance::ActiveModel {
            student_id: Set(student_id),
            subject_id: Set(subject.id),
            date: Set(session.date),
            present: Set(present.contains(&student_id)),
            ..Default::default()
        })
        .collect();
    let recorded = rows.len();
    let present_count = roster.intersection(&present).count();

    if !rows.is_empty() {
        Attendance::insert_many(rows).exec(&txn).await?;
    }

    txn.commit().await?;
    info!(
        "Saved attendance for '{}' on {}: {}/{} present",
        subject.name, session.date, present_count, recorded
    );

    Ok(SavedSession {
        subject,
        recorded,
        present: present_count,
        replaced,
    })
}

/// Deletes every row belonging to the given students. Returns rows removed.
pub async fn delete_attendance_for_students<C>(db: &C, student_ids: &[i64]) -> Result<u64>
where
    C: ConnectionTrait,
{
    if student_ids.is_empty() {
        return Ok(0);
    }

    Ok(Attendance::delete_many()
        .filter(attendance::Column::StudentId.is_in(student_ids.iter().copied()))
        .exec(db)
        .await?
        .rows_affected)
}

/// Deletes every row recorded for the given subjects. Returns rows removed.
pub async fn delete_attendance_for_subjects<C>(db: &C, subject_ids: &[i64]) -> Result<u64>
where
    C: ConnectionTrait,
{
    if subject_ids.is_empty() {
        return Ok(0);
    }

    Ok(Attendance::delete_many()
        .filter(attendance::Column::SubjectId.is_in(subject_ids.iter().copied()))
        .exec(db)
        .await?
        .rows_affected)
}

/// Clears all attendance of a classroom year, keeping its students.
///
/// # Errors
/// [`Error::NoStudents`] if the year has no students.
#[instrument(skip(db))]
pub async fn reset_year(db: &DatabaseConnection, year: &str) -> Result<u64> {
    let ids: Vec<i64> = student::get_students_by_year(db, year)
        .await?
        .into_iter()
        .map(|s| s.id)
        .collect();

    if ids.is_empty() {
        return Err(Error::NoStudents {
            year: year.to_string(),
        });
    }

    let removed = delete_attendance_for_students(db, &ids).await?;
    info!("Reset attendance for {}: {} rows deleted", year, removed);
    Ok(removed)
}
