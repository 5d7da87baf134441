//! Shared test utilities for `ClassCount`.
//!
//! Helpers for setting up an in-memory database and creating classrooms,
//! students, subjects and attendance with sensible defaults.

use crate::{
    core::{
        attendance::{self, MarkSession},
        classroom, student, subject,
    },
    entities,
    errors::Result,
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a classroom for the given year label.
pub async fn create_test_classroom(
    db: &DatabaseConnection,
    year: &str,
) -> Result<entities::classroom::Model> {
    classroom::create_classroom(db, year.to_string()).await
}

/// Enrolls a test student in section "A".
pub async fn create_test_student(
    db: &DatabaseConnection,
    classroom_id: i64,
    name: &str,
    roll_number: &str,
) -> Result<entities::student::Model> {
    let details = student::StudentDetails {
        name: name.to_string(),
        roll_number: roll_number.to_string(),
        section: "A".to_string(),
    };
    student::create_student(db, classroom_id, &details).await
}

/// Creates a test subject in a classroom.
pub async fn create_test_subject(
    db: &DatabaseConnection,
    classroom_id: i64,
    name: &str,
) -> Result<entities::subject::Model> {
    subject::create_subject(db, classroom_id, name.to_string()).await
}

/// A fixed day in September 2026.
///
/// # Panics
/// If `day` is not a valid September day.
#[allow(clippy::unwrap_used)]
pub fn test_date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 9, day).unwrap()
}

/// A populated classroom year created by [`setup_year_with_attendance`].
pub struct YearFixture {
    /// The classroom
    pub classroom: entities::classroom::Model,
    /// Two students, in enrollment order
    pub students: Vec<entities::student::Model>,
    /// The year's only subject, "Maths"
    pub subject: entities::subject::Model,
}

/// Creates a classroom with two students and one subject, plus one marked
/// session on `test_date(1)`: the first student present, the second absent.
///
/// Roll numbers are "1" and "2" in every year.
pub async fn setup_year_with_attendance(
    db: &DatabaseConnection,
    year: &str,
) -> Result<YearFixture> {
    let classroom = create_test_classroom(db, year).await?;
    let first = create_test_student(db, classroom.id, "Asha", "1").await?;
    let second = create_test_student(db, classroom.id, "Bilal", "2").await?;
    let subject = create_test_subject(db, classroom.id, "Maths").await?;

    attendance::save_session(
        db,
        &MarkSession {
            subject_id: subject.id,
            date: test_date(1),
            student_ids: vec![first.id, second.id],
            present_student_ids: vec![first.id],
        },
    )
    .await?;

    Ok(YearFixture {
        classroom,
        students: vec![first, second],
        subject,
    })
}
