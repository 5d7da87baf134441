//! Individual student attendance report.
//!
//! Looks a student up by roll number within a classroom year and lists their
//! `"present/total"` for each of the year's subjects plus an overall percentage.

use crate::{
    core::{attendance, student, subject, tally::AttendanceTallies},
    entities::student as student_entity,
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tracing::instrument;

/// One subject line of a [`StudentReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectAttendance {
    /// Subject id
    pub subject_id: i64,
    /// Subject name
    pub subject: String,
    /// `"present/total"`
    pub attendance: String,
}

/// Attendance report for a single student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentReport {
    /// The student reported on
    pub student: student_entity::Model,
    /// Classroom year the report covers
    pub year: String,
    /// One line per subject of the year, in subject order
    pub subjects: Vec<SubjectAttendance>,
    /// e.g. `"75.00%"`; `"0.00%"` when nothing has been recorded
    pub overall_percentage: String,
}

/// Builds the report for the student holding `roll_number` in `year`.
///
/// # Errors
/// [`Error::StudentNotFound`] if no such student is enrolled in that year.
#[instrument(skip(db))]
pub async fn student_report(
    db: &DatabaseConnection,
    year: &str,
    roll_number: &str,
) -> Result<StudentReport> {
    let student = student::get_student_by_roll_number_and_year(db, roll_number, year)
        .await?
        .ok_or_else(|| Error::StudentNotFound {
            key: format!("roll number {roll_number} in {year}"),
        })?;
    let subjects = subject::get_subjects_by_year(db, year).await?;
    let records = attendance::get_attendance_for_students(db, &[student.id]).await?;

    // Only the year's subjects count toward this report's overall figure
    let subject_ids: Vec<i64> = subjects.iter().map(|s| s.id).collect();
    let tallies = AttendanceTallies::from_records(
        records.iter().filter(|r| subject_ids.contains(&r.subject_id)),
    );

    let lines = subjects
        .into_iter()
        .map(|subject| SubjectAttendance {
            attendance: tallies.subject(student.id, subject.id).ratio(),
            subject_id: subject.id,
            subject: subject.name,
        })
        .collect();
    let overall_percentage = tallies.overall(student.id).percentage();

    Ok(StudentReport {
        student,
        year: year.to_string(),
        subjects: lines,
        overall_percentage,
    })
}
