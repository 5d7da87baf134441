//! Classroom attendance summary.
//!
//! For one classroom year this produces the roster, the subjects, each
//! student's `"present/total"` per subject and an overall
//! `"present/total (percentage)"`. Years without students or attendance give
//! empty or zero results rather than errors.

use crate::{
    core::{attendance, student, subject, tally::AttendanceTallies},
    entities::{attendance as attendance_entity, student as student_entity, subject as subject_entity},
    errors::Result,
};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::instrument;

/// Attendance summary for one classroom year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttendanceSummary {
    /// The classroom year summarized
    pub year: String,
    /// Students of the year
    pub students: Vec<student_entity::Model>,
    /// Subjects of the year
    pub subjects: Vec<subject_entity::Model>,
    /// student id -> subject id -> `"present/total"`
    pub subject_attendance: BTreeMap<i64, BTreeMap<i64, String>>,
    /// student id -> `"present/total (percentage%)"`
    pub overall_attendance: BTreeMap<i64, String>,
}

/// Loads the year's students, subjects and attendance and summarizes them.
#[instrument(skip(db))]
pub async fn summarize_year(db: &DatabaseConnection, year: &str) -> Result<AttendanceSummary> {
    let students = student::get_students_by_year(db, year).await?;
    let subjects = subject::get_subjects_by_year(db, year).await?;

    let student_ids: Vec<i64> = students.iter().map(|s| s.id).collect();
    let records = attendance::get_attendance_for_students(db, &student_ids).await?;

    Ok(build_summary(year, students, subjects, &records))
}

/// Builds the summary from already-loaded rows.
///
/// `records` may contain rows for other students; they are ignored. Overall
/// counts include every row of a student, including subjects outside `subjects`.
#[must_use]
pub fn build_summary(
    year: &str,
    students: Vec<student_entity::Model>,
    subjects: Vec<subject_entity::Model>,
    records: &[attendance_entity::Model],
) -> AttendanceSummary {
    let tallies = AttendanceTallies::from_records(records);

    let mut subject_attendance = BTreeMap::new();
    let mut overall_attendance = BTreeMap::new();

    for student in &students {
        let per_subject: BTreeMap<i64, String> = subjects
            .iter()
            .map(|subject| (subject.id, tallies.subject(student.id, subject.id).ratio()))
            .collect();
        subject_attendance.insert(student.id, per_subject);
        overall_attendance.insert(student.id, tallies.overall(student.id).summary());
    }

    AttendanceSummary {
        year: year.to_string(),
        students,
        subjects,
        subject_attendance,
        overall_attendance,
    }
}
