//! Student business logic - Handles all student-related operations.
//!
//! Students always belong to one classroom, and roll numbers are unique within
//! that classroom's year. Deleting students removes their attendance rows first.

use crate::{
    core::{attendance, classroom},
    entities::{Student, classroom as classroom_entity, student},
    errors::{Error, Result},
};
use sea_orm::{JoinType, PaginatorTrait, QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument};

/// Editable student fields, as submitted by a form or read from an import row.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StudentDetails {
    /// Full name
    pub name: String,
    /// Roll number, unique within the year
    pub roll_number: String,
    /// Section label
    pub section: String,
}

impl StudentDetails {
    /// Trims every field and rejects blanks.
    pub fn normalized(&self) -> Result<Self> {
        let details = Self {
            name: self.name.trim().to_string(),
            roll_number: self.roll_number.trim().to_string(),
            section: self.section.trim().to_string(),
        };

        for (field, value) in [
            ("Name", &details.name),
            ("Roll number", &details.roll_number),
            ("Section", &details.section),
        ] {
            if value.is_empty() {
                return Err(Error::Validation {
                    message: format!("{field} cannot be empty"),
                });
            }
        }

        Ok(details)
    }
}

/// Retrieves all students in a classroom year, in enrollment order.
///
/// An unknown year simply has no students.
pub async fn get_students_by_year<C>(db: &C, year: &str) -> Result<Vec<student::Model>>
where
    C: ConnectionTrait,
{
    Student::find()
        .join(JoinType::InnerJoin, student::Relation::Classroom.def())
        .filter(classroom_entity::Column::Year.eq(year))
        .order_by_asc(student::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a student by its unique ID.
pub async fn get_student_by_id<C>(db: &C, student_id: i64) -> Result<Option<student::Model>>
where
    C: ConnectionTrait,
{
    Student::find_by_id(student_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Like [`get_student_by_id`], but a missing id is an error.
pub async fn require_student_by_id<C>(db: &C, student_id: i64) -> Result<student::Model>
where
    C: ConnectionTrait,
{
    get_student_by_id(db, student_id)
        .await?
        .ok_or_else(|| Error::StudentNotFound {
            key: student_id.to_string(),
        })
}

/// Finds the student holding `roll_number` in the given classroom year.
pub async fn get_student_by_roll_number_and_year<C>(
    db: &C,
    roll_number: &str,
    year: &str,
) -> Result<Option<student::Model>>
where
    C: ConnectionTrait,
{
    Student::find()
        .join(JoinType::InnerJoin, student::Relation::Classroom.def())
        .filter(student::Column::RollNumber.eq(roll_number))
        .filter(classroom_entity::Column::Year.eq(year))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Returns the year label of the classroom a student belongs to.
pub async fn get_student_year<C>(db: &C, student: &student::Model) -> Result<String>
where
    C: ConnectionTrait,
{
    Ok(classroom::require_classroom_by_id(db, student.classroom_id)
        .await?
        .year)
}

/// Enrolls a student in a classroom after validating the details.
pub async fn create_student(
    db: &DatabaseConnection,
    classroom_id: i64,
    details: &StudentDetails,
) -> Result<student::Model> {
    let details = details.normalized()?;
    let classroom = classroom::require_classroom_by_id(db, classroom_id).await?;

    if get_student_by_roll_number_and_year(db, &details.roll_number, &classroom.year)
        .await?
        .is_some()
    {
        return Err(Error::DuplicateRollNumber {
            roll_number: details.roll_number,
            year: classroom.year,
        });
    }

    let student = student::ActiveModel {
        name: Set(details.name),
        roll_number: Set(details.roll_number),
        section: Set(details.section),
        classroom_id: Set(classroom.id),
        ..Default::default()
    };

    let result = student.insert(db).await?;
    info!(
        "Enrolled student '{}' ({}) in {}",
        result.name, result.roll_number, classroom.year
    );
    Ok(result)
}

/// Replaces a student's details and (optionally different) classroom.
pub async fn update_student(
    db: &DatabaseConnection,
    student_id: i64,
    classroom_id: i64,
    details: &StudentDetails,
) -> Result<student::Model> {
    let details = details.normalized()?;
    let existing = require_student_by_id(db, student_id).await?;
    let classroom = classroom::require_classroom_by_id(db, classroom_id).await?;

    if let Some(other) =
        get_student_by_roll_number_and_year(db, &details.roll_number, &classroom.year).await?
    {
        if other.id != student_id {
            return Err(Error::DuplicateRollNumber {
                roll_number: details.roll_number,
                year: classroom.year,
            });
        }
    }

    let mut active: student::ActiveModel = existing.into();
    active.name = Set(details.name);
    active.roll_number = Set(details.roll_number);
    active.section = Set(details.section);
    active.classroom_id = Set(classroom.id);
    active.update(db).await.map_err(Into::into)
}

/// Deletes one student and exactly that student's attendance rows.
///
/// Returns the deleted student and the number of attendance rows removed.
#[instrument(skip(db))]
pub async fn delete_student(
    db: &DatabaseConnection,
    student_id: i64,
) -> Result<(student::Model, u64)> {
    let txn = db.begin().await?;

    let student = require_student_by_id(&txn, student_id).await?;
    let removed = attendance::delete_attendance_for_students(&txn, &[student.id]).await?;
    Student::delete_by_id(student.id).exec(&txn).await?;

    txn.commit().await?;
    info!(
        "Deleted student {} and {} attendance rows",
        student.roll_number, removed
    );
    Ok((student, removed))
}

/// Deletes every student of a classroom year together with their attendance.
///
/// Returns the number of students removed. An empty year is reported as
/// [`Error::NoStudents`] so the caller can tell the user nothing happened.
#[instrument(skip(db))]
pub async fn delete_students_in_year(db: &DatabaseConnection, year: &str) -> Result<u64> {
    let txn = db.begin().await?;

    let ids: Vec<i64> = get_students_by_year(&txn, year)
        .await?
        .into_iter()
        .map(|s| s.id)
        .collect();

    if ids.is_empty() {
        return Err(Error::NoStudents {
            year: year.to_string(),
        });
    }

    let removed_attendance = attendance::delete_attendance_for_students(&txn, &ids).await?;
    let removed_students = Student::delete_many()
        .filter(student::Column::Id.is_in(ids.iter().copied()))
        .exec(&txn)
        .await?
        .rows_affected;

    txn.commit().await?;
    info!(
        "Deleted {} students and {} attendance rows from {}",
        removed_students, removed_attendance, year
    );
    Ok(removed_students)
}

/// Counts students enrolled in a classroom.
pub async fn count_students_in_classroom(db: &DatabaseConnection, classroom_id: i64) -> Result<u64> {
    Student::find()
        .filter(student::Column::ClassroomId.eq(classroom_id))
        .count(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::entities::Attendance;
    use crate::test_utils::*;

    fn details(name: &str, roll: &str, section: &str) -> StudentDetails {
        StudentDetails {
            name: name.to_string(),
            roll_number: roll.to_string(),
            section: section.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_student_validation() -> Result<()> {
        let db = setup_test_db().await?;
        let classroom = create_test_classroom(&db, "1st Year").await?;

        let result = create_student(&db, classroom.id, &details("  ", "1", "A")).await;
        assert!(matches!(result, Err(Error::Validation { message: _ })));

        let result = create_student(&db, classroom.id, &details("Asha", "1", "")).await;
        assert!(matches!(result, Err(Error::Validation { message: _ })));

        let result = create_student(&db, 999, &details("Asha", "1", "A")).await;
        assert!(matches!(result, Err(Error::ClassroomNotFound { key: _ })));

        Ok(())
    }

    #[tokio::test]
    async fn test_roll_number_unique_per_year() -> Result<()> {
        let db = setup_test_db().await?;
        let first = create_test_classroom(&db, "1st Year").await?;
        let second = create_test_classroom(&db, "2nd Year").await?;

        let asha = create_student(&db, first.id, &details(" Asha ", "101", "A")).await?;
        assert_eq!(asha.name, "Asha");

        let duplicate = create_student(&db, first.id, &details("Bilal", "101", "B")).await;
        assert!(matches!(
            duplicate,
            Err(Error::DuplicateRollNumber {
                roll_number: _,
                year: _
            })
        ));

        // Same roll number in another year is allowed
        create_student(&db, second.id, &details("Chen", "101", "A")).await?;

        let found = get_student_by_roll_number_and_year(&db, "101", "2nd Year").await?;
        assert_eq!(found.unwrap().name, "Chen");

        Ok(())
    }

    #[tokio::test]
    async fn test_get_students_by_year_filters_by_classroom() -> Result<()> {
        let db = setup_test_db().await?;
        let first = create_test_classroom(&db, "1st Year").await?;
        let second = create_test_classroom(&db, "2nd Year").await?;
        create_test_student(&db, first.id, "Asha", "1").await?;
        create_test_student(&db, second.id, "Bilal", "2").await?;
        create_test_student(&db, first.id, "Chen", "3").await?;

        let students = get_students_by_year(&db, "1st Year").await?;
        let names: Vec<&str> = students.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Asha", "Chen"]);

        assert!(get_students_by_year(&db, "9th Year").await?.is_empty());
        assert_eq!(count_students_in_classroom(&db, first.id).await?, 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_student_moves_classroom() -> Result<()> {
        let db = setup_test_db().await?;
        let first = create_test_classroom(&db, "1st Year").await?;
        let second = create_test_classroom(&db, "2nd Year").await?;
        let asha = create_test_student(&db, first.id, "Asha", "1").await?;
        create_test_student(&db, second.id, "Bilal", "2").await?;

        let clash = update_student(&db, asha.id, second.id, &details("Asha", "2", "A")).await;
        assert!(matches!(
            clash,
            Err(Error::DuplicateRollNumber {
                roll_number: _,
                year: _
            })
        ));

        let moved = update_student(&db, asha.id, second.id, &details("Asha K", "1", "C")).await?;
        assert_eq!(moved.classroom_id, second.id);
        assert_eq!(moved.name, "Asha K");
        assert_eq!(get_student_year(&db, &moved).await?, "2nd Year");

        let missing = update_student(&db, 999, second.id, &details("X", "9", "A")).await;
        assert!(matches!(missing, Err(Error::StudentNotFound { key: _ })));

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_student_removes_only_their_attendance() -> Result<()> {
        let db = setup_test_db().await?;
        let year = setup_year_with_attendance(&db, "1st Year").await?;
        let target = &year.students[0];
        let other = &year.students[1];

        let (deleted, removed) = delete_student(&db, target.id).await?;
        assert_eq!(deleted.id, target.id);
        assert_eq!(removed, 1);

        let remaining = Attendance::find().all(&db).await?;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].student_id, other.id);
        assert!(get_student_by_id(&db, target.id).await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_students_in_year_leaves_other_years() -> Result<()> {
        let db = setup_test_db().await?;
        setup_year_with_attendance(&db, "1st Year").await?;
        let kept = setup_year_with_attendance(&db, "2nd Year").await?;

        let removed = delete_students_in_year(&db, "1st Year").await?;
        assert_eq!(removed, 2);

        assert!(get_students_by_year(&db, "1st Year").await?.is_empty());
        assert_eq!(get_students_by_year(&db, "2nd Year").await?.len(), 2);

        let remaining = Attendance::find().all(&db).await?;
        assert_eq!(remaining.len(), 2);
        let kept_ids: Vec<i64> = kept.students.iter().map(|s| s.id).collect();
        assert!(remaining.iter().all(|a| kept_ids.contains(&a.student_id)));

        let again = delete_students_in_year(&db, "1st Year").await;
        assert!(matches!(again, Err(Error::NoStudents { year: _ })));

        Ok(())
    }
}
