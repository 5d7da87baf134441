//! Present/total counting shared by the summary, report and export paths.

use crate::entities::attendance;
use std::collections::HashMap;

/// Present and total counts for one bucket of attendance rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    /// Rows marked present
    pub present: u32,
    /// All rows
    pub total: u32,
}

impl Tally {
    /// Counts one row.
    pub const fn record(&mut self, present: bool) {
        self.total += 1;
        if present {
            self.present += 1;
        }
    }

    /// `"present/total"`, e.g. `"3/4"`.
    #[must_use]
    pub fn ratio(&self) -> String {
        format!("{}/{}", self.present, self.total)
    }

    /// Percentage present with two decimals, e.g. `"75.00%"`; `"0.00%"` when empty.
    #[must_use]
    pub fn percentage(&self) -> String {
        let percent = if self.total == 0 {
            0.0
        } else {
            f64::from(self.present) / f64::from(self.total) * 100.0
        };
        format!("{percent:.2}%")
    }

    /// `"present/total (percentage)"`, e.g. `"3/4 (75.00%)"`.
    #[must_use]
    pub fn summary(&self) -> String {
        format!("{} ({})", self.ratio(), self.percentage())
    }
}

#[derive(Debug, Default)]
struct StudentTally {
    overall: Tally,
    by_subject: HashMap<i64, Tally>,
}

/// Per-student, per-subject and per-student overall tallies.
#[derive(Debug, Default)]
pub struct AttendanceTallies {
    students: HashMap<i64, StudentTally>,
}

impl AttendanceTallies {
    /// Groups rows by student, then subject, in one pass.
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a attendance::Model>,
    {
        let mut tallies = Self::default();
        for record in records {
            let student = tallies.students.entry(record.student_id).or_default();
            student.overall.record(record.present);
            student
                .by_subject
                .entry(record.subject_id)
                .or_default()
                .record(record.present);
        }
        tallies
    }

    /// Counts for one student in one subject (zero if never marked).
    #[must_use]
    pub fn subject(&self, student_id: i64, subject_id: i64) -> Tally {
        self.students
            .get(&student_id)
            .and_then(|s| s.by_subject.get(&subject_id))
            .copied()
            .unwrap_or_default()
    }

    /// Counts for one student across every subject (zero if never marked).
    #[must_use]
    pub fn overall(&self, student_id: i64) -> Tally {
        self.students
            .get(&student_id)
            .map(|s| s.overall)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(student_id: i64, subject_id: i64, present: bool) -> attendance::Model {
        attendance::Model {
            id: 0,
            student_id,
            subject_id,
            date: NaiveDate::default(),
            present,
        }
    }

    #[test]
    fn test_empty_tally_formats_as_zero() {
        let tally = Tally::default();
        assert_eq!(tally.ratio(), "0/0");
        assert_eq!(tally.percentage(), "0.00%");
        assert_eq!(tally.summary(), "0/0 (0.00%)");
    }

    #[test]
    fn test_three_of_four() {
        let mut tally = Tally::default();
        for present in [true, true, false, true] {
            tally.record(present);
        }
        assert_eq!(tally.ratio(), "3/4");
        assert_eq!(tally.summary(), "3/4 (75.00%)");
    }

    #[test]
    fn test_percentage_rounds_to_two_places() {
        let tally = Tally {
            present: 2,
            total: 3,
        };
        assert_eq!(tally.percentage(), "66.67%");

        let tally = Tally {
            present: 1,
            total: 3,
        };
        assert_eq!(tally.percentage(), "33.33%");
    }

    #[test]
    fn test_grouping_by_student_and_subject() {
        let rows = vec![
            row(1, 10, true),
            row(1, 10, false),
            row(1, 20, true),
            row(2, 10, false),
        ];
        let tallies = AttendanceTallies::from_records(&rows);

        assert_eq!(tallies.subject(1, 10), Tally { present: 1, total: 2 });
        assert_eq!(tallies.subject(1, 20), Tally { present: 1, total: 1 });
        assert_eq!(tallies.overall(1), Tally { present: 2, total: 3 });
        assert_eq!(tallies.overall(2), Tally { present: 0, total: 1 });

        // Unknown keys are empty, not missing
        assert_eq!(tallies.subject(2, 20), Tally::default());
        assert_eq!(tallies.overall(3), Tally::default());
    }
}
