//! Bulk student import from an uploaded `.xlsx` workbook.
//!
//! Column layout of the first worksheet (row 1 is a header and is skipped):
//!
//! | A: Name | B: Roll Number | C: Section |
//!
//! A row is imported only when all three cells hold text or a number. Numbers
//! become text: `101.0` becomes `"101"`, `12.5` stays `"12.5"`. Rows with a
//! blank or unreadable cell, or with a roll number that already exists in the
//! target year, are skipped and logged. A file that cannot be opened as a
//! workbook aborts the whole import.

use crate::{
    core::student,
    entities::{Student, classroom, student as student_entity},
    errors::{Error, Result},
};
use calamine::{Data, Reader, Xlsx};
use sea_orm::{Set, TransactionTrait, prelude::*};
use std::collections::HashSet;
use std::io::Cursor;
use tracing::{info, instrument};

/// One data row as read from the sheet, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRow {
    /// 1-based row number as a spreadsheet user would see it
    pub row_number: u32,
    /// Column A
    pub name: Option<String>,
    /// Column B
    pub roll_number: Option<String>,
    /// Column C
    pub section: Option<String>,
}

/// Result of [`import_students`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOutcome {
    /// Students persisted
    pub saved: usize,
    /// Rows skipped for a blank or unreadable cell
    pub skipped_incomplete: usize,
    /// Rows skipped because the roll number was already taken in the year
    pub skipped_duplicate: usize,
}

/// Checks the upload itself before any parsing: it must be a non-empty `.xlsx`.
pub fn validate_upload(file_name: Option<&str>, bytes: &[u8]) -> Result<()> {
    let is_xlsx = file_name.is_some_and(|name| name.to_ascii_lowercase().ends_with(".xlsx"));
    if bytes.is_empty() || !is_xlsx {
        return Err(Error::Validation {
            message: "Invalid file selection or format.".to_string(),
        });
    }
    Ok(())
}

/// Reads the data rows of the first worksheet.
///
/// # Errors
/// [`Error::Import`] if the bytes are not a readable workbook or it has no sheets.
pub fn read_student_rows(bytes: &[u8]) -> Result<Vec<ImportRow>> {
    let mut workbook = Xlsx::new(Cursor::new(bytes)).map_err(|e| Error::Import {
        message: format!("Failed to open workbook: {e}"),
    })?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| Error::Import {
            message: "Workbook has no worksheets".to_string(),
        })?
        .map_err(|e| Error::Import {
            message: format!("Failed to read first worksheet: {e}"),
        })?;

    let (Some((first_row, _)), Some((last_row, _))) = (range.start(), range.end()) else {
        return Ok(Vec::new());
    };

    // Row 0 is the header wherever the used range happens to begin
    Ok((first_row.max(1)..=last_row)
        .map(|row| ImportRow {
            row_number: row + 1,
            name: cell_text(range.get_value((row, 0))),
            roll_number: cell_text(range.get_value((row, 1))),
            section: cell_text(range.get_value((row, 2))),
        })
        .collect())
}

/// Cell contents as trimmed text; `None` for blank or non-text, non-numeric cells.
#[allow(clippy::float_cmp, clippy::cast_possible_truncation)]
fn cell_text(cell: Option<&Data>) -> Option<String> {
    let text = match cell? {
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.is_finite() && f.fract() == 0.0 => (*f as i64).to_string(),
        Data::Float(f) => f.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Imports students from workbook bytes into `classroom`.
///
/// Parsing runs on the blocking pool. Every accepted row is inserted in one
/// transaction; the returned outcome counts what was actually saved.
#[instrument(skip(db, classroom, bytes), fields(year = %classroom.year, size = bytes.len()))]
pub async fn import_students(
    db: &DatabaseConnection,
    classroom: &classroom::Model,
    bytes: Vec<u8>,
) -> Result<ImportOutcome> {
    let rows = tokio::task::spawn_blocking(move || read_student_rows(&bytes))
        .await
        .map_err(|e| Error::Import {
            message: format!("Import task failed: {e}"),
        })??;

    let mut outcome = ImportOutcome::default();
    let mut seen = HashSet::new();
    let mut accepted = Vec::new();

    for row in rows {
        let (Some(name), Some(roll_number), Some(section)) = (row.name, row.roll_number, row.section)
        else {
            info!(
                "Skipping row {}: Missing Name, Roll Number, or Section.",
                row.row_number
            );
            outcome.skipped_incomplete += 1;
            continue;
        };

        let taken = seen.contains(&roll_number)
            || student::get_student_by_roll_number_and_year(db, &roll_number, &classroom.year)
                .await?
                .is_some();
        if taken {
            info!(
                "Skipping row {}: Duplicate Roll Number found in this year: {}",
                row.row_number, roll_number
            );
            outcome.skipped_duplicate += 1;
            continue;
        }

        seen.insert(roll_number.clone());
        accepted.push(student_entity::ActiveModel {
            name: Set(name),
            roll_number: Set(roll_number),
            section: Set(section),
            classroom_id: Set(classroom.id),
            ..Default::default()
        });
    }

    outcome.saved = accepted.len();
    if !accepted.is_empty() {
        let txn = db.begin().await?;
        Student::insert_many(accepted).exec(&txn).await?;
        txn.commit().await?;
    }

    info!(
        "Imported {} students into {} ({} incomplete, {} duplicate rows skipped)",
        outcome.saved, classroom.year, outcome.skipped_incomplete, outcome.skipped_duplicate
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use rust_xlsxwriter::Workbook;

    /// Cells of a test sheet: text, number, or blank.
    enum Cell {
        Text(&'static str),
        Number(f64),
        Blank,
    }
    use Cell::{Blank, Number, Text};

    fn workbook_bytes(rows: &[Vec<Cell>]) -> Vec<u8> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Name").unwrap();
        sheet.write_string(0, 1, "Roll Number").unwrap();
        sheet.write_string(0, 2, "Section").unwrap();
        for (r, row) in (1u32..).zip(rows) {
            for (c, cell) in (0u16..).zip(row) {
                match cell {
                    Text(s) => {
                        sheet.write_string(r, c, *s).unwrap();
                    }
                    Number(n) => {
                        sheet.write_number(r, c, *n).unwrap();
                    }
                    Blank => {}
                }
            }
        }
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn test_cell_text_coercion() {
        assert_eq!(cell_text(Some(&Data::String("  Asha ".into()))), Some("Asha".into()));
        assert_eq!(cell_text(Some(&Data::String("   ".into()))), None);
        assert_eq!(cell_text(Some(&Data::Float(101.0))), Some("101".into()));
        assert_eq!(cell_text(Some(&Data::Float(12.5))), Some("12.5".into()));
        assert_eq!(cell_text(Some(&Data::Int(7))), Some("7".into()));
        assert_eq!(cell_text(Some(&Data::Bool(true))), None);
        assert_eq!(cell_text(Some(&Data::Empty)), None);
        assert_eq!(cell_text(None), None);
    }

    #[test]
    fn test_validate_upload() {
        assert!(validate_upload(Some("students.xlsx"), b"PK").is_ok());
        assert!(validate_upload(Some("STUDENTS.XLSX"), b"PK").is_ok());
        assert!(validate_upload(Some("students.csv"), b"a,b").is_err());
        assert!(validate_upload(Some("students.xlsx"), b"").is_err());
        assert!(validate_upload(None, b"PK").is_err());
    }

    #[test]
    fn test_read_rows_skips_header() {
        let bytes = workbook_bytes(&[
            vec![Text("Asha"), Number(101.0), Text("A")],
            vec![Text("Bilal"), Blank, Text("B")],
        ]);
        let rows = read_student_rows(&bytes).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            ImportRow {
                row_number: 2,
                name: Some("Asha".into()),
                roll_number: Some("101".into()),
                section: Some("A".into()),
            }
        );
        assert_eq!(rows[1].roll_number, None);
    }

    #[test]
    fn test_corrupt_file_aborts() {
        let result = read_student_rows(b"definitely not a zip archive");
        assert!(matches!(result, Err(Error::Import { message: _ })));
    }

    #[tokio::test]
    async fn test_import_skips_incomplete_and_duplicate_rows() -> Result<()> {
        let db = setup_test_db().await?;
        let classroom = create_test_classroom(&db, "1st Year").await?;
        let other = create_test_classroom(&db, "2nd Year").await?;
        create_test_student(&db, classroom.id, "Existing", "100").await?;
        // Same roll number in a different year does not block the import
        create_test_student(&db, other.id, "Elsewhere", "102").await?;

        let bytes = workbook_bytes(&[
            vec![Text("Asha"), Number(101.0), Text("A")],
            vec![Text("Bilal"), Text("  "), Text("B")],
            vec![Text("Chen"), Number(100.0), Text("A")],
            vec![Text("Dana"), Number(102.0), Text("C")],
            vec![Text("Eli"), Number(101.0), Text("C")],
            vec![Text("Farah"), Text("103"), Blank],
        ]);

        let outcome = import_students(&db, &classroom, bytes).await?;
        assert_eq!(
            outcome,
            ImportOutcome {
                saved: 2,
                skipped_incomplete: 2,
                skipped_duplicate: 2,
            }
        );

        let students = student::get_students_by_year(&db, "1st Year").await?;
        let rolls: Vec<&str> = students.iter().map(|s| s.roll_number.as_str()).collect();
        assert_eq!(rolls, vec!["100", "101", "102"]);
        assert_eq!(students.len() - 1, outcome.saved);
        assert!(!students.iter().any(|s| s.name == "Bilal" || s.name == "Farah"));

        Ok(())
    }

    #[tokio::test]
    async fn test_import_of_corrupt_file_saves_nothing() -> Result<()> {
        let db = setup_test_db().await?;
        let classroom = create_test_classroom(&db, "1st Year").await?;

        let result = import_students(&db, &classroom, b"garbage".to_vec()).await;
        assert!(matches!(result, Err(Error::Import { message: _ })));
        assert!(student::get_students_by_year(&db, "1st Year").await?.is_empty());

        Ok(())
    }
}
