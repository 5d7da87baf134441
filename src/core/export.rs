//! Spreadsheet export of a classroom's attendance.
//!
//! The report is built as a plain string matrix first ([`AttendanceSheet`]) and
//! then rendered to `.xlsx` with `rust_xlsxwriter`:
//!
//! | Student Name | Maths | Art | Overall % |
//! |--------------|-------|-----|-----------|
//! | Asha         | 3/4   | 1/1 | 80.00%    |

use crate::{
    core::{attendance, student, subject, tally::AttendanceTallies},
    entities::{attendance as attendance_entity, student as student_entity, subject as subject_entity},
    errors::Result,
};
use rust_xlsxwriter::{Color, Format, FormatPattern, Workbook};
use sea_orm::DatabaseConnection;
use tracing::{debug, instrument};

/// Worksheet name of the exported report
pub const SHEET_NAME: &str = "Attendance Report";

/// Content type the download is served with
pub const CONTENT_TYPE: &str = "application/vnd.ms-excel";

/// Header fill, 25% grey
const HEADER_FILL: u32 = 0x00C0_C0C0;

/// The report as rows of cell text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceSheet {
    /// `["Student Name", <subjects...>, "Overall %"]`
    pub header: Vec<String>,
    /// One row per student: name, `"present/total"` per subject, overall percentage
    pub rows: Vec<Vec<String>>,
}

/// Builds the matrix from students, subjects and their attendance rows.
#[must_use]
pub fn build_sheet(
    students: &[student_entity::Model],
    subjects: &[subject_entity::Model],
    records: &[attendance_entity::Model],
) -> AttendanceSheet {
    let tallies = AttendanceTallies::from_records(records);

    let mut header = Vec::with_capacity(subjects.len() + 2);
    header.push("Student Name".to_string());
    header.extend(subjects.iter().map(|s| s.name.clone()));
    header.push("Overall %".to_string());

    let rows = students
        .iter()
        .map(|student| {
            let mut row = Vec::with_capacity(subjects.len() + 2);
            row.push(student.name.clone());
            row.extend(
                subjects
                    .iter()
                    .map(|subject| tallies.subject(student.id, subject.id).ratio()),
            );
            row.push(tallies.overall(student.id).percentage());
            row
        })
        .collect();

    AttendanceSheet { header, rows }
}

/// Renders the matrix as an `.xlsx` workbook and returns its bytes.
pub fn render_xlsx(sheet: &AttendanceSheet) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header_format = Format::new()
        .set_bold()
        .set_pattern(FormatPattern::Solid)
        .set_background_color(Color::RGB(HEADER_FILL));

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, title) in (0u16..).zip(&sheet.header) {
        worksheet.write_string_with_format(0, col, title, &header_format)?;
    }
    for (row_index, row) in (1u32..).zip(&sheet.rows) {
        for (col, value) in (0u16..).zip(row) {
            worksheet.write_string(row_index, col, value)?;
        }
    }
    worksheet.autofit();

    Ok(workbook.save_to_buffer()?)
}

/// Download name for a year's export, e.g. `Attendance_3rd_Year.xlsx`.
///
/// Anything other than ASCII letters, digits and `-` becomes `_`, so the
/// name is always safe inside a `Content-Disposition` header.
#[must_use]
pub fn export_file_name(year: &str) -> String {
    let stem: String = year
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    format!("Attendance_{stem}.xlsx")
}

/// Loads a classroom year and renders its attendance workbook.
#[instrument(skip(db))]
pub async fn export_year(db: &DatabaseConnection, year: &str) -> Result<Vec<u8>> {
    let students = student::get_students_by_year(db, year).await?;
    let subjects = subject::get_subjects_by_year(db, year).await?;
    let student_ids: Vec<i64> = students.iter().map(|s| s.id).collect();
    let records = attendance::get_attendance_for_students(db, &student_ids).await?;

    let sheet = build_sheet(&students, &subjects, &records);
    let bytes = render_xlsx(&sheet)?;
    debug!(
        "Rendered {} rows x {} columns ({} bytes)",
        sheet.rows.len(),
        sheet.header.len(),
        bytes.len()
    );
    Ok(bytes)
}
