//! Taking, saving, viewing, resetting and exporting attendance for a year.

use super::{accept, fail, outcome};
use crate::{
    core::{
        attendance::{self, MarkSession},
        classroom, export, student, subject,
        summary::{self, AttendanceSummary},
        user::Role,
    },
    entities::{student as student_entity, subject as subject_entity},
    errors::{self, Error},
    web::{
        AppState,
        flash::year_path,
        session::{AuthSession, Page, Rejection},
    },
};
use axum::{
    Form, Json,
    extract::{
        Path, State,
        rejection::{FormRejection, JsonRejection},
    },
    http::header,
    response::{IntoResponse, Redirect, Response},
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const TAKE: &str = "/attendance/take";
const VIEW: &str = "/attendance/view";

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Accepts `YYYY-MM-DD`; blank means today.
fn parse_session_date(raw: Option<&str>) -> errors::Result<NaiveDate> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(today()),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| Error::Validation {
            message: format!("Invalid date '{s}', expected YYYY-MM-DD"),
        }),
    }
}

/// Subjects a teacher can take attendance for in one year.
#[derive(Debug, Serialize)]
pub struct TakeAttendance {
    year: String,
    today: NaiveDate,
    subjects: Vec<subject_entity::Model>,
}

/// `GET /attendance/take/{year}`
pub async fn take(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(year): Path<String>,
) -> Result<Json<Page<TakeAttendance>>, Rejection> {
    auth.require(Role::can_mark_attendance)?;
    let loaded = async {
        let classroom = classroom::require_classroom_by_year(&state.db, &year).await?;
        let subjects = subject::get_subjects_by_year(&state.db, &classroom.year).await?;
        Ok::<_, Error>(TakeAttendance {
            year: classroom.year,
            today: today(),
            subjects,
        })
    }
    .await;

    match loaded {
        Ok(page) => Ok(auth.page(&state, page).await),
        Err(e) => Err(fail(&state, &auth, &e, "/welcome").await),
    }
}

/// Picks the subject and day to mark.
#[derive(Debug, Deserialize)]
pub struct MarkForm {
    year: String,
    subject_id: i64,
    date: Option<String>,
}

/// The attendance sheet for one subject and day, pre-filled with any saved marks.
#[derive(Debug, Serialize)]
pub struct MarkSheet {
    year: String,
    subject: subject_entity::Model,
    date: NaiveDate,
    students: Vec<student_entity::Model>,
    /// Student id to present flag, for a session already saved
    marks: BTreeMap<i64, bool>,
}

/// `POST /attendance/mark`
pub async fn mark(
    State(state): State<AppState>,
    auth: AuthSession,
    form: Result<Form<MarkForm>, FormRejection>,
) -> Result<Json<Page<MarkSheet>>, Rejection> {
    auth.require(Role::can_mark_attendance)?;
    let Form(form) = accept(&state, &auth, form, "/welcome").await?;
    let loaded = async {
        let date = parse_session_date(form.date.as_deref())?;
        let subject = subject::require_subject_by_id(&state.db, form.subject_id).await?;
        let students = student::get_students_by_year(&state.db, &form.year).await?;
        let marks = attendance::get_attendance_for_session(&state.db, subject.id, date)
            .await?
            .into_iter()
            .map(|record| (record.student_id, record.present))
            .collect();
        Ok::<_, Error>(MarkSheet {
            year: form.year.clone(),
            subject,
            date,
            students,
            marks,
        })
    }
    .await;

    match loaded {
        Ok(sheet) => Ok(auth.page(&state, sheet).await),
        Err(e) => Err(fail(&state, &auth, &e, &year_path(TAKE, &form.year)).await),
    }
}

/// A submitted sheet: everyone listed, and who of them was present.
#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    year: String,
    subject_id: i64,
    #[serde(default)]
    date: Option<NaiveDate>,
    student_ids: Vec<i64>,
    #[serde(default)]
    present_student_ids: Vec<i64>,
}

/// `POST /attendance/save`
pub async fn save(
    State(state): State<AppState>,
    auth: AuthSession,
    request: Result<Json<SaveRequest>, JsonRejection>,
) -> Result<Redirect, Rejection> {
    auth.require(Role::can_mark_attendance)?;
    let Json(request) = accept(&state, &auth, request, "/welcome").await?;
    let session = MarkSession {
        subject_id: request.subject_id,
        date: request.date.unwrap_or_else(today),
        student_ids: request.student_ids,
        present_student_ids: request.present_student_ids,
    };

    let flash = outcome(attendance::save_session(&state.db, &session).await, |saved| {
        format!("Attendance saved successfully for {}!", saved.subject.name)
    });
    Ok(auth
        .redirect(&state, flash, &year_path(TAKE, &request.year))
        .await)
}

/// `GET /attendance/view/{year}`
pub async fn view(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(year): Path<String>,
) -> Result<Json<Page<AttendanceSummary>>, Rejection> {
    auth.require(Role::can_view_reports)?;
    match summary::summarize_year(&state.db, &year).await {
        Ok(summary) => Ok(auth.page(&state, summary).await),
        Err(e) => Err(fail(&state, &auth, &e, "/welcome").await),
    }
}

/// `POST /attendance/reset/{year}`
pub async fn reset(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(year): Path<String>,
) -> Result<Redirect, Rejection> {
    auth.require(Role::can_manage_roster)?;
    let flash = outcome(attendance::reset_year(&state.db, &year).await, |n| {
        format!("{n} attendance records deleted. Attendance is now reset for {year}!")
    });
    Ok(auth.redirect(&state, flash, &year_path(VIEW, &year)).await)
}

/// `GET /attendance/export/{year}`, the year's summary as a workbook download.
pub async fn export(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(year): Path<String>,
) -> Result<Response, Rejection> {
    auth.require(Role::can_view_reports)?;
    if let Err(e) = classroom::require_classroom_by_year(&state.db, &year).await {
        return Err(fail(&state, &auth, &e, "/welcome").await);
    }
    match export::export_year(&state.db, &year).await {
        Ok(bytes) => Ok((
            [
                (header::CONTENT_TYPE, export::CONTENT_TYPE.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename={}", export::export_file_name(&year)),
                ),
            ],
            bytes,
        )
            .into_response()),
        Err(e) => Err(fail(&state, &auth, &e, &year_path(VIEW, &year)).await),
    }
}
