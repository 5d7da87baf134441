//! Subjects taught in each year.

use super::{accept, fail, outcome};
use crate::{
    core::{classroom, subject, user::Role},
    entities::{classroom as classroom_entity, subject as subject_entity},
    errors::Error,
    web::{
        AppState,
        flash::{Flash, year_path},
        session::{AuthSession, Page, Rejection},
    },
};
use axum::{
    Form, Json,
    extract::{Path, State, rejection::FormRejection},
    response::Redirect,
};
use serde::{Deserialize, Serialize};

const LIST: &str = "/subjects/list";

/// A year's subjects.
#[derive(Debug, Serialize)]
pub struct SubjectList {
    year: String,
    classroom_id: i64,
    subjects: Vec<subject_entity::Model>,
}

/// `GET /subjects/list/{year}`
pub async fn list(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(year): Path<String>,
) -> Result<Json<Page<SubjectList>>, Rejection> {
    let loaded = async {
        let classroom = classroom::require_classroom_by_year(&state.db, &year).await?;
        let subjects = subject::get_subjects_by_year(&state.db, &year).await?;
        Ok::<_, Error>(SubjectList {
            year: classroom.year,
            classroom_id: classroom.id,
            subjects,
        })
    }
    .await;

    match loaded {
        Ok(list) => Ok(auth.page(&state, list).await),
        Err(e) => Err(fail(&state, &auth, &e, "/welcome").await),
    }
}

/// A new subject and the year it belongs to.
#[derive(Debug, Deserialize)]
pub struct AddSubjectForm {
    year: String,
    name: String,
}

/// `POST /subjects/add`
pub async fn add(
    State(state): State<AppState>,
    auth: AuthSession,
    form: Result<Form<AddSubjectForm>, FormRejection>,
) -> Result<Redirect, Rejection> {
    auth.require(Role::can_manage_roster)?;
    let Form(form) = accept(&state, &auth, form, "/welcome").await?;
    let classroom = match classroom::require_classroom_by_year(&state.db, &form.year).await {
        Ok(c) => c,
        Err(e) => return Err(fail(&state, &auth, &e, "/welcome").await),
    };

    let flash = outcome(
        subject::create_subject(&state.db, classroom.id, form.name).await,
        |s| format!("Subject '{}' saved successfully!", s.name),
    );
    Ok(auth
        .redirect(&state, flash, &year_path(LIST, &classroom.year))
        .await)
}

/// One subject with the classrooms it could be moved to.
#[derive(Debug, Serialize)]
pub struct SubjectEdit {
    subject: subject_entity::Model,
    year: String,
    classrooms: Vec<classroom_entity::Model>,
}

/// `GET /subjects/edit/{id}`
pub async fn edit(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(id): Path<i64>,
) -> Result<Json<Page<SubjectEdit>>, Rejection> {
    let loaded = async {
        let subject = subject::require_subject_by_id(&state.db, id).await?;
        let year = classroom::require_classroom_by_id(&state.db, subject.classroom_id)
            .await?
            .year;
        let classrooms = classroom::get_all_classrooms(&state.db).await?;
        Ok::<_, Error>(SubjectEdit {
            subject,
            year,
            classrooms,
        })
    }
    .await;

    match loaded {
        Ok(edit) => Ok(auth.page(&state, edit).await),
        Err(e) => Err(fail(&state, &auth, &e, "/welcome").await),
    }
}

/// New name and classroom for a subject.
#[derive(Debug, Deserialize)]
pub struct UpdateSubjectForm {
    name: String,
    classroom_id: i64,
}

/// `POST /subjects/update/{id}`
pub async fn update(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(id): Path<i64>,
    form: Result<Form<UpdateSubjectForm>, FormRejection>,
) -> Result<Redirect, Rejection> {
    auth.require(Role::can_manage_roster)?;
    let Form(form) = accept(&state, &auth, form, &format!("/subjects/edit/{id}")).await?;
    let updated = async {
        let subject = subject::update_subject(&state.db, id, form.classroom_id, form.name).await?;
        Ok::<_, Error>(
            classroom::require_classroom_by_id(&state.db, subject.classroom_id)
                .await?
                .year,
        )
    }
    .await;

    match updated {
        Ok(year) => Ok(auth
            .redirect(
                &state,
                Flash::success("Subject updated successfully!"),
                &year_path(LIST, &year),
            )
            .await),
        Err(e @ Error::SubjectNotFound { .. }) => Err(fail(&state, &auth, &e, "/welcome").await),
        Err(e) => Err(fail(&state, &auth, &e, &format!("/subjects/edit/{id}")).await),
    }
}

/// `POST /subjects/delete/{id}`, with the subject's attendance records.
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(id): Path<i64>,
) -> Result<Redirect, Rejection> {
    auth.require(Role::can_manage_roster)?;
    let deleted = async {
        let subject = subject::require_subject_by_id(&state.db, id).await?;
        let year = classroom::require_classroom_by_id(&state.db, subject.classroom_id)
            .await?
            .year;
        subject::delete_subject(&state.db, id).await?;
        Ok::<_, Error>(year)
    }
    .await;

    match deleted {
        Ok(year) => Ok(auth
            .redirect(
                &state,
                Flash::success("Subject deleted successfully!"),
                &year_path(LIST, &year),
            )
            .await),
        Err(e) => Err(fail(&state, &auth, &e, "/welcome").await),
    }
}
