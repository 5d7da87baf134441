//! Adding, renaming and deleting classrooms.

use super::{accept, outcome};
use crate::{
    core::{classroom, user::Role},
    web::{
        AppState,
        session::{AuthSession, Rejection},
    },
};
use axum::{
    Form,
    extract::{Path, State, rejection::FormRejection},
    response::Redirect,
};
use serde::Deserialize;

/// The year label of a new or renamed classroom.
#[derive(Debug, Deserialize)]
pub struct ClassroomForm {
    year: String,
}

/// `POST /classrooms/add`
pub async fn add(
    State(state): State<AppState>,
    auth: AuthSession,
    form: Result<Form<ClassroomForm>, FormRejection>,
) -> Result<Redirect, Rejection> {
    auth.require(Role::can_manage_roster)?;
    let Form(form) = accept(&state, &auth, form, "/welcome").await?;
    let flash = outcome(classroom::create_classroom(&state.db, form.year).await, |c| {
        format!("Classroom '{}' added successfully!", c.year)
    });
    Ok(auth.redirect(&state, flash, "/welcome").await)
}

/// `POST /classrooms/update/{id}`
pub async fn update(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(id): Path<i64>,
    form: Result<Form<ClassroomForm>, FormRejection>,
) -> Result<Redirect, Rejection> {
    auth.require(Role::can_manage_roster)?;
    let Form(form) = accept(&state, &auth, form, "/welcome").await?;
    let flash = outcome(
        classroom::update_classroom(&state.db, id, form.year).await,
        |c| format!("Classroom renamed to '{}'.", c.year),
    );
    Ok(auth.redirect(&state, flash, "/welcome").await)
}

/// `POST /classrooms/delete/{id}`, cascading to the classroom's roster and records.
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(id): Path<i64>,
) -> Result<Redirect, Rejection> {
    auth.require(Role::can_manage_roster)?;
    let flash = outcome(
        classroom::delete_classroom(&state.db, id).await,
        |(c, removed)| {
            format!(
                "Classroom '{}' deleted along with {} students, {} subjects and {} attendance records.",
                c.year, removed.students, removed.subjects, removed.attendance
            )
        },
    );
    Ok(auth.redirect(&state, flash, "/welcome").await)
}
