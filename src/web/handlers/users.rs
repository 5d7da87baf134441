//! Account management, admin only.

use super::{accept, fail, outcome};
use crate::{
    core::user::{self, Role},
    web::{
        AppState,
        session::{AuthSession, LOGIN_PATH, Page, Rejection},
    },
};
use axum::{
    Form, Json,
    extract::{Path, State, rejection::FormRejection},
    response::Redirect,
};
use serde::{Deserialize, Serialize};
use tracing::info;

const MANAGE: &str = "/users/manage";

/// One account as listed to admins; the password hash never leaves the server.
#[derive(Debug, Serialize)]
pub struct UserEntry {
    id: i64,
    username: String,
    /// `None` when the stored role is not recognised
    role: Option<Role>,
}

/// Every account, plus the roles a new one may be given.
#[derive(Debug, Serialize)]
pub struct ManageUsers {
    users: Vec<UserEntry>,
    roles: [Role; 2],
}

/// `GET /users/manage`
pub async fn manage(
    State(state): State<AppState>,
    auth: AuthSession,
) -> Result<Json<Page<ManageUsers>>, Rejection> {
    auth.require(Role::can_manage_users)?;
    match user::get_all_users(&state.db).await {
        Ok(users) => {
            let users = users
                .iter()
                .map(|u| UserEntry {
                    id: u.id,
                    username: u.username.clone(),
                    role: user::user_role(u).ok(),
                })
                .collect();
            let page = ManageUsers {
                users,
                roles: [Role::Admin, Role::Teacher],
            };
            Ok(auth.page(&state, page).await)
        }
        Err(e) => Err(fail(&state, &auth, &e, "/welcome").await),
    }
}

/// A new account; `role` is parsed leniently.
#[derive(Debug, Deserialize)]
pub struct AddUserForm {
    username: String,
    password: String,
    role: String,
}

/// `POST /users/add`
pub async fn add(
    State(state): State<AppState>,
    auth: AuthSession,
    form: Result<Form<AddUserForm>, FormRejection>,
) -> Result<Redirect, Rejection> {
    auth.require(Role::can_manage_users)?;
    let Form(form) = accept(&state, &auth, form, MANAGE).await?;
    let created = match form.role.parse::<Role>() {
        Ok(role) => user::create_user(&state.db, &form.username, &form.password, role).await,
        Err(e) => Err(e),
    };
    let flash = outcome(created, |u| {
        format!("User '{}' added successfully!", u.username)
    });
    Ok(auth.redirect(&state, flash, MANAGE).await)
}

/// `POST /users/delete/{id}`, also ending the deleted user's sessions.
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(id): Path<i64>,
) -> Result<Redirect, Rejection> {
    auth.require(Role::can_manage_users)?;
    let deleted = user::delete_user(&state.db, id).await;
    if let Ok(removed) = &deleted {
        let ended = state.sessions.remove_user(removed.id).await;
        info!("User '{}' deleted, {} sessions ended", removed.username, ended);
        if removed.id == auth.session.user_id {
            return Ok(Redirect::to(LOGIN_PATH));
        }
    }

    let flash = outcome(deleted, |u| {
        format!("User '{}' deleted successfully.", u.username)
    });
    Ok(auth.redirect(&state, flash, MANAGE).await)
}
