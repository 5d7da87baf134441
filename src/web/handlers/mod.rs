//! Request handlers, one module per resource.
//!
//! Mutations never fail outright: the outcome becomes a flash message and the
//! user is redirected (303) to the most useful page. Views return JSON.

pub mod attendance;
pub mod auth;
pub mod classrooms;
pub mod reports;
pub mod students;
pub mod subjects;
pub mod users;

use crate::{
    errors::{Error, Result},
    web::{
        AppState,
        flash::Flash,
        session::{AuthSession, Rejection},
    },
};

/// Flash for an operation's result; `describe` words the success.
fn outcome<T>(result: Result<T>, describe: impl FnOnce(T) -> String) -> Flash {
    match result {
        Ok(value) => Flash::success(describe(value)),
        Err(err) => Flash::from_error(&err),
    }
}

/// Stores `err` as a flash message and rejects with a redirect to `to`.
async fn fail(state: &AppState, auth: &AuthSession, err: &Error, to: &str) -> Rejection {
    Rejection::Redirect(auth.redirect(state, Flash::from_error(err), to).await)
}

/// Unwraps an extracted request body, or flashes why it was refused and redirects to `to`.
async fn accept<T, R: std::fmt::Display>(
    state: &AppState,
    auth: &AuthSession,
    payload: std::result::Result<T, R>,
    to: &str,
) -> std::result::Result<T, Rejection> {
    match payload {
        Ok(value) => Ok(value),
        Err(rejection) => {
            tracing::debug!("Rejected request body: {}", rejection);
            let err = Error::Validation {
                message: rejection.to_string(),
            };
            Err(fail(state, auth, &err, to).await)
        }
    }
}
