//! Landing page, login/logout and the post-login welcome page.

use crate::{
    core::{classroom, student, user::{self, Role}},
    errors::{self, Error},
    web::{
        AppState,
        session::{self, AuthSession, Page, Rejection},
    },
};
use axum::{
    Form, Json,
    extract::{Query, State, rejection::FormRejection},
    http::{HeaderMap, header},
    response::{IntoResponse, Redirect, Response},
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// What an anonymous visitor sees at `/`.
#[derive(Debug, Serialize)]
pub struct Landing {
    application: &'static str,
    login: &'static str,
}

/// `GET /`
pub async fn landing() -> Json<Landing> {
    Json(Landing {
        application: "ClassCount",
        login: session::LOGIN_PATH,
    })
}

/// `?error` and `?logout` markers left by the login and logout redirects.
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    error: Option<String>,
    logout: Option<String>,
}

/// The login screen, with a message when arriving from a failed login or a logout.
#[derive(Debug, Serialize)]
pub struct LoginPage {
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

/// `GET /login`
pub async fn login_page(Query(query): Query<LoginQuery>) -> Json<LoginPage> {
    Json(LoginPage {
        error: query.error.map(|_| "Invalid username or password."),
        message: query.logout.map(|_| "You have been logged out."),
    })
}

/// Submitted credentials.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    username: String,
    password: String,
}

/// `POST /login`, starting a session on success.
pub async fn login(
    State(state): State<AppState>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Response {
    let Form(form) = match form {
        Ok(form) => form,
        Err(rejection) => {
            warn!("Malformed login form: {}", rejection);
            return Redirect::to("/login?error").into_response();
        }
    };
    match user::authenticate(&state.db, &form.username, &form.password).await {
        Ok((user, role)) => {
            let token = state.sessions.create(&user, role).await;
            info!("User '{}' logged in as {}", user.username, role);
            (
                [(header::SET_COOKIE, state.sessions.cookie(&token))],
                Redirect::to("/welcome"),
            )
                .into_response()
        }
        Err(Error::InvalidCredentials) => {
            warn!("Failed login for '{}'", form.username.trim());
            Redirect::to("/login?error").into_response()
        }
        Err(e) => {
            error!("Login failed: {}", e);
            Redirect::to("/login?error").into_response()
        }
    }
}

/// `GET|POST /logout`, ending the caller's session.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(token) = session::token_from_headers(&headers) {
        state.sessions.remove(&token).await;
    }
    (
        [(header::SET_COOKIE, session::expired_cookie())],
        Redirect::to("/login?logout"),
    )
}

/// A classroom as listed on the welcome page.
#[derive(Debug, Serialize)]
pub struct ClassroomEntry {
    id: i64,
    year: String,
    students: u64,
}

/// The post-login landing page.
#[derive(Debug, Serialize)]
pub struct Welcome {
    username: String,
    role: Role,
    classrooms: Vec<ClassroomEntry>,
}

async fn classroom_entries(db: &DatabaseConnection) -> errors::Result<Vec<ClassroomEntry>> {
    let mut entries = Vec::new();
    for c in classroom::get_all_classrooms(db).await? {
        entries.push(ClassroomEntry {
            students: student::count_students_in_classroom(db, c.id).await?,
            id: c.id,
            year: c.year,
        });
    }
    Ok(entries)
}

/// `GET /welcome`
pub async fn welcome(
    State(state): State<AppState>,
    auth: AuthSession,
) -> Result<Json<Page<Welcome>>, Rejection> {
    let classrooms = classroom_entries(&state.db).await.map_err(|e| {
        error!("Failed to load classrooms: {}", e);
        Rejection::Internal
    })?;

    let welcome = Welcome {
        username: auth.session.username.clone(),
        role: auth.session.role,
        classrooms,
    };
    Ok(auth.page(&state, welcome).await)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::web::handlers::test_support::*;
    use axum::{body::Body, http::Request};

    fn login_request(body: &str) -> Request<Body> {
        Request::post("/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_login_sets_cookie_and_welcome_lists_classrooms() {
        let state = test_state().await;
        user::create_user(&state.db, "admin", "admin123", Role::Admin)
            .await
            .unwrap();
        classroom::create_classroom(&state.db, "1st Year".to_string())
            .await
            .unwrap();

        let response = send(&state, login_request("username=admin&password=admin123")).await;
        assert_redirect(&response, "/welcome");
        let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        let cookie = set_cookie.split(';').next().unwrap().to_string();

        let body = json_body(send(&state, get("/welcome", &cookie)).await).await;
        assert_eq!(body["username"], "admin");
        assert_eq!(body["role"], "ADMIN");
        assert_eq!(body["classrooms"][0]["year"], "1st Year");
        assert_eq!(body["classrooms"][0]["students"], 0);
    }

    #[tokio::test]
    async fn test_bad_password_redirects_with_error() {
        let state = test_state().await;
        user::create_user(&state.db, "admin", "admin123", Role::Admin)
            .await
            .unwrap();

        let response = send(&state, login_request("username=admin&password=nope")).await;
        assert_redirect(&response, "/login?error");
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn test_malformed_login_form_redirects_with_error() {
        let state = test_state().await;
        let response = send(&state, login_request("username=admin")).await;
        assert_redirect(&response, "/login?error");
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn test_protected_page_without_session_redirects_to_login() {
        let state = test_state().await;
        let response = send(&state, get("/welcome", "classcount_session=bogus")).await;
        assert_redirect(&response, "/login");
    }

    #[tokio::test]
    async fn test_logout_ends_session() {
        let state = test_state().await;
        let cookie = login_as(&state, "ms.rao", Role::Teacher).await;

        let response = send(&state, get("/logout", &cookie)).await;
        assert_redirect(&response, "/login?logout");

        let response = send(&state, get("/welcome", &cookie)).await;
        assert_redirect(&response, "/login");
    }

    #[tokio::test]
    async fn test_login_page_reports_markers() {
        let state = test_state().await;
        let body = json_body(send(&state, get("/login?error", "")).await).await;
        assert_eq!(body["error"], "Invalid username or password.");
        assert!(body.get("message").is_none());
    }
}
