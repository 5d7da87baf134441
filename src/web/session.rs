//! Login sessions: an in-memory token store and the extractor that guards routes.
//!
//! A session token travels in the `classcount_session` cookie. Each session
//! carries the user's identity, role, expiry and at most one pending flash
//! message.

use crate::{
    core::user::Role,
    entities::user,
    web::{AppState, flash::Flash},
};
use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderMap, StatusCode, header, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use tracing::debug;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "classcount_session";

/// Where unauthenticated requests are sent
pub const LOGIN_PATH: &str = "/login";

/// One logged-in user.
#[derive(Debug, Clone)]
pub struct Session {
    /// Id of the user row
    pub user_id: i64,
    /// Login name
    pub username: String,
    /// Role at login time
    pub role: Role,
    expires_at: DateTime<Utc>,
    flash: Option<Flash>,
}

/// Token-keyed sessions shared by every request.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    ttl: Duration,
}

impl SessionStore {
    /// Creates an empty store whose sessions live for `ttl_minutes`.
    #[must_use]
    pub fn new(ttl_minutes: i64) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl: Duration::minutes(ttl_minutes.max(1)),
        }
    }

    /// Starts a session for `user` and returns its token.
    pub async fn create(&self, user: &user::Model, role: Role) -> String {
        let token = uuid::Uuid::new_v4().simple().to_string();
        let session = Session {
            user_id: user.id,
            username: user.username.clone(),
            role,
            expires_at: Utc::now() + self.ttl,
            flash: None,
        };
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| s.expires_at > Utc::now());
        sessions.insert(token.clone(), session);
        token
    }

    /// Looks up a live session. Expired sessions are dropped on sight.
    pub async fn get(&self, token: &str) -> Option<Session> {
        let mut sessions = self.sessions.write().await;
        match sessions.get(token) {
            Some(session) if session.expires_at > Utc::now() => Some(session.clone()),
            Some(_) => {
                debug!("Session expired");
                sessions.remove(token);
                None
            }
            None => None,
        }
    }

    /// Ends a session. Unknown tokens are ignored.
    pub async fn remove(&self, token: &str) {
        self.sessions.write().await.remove(token);
    }

    /// Ends every session belonging to `user_id` and returns how many there were.
    pub async fn remove_user(&self, user_id: i64) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.user_id != user_id);
        before - sessions.len()
    }

    /// Stores a message for the next page the session views, replacing any pending one.
    pub async fn set_flash(&self, token: &str, flash: Flash) {
        if let Some(session) = self.sessions.write().await.get_mut(token) {
            session.flash = Some(flash);
        }
    }

    /// Removes and returns the pending message.
    pub async fn take_flash(&self, token: &str) -> Option<Flash> {
        self.sessions
            .write()
            .await
            .get_mut(token)
            .and_then(|session| session.flash.take())
    }

    /// `Set-Cookie` value for a fresh session token.
    #[must_use]
    pub fn cookie(&self, token: &str) -> String {
        format!(
            "{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
            self.ttl.num_seconds()
        )
    }
}

/// `Set-Cookie` value that clears the session cookie.
#[must_use]
pub fn expired_cookie() -> String {
    format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
}

/// Reads the session token from the request's `Cookie` headers.
#[must_use]
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, token)| token.to_string())
        .filter(|token| !token.is_empty())
}

/// Why a request was turned away.
#[derive(Debug)]
pub enum Rejection {
    /// No valid session: go log in
    Login,
    /// Logged in, but the role lacks the capability
    Forbidden,
    /// Send the user elsewhere; a flash message has already been stored
    Redirect(Redirect),
    /// Nowhere safe to redirect to
    Internal,
}

impl From<Redirect> for Rejection {
    fn from(redirect: Redirect) -> Self {
        Self::Redirect(redirect)
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        match self {
            Self::Login => Redirect::to(LOGIN_PATH).into_response(),
            Self::Forbidden => (StatusCode::FORBIDDEN, "Access denied").into_response(),
            Self::Redirect(redirect) => redirect.into_response(),
            Self::Internal => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong").into_response()
            }
        }
    }
}

/// A JSON page with the session's pending flash message, consumed on render.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    /// Message left by the previous action, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flash: Option<Flash>,
    /// The page's own content
    #[serde(flatten)]
    pub data: T,
}

/// Extractor for a logged-in user; redirects to the login page otherwise.
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// Session token from the cookie
    pub token: String,
    /// The session it resolves to
    pub session: Session,
}

impl FromRequestParts<AppState> for AuthSession {
    type Rejection = Rejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = token_from_headers(&parts.headers).ok_or(Rejection::Login)?;
        let session = state.sessions.get(&token).await.ok_or(Rejection::Login)?;
        Ok(Self { token, session })
    }
}

impl AuthSession {
    /// Fails with 403 unless the session's role has the capability.
    pub fn require(&self, capability: fn(Role) -> bool) -> Result<(), Rejection> {
        if capability(self.session.role) {
            Ok(())
        } else {
            debug!(
                "User '{}' ({}) refused access",
                self.session.username, self.session.role
            );
            Err(Rejection::Forbidden)
        }
    }

    /// Leaves `flash` for the next page and redirects (303) to `to`.
    pub async fn redirect(&self, state: &AppState, flash: Flash, to: &str) -> Redirect {
        state.sessions.set_flash(&self.token, flash).await;
        Redirect::to(to)
    }

    /// Wraps `data` with the pending flash message.
    pub async fn page<T: Serialize>(&self, state: &AppState, data: T) -> Json<Page<T>> {
        Json(Page {
            flash: state.sessions.take_flash(&self.token).await,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use axum::http::HeaderValue;

    fn test_user() -> user::Model {
        user::Model {
            id: 7,
            username: "ms.rao".to_string(),
            password_hash: String::new(),
            role: Role::Teacher.as_stored().to_string(),
        }
    }

    #[test]
    fn test_token_from_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(token_from_headers(&headers), None);

        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; classcount_session=abc123; lang=en"),
        );
        assert_eq!(token_from_headers(&headers).as_deref(), Some("abc123"));

        headers.insert(header::COOKIE, HeaderValue::from_static("classcount_session="));
        assert_eq!(token_from_headers(&headers), None);
    }

    #[tokio::test]
    async fn test_session_lifecycle_and_flash() {
        let store = SessionStore::new(30);
        let token = store.create(&test_user(), Role::Teacher).await;

        let session = store.get(&token).await.unwrap();
        assert_eq!(session.user_id, 7);
        assert_eq!(session.role, Role::Teacher);

        store.set_flash(&token, Flash::success("Saved")).await;
        assert_eq!(store.take_flash(&token).await, Some(Flash::success("Saved")));
        assert_eq!(store.take_flash(&token).await, None);

        store.remove(&token).await;
        assert!(store.get(&token).await.is_none());
    }

    #[tokio::test]
    async fn test_remove_user_ends_only_their_sessions() {
        let store = SessionStore::new(30);
        let laptop = store.create(&test_user(), Role::Teacher).await;
        let phone = store.create(&test_user(), Role::Teacher).await;
        let other = user::Model {
            id: 8,
            username: "mr.iyer".to_string(),
            ..test_user()
        };
        let kept = store.create(&other, Role::Teacher).await;

        assert_eq!(store.remove_user(7).await, 2);
        assert!(store.get(&laptop).await.is_none());
        assert!(store.get(&phone).await.is_none());
        assert!(store.get(&kept).await.is_some());
        assert_eq!(store.remove_user(7).await, 0);
    }

    #[tokio::test]
    async fn test_expired_session_is_dropped() {
        let store = SessionStore::new(30);
        let token = store.create(&test_user(), Role::Admin).await;
        store
            .sessions
            .write()
            .await
            .get_mut(&token)
            .unwrap()
            .expires_at = Utc::now() - Duration::minutes(1);

        assert!(store.get(&token).await.is_none());
        assert!(store.sessions.read().await.is_empty());
    }

    #[test]
    fn test_cookie_attributes() {
        let store = SessionStore::new(60);
        let cookie = store.cookie("tok");
        assert!(cookie.starts_with("classcount_session=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=3600"));
        assert!(expired_cookie().contains("Max-Age=0"));
    }
}
