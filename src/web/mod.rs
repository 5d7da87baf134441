//! HTTP surface: routing, shared state and the server loop.

pub mod flash;
pub mod handlers;
pub mod session;

use crate::{config::AppConfig, errors::Result};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use session::SessionStore;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Largest accepted roster upload
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    /// Connection pool
    pub db: DatabaseConnection,
    /// Logged-in sessions
    pub sessions: SessionStore,
    /// Loaded application settings
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Bundles the connection and config with an empty session store.
    #[must_use]
    pub fn new(db: DatabaseConnection, config: AppConfig) -> Self {
        Self {
            db,
            sessions: SessionStore::new(config.session.ttl_minutes),
            config: Arc::new(config),
        }
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    use handlers::{attendance, auth, classrooms, reports, students, subjects, users};

    Router::new()
        .route("/", get(auth::landing))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", get(auth::logout).post(auth::logout))
        .route("/welcome", get(auth::welcome))
        .route("/classrooms/add", post(classrooms::add))
        .route("/classrooms/update/{id}", post(classrooms::update))
        .route("/classrooms/delete/{id}", post(classrooms::delete))
        .route("/students/list/{year}", get(students::list))
        .route("/students/add", post(students::add))
        .route(
            "/students/import/{year}",
            post(students::import).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/students/delete-all/{year}", post(students::delete_all))
        .route("/students/edit/{id}", get(students::edit))
        .route("/students/update/{id}", post(students::update))
        .route("/students/delete/{id}", post(students::delete))
        .route("/subjects/list/{year}", get(subjects::list))
        .route("/subjects/add", post(subjects::add))
        .route("/subjects/edit/{id}", get(subjects::edit))
        .route("/subjects/update/{id}", post(subjects::update))
        .route("/subjects/delete/{id}", post(subjects::delete))
        .route("/attendance/take/{year}", get(attendance::take))
        .route("/attendance/mark", post(attendance::mark))
        .route("/attendance/save", post(attendance::save))
        .route("/attendance/view/{year}", get(attendance::view))
        .route("/attendance/reset/{year}", post(attendance::reset))
        .route("/attendance/export/{year}", get(attendance::export))
        .route("/reports/student/{year}/{roll_number}", get(reports::student))
        .route("/users/manage", get(users::manage))
        .route("/users/add", post(users::add))
        .route("/users/delete/{id}", post(users::delete))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds the configured address and serves until Ctrl-C.
pub async fn serve(state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(&state.config.server.bind_address).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
