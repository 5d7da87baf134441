//! Per-student attendance reports.

use super::fail;
use crate::{
    core::{
        report::{self, StudentReport},
        user::Role,
    },
    web::{
        AppState,
        flash::year_path,
        session::{AuthSession, Page, Rejection},
    },
};
use axum::{
    Json,
    extract::{Path, State},
};

/// `GET /reports/student/{year}/{roll_number}`
pub async fn student(
    State(state): State<AppState>,
    auth: AuthSession,
    Path((year, roll_number)): Path<(String, String)>,
) -> Result<Json<Page<StudentReport>>, Rejection> {
    auth.require(Role::can_view_reports)?;
    match report::student_report(&state.db, &year, &roll_number).await {
        Ok(report) => Ok(auth.page(&state, report).await),
        Err(e) => Err(fail(&state, &auth, &e, &year_path("/attendance/view", &year)).await),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use crate::{core::user::Role, test_utils::*, web::handlers::test_support::*};

    #[tokio::test]
    async fn test_student_report_by_roll_number() {
        let state = test_state().await;
        let cookie = login_as(&state, "ms.rao", Role::Teacher).await;
        setup_year_with_attendance(&state.db, "1st Year").await.unwrap();

        let body = json_body(send(&state, get("/reports/student/1st%20Year/2", &cookie)).await).await;
        assert_eq!(body["student"]["name"], "Bilal");
        assert_eq!(body["subjects"][0]["attendance"], "0/1");
        assert_eq!(body["overall_percentage"], "0.00%");
    }

    #[tokio::test]
    async fn test_unknown_roll_number_redirects_to_view() {
        let state = test_state().await;
        let cookie = login_as(&state, "ms.rao", Role::Teacher).await;
        setup_year_with_attendance(&state.db, "1st Year").await.unwrap();

        let response = send(&state, get("/reports/student/1st%20Year/99", &cookie)).await;
        assert_redirect(&response, "/attendance/view/1st%20Year");

        let body = json_body(send(&state, get("/attendance/view/1st%20Year", &cookie)).await).await;
        assert_eq!(body["flash"]["kind"], "error");
    }
}
