//! Student roster pages, manual edits and spreadsheet import.

use super::{accept, fail, outcome};
use crate::{
    core::{classroom, import, student, user::Role},
    entities::{classroom as classroom_entity, student as student_entity},
    errors::{self, Error},
    web::{
        AppState,
        flash::{Flash, year_path},
        session::{AuthSession, Page, Rejection},
    },
};
use axum::{
    Form, Json,
    extract::{
        Multipart, Path, State,
        multipart::MultipartRejection,
        rejection::FormRejection,
    },
    response::Redirect,
};
use serde::{Deserialize, Serialize};
use tracing::info;

const LIST: &str = "/students/list";

/// A year's roster.
#[derive(Debug, Serialize)]
pub struct StudentList {
    year: String,
    classroom_id: i64,
    students: Vec<student_entity::Model>,
}

/// `GET /students/list/{year}`
pub async fn list(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(year): Path<String>,
) -> Result<Json<Page<StudentList>>, Rejection> {
    let loaded = async {
        let classroom = classroom::require_classroom_by_year(&state.db, &year).await?;
        let students = student::get_students_by_year(&state.db, &year).await?;
        Ok::<_, Error>((classroom, students))
    }
    .await;

    match loaded {
        Ok((classroom, students)) => Ok(auth
            .page(
                &state,
                StudentList {
                    year: classroom.year,
                    classroom_id: classroom.id,
                    students,
                },
            )
            .await),
        Err(e) => Err(fail(&state, &auth, &e, "/welcome").await),
    }
}

/// A new student and the year they join.
#[derive(Debug, Deserialize)]
pub struct AddStudentForm {
    year: String,
    #[serde(flatten)]
    details: student::StudentDetails,
}

/// `POST /students/add`
pub async fn add(
    State(state): State<AppState>,
    auth: AuthSession,
    form: Result<Form<AddStudentForm>, FormRejection>,
) -> Result<Redirect, Rejection> {
    auth.require(Role::can_manage_roster)?;
    let Form(form) = accept(&state, &auth, form, "/welcome").await?;
    let classroom = match classroom::require_classroom_by_year(&state.db, &form.year).await {
        Ok(c) => c,
        Err(e) => return Err(fail(&state, &auth, &e, "/welcome").await),
    };

    let flash = outcome(
        student::create_student(&state.db, classroom.id, &form.details).await,
        |s| format!("Student '{}' added successfully!", s.name),
    );
    Ok(auth
        .redirect(&state, flash, &year_path(LIST, &classroom.year))
        .await)
}

/// Pulls the `file` part out of a multipart upload.
async fn read_upload(mut multipart: Multipart) -> errors::Result<(Option<String>, Vec<u8>)> {
    let malformed = |e: axum::extract::multipart::MultipartError| Error::Validation {
        message: format!("Malformed upload: {e}"),
    };
    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        if field.name() == Some("file") {
            let file_name = field.file_name().map(str::to_string);
            let bytes = field.bytes().await.map_err(malformed)?;
            return Ok((file_name, bytes.to_vec()));
        }
    }
    Ok((None, Vec::new()))
}

async fn import_upload(
    state: &AppState,
    classroom: &classroom_entity::Model,
    multipart: Multipart,
) -> errors::Result<import::ImportOutcome> {
    let (file_name, bytes) = read_upload(multipart).await?;
    import::validate_upload(file_name.as_deref(), &bytes)?;
    info!(
        "Importing '{}' into {}",
        file_name.unwrap_or_default(),
        classroom.year
    );
    import::import_students(&state.db, classroom, bytes).await
}

/// `POST /students/import/{year}`, a multipart upload with a `file` part.
pub async fn import(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(year): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Redirect, Rejection> {
    auth.require(Role::can_manage_roster)?;
    let classroom = match classroom::require_classroom_by_year(&state.db, &year).await {
        Ok(c) => c,
        Err(e) => return Err(fail(&state, &auth, &e, "/welcome").await),
    };
    let multipart = accept(&state, &auth, multipart, &year_path(LIST, &classroom.year)).await?;

    let flash = outcome(import_upload(&state, &classroom, multipart).await, |o| {
        format!("{} students imported successfully into {}!", o.saved, classroom.year)
    });
    Ok(auth
        .redirect(&state, flash, &year_path(LIST, &classroom.year))
        .await)
}

/// `POST /students/delete-all/{year}`
pub async fn delete_all(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(year): Path<String>,
) -> Result<Redirect, Rejection> {
    auth.require(Role::can_manage_roster)?;
    let flash = outcome(student::delete_students_in_year(&state.db, &year).await, |n| {
        format!("{n} students and all associated attendance records have been deleted.")
    });
    Ok(auth.redirect(&state, flash, &year_path(LIST, &year)).await)
}

/// One student with the classrooms they could be moved to.
#[derive(Debug, Serialize)]
pub struct StudentEdit {
    student: student_entity::Model,
    year: String,
    classrooms: Vec<classroom_entity::Model>,
}

/// `GET /students/edit/{id}`
pub async fn edit(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(id): Path<i64>,
) -> Result<Json<Page<StudentEdit>>, Rejection> {
    let loaded = async {
        let student = student::require_student_by_id(&state.db, id).await?;
        let year = student::get_student_year(&state.db, &student).await?;
        let classrooms = classroom::get_all_classrooms(&state.db).await?;
        Ok::<_, Error>(StudentEdit {
            student,
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

/// Replacement details, including the target classroom.
#[derive(Debug, Deserialize)]
pub struct UpdateStudentForm {
    classroom_id: i64,
    #[serde(flatten)]
    details: student::StudentDetails,
}

/// `POST /students/update/{id}`
pub async fn update(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(id): Path<i64>,
    form: Result<Form<UpdateStudentForm>, FormRejection>,
) -> Result<Redirect, Rejection> {
    auth.require(Role::can_manage_roster)?;
    let Form(form) = accept(&state, &auth, form, &format!("/students/edit/{id}")).await?;
    let updated = async {
        let student = student::update_student(&state.db, id, form.classroom_id, &form.details).await?;
        let year = student::get_student_year(&state.db, &student).await?;
        Ok::<_, Error>(year)
    }
    .await;

    match updated {
        Ok(year) => Ok(auth
            .redirect(
                &state,
                Flash::success("Student updated successfully!"),
                &year_path(LIST, &year),
            )
            .await),
        Err(e @ Error::StudentNotFound { .. }) => Err(fail(&state, &auth, &e, "/welcome").await),
        Err(e) => Err(fail(&state, &auth, &e, &format!("/students/edit/{id}")).await),
    }
}

/// `POST /students/delete/{id}`
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(id): Path<i64>,
) -> Result<Redirect, Rejection> {
    auth.require(Role::can_manage_roster)?;
    let deleted = async {
        let student = student::require_student_by_id(&state.db, id).await?;
        let year = student::get_student_year(&state.db, &student).await?;
        student::delete_student(&state.db, id).await?;
        Ok::<_, Error>(year)
    }
    .await;

    match deleted {
        Ok(year) => Ok(auth
            .redirect(
                &state,
                Flash::success("Student deleted successfully!"),
                &year_path(LIST, &year),
            )
            .await),
        Err(e) => Err(fail(&state, &auth, &e, "/welcome").await),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use crate::{
        core::{student, user::Role},
        test_utils::*,
        web::{flash::IMPORT_FAILURE_MESSAGE, handlers::test_support::*},
    };
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use rust_xlsxwriter::Workbook;

    fn roster_workbook() -> Vec<u8> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, title) in (0u16..).zip(["Name", "Roll Number", "Section"]) {
            sheet.write_string(0, col, title).unwrap();
        }
        sheet.write_string(1, 0, "Asha").unwrap();
        sheet.write_number(1, 1, 101.0).unwrap();
        sheet.write_string(1, 2, "A").unwrap();
        sheet.write_string(2, 0, "Bilal").unwrap();
        sheet.write_string(2, 2, "B").unwrap();
        workbook.save_to_buffer().unwrap()
    }

    fn multipart_upload(uri: &str, cookie: &str, file_name: &str, bytes: &[u8]) -> Request<Body> {
        let boundary = "classcount-test-boundary";
        let mut body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        Request::post(uri)
            .header(header::COOKIE, cookie)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_add_and_list_students() {
        let state = test_state().await;
        let cookie = login_as(&state, "admin", Role::Admin).await;
        create_test_classroom(&state.db, "1st Year").await.unwrap();

        let response = send(
            &state,
            post_form(
                "/students/add",
                &cookie,
                "year=1st+Year&name=Asha&roll_number=101&section=A",
            ),
        )
        .await;
        assert_redirect(&response, "/students/list/1st%20Year");

        let body = json_body(send(&state, get("/students/list/1st%20Year", &cookie)).await).await;
        assert_eq!(body["flash"]["message"], "Student 'Asha' added successfully!");
        assert_eq!(body["students"][0]["roll_number"], "101");
        assert_eq!(body["year"], "1st Year");
    }

    #[tokio::test]
    async fn test_add_without_roll_number_is_flashed() {
        let state = test_state().await;
        let cookie = login_as(&state, "admin", Role::Admin).await;
        create_test_classroom(&state.db, "1st Year").await.unwrap();

        let response = send(&state, post_form("/students/add", &cookie, "year=1st+Year&name=A")).await;
        assert_redirect(&response, "/welcome");

        let body = json_body(send(&state, get("/welcome", &cookie)).await).await;
        assert_eq!(body["flash"]["kind"], "error");
        assert!(student::get_students_by_year(&state.db, "1st Year")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_update_with_bad_classroom_id_returns_to_edit() {
        let state = test_state().await;
        let cookie = login_as(&state, "admin", Role::Admin).await;
        let year = setup_year_with_attendance(&state.db, "1st Year").await.unwrap();

        let uri = format!("/students/update/{}", year.students[0].id);
        let body = "name=Asha&roll_number=1&section=A&classroom_id=abc";
        let response = send(&state, post_form(&uri, &cookie, body)).await;
        assert_redirect(&response, &format!("/students/edit/{}", year.students[0].id));
    }

    #[tokio::test]
    async fn test_import_without_multipart_body_is_flashed() {
        let state = test_state().await;
        let cookie = login_as(&state, "admin", Role::Admin).await;
        create_test_classroom(&state.db, "1st Year").await.unwrap();

        let response = send(&state, post_form("/students/import/1st%20Year", &cookie, "")).await;
        assert_redirect(&response, "/students/list/1st%20Year");
    }

    #[tokio::test]
    async fn test_unknown_year_redirects_to_welcome() {
        let state = test_state().await;
        let cookie = login_as(&state, "ms.rao", Role::Teacher).await;

        let response = send(&state, get("/students/list/9th%20Year", &cookie)).await;
        assert_redirect(&response, "/welcome");
    }

    #[tokio::test]
    async fn test_import_upload() {
        let state = test_state().await;
        let cookie = login_as(&state, "admin", Role::Admin).await;
        create_test_classroom(&state.db, "1st Year").await.unwrap();

        let request = multipart_upload(
            "/students/import/1st%20Year",
            &cookie,
            "roster.xlsx",
            &roster_workbook(),
        );
        assert_redirect(&send(&state, request).await, "/students/list/1st%20Year");

        let body = json_body(send(&state, get("/students/list/1st%20Year", &cookie)).await).await;
        assert_eq!(
            body["flash"]["message"],
            "1 students imported successfully into 1st Year!"
        );
        assert_eq!(body["students"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_upload_shows_generic_failure() {
        let state = test_state().await;
        let cookie = login_as(&state, "admin", Role::Admin).await;
        create_test_classroom(&state.db, "1st Year").await.unwrap();

        let request = multipart_upload("/students/import/1st%20Year", &cookie, "roster.xlsx", b"junk");
        send(&state, request).await;

        let body = json_body(send(&state, get("/students/list/1st%20Year", &cookie)).await).await;
        assert_eq!(body["flash"]["kind"], "error");
        assert_eq!(body["flash"]["message"], IMPORT_FAILURE_MESSAGE);
    }

    #[tokio::test]
    async fn test_delete_student_and_teacher_forbidden() {
        let state = test_state().await;
        let year = setup_year_with_attendance(&state.db, "1st Year").await.unwrap();

        let teacher = login_as(&state, "ms.rao", Role::Teacher).await;
        let uri = format!("/students/delete/{}", year.students[0].id);
        let response = send(&state, post_form(&uri, &teacher, "")).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let admin = login_as(&state, "admin", Role::Admin).await;
        let response = send(&state, post_form(&uri, &admin, "")).await;
        assert_redirect(&response, "/students/list/1st%20Year");
        assert_eq!(
            student::get_students_by_year(&state.db, "1st Year")
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_update_moves_student_between_years() {
        let state = test_state().await;
        let cookie = login_as(&state, "admin", Role::Admin).await;
        let first = setup_year_with_attendance(&state.db, "1st Year").await.unwrap();
        let second = create_test_classroom(&state.db, "2nd Year").await.unwrap();

        let uri = format!("/students/update/{}", first.students[0].id);
        let body = format!(
            "name=Asha+K&roll_number=201&section=B&classroom_id={}",
            second.id
        );
        let response = send(&state, post_form(&uri, &cookie, &body)).await;
        assert_redirect(&response, "/students/list/2nd%20Year");

        let moved = student::require_student_by_id(&state.db, first.students[0].id)
            .await
            .unwrap();
        assert_eq!(moved.classroom_id, second.id);
        assert_eq!(moved.name, "Asha K");
    }
}
