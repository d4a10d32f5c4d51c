mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use common::{
    ids, TestApp, ADA_FRIDAY, ADA_MONDAY_EARLY, ADA_MONDAY_LATE, BOB_TUESDAY, STUDENT_SAM, STUDENT_TIA,
    TEACHER_BOB,
};

#[tokio::test]
async fn class_visibility_follows_role() -> Result<()> {
    let app = TestApp::seeded().await?;

    let (_, rows) = app.get("/api/v1/classes", &app.ada()).await?;
    assert_eq!(ids(&rows), vec![ADA_MONDAY_EARLY, ADA_MONDAY_LATE, ADA_FRIDAY]);

    let (_, rows) = app.get("/api/v1/classes", &app.sam()).await?;
    assert_eq!(ids(&rows), vec![ADA_MONDAY_EARLY, ADA_FRIDAY]);

    let (_, rows) = app.get("/api/v1/classes?weekday=monday", &app.admin()).await?;
    assert_eq!(ids(&rows), vec![ADA_MONDAY_EARLY, ADA_MONDAY_LATE]);

    let (status, _) = app.get(&format!("/api/v1/classes/{}", BOB_TUESDAY), &app.ada()).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn teacher_sees_only_students_on_their_rosters() -> Result<()> {
    let app = TestApp::seeded().await?;

    let (_, rows) = app.get("/api/v1/users", &app.ada()).await?;
    assert_eq!(ids(&rows), vec![STUDENT_SAM]);
    assert!(rows[0].get("password").is_none());

    let (_, rows) = app.get("/api/v1/users", &app.bob()).await?;
    assert_eq!(ids(&rows), vec![STUDENT_TIA]);

    let (status, _) = app.get("/api/v1/users", &app.sam()).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn teacher_cannot_create_class_for_someone_else() -> Result<()> {
    let app = TestApp::seeded().await?;
    let class = json!({
        "name": "Geometry", "subjectId": 1, "teacherId": TEACHER_BOB,
        "weekday": "thursday", "startTime": "12:00", "endTime": "12:45"
    });

    let (status, _) = app.post("/api/v1/classes", &app.ada(), class.clone()).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, created) = app.post("/api/v1/classes", &app.bob(), class).await?;
    assert_eq!(status, StatusCode::OK, "{}", created);
    assert_eq!(created["weekday"], "THURSDAY");
    assert_eq!(created["start_time"], "12:00:00");
    Ok(())
}

#[tokio::test]
async fn enrollment_adds_and_removes_roster_members() -> Result<()> {
    let app = TestApp::seeded().await?;
    let ada = app.ada();
    let uri = format!("/api/v1/classes/{}/students", ADA_MONDAY_LATE);

    let (status, body) = app.post(&uri, &ada, json!({ "studentId": STUDENT_TIA })).await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["enrolled"], true);

    let (_, body) = app.post(&uri, &ada, json!({ "studentId": STUDENT_TIA })).await?;
    assert_eq!(body["enrolled"], false);

    let (_, rows) = app.get("/api/v1/users", &ada).await?;
    assert_eq!(ids(&rows), vec![STUDENT_SAM, STUDENT_TIA]);

    let (status, body) = app.delete(&format!("{}/{}", uri, STUDENT_TIA), &ada).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rowsDeleted"], 1);

    let (_, body) = app.delete(&format!("{}/{}", uri, STUDENT_TIA), &ada).await?;
    assert_eq!(body["rowsDeleted"], 0);
    Ok(())
}

#[tokio::test]
async fn enrollment_rejects_non_students_and_foreign_classes() -> Result<()> {
    let app = TestApp::seeded().await?;

    let uri = format!("/api/v1/classes/{}/students", ADA_MONDAY_LATE);
    let (status, body) = app.post(&uri, &app.ada(), json!({ "studentId": TEACHER_BOB })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["param"], "studentId");

    let (status, _) = app.post(&uri, &app.bob(), json!({ "studentId": STUDENT_TIA })).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.post(&uri, &app.sam(), json!({ "studentId": STUDENT_SAM })).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn deleting_a_class_drops_its_enrollments() -> Result<()> {
    let app = TestApp::seeded().await?;
    let (status, body) = app.delete(&format!("/api/v1/classes/{}", ADA_FRIDAY), &app.admin()).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rowsDeleted"], 1);

    let (_, rows) = app.get("/api/v1/classes", &app.sam()).await?;
    assert_eq!(ids(&rows), vec![ADA_MONDAY_EARLY]);
    Ok(())
}

#[tokio::test]
async fn classes_with_grades_cannot_be_deleted() -> Result<()> {
    let app = TestApp::seeded().await?;
    let (status, body) = app.delete(&format!("/api/v1/classes/{}", ADA_MONDAY_EARLY), &app.admin()).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["errors"][0]["param"], "id");
    assert_eq!(body["errors"][0]["location"], "params");

    let (status, _) = app.get(&format!("/api/v1/classes/{}", ADA_MONDAY_EARLY), &app.admin()).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}
