mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use common::{ids, TestApp, ADA_MONDAY_EARLY, BOB_TUESDAY, STUDENT_SAM, STUDENT_TIA};

fn entry(month: serde_json::Value, class_id: i64, student_id: i64) -> serde_json::Value {
    json!({ "date": "2024-10-07", "month": month, "studentId": student_id, "classId": class_id })
}

#[tokio::test]
async fn attendance_entry_month_must_be_a_calendar_month() -> Result<()> {
    let app = TestApp::seeded().await?;
    let ada = app.ada();

    for month in [json!(0), json!(13), json!("october")] {
        let (status, body) = app.post("/api/v1/attendance-entries", &ada, entry(month, ADA_MONDAY_EARLY, STUDENT_SAM)).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["param"], "month");
    }

    let (status, created) = app.post("/api/v1/attendance-entries", &ada, entry(json!("10"), ADA_MONDAY_EARLY, STUDENT_SAM)).await?;
    assert_eq!(status, StatusCode::OK, "{}", created);
    assert_eq!(created["month"], 10);
    assert!(created["has_attended"].is_null());
    assert_eq!(created["school_year"], common::school_year());
    Ok(())
}

#[tokio::test]
async fn attendance_entry_may_be_cleared_but_list_may_not() -> Result<()> {
    let app = TestApp::seeded().await?;
    let ada = app.ada();

    let mut body = entry(json!(10), ADA_MONDAY_EARLY, STUDENT_SAM);
    body["hasAttended"] = json!(true);
    let (_, created) = app.post("/api/v1/attendance-entries", &ada, body).await?;
    let uri = format!("/api/v1/attendance-entries/{}", created["id"]);
    let (status, cleared) = app.put(&uri, &ada, json!({ "hasAttended": null })).await?;
    assert_eq!(status, StatusCode::OK, "{}", cleared);
    assert!(cleared["has_attended"].is_null());

    let list = json!({ "date": "2024-10-07", "studentId": STUDENT_SAM, "classId": ADA_MONDAY_EARLY });
    let (status, body) = app.post("/api/v1/attendance-lists", &ada, list.clone()).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["param"], "hasAttended");

    let mut list = list;
    list["hasAttended"] = json!("false");
    let (status, created) = app.post("/api/v1/attendance-lists", &ada, list).await?;
    assert_eq!(status, StatusCode::OK, "{}", created);
    assert_eq!(created["has_attended"], false);

    let uri = format!("/api/v1/attendance-lists/{}", created["id"]);
    let (status, body) = app.put(&uri, &ada, json!({ "hasAttended": null })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["param"], "hasAttended");
    Ok(())
}

#[tokio::test]
async fn class_ownership_is_resolved_on_create() -> Result<()> {
    let app = TestApp::seeded().await?;
    let ada = app.ada();

    let (status, _) = app.post("/api/v1/attendance-entries", &ada, entry(json!(10), BOB_TUESDAY, STUDENT_TIA)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.post("/api/v1/attendance-entries", &ada, entry(json!(10), 99, STUDENT_SAM)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["param"], "classId");

    let (status, _) = app.post("/api/v1/attendance-entries", &app.bob(), entry(json!(10), BOB_TUESDAY, STUDENT_TIA)).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.post("/api/v1/attendance-entries", &app.sam(), entry(json!(10), ADA_MONDAY_EARLY, STUDENT_SAM)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn attendance_reads_follow_role_scope() -> Result<()> {
    let app = TestApp::seeded().await?;
    let (_, sam_row) = app.post("/api/v1/attendance-entries", &app.ada(), entry(json!(9), ADA_MONDAY_EARLY, STUDENT_SAM)).await?;
    let (_, tia_row) = app.post("/api/v1/attendance-entries", &app.bob(), entry(json!(10), BOB_TUESDAY, STUDENT_TIA)).await?;
    let (sam_id, tia_id) = (sam_row["id"].as_i64().unwrap_or_default(), tia_row["id"].as_i64().unwrap_or_default());

    let (_, rows) = app.get("/api/v1/attendance-entries", &app.ada()).await?;
    assert_eq!(ids(&rows), vec![sam_id]);

    let (_, rows) = app.get("/api/v1/attendance-entries", &app.tia()).await?;
    assert_eq!(ids(&rows), vec![tia_id]);

    let (_, rows) = app.get("/api/v1/attendance-entries?month=10", &app.admin()).await?;
    assert_eq!(ids(&rows), vec![tia_id]);

    let (status, _) = app.get(&format!("/api/v1/attendance-entries/{}", tia_id), &app.ada()).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn weekly_notes_stay_with_the_class_teacher() -> Result<()> {
    let app = TestApp::seeded().await?;
    let ada = app.ada();

    let note = json!({ "note": "Great progress", "studentId": STUDENT_SAM, "classId": ADA_MONDAY_EARLY });
    let (status, created) = app.post("/api/v1/weekly-notes", &ada, note).await?;
    assert_eq!(status, StatusCode::OK, "{}", created);
    let uri = format!("/api/v1/weekly-notes/{}", created["id"]);

    let (status, fetched) = app.get(&uri, &app.sam()).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["note"], "Great progress");

    let (_, rows) = app.get(&format!("/api/v1/weekly-notes?user={}", STUDENT_SAM), &app.tia()).await?;
    assert!(ids(&rows).is_empty());

    let (status, _) = app.get(&uri, &app.bob()).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.put(&uri, &ada, json!({ "classId": BOB_TUESDAY })).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, patched) = app.put(&uri, &ada, json!({ "note": "Keep it up" })).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["note"], "Keep it up");
    assert_eq!(patched["class_id"], ADA_MONDAY_EARLY);

    let (status, _) = app.delete(&uri, &app.sam()).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = app.delete(&uri, &ada).await?;
    assert_eq!(body["rowsDeleted"], 1);
    Ok(())
}
