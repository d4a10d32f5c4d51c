mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use common::{TestApp, PASSWORD, STUDENT_SAM};
use school_api::auth::{Claims, ClaimsUser};

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let app = TestApp::seeded().await?;
    let (status, body) = app.send("GET", "/health", None, None).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "memory");
    Ok(())
}

#[tokio::test]
async fn login_issues_token_for_valid_credentials() -> Result<()> {
    let app = TestApp::seeded().await?;
    let (status, body) = app
        .send("POST", "/api/v1/auth", None, Some(json!({ "email": "sam@school.test", "password": PASSWORD })))
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let token = body["token"].as_str().expect("token in response");
    let identity = app.tokens.resolve(token)?;
    assert_eq!(identity.user_id, STUDENT_SAM);
    assert_eq!(identity.role.as_str(), "student");

    let (status, me) = app.get("/api/v1/auth", token).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "sam@school.test");
    assert!(me.get("password").is_none());
    Ok(())
}

#[tokio::test]
async fn login_rejects_wrong_password_and_unknown_email_alike() -> Result<()> {
    let app = TestApp::seeded().await?;

    let (wrong_status, wrong_body) = app
        .send("POST", "/api/v1/auth", None, Some(json!({ "email": "sam@school.test", "password": "not-it" })))
        .await?;
    let (unknown_status, unknown_body) = app
        .send("POST", "/api/v1/auth", None, Some(json!({ "email": "nobody@school.test", "password": PASSWORD })))
        .await?;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);
    assert_eq!(wrong_body["code"], "UNAUTHENTICATED");
    Ok(())
}

#[tokio::test]
async fn login_validates_body() -> Result<()> {
    let app = TestApp::seeded().await?;
    let (status, body) = app.send("POST", "/api/v1/auth", None, Some(json!({}))).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    let params: Vec<_> = body["errors"].as_array().unwrap().iter().map(|e| e["param"].clone()).collect();
    assert_eq!(params, vec![json!("email"), json!("password")]);
    Ok(())
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() -> Result<()> {
    let app = TestApp::seeded().await?;

    let (status, body) = app.send("GET", "/api/v1/subjects", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["msg"], "Authentication required");

    let (status, _) = app.get("/api/v1/subjects", "not-a-jwt").await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let forged = school_api::auth::TokenService::new("some-other-secret", 1)
        .sign(STUDENT_SAM, school_api::auth::Role::Admin)?;
    let (status, _) = app.get("/api/v1/subjects", &forged).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn token_without_role_is_rejected() -> Result<()> {
    let app = TestApp::seeded().await?;
    let mut claims = Claims::new(STUDENT_SAM, school_api::auth::Role::Student, chrono::Duration::hours(1));
    claims.user = ClaimsUser { id: STUDENT_SAM, role: None };
    let token = app.tokens.sign_claims(&claims)?;

    let (status, _) = app.get("/api/v1/subjects", &token).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn unrecognized_role_is_denied_everything() -> Result<()> {
    let app = TestApp::seeded().await?;
    let token = app.token(STUDENT_SAM, school_api::auth::Role::parse("janitor"));

    let (status, body) = app.get("/api/v1/subjects", &token).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "UNAUTHORIZED");
    Ok(())
}

#[tokio::test]
async fn audit_log_records_authenticated_requests() -> Result<()> {
    let app = TestApp::seeded_with_audit().await?;
    let long_name = "x".repeat(400);
    let (status, _) = app.post("/api/v1/subjects", &app.admin(), json!({ "name": long_name })).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.send("GET", "/api/v1/subjects", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/api/v1/bills?user=4", &app.sam()).await?;
    assert_eq!(status, StatusCode::OK);

    let logs = app.store.logs().await;
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].user_id, common::ADMIN);
    assert_eq!(logs[0].method, "POST");
    assert_eq!(logs[0].requested_url, "/api/v1/subjects");
    assert_eq!(logs[0].ip_address, "unknown");
    assert_eq!(logs[0].body.chars().count(), 255);
    assert_eq!(logs[1].user_id, common::STUDENT_SAM);
    assert_eq!(logs[1].requested_url, "/api/v1/bills?user=4");
    assert_eq!(logs[1].body, "");
    Ok(())
}
