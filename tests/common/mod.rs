#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::Local;
use serde_json::{json, Value};
use tower::ServiceExt;

use school_api::app::{build_router, AppState};
use school_api::auth::{password, Role, TokenService};
use school_api::database::{MemoryStore, Record, SchoolStore, Table};
use school_api::services::school_year::current_school_year;

pub const SECRET: &str = "integration-test-secret";
pub const PASSWORD: &str = "correct-horse";

pub const ADMIN: i64 = 1;
pub const TEACHER_ADA: i64 = 2;
pub const TEACHER_BOB: i64 = 3;
pub const STUDENT_SAM: i64 = 4;
pub const STUDENT_TIA: i64 = 5;

/// Ada teaches classes 1-3 (two on Monday, one on Friday), Bob teaches class 4.
pub const ADA_MONDAY_EARLY: i64 = 1;
pub const ADA_MONDAY_LATE: i64 = 2;
pub const ADA_FRIDAY: i64 = 3;
pub const BOB_TUESDAY: i64 = 4;

/// Bill 1 and grade 1 belong to Sam, bill 2 and grade 2 to Tia.
pub const SAM_BILL: i64 = 1;
pub const TIA_BILL: i64 = 2;
pub const SAM_GRADE: i64 = 1;
pub const TIA_GRADE: i64 = 2;

/// Router plus direct handles on its store and token service.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub tokens: TokenService,
}

impl TestApp {
    pub async fn seeded() -> Result<Self> {
        Self::build(false).await
    }

    pub async fn seeded_with_audit() -> Result<Self> {
        Self::build(true).await
    }

    async fn build(audit_logging: bool) -> Result<Self> {
        let store = Arc::new(MemoryStore::new());
        seed(store.as_ref()).await?;

        let tokens = TokenService::new(SECRET, 1);
        let state = AppState::new(store.clone(), tokens.clone()).with_audit_logging(audit_logging);
        Ok(Self { router: build_router(state), store, tokens })
    }

    pub fn token(&self, user_id: i64, role: Role) -> String {
        self.tokens.sign(user_id, role).expect("sign test token")
    }

    pub fn admin(&self) -> String {
        self.token(ADMIN, Role::Admin)
    }

    pub fn ada(&self) -> String {
        self.token(TEACHER_ADA, Role::Teacher)
    }

    pub fn bob(&self) -> String {
        self.token(TEACHER_BOB, Role::Teacher)
    }

    pub fn sam(&self) -> String {
        self.token(STUDENT_SAM, Role::Student)
    }

    pub fn tia(&self) -> String {
        self.token(STUDENT_TIA, Role::Student)
    }

    /// Send one request through the router and decode the JSON response.
    pub async fn send(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await.context("router call failed")?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes)? };
        Ok((status, value))
    }

    pub async fn get(&self, uri: &str, token: &str) -> Result<(StatusCode, Value)> {
        self.send("GET", uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.send("POST", uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.send("PUT", uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> Result<(StatusCode, Value)> {
        self.send("DELETE", uri, Some(token), None).await
    }
}

pub fn school_year() -> String {
    current_school_year(Local::now().date_naive())
}

fn record(value: Value) -> Record {
    value.as_object().cloned().unwrap_or_default()
}

fn user(first: &str, last: &str, email: &str, digest: &str, role_id: i64) -> Record {
    record(json!({
        "first_name": first, "last_name": last, "email": email, "password": digest,
        "role_id": role_id, "birth_date": "2000-01-01", "image": "",
        "region": "North", "city": "Springfield", "zip": "12345", "street": "1 School Lane"
    }))
}

async fn seed(store: &MemoryStore) -> Result<()> {
    let digest = password::hash(PASSWORD)?;
    let year = school_year();

    for row in [
        user("Grace", "Admin", "admin@school.test", &digest, 1),
        user("Ada", "Lovelace", "ada@school.test", &digest, 2),
        user("Bob", "Builder", "bob@school.test", &digest, 2),
        user("Sam", "Student", "sam@school.test", &digest, 3),
        user("Tia", "Student", "tia@school.test", &digest, 3),
    ] {
        store.create(Table::Users, row).await?;
    }

    store.create(Table::Subjects, record(json!({ "name": "Mathematics" }))).await?;

    for (name, teacher, weekday, start, end) in [
        ("Math 1A", TEACHER_ADA, "MONDAY", "08:00:00", "08:45:00"),
        ("Math 1B", TEACHER_ADA, "MONDAY", "10:00:00", "10:45:00"),
        ("Math 1C", TEACHER_ADA, "FRIDAY", "09:00:00", "09:45:00"),
        ("Physics", TEACHER_BOB, "TUESDAY", "11:00:00", "11:45:00"),
    ] {
        store
            .create(
                Table::Classes,
                record(json!({
                    "name": name, "subject_id": 1, "teacher_id": teacher, "school_year": year,
                    "weekday": weekday, "start_time": start, "end_time": end
                })),
            )
            .await?;
    }

    store.enroll(STUDENT_SAM, ADA_MONDAY_EARLY).await?;
    store.enroll(STUDENT_SAM, ADA_FRIDAY).await?;
    store.enroll(STUDENT_TIA, BOB_TUESDAY).await?;

    for (student, amount) in [(STUDENT_SAM, 120.0), (STUDENT_TIA, 80.0)] {
        store
            .create(
                Table::Bills,
                record(json!({
                    "billing_reason": "Field trip", "amount": amount, "is_paid": false,
                    "issue_date": "2024-09-15", "due_date": null, "payment_date": null,
                    "school_year": year, "student_id": student
                })),
            )
            .await?;
    }

    for (student, class) in [(STUDENT_SAM, ADA_MONDAY_EARLY), (STUDENT_TIA, BOB_TUESDAY)] {
        store
            .create(
                Table::Grades,
                record(json!({
                    "grade": 4, "nth_grade": 1, "school_year": year, "student_id": student, "class_id": class
                })),
            )
            .await?;
    }

    Ok(())
}

pub fn ids(rows: &Value) -> Vec<i64> {
    rows.as_array()
        .map(|rows| rows.iter().filter_map(|row| row["id"].as_i64()).collect())
        .unwrap_or_default()
}
