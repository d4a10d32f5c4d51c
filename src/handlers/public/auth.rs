// handlers/public/auth.rs - POST /auth handler

use axum::{extract::State, Json};
use chrono::Local;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::{password, Role};
use crate::database::Table;
use crate::error::ApiError;
use crate::filter::{Predicate, PredicateSet};
use crate::handlers::extract::JsonBody;
use crate::handlers::validation::{validate_create, FieldSpec, Rule};

const CREDENTIALS: &[FieldSpec] = &[
    FieldSpec::required("email", "email", Rule::Email),
    FieldSpec::required("password", "password", Rule::Password),
];

/// POST /auth - exchange email and password for a session token
///
/// Expected Input:
/// ```json
/// { "email": "teacher@school.test", "password": "secret" }
/// ```
///
/// Expected Output:
/// ```json
/// { "token": "eyJhbGciOiJIUzI1NiI..." }
/// ```
///
/// Unknown emails and wrong passwords get the same 401.
pub async fn login(State(state): State<AppState>, JsonBody(body): JsonBody) -> Result<Json<Value>, ApiError> {
    let credentials =
        validate_create(CREDENTIALS, &body, Local::now().date_naive()).map_err(ApiError::validation)?;
    let email = credentials.get("email").cloned().unwrap_or(Value::Null);
    let plaintext = credentials.get("password").and_then(Value::as_str).unwrap_or_default();

    let by_email = PredicateSet::empty().and(Predicate::eq("email", email));
    let Some(user) = state.store.find_one(Table::Users, &by_email).await? else {
        tracing::debug!("Login attempt for unknown email");
        return Err(ApiError::unauthenticated("Invalid credentials"));
    };

    let digest = user.get("password").and_then(Value::as_str).unwrap_or_default();
    if !password::verify(plaintext, digest) {
        tracing::debug!("Login attempt with wrong password");
        return Err(ApiError::unauthenticated("Invalid credentials"));
    }

    let user_id = user
        .get("id")
        .and_then(Value::as_i64)
        .ok_or_else(|| ApiError::server_error("An error occurred while processing your request"))?;
    let role = state
        .store
        .user_role(user_id)
        .await?
        .ok_or_else(|| ApiError::unauthenticated("Invalid credentials"))?;

    let token = state.tokens.sign(user_id, Role::parse(&role))?;
    tracing::info!("User {} logged in as {}", user_id, role);
    Ok(Json(json!({ "token": token })))
}
