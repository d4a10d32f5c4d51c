// handlers/protected/enrollment.rs - class roster membership

use axum::{extract::State, Extension, Json};
use chrono::Local;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::{Identity, Role};
use crate::database::Table;
use crate::error::{ApiError, FieldError};
use crate::handlers::extract::{EnrollmentPath, JsonBody, RecordId};
use crate::handlers::protected::resource::visible_by_id;
use crate::handlers::validation::{validate_create, FieldSpec, Rule};
use crate::policy;
use crate::types::{Operation, ResourceType};

const ENROLLMENT_FIELDS: &[FieldSpec] = &[FieldSpec::required("studentId", "student_id", Rule::Integer)];

/// Class must be writable by the requester and visible in their scope.
async fn writable_class(state: &AppState, identity: &Identity, class_id: i64) -> Result<(), ApiError> {
    let scope = policy::require(identity, ResourceType::Class, Operation::Update, None)?;
    let predicates = visible_by_id(ResourceType::Class, scope, class_id)?;
    match state.store.find_one(Table::Classes, &predicates).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::not_found("Class not found")),
    }
}

/// POST /classes/:id/students - enroll a student; repeating it is a no-op
pub async fn enroll(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    RecordId(class_id): RecordId,
    JsonBody(body): JsonBody,
) -> Result<Json<Value>, ApiError> {
    writable_class(&state, &identity, class_id).await?;

    let record = validate_create(ENROLLMENT_FIELDS, &body, Local::now().date_naive()).map_err(ApiError::validation)?;
    let student_id = record.get("student_id").and_then(Value::as_i64).unwrap_or_default();

    let role = state.store.user_role(student_id).await?;
    if role.as_deref().map(Role::parse) != Some(Role::Student) {
        return Err(ApiError::validation(vec![FieldError::body(
            "studentId",
            format!("user {} is not a student", student_id),
            Some(Value::from(student_id)),
        )]));
    }

    let enrolled = state.store.enroll(student_id, class_id).await?;
    Ok(Json(json!({ "msg": "request completed", "enrolled": enrolled })))
}

/// DELETE /classes/:id/students/:student_id - remove a student from the roster
pub async fn unenroll(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    path: EnrollmentPath,
) -> Result<Json<Value>, ApiError> {
    writable_class(&state, &identity, path.class_id).await?;
    let rows_deleted = state.store.unenroll(path.student_id, path.class_id).await?;
    Ok(Json(json!({ "msg": "request completed", "rowsDeleted": rows_deleted })))
}
