//! Generic CRUD handlers shared by every school resource.
//!
//! Each request runs the same pipeline: role policy → filter builder →
//! store → response shaping. Per-resource differences (fields, ownership,
//! response model) live in the `Resource` impls below.

use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::Local;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::{password, Identity};
use crate::database::models::{AttendanceEntry, AttendanceList, Bill, Class, Grade, Subject, User, WeeklyNote};
use crate::database::{Record, Table};
use crate::error::{ApiError, FieldError};
use crate::filter::{self, Predicate, PredicateSet};
use crate::handlers::extract::{JsonBody, RecordId};
use crate::handlers::validation::{validate_create, validate_patch, Fallback, FieldSpec, Rule};
use crate::policy::{self, Scope};
use crate::types::{Operation, ResourceType};

/// How the teacher owning a row is found.
#[derive(Debug, Clone, Copy)]
pub enum Ownership {
    /// Not owned by a teacher.
    None,
    /// The row names its teacher directly.
    Teacher { column: &'static str, key: &'static str },
    /// The row belongs to a class; the class teacher owns it.
    Class { column: &'static str, key: &'static str },
}

pub trait Resource: Serialize + DeserializeOwned + Send + 'static {
    const KIND: ResourceType;
    const FIELDS: &'static [FieldSpec];
    const OWNERSHIP: Ownership;

    fn table() -> Table {
        Table::for_resource(Self::KIND)
    }

    /// Runs on validated create and patch records before they are stored.
    fn prepare(record: Record) -> Result<Record, ApiError> {
        Ok(record)
    }
}

use Fallback::{CurrentSchoolYear, EmptyText, False, Nullable, Today};

impl Resource for User {
    const KIND: ResourceType = ResourceType::User;
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("firstName", "first_name", Rule::Text),
        FieldSpec::required("lastName", "last_name", Rule::Text),
        FieldSpec::required("email", "email", Rule::Email),
        FieldSpec::required("password", "password", Rule::Password),
        FieldSpec::required("roleId", "role_id", Rule::Integer),
        FieldSpec::required("birthDate", "birth_date", Rule::Date),
        FieldSpec::with_fallback("image", "image", Rule::Text, EmptyText),
        FieldSpec::required("region", "region", Rule::Text),
        FieldSpec::required("city", "city", Rule::Text),
        FieldSpec::required("zipCode", "zip", Rule::Text),
        FieldSpec::required("streetAddress", "street", Rule::Text),
    ];
    const OWNERSHIP: Ownership = Ownership::None;

    fn prepare(mut record: Record) -> Result<Record, ApiError> {
        let digest = match record.get("password") {
            Some(Value::String(plaintext)) => Some(password::hash(plaintext)?),
            _ => None,
        };
        if let Some(digest) = digest {
            record.insert("password".to_string(), Value::String(digest));
        }
        Ok(record)
    }
}

impl Resource for Subject {
    const KIND: ResourceType = ResourceType::Subject;
    const FIELDS: &'static [FieldSpec] = &[FieldSpec::required("name", "name", Rule::Text)];
    const OWNERSHIP: Ownership = Ownership::None;
}

impl Resource for Class {
    const KIND: ResourceType = ResourceType::Class;
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("name", "name", Rule::Text),
        FieldSpec::required("subjectId", "subject_id", Rule::Integer),
        FieldSpec::required("teacherId", "teacher_id", Rule::Integer),
        FieldSpec::with_fallback("schoolYear", "school_year", Rule::SchoolYear, CurrentSchoolYear),
        FieldSpec::required("weekday", "weekday", Rule::Weekday),
        FieldSpec::required("startTime", "start_time", Rule::Time),
        FieldSpec::required("endTime", "end_time", Rule::Time),
    ];
    const OWNERSHIP: Ownership = Ownership::Teacher { column: "teacher_id", key: "teacherId" };
}

impl Resource for Grade {
    const KIND: ResourceType = ResourceType::Grade;
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("grade", "grade", Rule::Integer),
        FieldSpec::required("nthGrade", "nth_grade", Rule::Integer),
        FieldSpec::with_fallback("schoolYear", "school_year", Rule::SchoolYear, CurrentSchoolYear),
        FieldSpec::required("studentId", "student_id", Rule::Integer),
        FieldSpec::required("classId", "class_id", Rule::Integer),
    ];
    const OWNERSHIP: Ownership = Ownership::Class { column: "class_id", key: "classId" };
}

impl Resource for Bill {
    const KIND: ResourceType = ResourceType::Bill;
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("billingReason", "billing_reason", Rule::Text),
        FieldSpec::required("amount", "amount", Rule::Number),
        FieldSpec::with_fallback("isPaid", "is_paid", Rule::Bool, False),
        FieldSpec::with_fallback("issueDate", "issue_date", Rule::Date, Today),
        FieldSpec::with_fallback("dueDate", "due_date", Rule::Date, Nullable),
        FieldSpec::with_fallback("paymentDate", "payment_date", Rule::Date, Nullable),
        FieldSpec::with_fallback("schoolYear", "school_year", Rule::SchoolYear, CurrentSchoolYear),
        FieldSpec::required("studentId", "student_id", Rule::Integer),
    ];
    const OWNERSHIP: Ownership = Ownership::None;
}

impl Resource for AttendanceEntry {
    const KIND: ResourceType = ResourceType::AttendanceEntry;
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("date", "date", Rule::Date),
        FieldSpec::with_fallback("schoolYear", "school_year", Rule::SchoolYear, CurrentSchoolYear),
        FieldSpec::required("month", "month", Rule::Month),
        FieldSpec::with_fallback("hasAttended", "has_attended", Rule::Bool, Nullable),
        FieldSpec::required("studentId", "student_id", Rule::Integer),
        FieldSpec::required("classId", "class_id", Rule::Integer),
    ];
    const OWNERSHIP: Ownership = Ownership::Class { column: "class_id", key: "classId" };
}

impl Resource for AttendanceList {
    const KIND: ResourceType = ResourceType::AttendanceList;
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("date", "date", Rule::Date),
        FieldSpec::required("hasAttended", "has_attended", Rule::Bool),
        FieldSpec::required("studentId", "student_id", Rule::Integer),
        FieldSpec::required("classId", "class_id", Rule::Integer),
    ];
    const OWNERSHIP: Ownership = Ownership::Class { column: "class_id", key: "classId" };
}

impl Resource for WeeklyNote {
    const KIND: ResourceType = ResourceType::WeeklyNote;
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("note", "note", Rule::Text),
        FieldSpec::with_fallback("schoolYear", "school_year", Rule::SchoolYear, CurrentSchoolYear),
        FieldSpec::required("studentId", "student_id", Rule::Integer),
        FieldSpec::required("classId", "class_id", Rule::Integer),
    ];
    const OWNERSHIP: Ownership = Ownership::Class { column: "class_id", key: "classId" };
}

/// Predicates selecting one row by id within a scope.
pub fn visible_by_id(resource: ResourceType, scope: Scope, id: i64) -> Result<PredicateSet, ApiError> {
    let scoped = filter::scope_predicates(resource, scope)?;
    Ok(PredicateSet::from(scoped).and(Predicate::eq("id", id)))
}

/// Serialize a stored row through the resource model, dropping columns the
/// model does not expose.
fn shape<R: Resource>(record: Record) -> Result<Value, ApiError> {
    let model: R = serde_json::from_value(Value::Object(record))?;
    Ok(serde_json::to_value(model)?)
}

/// Teacher owning `record`, when the record says. A referenced class that
/// does not exist is reported against the request key.
async fn resolve_owner<R: Resource>(state: &AppState, record: &Record) -> Result<Option<i64>, ApiError> {
    match R::OWNERSHIP {
        Ownership::None => Ok(None),
        Ownership::Teacher { column, .. } => Ok(record.get(column).and_then(Value::as_i64)),
        Ownership::Class { column, key } => {
            let Some(class_id) = record.get(column).and_then(Value::as_i64) else {
                return Ok(None);
            };
            let by_id = PredicateSet::empty().and(Predicate::eq("id", class_id));
            match state.store.find_one(Table::Classes, &by_id).await? {
                Some(class) => Ok(class.get("teacher_id").and_then(Value::as_i64)),
                None => Err(ApiError::validation(vec![FieldError::body(
                    key,
                    format!("class {} does not exist", class_id),
                    Some(Value::from(class_id)),
                )])),
            }
        }
    }
}

fn ownership_column(ownership: Ownership) -> Option<&'static str> {
    match ownership {
        Ownership::None => None,
        Ownership::Teacher { column, .. } | Ownership::Class { column, .. } => Some(column),
    }
}

/// GET /<resource> - list rows visible to the requester, narrowed by query filters
pub async fn list<R: Resource>(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let scope = policy::require(&identity, R::KIND, Operation::Read, None)?;
    let predicates = filter::build(R::KIND, &params, scope)?;
    let rows = state.store.find_all(R::table(), &predicates).await?;
    let shaped = rows.into_iter().map(shape::<R>).collect::<Result<Vec<_>, _>>()?;
    Ok(Json(shaped))
}

/// GET /<resource>/:id - show one row if visible
pub async fn show<R: Resource>(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    RecordId(id): RecordId,
) -> Result<Json<Value>, ApiError> {
    let scope = policy::require(&identity, R::KIND, Operation::Read, None)?;
    let predicates = visible_by_id(R::KIND, scope, id)?;
    match state.store.find_one(R::table(), &predicates).await? {
        Some(row) => Ok(Json(shape::<R>(row)?)),
        None => Err(ApiError::not_found("Resource not found")),
    }
}

/// POST /<resource> - validate, authorize against the owner, then create
pub async fn create<R: Resource>(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    JsonBody(body): JsonBody,
) -> Result<Json<Value>, ApiError> {
    // Denied roles fail before the body is looked at.
    policy::require(&identity, R::KIND, Operation::Create, None)?;

    let record = validate_create(R::FIELDS, &body, Local::now().date_naive()).map_err(ApiError::validation)?;
    let owner = resolve_owner::<R>(&state, &record).await?;
    policy::require(&identity, R::KIND, Operation::Create, owner)?;

    let created = state.store.create(R::table(), R::prepare(record)?).await?;
    let created_id = created.get("id").cloned().unwrap_or_default();
    tracing::info!("{} {} created {} {}", identity.role, identity.user_id, R::KIND, created_id);
    Ok(Json(shape::<R>(created)?))
}

/// PUT /<resource>/:id - sparse patch of a visible row
pub async fn update<R: Resource>(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    RecordId(id): RecordId,
    JsonBody(body): JsonBody,
) -> Result<Json<Value>, ApiError> {
    let scope = policy::require(&identity, R::KIND, Operation::Update, None)?;
    let patch = validate_patch(R::FIELDS, &body).map_err(ApiError::validation)?;

    let existing = state
        .store
        .find_one(R::table(), &visible_by_id(R::KIND, scope, id)?)
        .await?
        .ok_or_else(|| ApiError::not_found("Resource not found"))?;

    if ownership_column(R::OWNERSHIP).map_or(false, |column| patch.contains_key(column)) {
        let owner = resolve_owner::<R>(&state, &patch).await?;
        policy::require(&identity, R::KIND, Operation::Update, owner)?;
    }

    if patch.is_empty() {
        return Ok(Json(shape::<R>(existing)?));
    }

    let affected = state.store.update(R::table(), id, R::prepare(patch)?).await?;
    if affected == 0 {
        return Err(ApiError::not_found("Resource not found"));
    }

    let by_id = PredicateSet::empty().and(Predicate::eq("id", id));
    let refreshed = state
        .store
        .find_one(R::table(), &by_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Resource not found"))?;
    Ok(Json(shape::<R>(refreshed)?))
}

/// DELETE /<resource>/:id - idempotent; rows outside the scope count as missing
pub async fn remove<R: Resource>(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    RecordId(id): RecordId,
) -> Result<Json<Value>, ApiError> {
    let scope = policy::require(&identity, R::KIND, Operation::Delete, None)?;

    let visible = state.store.find_one(R::table(), &visible_by_id(R::KIND, scope, id)?).await?;
    let rows_deleted = match visible {
        Some(_) => state.store.destroy(R::table(), id).await?,
        None => 0,
    };
    Ok(Json(json!({ "msg": "request completed", "rowsDeleted": rows_deleted })))
}
