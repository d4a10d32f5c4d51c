//! Extractors whose rejections use the API error body.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
    Json,
};
use serde_json::Value;

use crate::error::{ApiError, FieldError};

/// Numeric `:id` path segment.
#[derive(Debug, Clone, Copy)]
pub struct RecordId(pub i64);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RecordId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::validation(vec![FieldError::params("id", e.body_text(), None)]))?;
        parse_id("id", &raw).map(RecordId)
    }
}

/// `/:id/students/:student_id` path pair.
#[derive(Debug, Clone, Copy)]
pub struct EnrollmentPath {
    pub class_id: i64,
    pub student_id: i64,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for EnrollmentPath {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path((class_id, student_id)) = Path::<(String, String)>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::validation(vec![FieldError::params("id", e.body_text(), None)]))?;
        Ok(Self {
            class_id: parse_id("id", &class_id)?,
            student_id: parse_id("studentId", &student_id)?,
        })
    }
}

fn parse_id(param: &str, raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>().map_err(|_| {
        ApiError::validation(vec![FieldError::params(
            param,
            format!("{} must be an integer", param),
            Some(Value::String(raw.to_string())),
        )])
    })
}

/// JSON request body, reported as a validation error when it does not parse.
#[derive(Debug, Clone)]
pub struct JsonBody(pub Value);

#[async_trait]
impl<S: Send + Sync> FromRequest<S> for JsonBody {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<Value>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    ApiError::validation_error(
        "Invalid JSON body",
        vec![FieldError::body("body", rejection.body_text(), None)],
    )
}
