// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use serde_json::{json, Value};

use crate::auth::password::PasswordError;
use crate::auth::AuthError;
use crate::database::StoreError;
use crate::filter::FilterError;
use crate::policy::PolicyError;
use crate::services::schedule_service::ScheduleError;

/// One violated field rule, reported back to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub param: String,
    pub msg: String,
    pub location: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl FieldError {
    pub fn body(param: impl Into<String>, msg: impl Into<String>, value: Option<Value>) -> Self {
        Self { param: param.into(), msg: msg.into(), location: "body", value }
    }

    pub fn query(param: impl Into<String>, msg: impl Into<String>, value: Option<Value>) -> Self {
        Self { param: param.into(), msg: msg.into(), location: "query", value }
    }

    pub fn params(param: impl Into<String>, msg: impl Into<String>, value: Option<Value>) -> Self {
        Self { param: param.into(), msg: msg.into(), location: "params", value }
    }
}

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    ValidationError {
        message: String,
        errors: Vec<FieldError>,
    },

    // 401 Unauthorized
    Unauthenticated(String),

    // 403 Forbidden
    Unauthorized(String),

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error
    ServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::ValidationError { .. } => 400,
            ApiError::Unauthenticated(_) => 401,
            ApiError::Unauthorized(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::ServerError(_) => 500,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::ValidationError { message, .. } => message,
            ApiError::Unauthenticated(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::ServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::Unauthenticated(_) => "UNAUTHENTICATED",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::ServerError(_) => "SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "msg": self.message(),
            "code": self.error_code(),
        });
        if let ApiError::ValidationError { errors, .. } = self {
            body["errors"] = json!(errors);
        }
        body
    }
}

// Static constructor methods
impl ApiError {
    pub fn validation(errors: Vec<FieldError>) -> Self {
        ApiError::ValidationError {
            message: "Validation failed".to_string(),
            errors,
        }
    }

    pub fn validation_error(message: impl Into<String>, errors: Vec<FieldError>) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            errors,
        }
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        ApiError::Unauthenticated(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        ApiError::ServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Convert layer errors to ApiError
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenGeneration(detail) => {
                tracing::error!("Token generation failed: {}", detail);
                ApiError::server_error("An error occurred while processing your request")
            }
            other => {
                tracing::debug!("Authentication rejected: {}", other);
                ApiError::unauthenticated("Authentication required")
            }
        }
    }
}

impl From<PolicyError> for ApiError {
    fn from(err: PolicyError) -> Self {
        tracing::warn!("{}", err);
        ApiError::unauthorized("You are not allowed to perform this action")
    }
}

impl From<FilterError> for ApiError {
    fn from(err: FilterError) -> Self {
        match err {
            FilterError::InvalidValue { param, value, expected } => ApiError::validation(vec![
                FieldError::query(param, format!("must be {}", expected), Some(Value::String(value))),
            ]),
            FilterError::ScopeDenied => {
                tracing::warn!("Query built against a denied scope");
                ApiError::unauthorized("You are not allowed to perform this action")
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => ApiError::not_found(msg),
            StoreError::Conflict { field: "id", message } => {
                ApiError::validation_error(message.clone(), vec![FieldError::params("id", message, None)])
            }
            StoreError::Conflict { field, message } => {
                ApiError::validation_error(message.clone(), vec![FieldError::body(request_key(field), message, None)])
            }
            StoreError::Connection(msg) => {
                tracing::error!("Store connection error: {}", msg);
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            StoreError::Query(msg) => {
                // Don't expose internal SQL errors to clients
                tracing::error!("Store query error: {}", msg);
                ApiError::server_error("An error occurred while processing your request")
            }
            StoreError::Decode(msg) => {
                tracing::error!("Store decode error: {}", msg);
                ApiError::server_error("Failed to format response")
            }
        }
    }
}

/// Request body key for a column name (`class_id` -> `classId`).
fn request_key(column: &str) -> String {
    let mut key = String::with_capacity(column.len());
    let mut upper = false;
    for c in column.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            key.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            key.push(c);
        }
    }
    key
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        tracing::error!("{}", err);
        ApiError::server_error("An error occurred while processing your request")
    }
}

impl From<ScheduleError> for ApiError {
    fn from(err: ScheduleError) -> Self {
        match err {
            ScheduleError::UnsupportedRole(role) => {
                ApiError::not_found(format!("No action defined for user role '{}'", role))
            }
            ScheduleError::Policy(e) => e.into(),
            ScheduleError::Filter(e) => e.into(),
            ScheduleError::Store(e) => e.into(),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON serialization error: {}", err);
        ApiError::server_error("Failed to format response")
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}
