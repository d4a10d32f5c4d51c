//! Request body validation and camelCase → column mapping.

use chrono::{NaiveDate, NaiveTime};
use serde_json::{Number, Value};

use crate::database::Record;
use crate::error::FieldError;
use crate::services::school_year::{current_school_year, is_school_year};

const WEEKDAYS: [&str; 7] = ["MONDAY", "TUESDAY", "WEDNESDAY", "THURSDAY", "FRIDAY", "SATURDAY", "SUNDAY"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Text,
    Email,
    /// Plaintext, at least six characters. Hashed before it is stored.
    Password,
    Integer,
    Number,
    Bool,
    Date,
    Time,
    SchoolYear,
    Weekday,
    Month,
}

/// What happens when a field is missing from a create body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    Required,
    /// Stored as NULL.
    Nullable,
    CurrentSchoolYear,
    Today,
    False,
    EmptyText,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub key: &'static str,
    pub column: &'static str,
    pub rule: Rule,
    pub fallback: Fallback,
}

impl FieldSpec {
    pub const fn required(key: &'static str, column: &'static str, rule: Rule) -> Self {
        Self { key, column, rule, fallback: Fallback::Required }
    }

    pub const fn with_fallback(key: &'static str, column: &'static str, rule: Rule, fallback: Fallback) -> Self {
        Self { key, column, rule, fallback }
    }
}

fn body_object(body: &Value) -> Result<&serde_json::Map<String, Value>, Vec<FieldError>> {
    body.as_object()
        .ok_or_else(|| vec![FieldError::body("body", "request body must be a JSON object", None)])
}

/// Validate a full create body, applying fallbacks. Every violation is collected.
pub fn validate_create(fields: &[FieldSpec], body: &Value, today: NaiveDate) -> Result<Record, Vec<FieldError>> {
    let object = body_object(body)?;
    let mut record = Record::new();
    let mut errors = Vec::new();

    for field in fields {
        let supplied = object.get(field.key).filter(|v| !v.is_null());
        let value = match (supplied, field.fallback) {
            (Some(raw), _) => match coerce(field, raw) {
                Ok(value) => value,
                Err(err) => {
                    errors.push(err);
                    continue;
                }
            },
            (None, Fallback::Required) => {
                errors.push(FieldError::body(field.key, format!("{} is required", field.key), None));
                continue;
            }
            (None, Fallback::Nullable) => Value::Null,
            (None, Fallback::CurrentSchoolYear) => Value::String(current_school_year(today)),
            (None, Fallback::Today) => Value::String(today.format("%Y-%m-%d").to_string()),
            (None, Fallback::False) => Value::Bool(false),
            (None, Fallback::EmptyText) => Value::String(String::new()),
        };
        record.insert(field.column.to_string(), value);
    }

    if errors.is_empty() {
        Ok(record)
    } else {
        Err(errors)
    }
}

/// Validate a sparse patch: only keys present in the body are checked and
/// returned. Unknown keys are ignored.
pub fn validate_patch(fields: &[FieldSpec], body: &Value) -> Result<Record, Vec<FieldError>> {
    let object = body_object(body)?;
    let mut record = Record::new();
    let mut errors = Vec::new();

    for field in fields {
        let Some(raw) = object.get(field.key) else { continue };
        if raw.is_null() {
            if field.fallback == Fallback::Nullable {
                record.insert(field.column.to_string(), Value::Null);
            } else {
                errors.push(FieldError::body(field.key, format!("{} cannot be null", field.key), Some(Value::Null)));
            }
            continue;
        }
        match coerce(field, raw) {
            Ok(value) => {
                record.insert(field.column.to_string(), value);
            }
            Err(err) => errors.push(err),
        }
    }

    if errors.is_empty() {
        Ok(record)
    } else {
        Err(errors)
    }
}

fn coerce(field: &FieldSpec, raw: &Value) -> Result<Value, FieldError> {
    let reject = |msg: String| FieldError::body(field.key, msg, Some(raw.clone()));
    let key = field.key;

    match field.rule {
        Rule::Text => match raw.as_str().map(str::trim) {
            Some(s) if !s.is_empty() => Ok(Value::String(s.to_string())),
            Some(_) if field.fallback == Fallback::EmptyText => Ok(Value::String(String::new())),
            _ => Err(reject(format!("{} must be a non-empty string", key))),
        },
        Rule::Email => match raw.as_str().map(str::trim) {
            Some(s) if is_email(s) => Ok(Value::String(s.to_string())),
            _ => Err(reject(format!("{} must be a valid email", key))),
        },
        Rule::Password => match raw.as_str() {
            Some(s) if s.chars().count() >= 6 => Ok(Value::String(s.to_string())),
            _ => Err(reject(format!("{} needs to have at least 6 characters", key))),
        },
        Rule::Integer => as_integer(raw)
            .map(Value::from)
            .ok_or_else(|| reject(format!("{} needs to be an integer", key))),
        Rule::Month => match as_integer(raw) {
            Some(m) if (1..=12).contains(&m) => Ok(Value::from(m)),
            _ => Err(reject(format!("{} needs to be a month between 1 and 12", key))),
        },
        Rule::Number => as_number(raw)
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| reject(format!("{} needs to be numeric", key))),
        Rule::Bool => match raw {
            Value::Bool(b) => Ok(Value::Bool(*b)),
            Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
            Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
            _ => Err(reject(format!("{} needs to be a boolean", key))),
        },
        Rule::Date => raw
            .as_str()
            .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
            .ok_or_else(|| reject(format!("{} needs to be a date (YYYY-MM-DD)", key))),
        Rule::Time => raw
            .as_str()
            .and_then(|s| parse_time(s.trim()))
            .map(|t| Value::String(t.format("%H:%M:%S").to_string()))
            .ok_or_else(|| reject(format!("{} needs to be a time (HH:MM)", key))),
        Rule::SchoolYear => match raw.as_str().map(str::trim) {
            Some(s) if is_school_year(s) => Ok(Value::String(s.to_string())),
            _ => Err(reject(format!("{} needs to be a school year (YYYY-YYYY)", key))),
        },
        Rule::Weekday => match raw.as_str().map(|s| s.trim().to_ascii_uppercase()) {
            Some(day) if WEEKDAYS.contains(&day.as_str()) => Ok(Value::String(day)),
            _ => Err(reject(format!("{} needs to be a weekday (MONDAY..SUNDAY)", key))),
        },
    }
}

fn as_integer(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_number(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

fn is_email(raw: &str) -> bool {
    let Some((local, domain)) = raw.split_once('@') else { return false };
    !local.is_empty()
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && domain.contains('.')
        && !raw.chars().any(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FIELDS: &[FieldSpec] = &[
        FieldSpec::required("billingReason", "billing_reason", Rule::Text),
        FieldSpec::required("amount", "amount", Rule::Number),
        FieldSpec::with_fallback("isPaid", "is_paid", Rule::Bool, Fallback::False),
        FieldSpec::with_fallback("issueDate", "issue_date", Rule::Date, Fallback::Today),
        FieldSpec::with_fallback("dueDate", "due_date", Rule::Date, Fallback::Nullable),
        FieldSpec::with_fallback("schoolYear", "school_year", Rule::SchoolYear, Fallback::CurrentSchoolYear),
        FieldSpec::required("studentId", "student_id", Rule::Integer),
    ];

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 10, 3).unwrap()
    }

    #[test]
    fn create_maps_keys_and_applies_fallbacks() {
        let body = json!({ "billingReason": "Trip", "amount": "12.5", "studentId": "4" });
        let record = validate_create(FIELDS, &body, today()).unwrap();
        assert_eq!(record["billing_reason"], "Trip");
        assert_eq!(record["amount"], json!(12.5));
        assert_eq!(record["is_paid"], json!(false));
        assert_eq!(record["issue_date"], "2024-10-03");
        assert_eq!(record["due_date"], Value::Null);
        assert_eq!(record["school_year"], "2024-2025");
        assert_eq!(record["student_id"], json!(4));
    }

    #[test]
    fn create_lists_every_violation() {
        let body = json!({ "amount": "lots", "isPaid": "maybe", "studentId": 1 });
        let errors = validate_create(FIELDS, &body, today()).unwrap_err();
        let params: Vec<_> = errors.iter().map(|e| e.param.as_str()).collect();
        assert_eq!(params, ["billingReason", "amount", "isPaid"]);
        assert_eq!(errors[1].value, Some(json!("lots")));
        assert!(errors[0].value.is_none());
    }

    #[test]
    fn patch_only_touches_supplied_keys() {
        let record = validate_patch(FIELDS, &json!({ "isPaid": true, "unknown": 1 })).unwrap();
        assert_eq!(record.len(), 1);
        assert_eq!(record["is_paid"], json!(true));
    }

    #[test]
    fn patch_rejects_null_for_non_nullable() {
        assert!(validate_patch(FIELDS, &json!({ "amount": null })).is_err());
        let record = validate_patch(FIELDS, &json!({ "dueDate": null })).unwrap();
        assert_eq!(record["due_date"], Value::Null);
    }

    #[test]
    fn normalises_times_and_weekdays() {
        let fields = [
            FieldSpec::required("startTime", "start_time", Rule::Time),
            FieldSpec::required("weekday", "weekday", Rule::Weekday),
        ];
        let record = validate_patch(&fields, &json!({ "startTime": "08:05", "weekday": "monday" })).unwrap();
        assert_eq!(record["start_time"], "08:05:00");
        assert_eq!(record["weekday"], "MONDAY");
        assert!(validate_patch(&fields, &json!({ "weekday": "FUNDAY" })).is_err());
    }

    #[test]
    fn email_and_password_rules() {
        let fields = [
            FieldSpec::required("email", "email", Rule::Email),
            FieldSpec::required("password", "password", Rule::Password),
        ];
        assert!(validate_patch(&fields, &json!({ "email": "a@b.co", "password": "secret" })).is_ok());
        let errors = validate_patch(&fields, &json!({ "email": "nope", "password": "short" })).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn non_object_body_is_rejected() {
        assert!(validate_create(FIELDS, &json!([1, 2]), today()).is_err());
    }
}
