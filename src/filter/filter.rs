use std::collections::HashMap;

use serde_json::Value;

use super::error::FilterError;
use super::types::{FilterKey, Operator, Predicate, PredicateSet, ValueKind};
use crate::policy::Scope;
use crate::types::ResourceType;

use ValueKind::{Integer, Text, Weekday};

const USER_KEYS: &[FilterKey] = &[
    FilterKey::eq("role", "role_id", Integer),
    FilterKey::eq("email", "email", Text),
    FilterKey::contains("name", "last_name"),
];

const CLASS_KEYS: &[FilterKey] = &[
    FilterKey::eq("teacher", "teacher_id", Integer),
    FilterKey::eq("subject", "subject_id", Integer),
    FilterKey::eq("year", "school_year", Text),
    FilterKey::eq("weekday", "weekday", Weekday),
    FilterKey::contains("name", "name"),
];

const SUBJECT_KEYS: &[FilterKey] = &[FilterKey::contains("name", "name")];

const GRADE_KEYS: &[FilterKey] = &[
    FilterKey::eq("student", "student_id", Integer),
    FilterKey::eq("user", "student_id", Integer),
    FilterKey::eq("class", "class_id", Integer),
    FilterKey::eq("year", "school_year", Text),
];

const BILL_KEYS: &[FilterKey] = &[
    FilterKey::eq("student", "student_id", Integer),
    FilterKey::eq("user", "student_id", Integer),
    FilterKey::eq("year", "school_year", Text),
];

const ATTENDANCE_ENTRY_KEYS: &[FilterKey] = &[
    FilterKey::eq("student", "student_id", Integer),
    FilterKey::eq("class", "class_id", Integer),
    FilterKey::eq("year", "school_year", Text),
    FilterKey::eq("month", "month", Integer),
];

const ATTENDANCE_LIST_KEYS: &[FilterKey] = &[
    FilterKey::eq("student", "student_id", Integer),
    FilterKey::eq("user", "student_id", Integer),
    FilterKey::eq("class", "class_id", Integer),
];

const WEEKLY_NOTE_KEYS: &[FilterKey] = &[
    FilterKey::eq("student", "student_id", Integer),
    FilterKey::eq("user", "student_id", Integer),
    FilterKey::eq("class", "class_id", Integer),
    FilterKey::eq("year", "school_year", Text),
];

/// Query parameters a resource recognises, in predicate order.
pub fn allow_list(resource: ResourceType) -> &'static [FilterKey] {
    match resource {
        ResourceType::User => USER_KEYS,
        ResourceType::Class => CLASS_KEYS,
        ResourceType::Subject => SUBJECT_KEYS,
        ResourceType::Grade => GRADE_KEYS,
        ResourceType::Bill => BILL_KEYS,
        ResourceType::AttendanceEntry => ATTENDANCE_ENTRY_KEYS,
        ResourceType::AttendanceList => ATTENDANCE_LIST_KEYS,
        ResourceType::WeeklyNote => WEEKLY_NOTE_KEYS,
    }
}

/// Predicates pinning a query to the rows a scope may see.
pub fn scope_predicates(resource: ResourceType, scope: Scope) -> Result<Vec<Predicate>, FilterError> {
    use ResourceType::*;

    let predicates = match scope {
        Scope::Denied => return Err(FilterError::ScopeDenied),
        Scope::Unrestricted => Vec::new(),
        Scope::OwnedByStudent(student_id) => match resource {
            User => vec![Predicate::eq("id", student_id)],
            Class => vec![Predicate::new("id", Operator::InClassesAttendedBy, student_id)],
            Subject => Vec::new(),
            Grade | Bill | AttendanceEntry | AttendanceList | WeeklyNote => {
                vec![Predicate::eq("student_id", student_id)]
            }
        },
        Scope::OwnedByTeacher(teacher_id) => match resource {
            User => vec![Predicate::new("id", Operator::InRosterOf, teacher_id)],
            Class => vec![Predicate::eq("teacher_id", teacher_id)],
            Subject => Vec::new(),
            Bill => return Err(FilterError::ScopeDenied),
            Grade | AttendanceEntry | AttendanceList | WeeklyNote => {
                vec![Predicate::new("class_id", Operator::InClassesTaughtBy, teacher_id)]
            }
        },
    };
    Ok(predicates)
}

/// Build the predicate set for a read from raw query parameters and the
/// requester's scope. Scope predicates come first, then recognised keys in
/// allow-list order; unrecognised keys are ignored.
pub fn build(
    resource: ResourceType,
    raw: &HashMap<String, String>,
    scope: Scope,
) -> Result<PredicateSet, FilterError> {
    let mut predicates = scope_predicates(resource, scope)?;
    let keys = allow_list(resource);

    for key in keys {
        let Some(raw_value) = raw.get(key.param) else { continue };
        let trimmed = raw_value.trim();
        if trimmed.is_empty() {
            continue;
        }
        predicates.push(Predicate::new(key.column, key.operator, parse_value(key, trimmed)?));
    }

    if crate::config::CONFIG.filter.debug_logging {
        for param in raw.keys().filter(|p| !keys.iter().any(|k| k.param == p.as_str())) {
            tracing::debug!("Ignoring unrecognised {} filter '{}'", resource, param);
        }
    }

    Ok(PredicateSet::from(predicates))
}

fn parse_value(key: &FilterKey, raw: &str) -> Result<Value, FilterError> {
    match key.kind {
        ValueKind::Integer => raw.parse::<i64>().map(Value::from).map_err(|_| FilterError::InvalidValue {
            param: key.param.to_string(),
            value: raw.to_string(),
            expected: "an integer",
        }),
        ValueKind::Text => Ok(Value::String(raw.to_string())),
        ValueKind::Weekday => Ok(Value::String(raw.to_ascii_uppercase())),
    }
}
