use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::auth::{Identity, Role};
use crate::database::models::Class;
use crate::database::{RosterEntry, SchoolStore, StoreError, Table};
use crate::filter::{self, FilterError};
use crate::policy::{self, PolicyError};
use crate::services::school_year::current_school_year;
use crate::types::{Operation, ResourceType};

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("No action defined for user role '{0}'")]
    UnsupportedRole(Role),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const SCHOOL_DAYS: [Weekday; 5] =
        [Weekday::Monday, Weekday::Tuesday, Weekday::Wednesday, Weekday::Thursday, Weekday::Friday];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "MONDAY" => Some(Weekday::Monday),
            "TUESDAY" => Some(Weekday::Tuesday),
            "WEDNESDAY" => Some(Weekday::Wednesday),
            "THURSDAY" => Some(Weekday::Thursday),
            "FRIDAY" => Some(Weekday::Friday),
            "SATURDAY" => Some(Weekday::Saturday),
            "SUNDAY" => Some(Weekday::Sunday),
            _ => None,
        }
    }
}

/// One class occurrence in the weekly agenda.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: i64,
    pub name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub students: Option<Vec<RosterEntry>>,
}

/// Weekday-keyed agenda. MONDAY..FRIDAY are always present.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Schedule(BTreeMap<Weekday, Vec<Event>>);

impl Schedule {
    fn new() -> Self {
        Self(Weekday::SCHOOL_DAYS.iter().map(|day| (*day, Vec::new())).collect())
    }

    pub fn day(&self, day: Weekday) -> &[Event] {
        self.0.get(&day).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn days(&self) -> impl Iterator<Item = Weekday> + '_ {
        self.0.keys().copied()
    }
}

/// Weekly schedule for the current school year: classes taught (teachers,
/// with rosters) or attended (students).
pub async fn schedule_for(
    store: &dyn SchoolStore,
    identity: &Identity,
    today: NaiveDate,
) -> Result<Schedule, ScheduleError> {
    if !matches!(identity.role, Role::Teacher | Role::Student) {
        return Err(ScheduleError::UnsupportedRole(identity.role));
    }

    let scope = policy::require(identity, ResourceType::Class, Operation::Read, None)?;
    let params = HashMap::from([("year".to_string(), current_school_year(today))]);
    let predicates = filter::build(ResourceType::Class, &params, scope)?;

    let classes = store
        .find_all(Table::Classes, &predicates)
        .await?
        .into_iter()
        .map(|row| serde_json::from_value::<Class>(Value::Object(row)))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| StoreError::Decode(e.to_string()))?;

    let mut rosters = if identity.role == Role::Teacher {
        let ids: Vec<i64> = classes.iter().map(|c| c.id).collect();
        Some(store.class_rosters(&ids).await?)
    } else {
        None
    };

    let mut schedule = Schedule::new();
    for class in classes {
        let Some(day) = Weekday::parse(&class.weekday) else {
            tracing::warn!("Class {} has unknown weekday '{}'", class.id, class.weekday);
            continue;
        };
        let students = rosters.as_mut().map(|r| r.remove(&class.id).unwrap_or_default());
        schedule.0.entry(day).or_default().push(Event {
            id: class.id,
            name: class.name,
            start_time: class.start_time,
            end_time: class.end_time,
            kind: "custom",
            students,
        });
    }
    for events in schedule.0.values_mut() {
        events.sort_by(|a, b| a.start_time.cmp(&b.start_time).then(a.id.cmp(&b.id)));
    }

    Ok(schedule)
}
