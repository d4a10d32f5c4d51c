use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::schema::Table;
use super::store::{LogEntry, Record, RosterEntry, SchoolStore, StoreError};
use crate::filter::{Operator, Predicate, PredicateSet};

#[derive(Default)]
struct State {
    tables: HashMap<Table, BTreeMap<i64, Record>>,
    next_ids: HashMap<Table, i64>,
    /// (student_id, class_id)
    enrollments: BTreeSet<(i64, i64)>,
    roles: BTreeMap<i64, String>,
    logs: Vec<LogEntry>,
}

impl State {
    fn rows(&self, table: Table) -> impl Iterator<Item = &Record> {
        self.tables.get(&table).into_iter().flat_map(|rows| rows.values())
    }

    fn class_teacher(&self, class_id: i64) -> Option<i64> {
        self.tables
            .get(&Table::Classes)
            .and_then(|rows| rows.get(&class_id))
            .and_then(|row| row.get("teacher_id"))
            .and_then(Value::as_i64)
    }

    fn matches(&self, record: &Record, predicate: &Predicate) -> bool {
        let field = record.get(predicate.column).unwrap_or(&Value::Null);
        match predicate.operator {
            Operator::Eq => values_equal(field, &predicate.value),
            Operator::Contains => match (field.as_str(), predicate.value.as_str()) {
                (Some(haystack), Some(needle)) => haystack.to_lowercase().contains(&needle.to_lowercase()),
                _ => false,
            },
            Operator::InClassesTaughtBy => match (field.as_i64(), predicate.value.as_i64()) {
                (Some(class_id), Some(teacher_id)) => self.class_teacher(class_id) == Some(teacher_id),
                _ => false,
            },
            Operator::InClassesAttendedBy => match (field.as_i64(), predicate.value.as_i64()) {
                (Some(class_id), Some(student_id)) => self.enrollments.contains(&(student_id, class_id)),
                _ => false,
            },
            Operator::InRosterOf => match (field.as_i64(), predicate.value.as_i64()) {
                (Some(student_id), Some(teacher_id)) => self
                    .enrollments
                    .range((student_id, i64::MIN)..=(student_id, i64::MAX))
                    .any(|(_, class_id)| self.class_teacher(*class_id) == Some(teacher_id)),
                _ => false,
            },
        }
    }

    fn select(&self, table: Table, predicates: &PredicateSet) -> Vec<Record> {
        self.rows(table)
            .filter(|row| predicates.iter().all(|p| self.matches(row, p)))
            .cloned()
            .collect()
    }

    fn is_referenced(&self, table: Table, id: i64) -> bool {
        let id = Value::from(id);
        table
            .referenced_by()
            .iter()
            .any(|(child, column)| self.rows(*child).any(|row| row.get(*column).map_or(false, |v| values_equal(v, &id))))
    }

    fn email_taken(&self, email: &Value, except_id: Option<i64>) -> bool {
        self.rows(Table::Users).any(|row| {
            row.get("email") == Some(email) && row.get("id").and_then(Value::as_i64) != except_id
        })
    }
}

fn email_conflict() -> StoreError {
    StoreError::Conflict { field: "email", message: "E-mail already in use".to_string() }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// In-process store for tests and for running without a database.
pub struct MemoryStore {
    state: RwLock<State>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Empty store with the three user roles seeded (1 admin, 2 teacher, 3 student).
    pub fn new() -> Self {
        let mut state = State::default();
        for (id, role) in [(1, "admin"), (2, "teacher"), (3, "student")] {
            state.roles.insert(id, role.to_string());
        }
        Self { state: RwLock::new(state) }
    }

    /// Snapshot of the audit log.
    pub async fn logs(&self) -> Vec<LogEntry> {
        self.state.read().await.logs.clone()
    }
}

#[async_trait]
impl SchoolStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn find_all(&self, table: Table, predicates: &PredicateSet) -> Result<Vec<Record>, StoreError> {
        Ok(self.state.read().await.select(table, predicates))
    }

    async fn find_one(&self, table: Table, predicates: &PredicateSet) -> Result<Option<Record>, StoreError> {
        Ok(self.state.read().await.select(table, predicates).into_iter().next())
    }

    async fn create(&self, table: Table, record: Record) -> Result<Record, StoreError> {
        let mut state = self.state.write().await;
        if table == Table::Users {
            if let Some(email) = record.get("email").filter(|e| !e.is_null()) {
                if state.email_taken(email, None) {
                    return Err(email_conflict());
                }
            }
        }

        let next = state.next_ids.entry(table).or_insert(0);
        *next += 1;
        let id = *next;

        let mut row = Record::new();
        for (name, _) in table.columns() {
            let value = if *name == "id" {
                Value::from(id)
            } else {
                record.get(*name).cloned().unwrap_or(Value::Null)
            };
            row.insert(name.to_string(), value);
        }
        state.tables.entry(table).or_default().insert(id, row.clone());
        Ok(row)
    }

    async fn update(&self, table: Table, id: i64, patch: Record) -> Result<u64, StoreError> {
        let mut state = self.state.write().await;
        let exists = state.tables.get(&table).map_or(false, |rows| rows.contains_key(&id));
        let touches_columns = table.columns().iter().any(|(name, _)| *name != "id" && patch.contains_key(*name));
        if !exists || !touches_columns {
            return Ok(0);
        }
        if table == Table::Users {
            if let Some(email) = patch.get("email").filter(|e| !e.is_null()) {
                if state.email_taken(email, Some(id)) {
                    return Err(email_conflict());
                }
            }
        }

        let Some(row) = state.tables.get_mut(&table).and_then(|rows| rows.get_mut(&id)) else {
            return Ok(0);
        };
        for (name, _) in table.columns().iter().filter(|(name, _)| *name != "id") {
            if let Some(value) = patch.get(*name) {
                row.insert(name.to_string(), value.clone());
            }
        }
        Ok(1)
    }

    async fn destroy(&self, table: Table, id: i64) -> Result<u64, StoreError> {
        let mut state = self.state.write().await;
        if state.is_referenced(table, id) {
            return Err(StoreError::Conflict {
                field: "id",
                message: "Record is still referenced by other records".to_string(),
            });
        }
        let removed = state.tables.get_mut(&table).and_then(|rows| rows.remove(&id));
        if removed.is_none() {
            return Ok(0);
        }
        match table {
            Table::Classes => state.enrollments.retain(|(_, class_id)| *class_id != id),
            Table::Users => state.enrollments.retain(|(student_id, _)| *student_id != id),
            _ => {}
        }
        Ok(1)
    }

    async fn class_rosters(&self, class_ids: &[i64]) -> Result<HashMap<i64, Vec<RosterEntry>>, StoreError> {
        let state = self.state.read().await;
        let users = state.tables.get(&Table::Users);
        let mut rosters: HashMap<i64, Vec<RosterEntry>> = HashMap::new();
        for (student_id, class_id) in state.enrollments.iter().filter(|(_, c)| class_ids.contains(c)) {
            let Some(user) = users.and_then(|rows| rows.get(student_id)) else { continue };
            let name = |key: &str| user.get(key).and_then(Value::as_str).unwrap_or_default().to_string();
            rosters.entry(*class_id).or_default().push(RosterEntry {
                id: *student_id,
                first_name: name("first_name"),
                last_name: name("last_name"),
            });
        }
        Ok(rosters)
    }

    async fn enroll(&self, student_id: i64, class_id: i64) -> Result<bool, StoreError> {
        Ok(self.state.write().await.enrollments.insert((student_id, class_id)))
    }

    async fn unenroll(&self, student_id: i64, class_id: i64) -> Result<u64, StoreError> {
        let removed = self.state.write().await.enrollments.remove(&(student_id, class_id));
        Ok(u64::from(removed))
    }

    async fn user_role(&self, user_id: i64) -> Result<Option<String>, StoreError> {
        let state = self.state.read().await;
        let role_id = state
            .tables
            .get(&Table::Users)
            .and_then(|rows| rows.get(&user_id))
            .and_then(|row| row.get("role_id"))
            .and_then(Value::as_i64);
        Ok(role_id.and_then(|id| state.roles.get(&id).cloned()))
    }

    async fn record_log(&self, entry: LogEntry) -> Result<(), StoreError> {
        self.state.write().await.logs.push(entry);
        Ok(())
    }
}
