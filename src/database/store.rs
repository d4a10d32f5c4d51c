use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde_json::{Map, Value};
use thiserror::Error;

use super::schema::Table;
use crate::filter::PredicateSet;

/// A row as a JSON object keyed by column name.
pub type Record = Map<String, Value>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// A write clashed with existing rows; `field` names the offending input.
    #[error("Conflict on {field}: {message}")]
    Conflict { field: &'static str, message: String },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

/// Student summary attached to a class roster.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RosterEntry {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

/// One row of the request audit log.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub user_id: i64,
    pub ip_address: String,
    pub method: String,
    pub body: String,
    pub requested_url: String,
    pub time: NaiveDateTime,
}

/// Persistence seam. Reads take a predicate set built by the filter module;
/// rows come back ordered by `id`.
#[async_trait]
pub trait SchoolStore: Send + Sync {
    fn backend_name(&self) -> &'static str;

    async fn health_check(&self) -> Result<(), StoreError>;

    async fn find_all(&self, table: Table, predicates: &PredicateSet) -> Result<Vec<Record>, StoreError>;

    async fn find_one(&self, table: Table, predicates: &PredicateSet) -> Result<Option<Record>, StoreError>;

    /// Insert and return the stored row including its new `id`.
    async fn create(&self, table: Table, record: Record) -> Result<Record, StoreError>;

    /// Apply a sparse patch; returns the number of rows changed (0 or 1).
    async fn update(&self, table: Table, id: i64, patch: Record) -> Result<u64, StoreError>;

    /// Returns the number of rows removed (0 or 1).
    async fn destroy(&self, table: Table, id: i64) -> Result<u64, StoreError>;

    /// Enrolled students per class, one roster query for all ids.
    async fn class_rosters(&self, class_ids: &[i64]) -> Result<HashMap<i64, Vec<RosterEntry>>, StoreError>;

    /// Returns false when the student was already enrolled.
    async fn enroll(&self, student_id: i64, class_id: i64) -> Result<bool, StoreError>;

    async fn unenroll(&self, student_id: i64, class_id: i64) -> Result<u64, StoreError>;

    /// Role name of a user, `None` when the user does not exist.
    async fn user_role(&self, user_id: i64) -> Result<Option<String>, StoreError>;

    async fn record_log(&self, entry: LogEntry) -> Result<(), StoreError>;
}
