use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgPoolOptions};
use sqlx::{PgPool, Row};
use tracing::info;

use super::schema::Table;
use super::store::{LogEntry, Record, RosterEntry, SchoolStore, StoreError};
use crate::config::DatabaseConfig;
use crate::filter::{FilterWhere, PredicateSet};

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(url: &str, config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;
        info!("Created database pool (max {} connections)", config.max_connections);
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Query(format!("migration failed: {}", e)))?;
        info!("Database migrations applied");
        Ok(())
    }

    fn select_sql(table: Table, predicates: &PredicateSet, limit_one: bool) -> (String, Vec<Value>) {
        let where_result = FilterWhere::generate(predicates, 0);
        let mut query = format!(
            "SELECT row_to_json(t) AS row FROM \"{}\" t WHERE {} ORDER BY t.\"id\"",
            table.name(),
            where_result.query
        );
        if limit_one {
            query.push_str(" LIMIT 1");
        }
        (query, where_result.params)
    }

    fn insert_sql(table: Table, record: &Record) -> (String, Vec<Value>) {
        let mut columns = Vec::new();
        let mut placeholders = Vec::new();
        let mut params = Vec::new();
        for (name, ty) in table.columns().iter().filter(|(name, _)| *name != "id") {
            let Some(value) = record.get(*name) else { continue };
            params.push(value.clone());
            columns.push(format!("\"{}\"", name));
            placeholders.push(format!("${}::{}", params.len(), ty.sql_cast()));
        }
        let query = format!(
            "INSERT INTO \"{}\" AS t ({}) VALUES ({}) RETURNING row_to_json(t) AS row",
            table.name(),
            columns.join(", "),
            placeholders.join(", ")
        );
        (query, params)
    }

    fn update_sql(table: Table, id: i64, patch: &Record) -> (String, Vec<Value>) {
        let mut assignments = Vec::new();
        let mut params = Vec::new();
        for (name, ty) in table.columns().iter().filter(|(name, _)| *name != "id") {
            let Some(value) = patch.get(*name) else { continue };
            params.push(value.clone());
            assignments.push(format!("\"{}\" = ${}::{}", name, params.len(), ty.sql_cast()));
        }
        params.push(Value::from(id));
        let query = format!(
            "UPDATE \"{}\" SET {} WHERE \"id\" = ${}",
            table.name(),
            assignments.join(", "),
            params.len()
        );
        (query, params)
    }

    async fn fetch_records(&self, sql: &str, params: &[Value]) -> Result<Vec<Record>, StoreError> {
        let mut query = sqlx::query(sql);
        for p in params {
            query = bind_param(query, p);
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(|row| decode_row(&row)).collect()
    }
}

fn decode_row(row: &sqlx::postgres::PgRow) -> Result<Record, StoreError> {
    let value: Value = row.try_get("row")?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Decode(format!("expected JSON object, got {}", other))),
    }
}

fn bind_param<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &'q Value,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s.as_str()),
        Value::Array(_) | Value::Object(_) => q.bind(v.clone()),
    }
}

/// Column behind a `<table>_<column>_fkey` constraint name.
fn foreign_key_column(constraint: Option<&str>) -> &'static str {
    let constraint = constraint.unwrap_or_default();
    ["teacher_id", "subject_id", "student_id", "class_id", "role_id"]
        .into_iter()
        .find(|column| constraint.ends_with(&format!("_{}_fkey", column)))
        .unwrap_or("id")
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
                StoreError::Connection(err.to_string())
            }
            sqlx::Error::RowNotFound => StoreError::NotFound("Record not found".to_string()),
            sqlx::Error::Database(db) => match db.code().as_deref() {
                Some("23505") => match db.constraint() {
                    Some(constraint) if constraint.contains("email") => StoreError::Conflict {
                        field: "email",
                        message: "E-mail already in use".to_string(),
                    },
                    _ => StoreError::Conflict {
                        field: "id",
                        message: "Record conflicts with an existing record".to_string(),
                    },
                },
                // Postgres reports a blocked delete as "update or delete on table ...".
                Some("23503") if db.message().starts_with("update or delete") => StoreError::Conflict {
                    field: "id",
                    message: "Record is still referenced by other records".to_string(),
                },
                Some("23503") => StoreError::Conflict {
                    field: foreign_key_column(db.constraint()),
                    message: "Referenced record does not exist".to_string(),
                },
                _ => StoreError::Query(err.to_string()),
            },
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => StoreError::Decode(err.to_string()),
            _ => StoreError::Query(err.to_string()),
        }
    }
}

#[async_trait]
impl SchoolStore for PgStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn find_all(&self, table: Table, predicates: &PredicateSet) -> Result<Vec<Record>, StoreError> {
        let (sql, params) = Self::select_sql(table, predicates, false);
        self.fetch_records(&sql, &params).await
    }

    async fn find_one(&self, table: Table, predicates: &PredicateSet) -> Result<Option<Record>, StoreError> {
        let (sql, params) = Self::select_sql(table, predicates, true);
        Ok(self.fetch_records(&sql, &params).await?.into_iter().next())
    }

    async fn create(&self, table: Table, record: Record) -> Result<Record, StoreError> {
        let (sql, params) = Self::insert_sql(table, &record);
        let mut query = sqlx::query(&sql);
        for p in &params {
            query = bind_param(query, p);
        }
        let row = query.fetch_one(&self.pool).await?;
        decode_row(&row)
    }

    async fn update(&self, table: Table, id: i64, patch: Record) -> Result<u64, StoreError> {
        if !table.columns().iter().any(|(name, _)| *name != "id" && patch.contains_key(*name)) {
            return Ok(0);
        }
        let (sql, params) = Self::update_sql(table, id, &patch);
        let mut query = sqlx::query(&sql);
        for p in &params {
            query = bind_param(query, p);
        }
        Ok(query.execute(&self.pool).await?.rows_affected())
    }

    async fn destroy(&self, table: Table, id: i64) -> Result<u64, StoreError> {
        let sql = format!("DELETE FROM \"{}\" WHERE \"id\" = $1", table.name());
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn class_rosters(&self, class_ids: &[i64]) -> Result<HashMap<i64, Vec<RosterEntry>>, StoreError> {
        let mut rosters: HashMap<i64, Vec<RosterEntry>> = HashMap::new();
        if class_ids.is_empty() {
            return Ok(rosters);
        }
        let rows: Vec<(i64, i64, String, String)> = sqlx::query_as(
            "SELECT sc.\"class_id\", u.\"id\", u.\"first_name\", u.\"last_name\" \
             FROM \"students_classes\" sc JOIN \"users\" u ON u.\"id\" = sc.\"student_id\" \
             WHERE sc.\"class_id\" = ANY($1) ORDER BY sc.\"class_id\", u.\"id\"",
        )
        .bind(class_ids.to_vec())
        .fetch_all(&self.pool)
        .await?;
        for (class_id, id, first_name, last_name) in rows {
            rosters.entry(class_id).or_default().push(RosterEntry { id, first_name, last_name });
        }
        Ok(rosters)
    }

    async fn enroll(&self, student_id: i64, class_id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "INSERT INTO \"students_classes\" (\"student_id\", \"class_id\") VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(student_id)
        .bind(class_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn unenroll(&self, student_id: i64, class_id: i64) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM \"students_classes\" WHERE \"student_id\" = $1 AND \"class_id\" = $2")
            .bind(student_id)
            .bind(class_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn user_role(&self, user_id: i64) -> Result<Option<String>, StoreError> {
        let role: Option<String> = sqlx::query_scalar(
            "SELECT r.\"role\" FROM \"users\" u JOIN \"user_roles\" r ON r.\"id\" = u.\"role_id\" WHERE u.\"id\" = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(role)
    }

    async fn record_log(&self, entry: LogEntry) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO \"logs\" (\"user_id\", \"ip_address\", \"method\", \"body\", \"requested_url\", \"time\") \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(entry.user_id)
        .bind(entry.ip_address)
        .bind(entry.method)
        .bind(entry.body)
        .bind(entry.requested_url)
        .bind(entry.time)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
