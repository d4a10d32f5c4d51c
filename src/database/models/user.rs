use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// User as returned to clients. The password digest is never part of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role_id: i64,
    pub birth_date: NaiveDate,
    pub image: String,
    pub region: String,
    pub city: String,
    pub zip: String,
    pub street: String,
}
