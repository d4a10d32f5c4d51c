use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Class {
    pub id: i64,
    pub name: String,
    pub subject_id: i64,
    pub teacher_id: i64,
    /// `"YYYY-YYYY"`
    pub school_year: String,
    /// Upper-case day name, `MONDAY`..`SUNDAY`.
    pub weekday: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}
