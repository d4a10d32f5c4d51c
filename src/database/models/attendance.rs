use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Per-lesson attendance record, bucketed by school year and month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceEntry {
    pub id: i64,
    pub date: NaiveDate,
    pub school_year: String,
    pub month: i64,
    pub has_attended: Option<bool>,
    pub student_id: i64,
    pub class_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceList {
    pub id: i64,
    pub date: NaiveDate,
    pub has_attended: bool,
    pub student_id: i64,
    pub class_id: i64,
}
