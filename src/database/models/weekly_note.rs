use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyNote {
    pub id: i64,
    pub note: String,
    pub school_year: String,
    pub student_id: i64,
    pub class_id: i64,
}
