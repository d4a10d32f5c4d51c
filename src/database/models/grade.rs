use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    pub id: i64,
    pub grade: i64,
    pub nth_grade: i64,
    pub school_year: String,
    pub student_id: i64,
    pub class_id: i64,
}
