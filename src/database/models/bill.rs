use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    pub id: i64,
    pub billing_reason: String,
    pub amount: f64,
    pub is_paid: bool,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub payment_date: Option<NaiveDate>,
    pub school_year: String,
    pub student_id: i64,
}
