pub mod schedule_service;
pub mod school_year;
