use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Invalid value '{value}' for query parameter '{param}': expected {expected}")]
    InvalidValue {
        param: String,
        value: String,
        expected: &'static str,
    },

    #[error("Cannot build a query for a denied scope")]
    ScopeDenied,
}
