pub mod types;
pub mod filter;
pub mod filter_where;
pub mod error;

pub use types::*;
pub use error::FilterError;
pub use filter::{allow_list, build, scope_predicates};
pub use filter_where::FilterWhere;
