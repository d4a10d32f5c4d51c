pub mod memory;
pub mod models;
pub mod postgres;
pub mod schema;
pub mod store;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use schema::{ColumnType, Table};
pub use store::{LogEntry, Record, RosterEntry, SchoolStore, StoreError};
