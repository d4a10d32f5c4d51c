pub mod attendance;
pub mod bill;
pub mod class;
pub mod grade;
pub mod subject;
pub mod user;
pub mod weekly_note;

pub use attendance::{AttendanceEntry, AttendanceList};
pub use bill::Bill;
pub use class::Class;
pub use grade::Grade;
pub use subject::Subject;
pub use user::User;
pub use weekly_note::WeeklyNote;
