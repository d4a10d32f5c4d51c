use crate::types::ResourceType;

/// PostgreSQL type of a column, used to cast bound parameters on writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    BigInt,
    Double,
    Bool,
    Text,
    Date,
    Time,
}

impl ColumnType {
    pub fn sql_cast(&self) -> &'static str {
        match self {
            ColumnType::BigInt => "bigint",
            ColumnType::Double => "double precision",
            ColumnType::Bool => "boolean",
            ColumnType::Text => "text",
            ColumnType::Date => "date",
            ColumnType::Time => "time",
        }
    }
}

type Columns = &'static [(&'static str, ColumnType)];

use ColumnType::*;

const USERS: Columns = &[
    ("id", BigInt),
    ("first_name", Text),
    ("last_name", Text),
    ("email", Text),
    ("password", Text),
    ("role_id", BigInt),
    ("birth_date", Date),
    ("image", Text),
    ("region", Text),
    ("city", Text),
    ("zip", Text),
    ("street", Text),
];

const CLASSES: Columns = &[
    ("id", BigInt),
    ("name", Text),
    ("subject_id", BigInt),
    ("teacher_id", BigInt),
    ("school_year", Text),
    ("weekday", Text),
    ("start_time", Time),
    ("end_time", Time),
];

const SUBJECTS: Columns = &[("id", BigInt), ("name", Text)];

const GRADES: Columns = &[
    ("id", BigInt),
    ("grade", BigInt),
    ("nth_grade", BigInt),
    ("school_year", Text),
    ("student_id", BigInt),
    ("class_id", BigInt),
];

const BILLS: Columns = &[
    ("id", BigInt),
    ("billing_reason", Text),
    ("amount", Double),
    ("is_paid", Bool),
    ("issue_date", Date),
    ("due_date", Date),
    ("payment_date", Date),
    ("school_year", Text),
    ("student_id", BigInt),
];

const ATTENDANCE_ENTRIES: Columns = &[
    ("id", BigInt),
    ("date", Date),
    ("school_year", Text),
    ("month", BigInt),
    ("has_attended", Bool),
    ("student_id", BigInt),
    ("class_id", BigInt),
];

const ATTENDANCE_LISTS: Columns = &[
    ("id", BigInt),
    ("date", Date),
    ("has_attended", Bool),
    ("student_id", BigInt),
    ("class_id", BigInt),
];

const WEEKLY_NOTES: Columns = &[
    ("id", BigInt),
    ("note", Text),
    ("school_year", Text),
    ("student_id", BigInt),
    ("class_id", BigInt),
];

/// Persisted tables reachable through the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Users,
    Classes,
    Subjects,
    Grades,
    Bills,
    AttendanceEntries,
    AttendanceLists,
    WeeklyNotes,
}

impl Table {
    pub const ALL: [Table; 8] = [
        Table::Users,
        Table::Classes,
        Table::Subjects,
        Table::Grades,
        Table::Bills,
        Table::AttendanceEntries,
        Table::AttendanceLists,
        Table::WeeklyNotes,
    ];

    pub fn for_resource(resource: ResourceType) -> Self {
        match resource {
            ResourceType::User => Table::Users,
            ResourceType::Class => Table::Classes,
            ResourceType::Subject => Table::Subjects,
            ResourceType::Grade => Table::Grades,
            ResourceType::Bill => Table::Bills,
            ResourceType::AttendanceEntry => Table::AttendanceEntries,
            ResourceType::AttendanceList => Table::AttendanceLists,
            ResourceType::WeeklyNote => Table::WeeklyNotes,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::Classes => "classes",
            Table::Subjects => "subjects",
            Table::Grades => "grades",
            Table::Bills => "bills",
            Table::AttendanceEntries => "attendance_entries",
            Table::AttendanceLists => "attendance_lists",
            Table::WeeklyNotes => "weekly_notes",
        }
    }

    /// Tables holding a restricting foreign key to this one, with the column.
    /// Enrollments cascade and are not listed.
    pub fn referenced_by(&self) -> &'static [(Table, &'static str)] {
        match self {
            Table::Users => &[
                (Table::Classes, "teacher_id"),
                (Table::Grades, "student_id"),
                (Table::Bills, "student_id"),
                (Table::AttendanceEntries, "student_id"),
                (Table::AttendanceLists, "student_id"),
                (Table::WeeklyNotes, "student_id"),
            ],
            Table::Classes => &[
                (Table::Grades, "class_id"),
                (Table::AttendanceEntries, "class_id"),
                (Table::AttendanceLists, "class_id"),
                (Table::WeeklyNotes, "class_id"),
            ],
            Table::Subjects => &[(Table::Classes, "subject_id")],
            Table::Grades | Table::Bills | Table::AttendanceEntries | Table::AttendanceLists | Table::WeeklyNotes => &[],
        }
    }

    /// Every column, `id` first.
    pub fn columns(&self) -> Columns {
        match self {
            Table::Users => USERS,
            Table::Classes => CLASSES,
            Table::Subjects => SUBJECTS,
            Table::Grades => GRADES,
            Table::Bills => BILLS,
            Table::AttendanceEntries => ATTENDANCE_ENTRIES,
            Table::AttendanceLists => ATTENDANCE_LISTS,
            Table::WeeklyNotes => WEEKLY_NOTES,
        }
    }
}
