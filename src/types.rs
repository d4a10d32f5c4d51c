/// Shared types used across the codebase

use serde::{Deserialize, Serialize};
use std::fmt;

/// Operations a requester can attempt on a resource.
/// Used by the role policy and by every resource handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Read,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn is_write(&self) -> bool {
        !matches!(self, Operation::Read)
    }
}

/// Every entity exposed over the HTTP surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    User,
    Class,
    Subject,
    Grade,
    Bill,
    AttendanceEntry,
    AttendanceList,
    WeeklyNote,
}

impl ResourceType {
    pub const ALL: [ResourceType; 8] = [
        ResourceType::User,
        ResourceType::Class,
        ResourceType::Subject,
        ResourceType::Grade,
        ResourceType::Bill,
        ResourceType::AttendanceEntry,
        ResourceType::AttendanceList,
        ResourceType::WeeklyNote,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::User => "user",
            ResourceType::Class => "class",
            ResourceType::Subject => "subject",
            ResourceType::Grade => "grade",
            ResourceType::Bill => "bill",
            ResourceType::AttendanceEntry => "attendance entry",
            ResourceType::AttendanceList => "attendance list",
            ResourceType::WeeklyNote => "weekly note",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operation::Read => "read",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        };
        f.write_str(s)
    }
}
