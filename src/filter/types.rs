use serde::Serialize;
use serde_json::Value;

/// Comparison applied by one predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq,
    /// Case-insensitive substring match.
    Contains,
    /// Column holds the id of a class taught by the teacher in `value`.
    InClassesTaughtBy,
    /// Column holds the id of a class the student in `value` is enrolled in.
    InClassesAttendedBy,
    /// Column holds the id of a student enrolled in any class taught by `value`.
    InRosterOf,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Predicate {
    pub column: &'static str,
    pub operator: Operator,
    pub value: Value,
}

impl Predicate {
    pub fn new(column: &'static str, operator: Operator, value: impl Into<Value>) -> Self {
        Self { column, operator, value: value.into() }
    }

    pub fn eq(column: &'static str, value: impl Into<Value>) -> Self {
        Self::new(column, Operator::Eq, value)
    }
}

/// Ordered conjunction of predicates. Immutable once built; `and` returns a new set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PredicateSet(Vec<Predicate>);

impl PredicateSet {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn and(mut self, predicate: Predicate) -> Self {
        self.0.push(predicate);
        self
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Predicate> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Predicate>> for PredicateSet {
    fn from(predicates: Vec<Predicate>) -> Self {
        Self(predicates)
    }
}

impl<'a> IntoIterator for &'a PredicateSet {
    type Item = &'a Predicate;
    type IntoIter = std::slice::Iter<'a, Predicate>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// How a raw query-string value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Integer,
    Text,
    /// Text, upper-cased.
    Weekday,
}

/// One recognised query parameter for a resource.
#[derive(Debug, Clone, Copy)]
pub struct FilterKey {
    pub param: &'static str,
    pub column: &'static str,
    pub operator: Operator,
    pub kind: ValueKind,
}

impl FilterKey {
    pub const fn eq(param: &'static str, column: &'static str, kind: ValueKind) -> Self {
        Self { param, column, operator: Operator::Eq, kind }
    }

    pub const fn contains(param: &'static str, column: &'static str) -> Self {
        Self { param, column, operator: Operator::Contains, kind: ValueKind::Text }
    }
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<Value>,
}
