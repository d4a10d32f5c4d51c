use serde_json::Value;

use super::types::{Operator, Predicate, PredicateSet, SqlResult};

/// Renders a predicate set as a parameterised PostgreSQL WHERE clause.
pub struct FilterWhere {
    param_values: Vec<Value>,
    param_index: usize,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
        }
    }

    /// `starting_param_index` is the number of placeholders already used by
    /// the surrounding statement; the first one emitted here is that plus one.
    pub fn generate(predicates: &PredicateSet, starting_param_index: usize) -> SqlResult {
        let mut filter_where = Self::new(starting_param_index);
        let conditions: Vec<String> = predicates.iter().map(|p| filter_where.build_sql_condition(p)).collect();
        let query = if conditions.is_empty() {
            "1=1".to_string()
        } else {
            conditions.join(" AND ")
        };
        SqlResult { query, params: filter_where.param_values }
    }

    fn build_sql_condition(&mut self, predicate: &Predicate) -> String {
        let quoted_column = format!("\"{}\"", predicate.column);
        match predicate.operator {
            Operator::Eq => {
                if predicate.value.is_null() {
                    format!("{} IS NULL", quoted_column)
                } else {
                    format!("{} = {}", quoted_column, self.param(predicate.value.clone()))
                }
            }
            Operator::Contains => {
                let needle = match &predicate.value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                format!("{} ILIKE {}", quoted_column, self.param(Value::String(format!("%{}%", escape_like(&needle)))))
            }
            Operator::InClassesTaughtBy => format!(
                "{} IN (SELECT \"id\" FROM \"classes\" WHERE \"teacher_id\" = {})",
                quoted_column,
                self.param(predicate.value.clone())
            ),
            Operator::InClassesAttendedBy => format!(
                "{} IN (SELECT \"class_id\" FROM \"students_classes\" WHERE \"student_id\" = {})",
                quoted_column,
                self.param(predicate.value.clone())
            ),
            Operator::InRosterOf => format!(
                "{} IN (SELECT sc.\"student_id\" FROM \"students_classes\" sc JOIN \"classes\" c ON c.\"id\" = sc.\"class_id\" WHERE c.\"teacher_id\" = {})",
                quoted_column,
                self.param(predicate.value.clone())
            ),
        }
    }

    fn param(&mut self, value: Value) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
