//! Result-set value model and the execution collaborator interface.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors reported by an execution collaborator. The three named kinds are
/// surfaced distinctly; everything else falls into `Other`.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("invalid SQL, please check the syntax: {0}")]
    Syntax(String),

    #[error("table or dataset not found: {0}")]
    NotFound(String),

    #[error("execution failed: {0}")]
    Other(String),
}

/// Executes one SQL statement against the target database.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, sql: &str) -> Result<ResultSet, ExecutionError>;
}

/// One cell of a result row. Date-like values keep their typed form until
/// serialization, where they render as ISO-8601 strings.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
}

impl Cell {
    pub fn to_json(&self) -> Value {
        match self {
            Cell::Null => Value::Null,
            Cell::Bool(b) => Value::Bool(*b),
            Cell::Int(i) => Value::from(*i),
            Cell::Float(f) => Value::from(*f),
            Cell::Text(s) => Value::String(s.clone()),
            // NaiveDate displays as YYYY-MM-DD.
            Cell::Date(d) => Value::String(d.to_string()),
            Cell::Timestamp(ts) => Value::String(ts.to_rfc3339()),
        }
    }

    /// Plain-text form used for CSV cells. NULL becomes an empty field.
    pub fn render(&self) -> String {
        match self {
            Cell::Null => String::new(),
            Cell::Bool(b) => b.to_string(),
            Cell::Int(i) => i.to_string(),
            Cell::Float(f) => f.to_string(),
            Cell::Text(s) => s.clone(),
            Cell::Date(d) => d.to_string(),
            Cell::Timestamp(ts) => ts.to_rfc3339(),
        }
    }
}

/// Ordered result rows with their column names.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl ResultSet {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Row objects in column order, one JSON object per row.
    pub fn to_json_rows(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| {
                let mut obj = Map::new();
                for (name, cell) in self.columns.iter().zip(row) {
                    obj.insert(name.clone(), cell.to_json());
                }
                Value::Object(obj)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_serialize_as_iso_8601() {
        let d = Cell::Date(NaiveDate::from_ymd_opt(2024, 3, 7).unwrap());
        assert_eq!(d.to_json(), Value::String("2024-03-07".into()));

        let ts = Cell::Timestamp(
            DateTime::parse_from_rfc3339("2024-03-07T12:30:00Z")
                .unwrap()
                .with_timezone(&Utc),
        );
        assert_eq!(
            ts.to_json(),
            Value::String("2024-03-07T12:30:00+00:00".into())
        );
    }

    #[test]
    fn json_rows_keep_column_order() {
        let results = ResultSet {
            columns: vec!["z".into(), "a".into()],
            rows: vec![vec![Cell::Int(1), Cell::Text("x".into())]],
        };
        let rows = results.to_json_rows();
        let obj = rows[0].as_object().unwrap();
        let keys: Vec<&String> = obj.keys().collect();
        assert_eq!(keys, ["z", "a"]);
    }

    #[test]
    fn null_renders_as_empty_csv_field() {
        assert_eq!(Cell::Null.render(), "");
        assert_eq!(Cell::Null.to_json(), Value::Null);
    }
}
