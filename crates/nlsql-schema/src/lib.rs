//! Canonical in-memory schema representation.
//!
//! A [`SchemaModel`] is an ordered set of tables, each with an ordered list
//! of columns. Columns are either scalars or arbitrarily nested records.
//! The model is fed from three sources (live introspection, manual entry
//! via the builders, JSON import) and projects to two serializations: an
//! exact-reload JSON form and a one-way grounding text for the translator.

use std::fmt;

use thiserror::Error;

mod builder;
mod json;
mod text;

pub use builder::{ColumnsBuilder, TableBuilder};
pub use json::parse_table_fields;
pub use text::render;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("schema shape error: {0}")]
    Shape(String),
}

/// Nullability marker attached to every column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnMode {
    #[default]
    Nullable,
    Required,
}

impl ColumnMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnMode::Nullable => "NULLABLE",
            ColumnMode::Required => "REQUIRED",
        }
    }

    pub fn parse(s: &str) -> Result<Self, SchemaError> {
        match s {
            "NULLABLE" => Ok(ColumnMode::Nullable),
            "REQUIRED" => Ok(ColumnMode::Required),
            other => Err(SchemaError::Shape(format!("unknown column mode '{other}'"))),
        }
    }
}

impl fmt::Display for ColumnMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A column definition. Records nest recursively with no depth limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Column {
    Scalar {
        name: String,
        data_type: String,
        mode: ColumnMode,
    },
    Record {
        name: String,
        fields: Vec<Column>,
        mode: ColumnMode,
    },
}

impl Column {
    pub fn name(&self) -> &str {
        match self {
            Column::Scalar { name, .. } | Column::Record { name, .. } => name,
        }
    }

    pub fn mode(&self) -> ColumnMode {
        match self {
            Column::Scalar { mode, .. } | Column::Record { mode, .. } => *mode,
        }
    }
}

/// One table with its columns in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<Column>,
}

/// Ordered mapping from table name to columns. Table names are unique;
/// merge semantics are last-write-wins at table granularity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SchemaModel {
    tables: Vec<TableSchema>,
}

impl SchemaModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tables(&self) -> &[TableSchema] {
        &self.tables
    }

    pub fn get(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Merge tables into the model. An existing table with the same name is
    /// replaced wholesale (keeping its position); new tables are appended.
    pub fn merge(&mut self, incoming: impl IntoIterator<Item = TableSchema>) {
        for table in incoming {
            match self.tables.iter_mut().find(|t| t.name == table.name) {
                Some(existing) => *existing = table,
                None => self.tables.push(table),
            }
        }
    }

    /// Discard everything and install `other` verbatim (load-schema path).
    pub fn replace(&mut self, other: SchemaModel) {
        self.tables = other.tables;
    }

    /// Grounding-text projection, see [`text::render`].
    pub fn to_text(&self) -> String {
        text::render(self)
    }
}

impl FromIterator<TableSchema> for SchemaModel {
    fn from_iter<I: IntoIterator<Item = TableSchema>>(iter: I) -> Self {
        let mut model = SchemaModel::new();
        model.merge(iter);
        model
    }
}
