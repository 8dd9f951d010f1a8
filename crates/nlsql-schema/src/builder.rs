//! Builders for manually-entered schemas.
//!
//! Entry-time invariants are enforced here rather than in the model: every
//! name and type must be non-empty and a user-authored record needs at
//! least one field. Loaded/imported schemas bypass the builders and are
//! allowed to be looser (see the JSON codec).

use crate::{Column, ColumnMode, SchemaError, TableSchema};

/// Accumulates a column list; nest one inside another for RECORD columns.
#[derive(Debug, Default)]
pub struct ColumnsBuilder {
    columns: Vec<Column>,
}

impl ColumnsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scalar(
        mut self,
        name: impl Into<String>,
        data_type: impl Into<String>,
        mode: ColumnMode,
    ) -> Result<Self, SchemaError> {
        let name = name.into();
        let data_type = data_type.into();
        if name.is_empty() {
            return Err(SchemaError::Shape("column name must be non-empty".into()));
        }
        if data_type.is_empty() {
            return Err(SchemaError::Shape(format!(
                "column '{name}' must have a non-empty type"
            )));
        }
        self.columns.push(Column::Scalar {
            name,
            data_type,
            mode,
        });
        Ok(self)
    }

    pub fn record(
        mut self,
        name: impl Into<String>,
        fields: ColumnsBuilder,
        mode: ColumnMode,
    ) -> Result<Self, SchemaError> {
        let name = name.into();
        if name.is_empty() {
            return Err(SchemaError::Shape("column name must be non-empty".into()));
        }
        if fields.columns.is_empty() {
            return Err(SchemaError::Shape(format!(
                "record column '{name}' needs at least one nested field"
            )));
        }
        self.columns.push(Column::Record {
            name,
            fields: fields.columns,
            mode,
        });
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Builds one [`TableSchema`]; `build` is the explicit confirmation step.
#[derive(Debug)]
pub struct TableBuilder {
    name: String,
    columns: ColumnsBuilder,
}

impl TableBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: ColumnsBuilder::new(),
        }
    }

    pub fn scalar(
        mut self,
        name: impl Into<String>,
        data_type: impl Into<String>,
        mode: ColumnMode,
    ) -> Result<Self, SchemaError> {
        self.columns = self.columns.scalar(name, data_type, mode)?;
        Ok(self)
    }

    pub fn record(
        mut self,
        name: impl Into<String>,
        fields: ColumnsBuilder,
        mode: ColumnMode,
    ) -> Result<Self, SchemaError> {
        self.columns = self.columns.record(name, fields, mode)?;
        Ok(self)
    }

    pub fn build(self) -> Result<TableSchema, SchemaError> {
        if self.name.is_empty() {
            return Err(SchemaError::Shape("table name must be non-empty".into()));
        }
        if self.columns.is_empty() {
            return Err(SchemaError::Shape(format!(
                "table '{}' needs at least one column",
                self.name
            )));
        }
        Ok(TableSchema {
            name: self.name,
            columns: self.columns.columns,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_nested_table() {
        let nested = ColumnsBuilder::new()
            .scalar("price", "FLOAT", ColumnMode::Nullable)
            .unwrap()
            .scalar("quantity", "INTEGER", ColumnMode::Required)
            .unwrap();

        let table = TableBuilder::new("orders")
            .scalar("id", "INTEGER", ColumnMode::Required)
            .unwrap()
            .record("details", nested, ColumnMode::Nullable)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(table.name, "orders");
        assert_eq!(table.columns.len(), 2);
        match &table.columns[1] {
            Column::Record { fields, .. } => assert_eq!(fields.len(), 2),
            other => panic!("expected record, got {other:?}"),
        }
    }

    #[test]
    fn rejects_empty_record() {
        let err = TableBuilder::new("orders")
            .record("details", ColumnsBuilder::new(), ColumnMode::Nullable)
            .unwrap_err();
        assert!(err.to_string().contains("nested field"));
    }

    #[test]
    fn rejects_table_without_columns() {
        assert!(TableBuilder::new("orders").build().is_err());
    }

    #[test]
    fn rejects_empty_names_and_types() {
        assert!(TableBuilder::new("t").scalar("", "INTEGER", ColumnMode::Nullable).is_err());
        assert!(TableBuilder::new("t").scalar("id", "", ColumnMode::Nullable).is_err());
        assert!(TableBuilder::new("")
            .scalar("id", "INTEGER", ColumnMode::Nullable)
            .unwrap()
            .build()
            .is_err());
    }
}
