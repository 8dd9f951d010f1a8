//! Exact-reload JSON serialization of the schema model.
//!
//! The wire shape is an object keyed by table name, each value an array of
//! field objects `{name, type, mode, fields?}`. A field with
//! `type: "RECORD"` carries its nested fields; everything else is a scalar.
//! The same field shape is accepted by the per-table import funnel.

use serde_json::{json, Map, Value};

use crate::{Column, ColumnMode, SchemaError, SchemaModel, TableSchema};

const RECORD_TYPE: &str = "RECORD";

impl SchemaModel {
    /// Serialize the full model. Table and column order is preserved.
    pub fn to_json(&self) -> String {
        let mut root = Map::new();
        for table in self.tables() {
            let fields: Vec<Value> = table.columns.iter().map(column_to_value).collect();
            root.insert(table.name.clone(), Value::Array(fields));
        }
        serde_json::to_string(&Value::Object(root)).expect("schema JSON cannot fail to serialize")
    }

    /// Parse a full model from its JSON dump. Invalid JSON surfaces as
    /// [`SchemaError::Parse`]; structurally wrong JSON as
    /// [`SchemaError::Shape`]. Nothing is mutated on failure.
    pub fn from_json(text: &str) -> Result<SchemaModel, SchemaError> {
        let root: Value = serde_json::from_str(text)?;
        let obj = root
            .as_object()
            .ok_or_else(|| SchemaError::Shape("top level must be an object of tables".into()))?;

        let mut model = SchemaModel::new();
        for (table_name, fields) in obj {
            if table_name.is_empty() {
                return Err(SchemaError::Shape("table name must be non-empty".into()));
            }
            model.merge([TableSchema {
                name: table_name.clone(),
                columns: parse_fields(fields, table_name)?,
            }]);
        }
        Ok(model)
    }
}

/// Parse one table's fields from the `[{name, type, mode?, fields?}]`
/// import format (the JSON-entry funnel).
pub fn parse_table_fields(table_name: &str, text: &str) -> Result<TableSchema, SchemaError> {
    if table_name.is_empty() {
        return Err(SchemaError::Shape("table name must be non-empty".into()));
    }
    let fields: Value = serde_json::from_str(text)?;
    Ok(TableSchema {
        name: table_name.to_string(),
        columns: parse_fields(&fields, table_name)?,
    })
}

fn column_to_value(col: &Column) -> Value {
    match col {
        Column::Scalar {
            name,
            data_type,
            mode,
        } => json!({
            "name": name,
            "type": data_type,
            "mode": mode.as_str(),
        }),
        Column::Record { name, fields, mode } => {
            let nested: Vec<Value> = fields.iter().map(column_to_value).collect();
            json!({
                "name": name,
                "type": RECORD_TYPE,
                "mode": mode.as_str(),
                "fields": nested,
            })
        }
    }
}

fn parse_fields(value: &Value, context: &str) -> Result<Vec<Column>, SchemaError> {
    let items = value.as_array().ok_or_else(|| {
        SchemaError::Shape(format!("'{context}' must map to an array of fields"))
    })?;
    items.iter().map(|f| parse_field(f, context)).collect()
}

fn parse_field(value: &Value, context: &str) -> Result<Column, SchemaError> {
    let obj = value
        .as_object()
        .ok_or_else(|| SchemaError::Shape(format!("field in '{context}' must be an object")))?;

    let name = obj
        .get("name")
        .and_then(Value::as_str)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| {
            SchemaError::Shape(format!("field in '{context}' is missing a non-empty 'name'"))
        })?;

    let data_type = obj
        .get("type")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            SchemaError::Shape(format!("field '{context}.{name}' is missing a non-empty 'type'"))
        })?;

    // Missing mode defaults to NULLABLE, matching warehouse conventions.
    let mode = match obj.get("mode") {
        None => ColumnMode::Nullable,
        Some(Value::String(s)) => ColumnMode::parse(s)?,
        Some(_) => {
            return Err(SchemaError::Shape(format!(
                "field '{context}.{name}' has a non-string 'mode'"
            )))
        }
    };

    if data_type == RECORD_TYPE {
        // A loaded Record may legally be empty, but the 'fields' key itself
        // is required to distinguish a record from a malformed scalar.
        let nested = obj.get("fields").ok_or_else(|| {
            SchemaError::Shape(format!(
                "RECORD field '{context}.{name}' is missing its 'fields' array"
            ))
        })?;
        Ok(Column::Record {
            name: name.to_string(),
            fields: parse_fields(nested, &format!("{context}.{name}"))?,
            mode,
        })
    } else {
        Ok(Column::Scalar {
            name: name.to_string(),
            data_type: data_type.to_string(),
            mode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_model() -> SchemaModel {
        [
            TableSchema {
                name: "orders".into(),
                columns: vec![
                    Column::Scalar {
                        name: "id".into(),
                        data_type: "INTEGER".into(),
                        mode: ColumnMode::Required,
                    },
                    Column::Record {
                        name: "details".into(),
                        fields: vec![
                            Column::Scalar {
                                name: "price".into(),
                                data_type: "FLOAT".into(),
                                mode: ColumnMode::Nullable,
                            },
                            Column::Record {
                                name: "shipping".into(),
                                fields: vec![Column::Scalar {
                                    name: "carrier".into(),
                                    data_type: "STRING".into(),
                                    mode: ColumnMode::Nullable,
                                }],
                                mode: ColumnMode::Nullable,
                            },
                        ],
                        mode: ColumnMode::Nullable,
                    },
                ],
            },
            TableSchema {
                name: "users".into(),
                columns: vec![Column::Scalar {
                    name: "email".into(),
                    data_type: "STRING".into(),
                    mode: ColumnMode::Nullable,
                }],
            },
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn json_round_trip_preserves_order_nesting_and_modes() {
        let model = sample_model();
        let reloaded = SchemaModel::from_json(&model.to_json()).unwrap();
        assert_eq!(reloaded, model);
    }

    #[test]
    fn from_json_rejects_invalid_json() {
        assert!(matches!(
            SchemaModel::from_json("{not json"),
            Err(SchemaError::Parse(_))
        ));
    }

    #[test]
    fn from_json_rejects_record_without_fields() {
        let text = r#"{"orders": [{"name": "details", "type": "RECORD", "mode": "NULLABLE"}]}"#;
        let err = SchemaModel::from_json(text).unwrap_err();
        assert!(matches!(err, SchemaError::Shape(_)));
        assert!(err.to_string().contains("fields"));
    }

    #[test]
    fn from_json_rejects_missing_name_or_type() {
        let missing_name = r#"{"orders": [{"type": "INTEGER"}]}"#;
        assert!(matches!(
            SchemaModel::from_json(missing_name),
            Err(SchemaError::Shape(_))
        ));

        let empty_type = r#"{"orders": [{"name": "id", "type": ""}]}"#;
        assert!(matches!(
            SchemaModel::from_json(empty_type),
            Err(SchemaError::Shape(_))
        ));
    }

    #[test]
    fn loaded_record_may_be_empty() {
        let text = r#"{"orders": [{"name": "details", "type": "RECORD", "fields": []}]}"#;
        let model = SchemaModel::from_json(text).unwrap();
        match &model.get("orders").unwrap().columns[0] {
            Column::Record { fields, .. } => assert!(fields.is_empty()),
            other => panic!("expected record, got {other:?}"),
        }
    }

    #[test]
    fn parse_table_fields_defaults_mode_to_nullable() {
        let table =
            parse_table_fields("events", r#"[{"name": "ts", "type": "TIMESTAMP"}]"#).unwrap();
        assert_eq!(table.columns[0].mode(), ColumnMode::Nullable);
    }
}
