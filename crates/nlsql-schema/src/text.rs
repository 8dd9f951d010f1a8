//! Grounding-text projection of the schema model.
//!
//! This text is the only schema context the translation model sees, so it
//! spells out nesting, types and modes in full. It is deliberately one-way:
//! there is no parser back from text to [`SchemaModel`].

use crate::{Column, SchemaModel};

/// Render the model in the prompt format:
///
/// ```text
/// Tables:
/// - orders (id INTEGER MODE(REQUIRED), details RECORD(price FLOAT MODE(NULLABLE)) MODE(NULLABLE))
/// ```
pub fn render(schema: &SchemaModel) -> String {
    let mut out = String::from("Tables:\n");
    for table in schema.tables() {
        out.push_str(&format!(
            "- {} ({})\n",
            table.name,
            columns_to_text(&table.columns)
        ));
    }
    out
}

fn columns_to_text(columns: &[Column]) -> String {
    columns
        .iter()
        .map(|col| match col {
            Column::Scalar {
                name,
                data_type,
                mode,
            } => format!("{name} {data_type} MODE({mode})"),
            Column::Record { name, fields, mode } => {
                format!("{name} RECORD({}) MODE({mode})", columns_to_text(fields))
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}
