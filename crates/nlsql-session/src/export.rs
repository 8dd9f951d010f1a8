//! Result-set export: CSV (header + positional rows) and pretty JSON
//! (array of row objects, 4-space indent, ISO dates).

use std::io::Write;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use thiserror::Error;

use crate::ResultSet;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON write failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// First row is the column names; data rows follow positionally.
pub fn write_csv<W: Write>(results: &ResultSet, writer: W) -> Result<(), ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(&results.columns)?;
    for row in &results.rows {
        csv_writer.write_record(row.iter().map(|cell| cell.render()))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Pretty-printed JSON array of row objects with 4-space indentation.
pub fn write_json<W: Write>(results: &ResultSet, writer: W) -> Result<(), ExportError> {
    let rows = serde_json::Value::Array(results.to_json_rows());
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(writer, formatter);
    rows.serialize(&mut serializer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Cell;
    use chrono::NaiveDate;

    fn sample() -> ResultSet {
        ResultSet {
            columns: vec!["id".into(), "day".into(), "note".into()],
            rows: vec![
                vec![
                    Cell::Int(1),
                    Cell::Date(NaiveDate::from_ymd_opt(2024, 3, 7).unwrap()),
                    Cell::Text("first".into()),
                ],
                vec![Cell::Int(2), Cell::Null, Cell::Text("with, comma".into())],
            ],
        }
    }

    #[test]
    fn csv_has_header_then_positional_rows() {
        let mut buf = Vec::new();
        write_csv(&sample(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("id,day,note"));
        assert_eq!(lines.next(), Some("1,2024-03-07,first"));
        // Embedded comma gets quoted by the writer.
        assert_eq!(lines.next(), Some("2,,\"with, comma\""));
    }

    #[test]
    fn json_is_pretty_with_four_space_indent_and_iso_dates() {
        let mut buf = Vec::new();
        write_json(&sample(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.contains("    {"));
        assert!(text.contains("        \"day\": \"2024-03-07\""));

        // Still valid JSON with both rows.
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 2);
    }
}
