//! PostgreSQL collaborator: query execution and schema introspection.

use async_trait::async_trait;
use tokio_postgres::error::SqlState;
use tokio_postgres::types::Type;
use tokio_postgres::{Client, NoTls, Row};

use nlsql_schema::{Column, ColumnMode, TableSchema};
use nlsql_session::{Cell, ExecutionError, QueryExecutor, ResultSet};

pub struct PgExecutor {
    client: Client,
}

impl PgExecutor {
    /// Connect and spawn the connection task. A refused or misconfigured
    /// connection surfaces as [`ExecutionError::Connection`].
    pub async fn connect(url: &str) -> Result<Self, ExecutionError> {
        let (client, connection) = tokio_postgres::connect(url, NoTls)
            .await
            .map_err(|e| ExecutionError::Connection(e.to_string()))?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(error = %e, "postgres connection task ended");
            }
        });

        Ok(Self { client })
    }

    /// Introspect the public schema into table definitions, ordered by
    /// table name and ordinal position. Postgres columns are always flat
    /// scalars here; nesting only arrives via import or manual entry.
    pub async fn fetch_schema(&self) -> Result<Vec<TableSchema>, ExecutionError> {
        let rows = self
            .client
            .query(
                "SELECT table_name, column_name, data_type, is_nullable
                 FROM information_schema.columns
                 WHERE table_schema = 'public'
                 ORDER BY table_name, ordinal_position",
                &[],
            )
            .await
            .map_err(map_pg_error)?;

        let mut tables: Vec<TableSchema> = Vec::new();
        for row in rows {
            let table_name: String = row.get(0);
            let column = Column::Scalar {
                name: row.get(1),
                data_type: row.get(2),
                mode: if row.get::<_, String>(3) == "YES" {
                    ColumnMode::Nullable
                } else {
                    ColumnMode::Required
                },
            };

            match tables.last_mut() {
                Some(table) if table.name == table_name => table.columns.push(column),
                _ => tables.push(TableSchema {
                    name: table_name,
                    columns: vec![column],
                }),
            }
        }

        tracing::info!(tables = tables.len(), "schema introspection complete");
        Ok(tables)
    }
}

#[async_trait]
impl QueryExecutor for PgExecutor {
    async fn execute(&self, sql: &str) -> Result<ResultSet, ExecutionError> {
        tracing::debug!(sql = %sql, "executing query");

        let statement = self.client.prepare(sql).await.map_err(map_pg_error)?;
        let rows = self
            .client
            .query(&statement, &[])
            .await
            .map_err(map_pg_error)?;

        let columns: Vec<String> = statement
            .columns()
            .iter()
            .map(|col| col.name().to_string())
            .collect();

        let mut result_rows = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut cells = Vec::with_capacity(columns.len());
            for (idx, col) in statement.columns().iter().enumerate() {
                cells.push(decode_cell(row, idx, col.type_()));
            }
            result_rows.push(cells);
        }

        Ok(ResultSet {
            columns,
            rows: result_rows,
        })
    }
}

fn map_pg_error(e: tokio_postgres::Error) -> ExecutionError {
    match e.code() {
        Some(code) if *code == SqlState::SYNTAX_ERROR => ExecutionError::Syntax(e.to_string()),
        Some(code) if *code == SqlState::UNDEFINED_TABLE || *code == SqlState::UNDEFINED_OBJECT => {
            ExecutionError::NotFound(e.to_string())
        }
        Some(_) => ExecutionError::Other(e.to_string()),
        // No SQLSTATE means the failure happened below the protocol.
        None => ExecutionError::Connection(e.to_string()),
    }
}

/// Decode one column by its wire type, falling back to the text form for
/// anything without a dedicated [`Cell`] variant. Undecodable values
/// become NULL rather than failing the whole result.
fn decode_cell(row: &Row, idx: usize, pg_type: &Type) -> Cell {
    match *pg_type {
        Type::BOOL => row
            .try_get::<_, Option<bool>>(idx)
            .ok()
            .flatten()
            .map(Cell::Bool)
            .unwrap_or(Cell::Null),
        Type::INT2 => row
            .try_get::<_, Option<i16>>(idx)
            .ok()
            .flatten()
            .map(|v| Cell::Int(v.into()))
            .unwrap_or(Cell::Null),
        Type::INT4 => row
            .try_get::<_, Option<i32>>(idx)
            .ok()
            .flatten()
            .map(|v| Cell::Int(v.into()))
            .unwrap_or(Cell::Null),
        Type::INT8 => row
            .try_get::<_, Option<i64>>(idx)
            .ok()
            .flatten()
            .map(Cell::Int)
            .unwrap_or(Cell::Null),
        Type::FLOAT4 => row
            .try_get::<_, Option<f32>>(idx)
            .ok()
            .flatten()
            .map(|v| Cell::Float(v.into()))
            .unwrap_or(Cell::Null),
        Type::FLOAT8 => row
            .try_get::<_, Option<f64>>(idx)
            .ok()
            .flatten()
            .map(Cell::Float)
            .unwrap_or(Cell::Null),
        Type::DATE => row
            .try_get::<_, Option<chrono::NaiveDate>>(idx)
            .ok()
            .flatten()
            .map(Cell::Date)
            .unwrap_or(Cell::Null),
        Type::TIMESTAMP => row
            .try_get::<_, Option<chrono::NaiveDateTime>>(idx)
            .ok()
            .flatten()
            .map(|v| Cell::Timestamp(v.and_utc()))
            .unwrap_or(Cell::Null),
        Type::TIMESTAMPTZ => row
            .try_get::<_, Option<chrono::DateTime<chrono::Utc>>>(idx)
            .ok()
            .flatten()
            .map(Cell::Timestamp)
            .unwrap_or(Cell::Null),
        _ => row
            .try_get::<_, Option<String>>(idx)
            .ok()
            .flatten()
            .map(Cell::Text)
            .unwrap_or(Cell::Null),
    }
}
