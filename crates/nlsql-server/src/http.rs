//! HTTP surface over the translation pipeline.
//!
//! All mutable state sits behind a single tokio mutex and every handler
//! holds the lock across its external call, so at most one translation or
//! execution is ever in flight — the concurrency contract of the core.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use nlsql_schema::{parse_table_fields, SchemaError, SchemaModel};
use nlsql_session::{
    write_csv, write_json, ExecutionError, ExportError, QueryExecutor, QuerySession,
    SessionError, ViewMode,
};
use nlsql_translate::TranslateError;

use crate::pg::PgExecutor;

pub struct App {
    pub schema: SchemaModel,
    pub session: QuerySession,
    pub executor: Option<PgExecutor>,
}

pub type SharedApp = Arc<Mutex<App>>;

pub fn router(app: SharedApp) -> Router {
    Router::new()
        .route("/api/schema", get(get_schema).put(put_schema))
        .route("/api/schema/text", get(get_schema_text))
        .route("/api/schema/tables", post(merge_table))
        .route("/api/schema/fetch", post(fetch_schema))
        .route("/api/translate", post(translate))
        .route("/api/feedback", post(feedback))
        .route("/api/execute", post(execute))
        .route("/api/history", get(history))
        .route("/api/history/select", post(select_history))
        .route("/api/view/toggle", post(toggle_view))
        .route("/api/view", get(current_view))
        .route("/api/results/export", get(export_results))
        .with_state(app)
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("no database configured for execution or introspection")]
    NoExecutor,

    #[error("no generated query to execute")]
    NoRound,

    #[error("no results to export")]
    NoResults,

    #[error("unknown export format '{0}' (expected 'csv' or 'json')")]
    UnknownFormat(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Schema(SchemaError::Parse(_)) => StatusCode::BAD_REQUEST,
            ApiError::Schema(SchemaError::Shape(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Session(SessionError::IndexOutOfRange { .. }) => StatusCode::NOT_FOUND,
            ApiError::Session(SessionError::NoActiveRound) => StatusCode::CONFLICT,
            ApiError::Session(SessionError::Translation(TranslateError::Generation(_))) => {
                StatusCode::BAD_GATEWAY
            }
            ApiError::Session(SessionError::Translation(TranslateError::EmptyResponse)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::Execution(ExecutionError::Syntax(_)) => StatusCode::BAD_REQUEST,
            ApiError::Execution(ExecutionError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Execution(ExecutionError::Connection(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Execution(ExecutionError::Other(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NoExecutor => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::NoRound | ApiError::NoResults => StatusCode::CONFLICT,
            ApiError::UnknownFormat(_) => StatusCode::BAD_REQUEST,
        };

        tracing::warn!(status = %status, error = %self, "request failed");
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

async fn get_schema(State(app): State<SharedApp>) -> Response {
    let app = app.lock().await;
    (
        [(header::CONTENT_TYPE, "application/json")],
        app.schema.to_json(),
    )
        .into_response()
}

async fn get_schema_text(State(app): State<SharedApp>) -> String {
    app.lock().await.schema.to_text()
}

/// Full overwrite from a saved JSON dump (the load-schema path).
async fn put_schema(
    State(app): State<SharedApp>,
    body: String,
) -> Result<Json<Value>, ApiError> {
    let incoming = SchemaModel::from_json(&body)?;
    let mut app = app.lock().await;
    let tables = incoming.len();
    app.schema.replace(incoming);
    Ok(Json(json!({ "tables": tables })))
}

#[derive(Deserialize)]
struct MergeTableRequest {
    table: String,
    fields: Value,
}

/// Merge one table from the `[{name, type, mode?, fields?}]` import form.
async fn merge_table(
    State(app): State<SharedApp>,
    Json(req): Json<MergeTableRequest>,
) -> Result<Json<Value>, ApiError> {
    let table = parse_table_fields(&req.table, &req.fields.to_string())?;
    let mut app = app.lock().await;
    app.schema.merge([table]);
    Ok(Json(json!({ "tables": app.schema.len() })))
}

/// Introspect the configured database and merge the discovered tables.
async fn fetch_schema(State(app): State<SharedApp>) -> Result<Json<Value>, ApiError> {
    let mut app = app.lock().await;
    let executor = app.executor.as_ref().ok_or(ApiError::NoExecutor)?;
    let tables = executor.fetch_schema().await?;
    let fetched = tables.len();
    app.schema.merge(tables);
    Ok(Json(json!({ "fetched": fetched, "tables": app.schema.len() })))
}

#[derive(Deserialize)]
struct TranslateRequest {
    question: String,
}

async fn translate(
    State(app): State<SharedApp>,
    Json(req): Json<TranslateRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut app = app.lock().await;
    let schema_text = app.schema.to_text();
    let round = app.session.submit(&req.question, &schema_text).await?;
    Ok(Json(serde_json::to_value(round).expect("round serializes")))
}

#[derive(Deserialize)]
struct FeedbackRequest {
    feedback: String,
}

async fn feedback(
    State(app): State<SharedApp>,
    Json(req): Json<FeedbackRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut app = app.lock().await;
    let schema_text = app.schema.to_text();
    let round = app.session.refine(&req.feedback, &schema_text).await?;
    Ok(Json(serde_json::to_value(round).expect("round serializes")))
}

/// Run the latest round's SQL and record the results on success.
async fn execute(State(app): State<SharedApp>) -> Result<Json<Value>, ApiError> {
    let mut app = app.lock().await;
    let sql = app
        .session
        .latest_round()
        .map(|r| r.sql_query.clone())
        .ok_or(ApiError::NoRound)?;
    let executor = app.executor.as_ref().ok_or(ApiError::NoExecutor)?;

    let results = executor.execute(&sql).await?;
    let payload = json!({
        "columns": results.columns,
        "rows": results.to_json_rows(),
        "row_count": results.row_count(),
    });
    app.session.record_execution(results);
    Ok(Json(payload))
}

async fn history(State(app): State<SharedApp>) -> Json<Value> {
    let app = app.lock().await;
    Json(serde_json::to_value(app.session.history()).expect("history serializes"))
}

#[derive(Deserialize)]
struct SelectHistoryRequest {
    index: usize,
}

async fn select_history(
    State(app): State<SharedApp>,
    Json(req): Json<SelectHistoryRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut app = app.lock().await;
    let round = app.session.select_history(req.index)?;
    Ok(Json(serde_json::to_value(round).expect("round serializes")))
}

async fn toggle_view(State(app): State<SharedApp>) -> Json<Value> {
    let mut app = app.lock().await;
    let mode = app.session.toggle();
    Json(json!({ "view": view_name(mode) }))
}

/// The read-side projection: the generated query or the last results.
async fn current_view(State(app): State<SharedApp>) -> Json<Value> {
    let app = app.lock().await;
    match (app.session.view_mode(), app.session.latest_results()) {
        (ViewMode::ShowingResults, Some(results)) => Json(json!({
            "view": "results",
            "columns": results.columns,
            "rows": results.to_json_rows(),
        })),
        _ => match app.session.latest_round() {
            Some(round) => Json(json!({
                "view": "query",
                "sql_query": round.sql_query,
                "explanation": round.explanation,
            })),
            None => Json(json!({ "view": "query" })),
        },
    }
}

#[derive(Deserialize)]
struct ExportParams {
    format: String,
}

async fn export_results(
    State(app): State<SharedApp>,
    Query(params): Query<ExportParams>,
) -> Result<Response, ApiError> {
    let app = app.lock().await;
    let results = app.session.latest_results().ok_or(ApiError::NoResults)?;

    let mut body = Vec::new();
    let content_type = match params.format.as_str() {
        "csv" => {
            write_csv(results, &mut body)?;
            "text/csv"
        }
        "json" => {
            write_json(results, &mut body)?;
            "application/json"
        }
        other => return Err(ApiError::UnknownFormat(other.to_string())),
    };

    Ok(([(header::CONTENT_TYPE, content_type)], body).into_response())
}

fn view_name(mode: ViewMode) -> &'static str {
    match mode {
        ViewMode::ShowingQuery => "query",
        ViewMode::ShowingResults => "results",
    }
}
