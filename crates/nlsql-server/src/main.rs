//! nlsql server: natural-language questions in, schema-grounded SQL out.
//!
//! Wires the schema model, the OpenAI-backed translator and the session
//! state machine behind an HTTP API, with an optional Postgres collaborator
//! for execution and schema introspection.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use nlsql_schema::SchemaModel;
use nlsql_session::QuerySession;
use nlsql_translate::{OpenAiGenerator, QueryTranslator};

mod config;
mod http;
mod logging;
mod pg;

use config::Config;
use http::App;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config_path =
        std::env::var("NLSQL_CONFIG").unwrap_or_else(|_| "config.yaml".to_string());
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            // Fall back to defaults so a bare checkout still starts.
            eprintln!("could not load {config_path} ({e}), using defaults");
            Config::default()
        }
    };

    logging::init(&config.logging);

    let api_key = Config::openai_api_key()?;
    let openai_config = async_openai::config::OpenAIConfig::new().with_api_key(api_key);
    let openai_client = async_openai::Client::with_config(openai_config);

    let dialect = config.dialect()?;
    info!(dialect = dialect.name(), model = %config.translator.model, "translator configured");

    let translator = QueryTranslator::new(
        Box::new(OpenAiGenerator::new(
            openai_client,
            config.translator.model.clone(),
        )),
        dialect,
    )
    .with_max_tokens(config.translator.max_tokens);

    let executor = match &config.database.url {
        Some(url) => {
            let executor = pg::PgExecutor::connect(url).await?;
            info!("database connection established");
            Some(executor)
        }
        None => {
            warn!("no database configured; execution and introspection disabled");
            None
        }
    };

    let app = Arc::new(Mutex::new(App {
        schema: SchemaModel::new(),
        session: QuerySession::new(translator),
        executor,
    }));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!(%addr, "starting nlsql server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, http::router(app)).await?;

    Ok(())
}
