//! Configuration for the nlsql server.
//!
//! Loaded from a YAML file; environment variables always override the file
//! values. Secrets (the OpenAI API key, the database URL password) come
//! from the environment only, typically via a `.env` file.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use nlsql_translate::Dialect;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("unknown dialect '{0}' (expected 'bigquery' or 'postgres')")]
    InvalidDialect(String),

    #[error("dialect 'bigquery' requires translator.project_id and translator.dataset")]
    MissingBigQueryIdentifiers,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatorConfig {
    /// Target dialect: "bigquery" or "postgres"
    pub dialect: String,

    /// OpenAI model id
    pub model: String,

    /// Output-length budget per translation call
    pub max_tokens: u32,

    /// Warehouse project, required for the bigquery dialect
    #[serde(default)]
    pub project_id: Option<String>,

    /// Warehouse dataset, required for the bigquery dialect
    #[serde(default)]
    pub dataset: Option<String>,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            dialect: "postgres".to_string(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: 200,
            project_id: None,
            dataset: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres connection string; execution and introspection are
    /// disabled when absent.
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or per-module directives
    pub level: String,

    /// Output format: pretty, json, compact
    pub format: String,

    /// Output destination: stdout, file, both
    pub output: String,

    /// Directory for log files
    pub directory: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            output: "stdout".to_string(),
            directory: "./logs".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub translator: TranslatorConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load from YAML with environment overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&contents)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    // Overrides go through a lookup closure so tests can inject values
    // without touching the process environment.
    fn apply_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = var("NLSQL_SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("NLSQL_SERVER_PORT") {
            if let Ok(port_num) = port.parse() {
                self.server.port = port_num;
            }
        }

        if let Some(dialect) = var("NLSQL_DIALECT") {
            self.translator.dialect = dialect;
        }
        if let Some(model) = var("NLSQL_MODEL") {
            self.translator.model = model;
        }
        if let Some(project) = var("NLSQL_PROJECT_ID") {
            self.translator.project_id = Some(project);
        }
        if let Some(dataset) = var("NLSQL_DATASET") {
            self.translator.dataset = Some(dataset);
        }

        if let Some(url) = var("DATABASE_URL") {
            self.database.url = Some(url);
        }

        if let Some(level) = var("RUST_LOG") {
            self.logging.level = level;
        }
        if let Some(format) = var("LOG_FORMAT") {
            self.logging.format = format;
        }
        if let Some(output) = var("LOG_OUTPUT") {
            self.logging.output = output;
        }
        if let Some(dir) = var("LOG_DIR") {
            self.logging.directory = dir;
        }
    }

    /// Resolve the translator dialect from the string form.
    pub fn dialect(&self) -> Result<Dialect, ConfigError> {
        match self.translator.dialect.as_str() {
            "postgres" => Ok(Dialect::Postgres),
            "bigquery" => {
                match (&self.translator.project_id, &self.translator.dataset) {
                    (Some(project_id), Some(dataset)) => Ok(Dialect::BigQuery {
                        project_id: project_id.clone(),
                        dataset: dataset.clone(),
                    }),
                    _ => Err(ConfigError::MissingBigQueryIdentifiers),
                }
            }
            other => Err(ConfigError::InvalidDialect(other.to_string())),
        }
    }

    /// OpenAI API key, environment only (usually via .env).
    pub fn openai_api_key() -> Result<String, ConfigError> {
        std::env::var("OPENAI_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("OPENAI_API_KEY".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.translator.dialect, "postgres");
        assert_eq!(config.translator.max_tokens, 200);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");
    }

    const SAMPLE_YAML: &str = r#"
server:
  host: "127.0.0.1"
  port: 8080
translator:
  dialect: "postgres"
  model: "gpt-4o-mini"
  max_tokens: 200
logging:
  level: "info"
  format: "pretty"
  output: "stdout"
  directory: "./logs"
"#;

    #[test]
    fn load_reads_yaml_file() {
        let temp_file = std::env::temp_dir().join("nlsql_test_config.yaml");
        std::fs::write(&temp_file, SAMPLE_YAML).unwrap();

        let config = Config::load(&temp_file).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.translator.model, "gpt-4o-mini");

        std::fs::remove_file(temp_file).ok();
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut config: Config = serde_yaml::from_str(SAMPLE_YAML).unwrap();
        config.apply_overrides(|key| match key {
            "NLSQL_SERVER_PORT" => Some("9090".to_string()),
            "NLSQL_DIALECT" => Some("bigquery".to_string()),
            _ => None,
        });

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.translator.dialect, "bigquery");
        // Keys without an override keep their file values.
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.translator.model, "gpt-4o-mini");
    }

    #[test]
    fn unparsable_port_override_is_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|key| {
            (key == "NLSQL_SERVER_PORT").then(|| "not-a-port".to_string())
        });
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn bigquery_dialect_requires_identifiers() {
        let mut config = Config::default();
        config.translator.dialect = "bigquery".to_string();
        assert!(matches!(
            config.dialect(),
            Err(ConfigError::MissingBigQueryIdentifiers)
        ));

        config.translator.project_id = Some("p".into());
        config.translator.dataset = Some("d".into());
        assert!(matches!(config.dialect(), Ok(Dialect::BigQuery { .. })));
    }

    #[test]
    fn unknown_dialect_is_rejected() {
        let mut config = Config::default();
        config.translator.dialect = "oracle".to_string();
        assert!(matches!(
            config.dialect(),
            Err(ConfigError::InvalidDialect(_))
        ));
    }
}
