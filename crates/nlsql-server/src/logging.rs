//! Structured logging setup: pretty/json/compact formats to stdout, a
//! daily-rolling file, or both, driven by the logging section of the
//! config.

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
    Compact,
}

impl LogFormat {
    fn parse(s: &str) -> Self {
        match s {
            "json" => LogFormat::Json,
            "compact" => LogFormat::Compact,
            _ => LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    Stdout,
    File,
    Both,
}

impl LogOutput {
    fn parse(s: &str) -> Self {
        match s {
            "file" => LogOutput::File,
            "both" => LogOutput::Both,
            _ => LogOutput::Stdout,
        }
    }
}

/// Initialize the global subscriber from the config. Call once at startup.
pub fn init(config: &LoggingConfig) {
    let format = LogFormat::parse(&config.format);
    let output = LogOutput::parse(&config.output);

    let env_filter = EnvFilter::try_new(&config.level)
        .unwrap_or_else(|_| EnvFilter::new("info"))
        // Quiet the noisy HTTP internals
        .add_directive("hyper=warn".parse().expect("valid directive"))
        .add_directive("tokio=warn".parse().expect("valid directive"))
        .add_directive("tower=warn".parse().expect("valid directive"))
        .add_directive("h2=warn".parse().expect("valid directive"));

    // Boxed layers in a Vec so one registry shape covers every combination.
    let mut layers = Vec::new();

    if matches!(output, LogOutput::Stdout | LogOutput::Both) {
        layers.push(match format {
            LogFormat::Pretty => fmt::layer().pretty().with_target(true).boxed(),
            LogFormat::Json => fmt::layer().json().with_current_span(true).boxed(),
            LogFormat::Compact => fmt::layer().compact().boxed(),
        });
    }

    if matches!(output, LogOutput::File | LogOutput::Both) {
        std::fs::create_dir_all(&config.directory).ok();
        let appender = RollingFileAppender::new(Rotation::DAILY, &config.directory, "nlsql.log");
        layers.push(fmt::layer().with_writer(appender).with_ansi(false).boxed());
    }

    tracing_subscriber::registry().with(env_filter).with(layers).init();

    tracing::info!(?format, ?output, "logging initialized");
}
