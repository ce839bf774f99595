//! Logging setup shared by the report binaries.

use std::env;
use std::io;
use std::net::SocketAddr;

use thiserror::Error;
use tracing::info;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

const DEFAULT_LEVEL: &str = "info";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

/// Where events are written. Stderr by default so report output on stdout
/// stays machine-readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogWriter {
    Stdout,
    Stderr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    pub writer: LogWriter,
    pub include_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL.to_string(),
            format: LogFormat::Compact,
            writer: LogWriter::Stderr,
            include_target: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum LoggingInitError {
    #[error("logging already initialized: {0}")]
    AlreadyInitialized(#[from] tracing::subscriber::SetGlobalDefaultError),
}

pub fn logging_config_from_env() -> LoggingConfig {
    let mut config = LoggingConfig::default();

    if let Some(level) = env_value("SENSORFEAT_LOG_LEVEL") {
        config.level = level;
    }
    if let Some(format) = env_value("SENSORFEAT_LOG_FORMAT").and_then(|v| parse_log_format(&v)) {
        config.format = format;
    }
    if let Some(writer) = env_value("SENSORFEAT_LOG_WRITER").and_then(|v| parse_writer(&v)) {
        config.writer = writer;
    }
    if let Some(target) = env_value("SENSORFEAT_LOG_TARGET").and_then(|v| parse_bool(&v)) {
        config.include_target = target;
    }

    config
}

pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingInitError> {
    let env_filter =
        EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL));
    let writer = match config.writer {
        LogWriter::Stdout => BoxMakeWriter::new(io::stdout),
        LogWriter::Stderr => BoxMakeWriter::new(io::stderr),
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(config.include_target)
        .with_writer(writer)
        .with_ansi(!matches!(config.format, LogFormat::Json));

    match config.format {
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
        LogFormat::Pretty => tracing::subscriber::set_global_default(builder.pretty().finish())?,
        LogFormat::Compact => {
            tracing::subscriber::set_global_default(builder.compact().finish())?
        }
    }

    Ok(())
}

pub fn log_app_start(component: &'static str, config: &LoggingConfig) {
    info!(
        component,
        event = "app.start",
        log_level = %config.level,
        log_format = ?config.format,
        log_writer = ?config.writer
    );
}

pub fn log_app_bind(bound_addr: SocketAddr) {
    info!(
        component = "report_server",
        event = "app.bind",
        bind_addr = %bound_addr,
        route = "/report"
    );
}

pub fn log_source_selected(
    component: &'static str,
    source: &str,
    seed: Option<u64>,
    points: usize,
) {
    match seed {
        Some(seed) => info!(
            component,
            event = "source.selected",
            source,
            seed,
            points
        ),
        None => info!(
            component,
            event = "source.selected",
            source,
            seed = "entropy",
            points
        ),
    }
}

fn env_value(key: &str) -> Option<String> {
    let raw = env::var(key).ok()?;
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_log_format(raw: &str) -> Option<LogFormat> {
    match raw.to_ascii_lowercase().as_str() {
        "json" => Some(LogFormat::Json),
        "pretty" => Some(LogFormat::Pretty),
        "compact" => Some(LogFormat::Compact),
        _ => None,
    }
}

fn parse_writer(raw: &str) -> Option<LogWriter> {
    match raw.to_ascii_lowercase().as_str() {
        "stdout" => Some(LogWriter::Stdout),
        "stderr" => Some(LogWriter::Stderr),
        _ => None,
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
