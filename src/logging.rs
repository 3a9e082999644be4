//! Structured logging initialisation
//!
//! The router itself only emits `tracing` events. Applications that do not
//! install their own subscriber can call [`init_logging`] or
//! [`init_logging_with_config`] once at startup to get JSON (production) or
//! pretty (development) output filtered through an `EnvFilter`.
//!
//! ## Environment Variables
//!
//! - `JERSEY_LOG_LEVEL` - `trace`/`debug`/`info`/`warn`/`error` (default `info`)
//! - `JERSEY_LOG_FORMAT` - `json` or `pretty` (default `json`)
//! - `JERSEY_LOG_ASYNC` - write through a non-blocking appender (default `false`)
//! - `JERSEY_LOG_TARGET_FILTER` - extra comma separated filter directives,
//!   e.g. `jersey_router::routing=debug`
//!
//! `RUST_LOG`, when set, replaces the level-derived base filter.

use anyhow::{Context, Result};
use std::env;
use tracing::{Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Log format: JSON for production, pretty-print for development
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level: trace/debug/info/warn/error
    pub log_level: String,
    pub format: LogFormat,
    /// Write through `tracing_appender::non_blocking`
    pub async_logging: bool,
    /// Extra filter directives (comma-separated)
    pub target_filter: Option<String>,
    /// Include file:line location (dev only)
    pub include_location: bool,
}

impl LogConfig {
    /// Parse configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            log_level: env::var("JERSEY_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: LogFormat::parse(
                &env::var("JERSEY_LOG_FORMAT").unwrap_or_else(|_| "json".to_string()),
            ),
            async_logging: env::var("JERSEY_LOG_ASYNC")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(false),
            target_filter: env::var("JERSEY_LOG_TARGET_FILTER").ok(),
            include_location: false,
        }
    }

    pub fn default_dev() -> Self {
        Self {
            log_level: "debug".to_string(),
            format: LogFormat::Pretty,
            async_logging: false,
            target_filter: None,
            include_location: true,
        }
    }

    pub fn default_prod() -> Self {
        Self {
            log_level: "info".to_string(),
            format: LogFormat::Json,
            async_logging: true,
            target_filter: None,
            include_location: false,
        }
    }

    fn level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }

    /// Base filter plus any valid `target_filter` directives; invalid
    /// directives are skipped.
    pub fn env_filter(&self) -> EnvFilter {
        let mut env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level().as_str()));
        if let Some(target_filter) = &self.target_filter {
            for filter in target_filter.split(',') {
                let filter = filter.trim();
                if filter.is_empty() {
                    continue;
                }
                match filter.parse() {
                    Ok(directive) => env_filter = env_filter.add_directive(directive),
                    Err(_) => eprintln!("Warning: Invalid log filter directive: {}", filter),
                }
            }
        }
        env_filter
    }
}

/// Initialise logging from the environment, overriding the level.
///
/// # Example
///
/// ```no_run
/// let _guard = jersey_router::logging::init_logging("debug").expect("logging");
/// ```
pub fn init_logging(log_level: &str) -> Result<Option<WorkerGuard>> {
    let mut config = LogConfig::from_env();
    config.log_level = log_level.to_string();
    init_logging_with_config(&config)
}

/// Install the global subscriber described by `config`.
///
/// In async mode the returned guard owns the background writer; buffered
/// events are flushed when it is dropped, so hold it until shutdown.
/// Fails when a global subscriber is already installed.
pub fn init_logging_with_config(config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let registry = tracing_subscriber::registry().with(config.env_filter());

    if config.async_logging {
        let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
        registry
            .with(fmt_layer(config, writer))
            .try_init()
            .context("Failed to initialize async logging")?;
        Ok(Some(guard))
    } else {
        registry
            .with(fmt_layer(config, std::io::stdout))
            .try_init()
            .context("Failed to initialize sync logging")?;
        Ok(None)
    }
}

fn fmt_layer<S, W>(config: &LogConfig, writer: W) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_writer(writer);
    match config.format {
        LogFormat::Json => layer
            .json()
            .with_current_span(true)
            .with_thread_ids(true)
            .boxed(),
        LogFormat::Pretty => layer.pretty().boxed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_defaults() {
        let dev = LogConfig::default_dev();
        assert_eq!(dev.log_level, "debug");
        assert_eq!(dev.format, LogFormat::Pretty);
        assert!(!dev.async_logging);
        assert!(dev.include_location);

        let prod = LogConfig::default_prod();
        assert_eq!(prod.format, LogFormat::Json);
        assert!(prod.async_logging);
        assert!(!prod.include_location);
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse("PRETTY"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("invalid"), LogFormat::Json);
    }

    #[test]
    fn test_level_parse() {
        let mut config = LogConfig::default_prod();
        config.log_level = "WARN".to_string();
        assert_eq!(config.level(), Level::WARN);
        config.log_level = "verbose".to_string();
        assert_eq!(config.level(), Level::INFO);
    }

    #[test]
    fn test_env_filter_skips_invalid_directives() {
        let mut config = LogConfig::default_dev();
        config.target_filter = Some("jersey_router::routing=trace, ,=[".to_string());
        let rendered = config.env_filter().to_string();
        assert!(rendered.contains("jersey_router::routing=trace"), "{rendered}");
        assert!(!rendered.contains('['), "{rendered}");
    }

    #[test]
    fn test_fmt_layer_builds_both_formats() {
        for format in [LogFormat::Json, LogFormat::Pretty] {
            let mut config = LogConfig::default_dev();
            config.format = format;
            let subscriber = tracing_subscriber::registry().with(fmt_layer(&config, std::io::sink));
            tracing::subscriber::with_default(subscriber, || {
                tracing::info!(route_pattern = "/books/{isbn}", "Route matched");
            });
        }
    }
}
