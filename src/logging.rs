//! Task Shell Logging System
//!
//! Diagnostics go to stderr (or a file), never to stdout: stdout carries the
//! rendered results.

use std::io;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

/// Environment variable naming a file to log into instead of stderr
pub const ENV_LOG_FILE: &str = "TSH_LOG_FILE";

/// Logging configuration options
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum log level to output
    pub level: Level,
    /// Enable colored output
    pub color: bool,
    pub show_timestamps: bool,
    pub show_target: bool,
    /// Enable JSON format for machine parsing
    pub json_format: bool,
    /// Output to file instead of stderr
    pub file_output: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            color: true,
            show_timestamps: false,
            show_target: false,
            json_format: false,
            file_output: None,
        }
    }
}

impl LoggingConfig {
    /// Create config from CLI arguments
    pub fn from_args(quiet: bool, verbose: bool, json: bool) -> Self {
        use std::io::IsTerminal;

        let level = if verbose {
            Level::DEBUG
        } else if quiet {
            Level::ERROR
        } else {
            Level::WARN
        };

        Self {
            level,
            color: !quiet && !json && io::stderr().is_terminal(),
            show_timestamps: verbose || json,
            show_target: verbose,
            json_format: json,
            file_output: std::env::var(ENV_LOG_FILE)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
        }
    }

    /// Directive used when `RUST_LOG` is not set
    pub fn default_directive(&self) -> String {
        format!("task_shell={}", self.level)
    }
}

/// Initialize the logging system
pub fn init_logging(config: LoggingConfig) -> io::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_directive()));

    let registry = Registry::default().with(env_filter);

    if let Some(log_file) = config.file_output {
        let dir = log_file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let name = log_file.file_name().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "Invalid log file name")
        })?;
        std::fs::create_dir_all(&dir)?;
        let file_appender = tracing_appender::rolling::never(dir, name);

        if config.json_format {
            let json_layer = fmt::layer()
                .json()
                .with_span_events(FmtSpan::CLOSE)
                .with_writer(file_appender);
            json_layer.with_subscriber(registry).init();
        } else {
            fmt::layer()
                .with_target(config.show_target)
                .with_level(true)
                .with_ansi(false)
                .with_timer(fmt::time::ChronoUtc::rfc_3339())
                .with_writer(file_appender)
                .with_subscriber(registry)
                .init();
        }
    } else if config.json_format {
        let json_layer = fmt::layer()
            .json()
            .with_span_events(FmtSpan::CLOSE)
            .with_writer(io::stderr);
        json_layer.with_subscriber(registry).init();
    } else {
        let fmt_layer = fmt::layer()
            .with_target(config.show_target)
            .with_level(true)
            .with_ansi(config.color)
            .with_writer(io::stderr);

        if config.show_timestamps {
            fmt_layer
                .with_timer(fmt::time::ChronoUtc::rfc_3339())
                .with_subscriber(registry)
                .init();
        } else {
            fmt_layer.without_time().with_subscriber(registry).init();
        }
    }

    Ok(())
}
