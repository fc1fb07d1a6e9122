//! Logging utilities for SchemaDelta
//!
//! This module provides logging setup and configuration.

use std::fs::File;
use std::path::Path;
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::{Error, Result};

/// Where log lines go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    File(String),
    /// Console output. Always stderr, since stdout may carry a script or snapshot.
    Stderr,
    Off,
}

/// Resolve the configured target. A file wins over console output.
pub fn log_target(config: &LoggingConfig) -> LogTarget {
    match &config.file {
        Some(path) => LogTarget::File(path.clone()),
        None if config.stdout => LogTarget::Stderr,
        None => LogTarget::Off,
    }
}

/// Initialize logging based on configuration.
///
/// Returns `Ok(false)` when there is no `[logging]` section, so the caller
/// can install its own fallback subscriber.
pub fn init_logging(config: &Option<LoggingConfig>) -> Result<bool> {
    let config = match config {
        Some(cfg) => cfg,
        None => return Ok(false),
    };

    let level = parse_level(&config.level);
    let directive = format!("schema_delta={}", level)
        .parse()
        .map_err(|e| Error::ConfigError(format!("Invalid log directive: {}", e)))?;
    let env_filter = EnvFilter::from_default_env().add_directive(directive);
    let json = config.format.eq_ignore_ascii_case("json");

    match log_target(config) {
        LogTarget::File(file_path) => {
            if let Some(parent) = Path::new(&file_path).parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = File::create(&file_path)?;

            if json {
                let subscriber = fmt::Subscriber::builder()
                    .json()
                    .with_env_filter(env_filter)
                    .with_writer(file)
                    .finish();
                install(subscriber)?;
            } else {
                let subscriber = fmt::Subscriber::builder()
                    .with_env_filter(env_filter)
                    .with_writer(file)
                    .with_ansi(false)
                    .finish();
                install(subscriber)?;
            }
        }
        LogTarget::Stderr => {
            if json {
                let subscriber = fmt::Subscriber::builder()
                    .json()
                    .with_env_filter(env_filter)
                    .with_writer(std::io::stderr)
                    .finish();
                install(subscriber)?;
            } else {
                let subscriber = fmt::Subscriber::builder()
                    .with_env_filter(env_filter)
                    .with_writer(std::io::stderr)
                    .finish();
                install(subscriber)?;
            }
        }
        // Explicitly silenced
        LogTarget::Off => {}
    }

    Ok(true)
}

fn install<S>(subscriber: S) -> Result<()>
where
    S: tracing::Subscriber + Send + Sync + 'static,
{
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::ConfigError(format!("Failed to install logger: {}", e)))
}

/// Map a configured level name to a tracing level, defaulting to INFO
pub fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}
