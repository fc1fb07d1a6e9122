//! Configuration handling for SchemaDelta

use serde::{Deserialize, Serialize};
use std::fs;

use crate::error::{Error, Result};
use crate::utils::naming::QuoteStyle;

/// Drivers accepted in the `[source]` and `[target]` sections
pub const SUPPORTED_DRIVERS: &[&str] = &["mysql", "postgres", "file"];

/// Load configuration from a TOML file
pub fn load_from_file(path: &str) -> Result<Config> {
    let config_str = fs::read_to_string(path)
        .map_err(|e| Error::ConfigError(format!("Failed to read config file: {}", e)))?;

    let config: Config = toml::from_str(&config_str)
        .map_err(|e| Error::ConfigError(format!("Failed to parse config file: {}", e)))?;

    config.validate()?;
    Ok(config)
}

/// Represents the complete SchemaDelta configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Database whose structure is being migrated
    pub source: DatabaseConfig,
    /// Database whose structure the source should end up matching
    pub target: DatabaseConfig,
    #[serde(default)]
    pub diff: DiffConfig,
    #[serde(default)]
    pub output: OutputConfig,
    pub logging: Option<LoggingConfig>,
}

impl Config {
    /// Check the values serde cannot check on its own
    pub fn validate(&self) -> Result<()> {
        self.source.validate("source")?;
        self.target.validate("target")?;

        if self.diff.detect_renames && self.diff.rename_suffix.is_empty() {
            return Err(Error::ConfigError(
                "diff.rename_suffix must not be empty when detect_renames is enabled".to_string(),
            ));
        }

        if self.output.path.trim().is_empty() {
            return Err(Error::ConfigError("output.path must not be empty".to_string()));
        }

        Ok(())
    }
}

/// Where one side's schema comes from
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// `mysql`, `postgres` or `file`
    pub driver: String,
    /// Connection URL, or the snapshot path for the `file` driver
    pub url: String,
    /// Schema to introspect; defaults to the connection's database
    pub schema: Option<String>,
    pub timeout_seconds: Option<u64>,
}

impl DatabaseConfig {
    fn validate(&self, side: &str) -> Result<()> {
        if !SUPPORTED_DRIVERS.contains(&self.driver.as_str()) {
            return Err(Error::ConfigError(format!(
                "Unsupported {} driver: {} (expected one of {})",
                side,
                self.driver,
                SUPPORTED_DRIVERS.join(", ")
            )));
        }

        if self.url.trim().is_empty() {
            return Err(Error::ConfigError(format!("{}.url must not be empty", side)));
        }

        if self.timeout_seconds == Some(0) {
            return Err(Error::ConfigError(format!(
                "{}.timeout_seconds must be greater than zero",
                side
            )));
        }

        Ok(())
    }
}

/// Target SQL dialect of the generated script
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    #[default]
    #[serde(alias = "mariadb")]
    Mysql,
    #[serde(alias = "postgresql")]
    Postgres,
    SqlServer,
}

impl Dialect {
    pub fn default_quote_style(self) -> QuoteStyle {
        match self {
            Dialect::Mysql => QuoteStyle::Backtick,
            Dialect::Postgres => QuoteStyle::DoubleQuote,
            Dialect::SqlServer => QuoteStyle::Bracket,
        }
    }

    /// Statement that opens the transactional wrapper
    pub fn begin_transaction(self) -> &'static str {
        match self {
            Dialect::Mysql => "START TRANSACTION",
            Dialect::Postgres => "BEGIN",
            Dialect::SqlServer => "BEGIN TRANSACTION",
        }
    }
}

/// What to do with a text default the quoting rules cannot represent
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnsafeDefaultPolicy {
    /// Fail with `UnrenderableDefault`
    #[default]
    Reject,
    /// Double embedded single quotes
    Escape,
    /// Emit the text unchanged inside single quotes
    Verbatim,
}

/// Schema comparison and script generation behavior
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct DiffConfig {
    pub detect_renames: bool,
    pub rename_suffix: String,
    /// Compare nullability and defaults, not just the column type
    pub compare_nullability_and_defaults: bool,
    /// Let nullable columns carry a non-NULL DEFAULT clause
    pub default_for_nullable_columns: bool,
    pub unsafe_default_policy: UnsafeDefaultPolicy,
    pub wrap_in_transaction: bool,
    pub dialect: Dialect,
    pub identifier_quote_style: Option<QuoteStyle>,
}

impl DiffConfig {
    /// Quote style in effect: the explicit override or the dialect's own
    pub fn quote_style(&self) -> QuoteStyle {
        self.identifier_quote_style
            .unwrap_or_else(|| self.dialect.default_quote_style())
    }
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            detect_renames: true,
            rename_suffix: "table".to_string(),
            compare_nullability_and_defaults: true,
            default_for_nullable_columns: false,
            unsafe_default_policy: UnsafeDefaultPolicy::default(),
            wrap_in_transaction: true,
            dialect: Dialect::default(),
            identifier_quote_style: None,
        }
    }
}

/// Script output configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub path: String,
    /// Prefix the file name with a UTC timestamp
    pub timestamped: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "update_script.sql".to_string(),
            timestamped: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    pub format: String,
    /// Console logging, written to stderr
    pub stdout: bool,
}
