//! Error types for SchemaDelta

use thiserror::Error;

/// Result type for SchemaDelta operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for SchemaDelta
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Introspection error: {0}")]
    IntrospectionError(String),

    #[error("Duplicate table `{0}` (table names are case-insensitive)")]
    DuplicateTable(String),

    #[error("Duplicate column `{column}` in table `{table}` (column names are case-insensitive)")]
    DuplicateColumn { table: String, column: String },

    #[error("Ambiguous rename: tables {} all map to `{candidate}`", .tables.join(", "))]
    AmbiguousRename {
        candidate: String,
        tables: Vec<String>,
    },

    #[error("Default value {value:?} of column `{column}` cannot be rendered safely")]
    UnrenderableDefault { column: String, value: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Convert Serde JSON errors to SchemaDelta errors
impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::SerializationError(error.to_string())
    }
}

/// Convert TOML deserialization errors to SchemaDelta errors
impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Error::ConfigError(error.to_string())
    }
}
