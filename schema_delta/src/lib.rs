//! SchemaDelta: compares two database schemas and writes the DDL that turns one into the other
//!
//! The comparison itself ([`plan_migration`]) is a pure function of two
//! [`SchemaSnapshot`]s and a [`DiffConfig`]. [`SchemaDeltaClient`] wraps it with
//! introspection of live databases (or snapshot files) and script output.

pub mod config;
pub mod db;
pub mod error;
pub mod output;
pub mod schema;
pub mod utils;

use std::path::PathBuf;

// Re-export main types for easier access
pub use config::{Config, DiffConfig};
pub use db::connection::DatabaseConnection;
pub use error::{Error, Result};
pub use schema::analyzer::SchemaAnalyzer;
pub use schema::diff::SchemaDiff;
pub use schema::generator::{plan_migration, MigrationPlan, MigrationScript};
pub use schema::types::SchemaSnapshot;

/// Initialize SchemaDelta with the specified configuration file
pub fn init(config_path: &str) -> Result<SchemaDeltaClient> {
    let config = config::load_from_file(config_path)?;
    Ok(SchemaDeltaClient::new(config))
}

/// The main client for interacting with SchemaDelta
pub struct SchemaDeltaClient {
    config: Config,
}

impl SchemaDeltaClient {
    /// Create a new SchemaDelta client from configuration
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Introspect both sides concurrently.
    ///
    /// Each side releases its own connection before its result is inspected,
    /// so a failure on one side never leaks the other's.
    pub async fn capture_snapshots(&self) -> Result<(SchemaSnapshot, SchemaSnapshot)> {
        let source_analyzer = SchemaAnalyzer::new(&self.config.source);
        let target_analyzer = SchemaAnalyzer::new(&self.config.target);

        let (source, target) = tokio::join!(source_analyzer.snapshot(), target_analyzer.snapshot());

        let source = source?;
        let target = target?;
        tracing::info!(
            source_tables = source.len(),
            target_tables = target.len(),
            "Captured schema snapshots"
        );

        Ok((source, target))
    }

    /// Introspect both sides and compute the migration plan
    pub async fn generate_plan(&self) -> Result<MigrationPlan> {
        let (source, target) = self.capture_snapshots().await?;
        plan_migration(&source, &target, &self.config.diff)
    }

    /// Complete workflow: introspect, diff, and write the script file
    pub async fn sync(&self) -> Result<PathBuf> {
        let plan = self.generate_plan().await?;

        if plan.is_empty() {
            tracing::info!("Source schema already matches target");
        }

        output::write_script(&plan.script, &self.config.output)
    }
}
