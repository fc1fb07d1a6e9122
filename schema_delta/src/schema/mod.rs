//! Schema module for SchemaDelta
//!
//! This module handles schema introspection, comparison, and script generation.

pub mod analyzer;
pub mod diff;
pub mod format;
pub mod generator;
pub mod rename;
pub mod types;

// Re-export key types
pub use analyzer::{FileIntrospector, Introspector, SchemaAnalyzer};
pub use diff::{DiffStatement, SchemaDiff};
pub use format::{ColumnFormatter, DefaultKind};
pub use generator::{plan_migration, MigrationPlan, MigrationScript, ScriptGenerator};
pub use rename::{detect_renames, RenameOp};
pub use types::{Column, KeyRole, RawColumnRecord, SchemaSnapshot, Table};
