//! Migration script generator
//!
//! This module assembles renames and diff statements into the final script.

use std::fmt;

use crate::config::{Dialect, DiffConfig};
use crate::error::Result;
use crate::schema::diff::SchemaDiff;
use crate::schema::format::ColumnFormatter;
use crate::schema::rename::{detect_renames, RenameOp};
use crate::schema::types::SchemaSnapshot;
use crate::utils::naming::QuoteStyle;

/// Statement terminator shared by every supported dialect
pub const TERMINATOR: &str = ";";

/// Ordered, terminated script lines
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationScript {
    pub statements: Vec<String>,
}

impl MigrationScript {
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.statements.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

impl fmt::Display for MigrationScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for statement in &self.statements {
            writeln!(f, "{}", statement)?;
        }
        Ok(())
    }
}

/// Migration SQL generator
pub struct ScriptGenerator {
    dialect: Dialect,
    quote_style: QuoteStyle,
    wrap_in_transaction: bool,
}

impl ScriptGenerator {
    /// Create a new script generator
    pub fn new(config: &DiffConfig) -> Self {
        Self {
            dialect: config.dialect,
            quote_style: config.quote_style(),
            wrap_in_transaction: config.wrap_in_transaction,
        }
    }

    /// Renames first (outside the transaction), then the wrapped diff statements
    pub fn generate(&self, renames: &[RenameOp], diff: &SchemaDiff) -> MigrationScript {
        let mut statements = Vec::with_capacity(renames.len() + diff.len() + 2);

        for rename in renames {
            statements.push(self.terminate(format!(
                "RENAME TABLE {} TO {}",
                self.quote_style.quote(&rename.from),
                self.quote_style.quote(&rename.to)
            )));
        }

        if self.wrap_in_transaction {
            statements.push(self.terminate(self.dialect.begin_transaction().to_string()));
        }

        statements.extend(
            diff.statements
                .iter()
                .map(|statement| self.terminate(statement.to_sql(self.quote_style))),
        );

        if self.wrap_in_transaction {
            statements.push(self.terminate("COMMIT".to_string()));
        }

        MigrationScript { statements }
    }

    fn terminate(&self, mut statement: String) -> String {
        statement.push_str(TERMINATOR);
        statement
    }
}

/// Everything one diff run produces
#[derive(Debug, Clone)]
pub struct MigrationPlan {
    pub renames: Vec<RenameOp>,
    pub diff: SchemaDiff,
    pub script: MigrationScript,
}

impl MigrationPlan {
    /// True when applying the script would change nothing
    pub fn is_empty(&self) -> bool {
        self.renames.is_empty() && self.diff.is_empty()
    }
}

/// Compare two snapshots and build the script turning `source` into `target`
pub fn plan_migration(
    source: &SchemaSnapshot,
    target: &SchemaSnapshot,
    config: &DiffConfig,
) -> Result<MigrationPlan> {
    let (renames, revised_source) = if config.detect_renames {
        detect_renames(source, target, &config.rename_suffix)?
    } else {
        (Vec::new(), source.clone())
    };

    let formatter = ColumnFormatter::new(config);
    let diff = SchemaDiff::generate(&revised_source, target, &formatter)?;
    let script = ScriptGenerator::new(config).generate(&renames, &diff);

    tracing::info!(
        renames = renames.len(),
        statements = diff.len(),
        removals = diff.removal_count(),
        "Migration plan generated"
    );

    Ok(MigrationPlan {
        renames,
        diff,
        script,
    })
}
