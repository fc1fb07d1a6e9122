//! Schema difference calculator
//!
//! This module compares two schema snapshots and lists the statements that
//! turn the first into the second.

use crate::error::Result;
use crate::schema::format::ColumnFormatter;
use crate::schema::types::SchemaSnapshot;
use crate::utils::naming::QuoteStyle;

/// One create/alter/drop step. Column definitions are already formatted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffStatement {
    CreateTable { table: String, columns: Vec<String> },
    AddColumn { table: String, definition: String },
    ModifyColumn { table: String, definition: String },
    DropTable { table: String },
    DropColumn { table: String, column: String },
}

impl DiffStatement {
    /// Render without terminator
    pub fn to_sql(&self, quote: QuoteStyle) -> String {
        match self {
            DiffStatement::CreateTable { table, columns } => {
                format!("CREATE TABLE {} ({})", quote.quote(table), columns.join(", "))
            }
            DiffStatement::AddColumn { table, definition } => {
                format!("ALTER TABLE {} ADD COLUMN {}", quote.quote(table), definition)
            }
            DiffStatement::ModifyColumn { table, definition } => {
                format!("ALTER TABLE {} MODIFY COLUMN {}", quote.quote(table), definition)
            }
            DiffStatement::DropTable { table } => format!("DROP TABLE {}", quote.quote(table)),
            DiffStatement::DropColumn { table, column } => format!(
                "ALTER TABLE {} DROP COLUMN {}",
                quote.quote(table),
                quote.quote(column)
            ),
        }
    }

    pub fn is_removal(&self) -> bool {
        matches!(
            self,
            DiffStatement::DropTable { .. } | DiffStatement::DropColumn { .. }
        )
    }
}

/// Ordered changes needed to synchronize two schemas
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaDiff {
    /// Additions and modifications in target order, then removals in source order
    pub statements: Vec<DiffStatement>,
}

impl SchemaDiff {
    /// Generate a schema diff between two snapshots
    pub fn generate(
        source: &SchemaSnapshot,
        target: &SchemaSnapshot,
        formatter: &ColumnFormatter,
    ) -> Result<Self> {
        let mut statements = Self::additions(source, target, formatter)?;
        statements.extend(Self::removals(source, target));

        Ok(Self { statements })
    }

    fn additions(
        source: &SchemaSnapshot,
        target: &SchemaSnapshot,
        formatter: &ColumnFormatter,
    ) -> Result<Vec<DiffStatement>> {
        let mut statements = Vec::new();

        for target_table in target.tables() {
            let Some(source_table) = source.table(&target_table.name) else {
                let columns = target_table
                    .columns
                    .iter()
                    .map(|col| formatter.format(col))
                    .collect::<Result<Vec<_>>>()?;

                statements.push(DiffStatement::CreateTable {
                    table: target_table.name.clone(),
                    columns,
                });
                continue;
            };

            for target_col in &target_table.columns {
                let Some(source_col) = source_table.column(&target_col.name) else {
                    statements.push(DiffStatement::AddColumn {
                        table: source_table.name.clone(),
                        definition: formatter.format(target_col)?,
                    });
                    continue;
                };

                if !formatter.equivalent(source_col, target_col) {
                    tracing::debug!(
                        table = %source_table.name,
                        column = %target_col.name,
                        "Column definition changed"
                    );
                    statements.push(DiffStatement::ModifyColumn {
                        table: source_table.name.clone(),
                        definition: formatter.format(target_col)?,
                    });
                }
            }
        }

        Ok(statements)
    }

    fn removals(source: &SchemaSnapshot, target: &SchemaSnapshot) -> Vec<DiffStatement> {
        let mut statements = Vec::new();

        for source_table in source.tables() {
            let Some(target_table) = target.table(&source_table.name) else {
                statements.push(DiffStatement::DropTable {
                    table: source_table.name.clone(),
                });
                continue;
            };

            statements.extend(
                source_table
                    .columns
                    .iter()
                    .filter(|col| !target_table.has_column(&col.name))
                    .map(|col| DiffStatement::DropColumn {
                        table: source_table.name.clone(),
                        column: col.name.clone(),
                    }),
            );
        }

        statements
    }

    /// Check if the diff is empty (no changes needed)
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn removal_count(&self) -> usize {
        self.statements.iter().filter(|s| s.is_removal()).count()
    }
}
