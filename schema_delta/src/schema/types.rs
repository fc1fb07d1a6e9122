//! Type definitions for schema snapshots

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{Error, Result};
use crate::utils::naming::{fold_case, names_match};

/// One row of column metadata, exactly as the introspection query returns it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RawColumnRecord {
    pub table_name: String,
    pub column_name: String,
    pub column_type: String,
    #[serde(default)]
    pub column_key: String,
    /// `YES` or `NO`
    pub is_nullable: String,
    #[serde(default)]
    pub column_default: Option<String>,
}

/// Key role of a column. Carried through, never compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum KeyRole {
    Primary,
    Unique,
    /// First column of a non-unique index
    Multiple,
    #[default]
    None,
}

impl KeyRole {
    /// Parse the `COLUMN_KEY` marker (`PRI`, `UNI`, `MUL` or empty)
    pub fn parse(marker: &str) -> Option<Self> {
        match marker.trim().to_uppercase().as_str() {
            "PRI" => Some(KeyRole::Primary),
            "UNI" => Some(KeyRole::Unique),
            "MUL" => Some(KeyRole::Multiple),
            "" => Some(KeyRole::None),
            _ => None,
        }
    }

    pub fn as_marker(self) -> &'static str {
        match self {
            KeyRole::Primary => "PRI",
            KeyRole::Unique => "UNI",
            KeyRole::Multiple => "MUL",
            KeyRole::None => "",
        }
    }
}

/// Represents a table column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    /// Database type text, compared verbatim and never parsed
    pub sql_type: String,
    pub key: KeyRole,
    pub nullable: bool,
    pub default: Option<String>,
}

impl Column {
    /// Create a NOT NULL column without key role or default
    pub fn new(name: &str, sql_type: &str) -> Self {
        Self {
            name: name.to_string(),
            sql_type: sql_type.to_string(),
            key: KeyRole::None,
            nullable: false,
            default: None,
        }
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn with_default(mut self, default: &str) -> Self {
        self.default = Some(default.to_string());
        self
    }

    pub fn with_key(mut self, key: KeyRole) -> Self {
        self.key = key;
        self
    }
}

impl TryFrom<&RawColumnRecord> for Column {
    type Error = Error;

    fn try_from(record: &RawColumnRecord) -> Result<Self> {
        let nullable = match record.is_nullable.trim().to_uppercase().as_str() {
            "YES" => true,
            "NO" => false,
            other => {
                return Err(Error::IntrospectionError(format!(
                    "Column {}.{} has unrecognized nullability flag {:?}",
                    record.table_name, record.column_name, other
                )))
            }
        };

        let key = KeyRole::parse(&record.column_key).ok_or_else(|| {
            Error::IntrospectionError(format!(
                "Column {}.{} has unrecognized key marker {:?}",
                record.table_name, record.column_name, record.column_key
            ))
        })?;

        if record.column_name.is_empty() || record.column_type.is_empty() {
            return Err(Error::IntrospectionError(format!(
                "Table {} has a column record without name or type",
                record.table_name
            )));
        }

        Ok(Self {
            name: record.column_name.clone(),
            sql_type: record.column_type.clone(),
            key,
            nullable,
            default: record.column_default.clone(),
        })
    }
}

/// Represents a database table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    /// Columns in introspection order
    pub columns: Vec<Column>,
}

impl Table {
    /// Create a new table with the given name
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            columns: Vec::new(),
        }
    }

    /// Builder-style column append, for assembling tables by hand
    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Case-insensitive column lookup
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|col| names_match(&col.name, name))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    fn push_column(&mut self, column: Column) -> Result<()> {
        if self.has_column(&column.name) {
            return Err(Error::DuplicateColumn {
                table: self.name.clone(),
                column: column.name,
            });
        }
        self.columns.push(column);
        Ok(())
    }
}

/// Immutable view of one database's tables at introspection time.
///
/// Tables keep the order in which they were first seen; lookups ignore case
/// while the stored names keep their original casing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SchemaSnapshot {
    tables: IndexMap<String, Table>,
}

impl SchemaSnapshot {
    /// Snapshot with no tables
    pub fn empty() -> Self {
        Self::default()
    }

    /// Group raw column records into tables
    pub fn from_records<'a, I>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a RawColumnRecord>,
    {
        let mut tables: IndexMap<String, Table> = IndexMap::new();

        for record in records {
            let column = Column::try_from(record)?;
            let table = tables
                .entry(fold_case(&record.table_name))
                .or_insert_with(|| Table::new(&record.table_name));

            // Same folded key, different spelling: two distinct tables collide
            if table.name != record.table_name {
                return Err(Error::DuplicateTable(record.table_name.clone()));
            }

            table.push_column(column)?;
        }

        Ok(Self { tables })
    }

    /// Build a snapshot from already-assembled tables, checking name uniqueness
    pub fn from_tables<I>(tables: I) -> Result<Self>
    where
        I: IntoIterator<Item = Table>,
    {
        let mut snapshot = IndexMap::new();

        for table in tables {
            let mut checked = Table::new(&table.name);
            for column in table.columns {
                checked.push_column(column)?;
            }

            let key = fold_case(&checked.name);
            if snapshot.contains_key(&key) {
                return Err(Error::DuplicateTable(checked.name));
            }
            snapshot.insert(key, checked);
        }

        Ok(Self { tables: snapshot })
    }

    /// Case-insensitive table lookup
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(&fold_case(name))
    }

    pub fn contains_table(&self, name: &str) -> bool {
        self.tables.contains_key(&fold_case(name))
    }

    /// Tables in snapshot order
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.values().map(|t| t.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Flatten back into raw records, e.g. for writing a snapshot file
    pub fn to_records(&self) -> Vec<RawColumnRecord> {
        self.tables()
            .flat_map(|table| {
                table.columns.iter().map(move |col| RawColumnRecord {
                    table_name: table.name.clone(),
                    column_name: col.name.clone(),
                    column_type: col.sql_type.clone(),
                    column_key: col.key.as_marker().to_string(),
                    is_nullable: if col.nullable { "YES" } else { "NO" }.to_string(),
                    column_default: col.default.clone(),
                })
            })
            .collect()
    }

    /// New snapshot with one table re-keyed under `new_name`, keeping its position
    pub(crate) fn with_table_renamed(&self, old_name: &str, new_name: &str) -> Result<Self> {
        let old_key = fold_case(old_name);
        let new_key = fold_case(new_name);

        if old_key != new_key && self.tables.contains_key(&new_key) {
            return Err(Error::DuplicateTable(new_name.to_string()));
        }

        let tables = self
            .tables
            .iter()
            .map(|(key, table)| {
                if *key == old_key {
                    let mut renamed = table.clone();
                    renamed.name = new_name.to_string();
                    (new_key.clone(), renamed)
                } else {
                    (key.clone(), table.clone())
                }
            })
            .collect();

        Ok(Self { tables })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(table: &str, column: &str, nullable: &str) -> RawColumnRecord {
        RawColumnRecord {
            table_name: table.to_string(),
            column_name: column.to_string(),
            column_type: "int".to_string(),
            column_key: String::new(),
            is_nullable: nullable.to_string(),
            column_default: None,
        }
    }

    #[test]
    fn records_group_by_first_appearance() {
        let records = vec![
            record("orders", "id", "NO"),
            record("customer", "id", "NO"),
            record("orders", "total", "YES"),
        ];

        let snapshot = SchemaSnapshot::from_records(&records).unwrap();

        assert_eq!(snapshot.table_names(), vec!["orders", "customer"]);
        let orders = snapshot.table("ORDERS").unwrap();
        assert_eq!(orders.columns.len(), 2);
        assert!(!orders.columns[0].nullable);
        assert!(orders.columns[1].nullable);
    }

    #[test]
    fn differently_cased_tables_collide() {
        let records = vec![record("Order", "id", "NO"), record("order", "id", "NO")];

        let err = SchemaSnapshot::from_records(&records).unwrap_err();
        assert!(matches!(err, Error::DuplicateTable(name) if name == "order"));
    }

    #[test]
    fn differently_cased_columns_collide() {
        let records = vec![record("orders", "Total", "NO"), record("orders", "total", "NO")];

        let err = SchemaSnapshot::from_records(&records).unwrap_err();
        assert!(matches!(err, Error::DuplicateColumn { column, .. } if column == "total"));
    }

    #[test]
    fn unparseable_nullability_is_an_introspection_error() {
        let records = vec![record("orders", "id", "MAYBE")];

        let err = SchemaSnapshot::from_records(&records).unwrap_err();
        assert!(matches!(err, Error::IntrospectionError(_)));
    }

    #[test]
    fn unknown_key_marker_is_an_introspection_error() {
        let mut bad = record("orders", "id", "NO");
        bad.column_key = "FOREIGN".to_string();

        assert!(matches!(
            SchemaSnapshot::from_records(&[bad]).unwrap_err(),
            Error::IntrospectionError(_)
        ));
    }

    #[test]
    fn rename_keeps_position_and_columns() {
        let snapshot = SchemaSnapshot::from_tables(vec![
            Table::new("a").with_column(Column::new("id", "int")),
            Table::new("archivetable").with_column(Column::new("id", "int")),
            Table::new("z").with_column(Column::new("id", "int")),
        ])
        .unwrap();

        let renamed = snapshot.with_table_renamed("archivetable", "archive").unwrap();

        assert_eq!(renamed.table_names(), vec!["a", "archive", "z"]);
        assert!(!renamed.contains_table("archivetable"));
        assert_eq!(
            renamed.table("archive").unwrap().columns,
            snapshot.table("archivetable").unwrap().columns
        );
        // The original is untouched
        assert!(snapshot.contains_table("archivetable"));
    }

    #[test]
    fn records_round_trip_through_snapshot() {
        let mut with_default = record("orders", "status", "NO");
        with_default.column_default = Some("new".to_string());
        with_default.column_key = "MUL".to_string();
        let records = vec![record("orders", "id", "NO"), with_default];

        let snapshot = SchemaSnapshot::from_records(&records).unwrap();

        assert_eq!(snapshot.to_records(), records);
    }
}
