//! Database schema analyzer
//!
//! This module reads raw column metadata from a live database or a snapshot
//! file and turns it into a [`SchemaSnapshot`].

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use sqlx::{MySql, Pool, Postgres};
use std::path::{Path, PathBuf};

use crate::config::DatabaseConfig;
use crate::db::connection::DatabaseConnection;
use crate::error::{Error, Result};
use crate::schema::types::{RawColumnRecord, SchemaSnapshot};

/// Source of raw column records
#[async_trait]
pub trait Introspector {
    /// Fetch every base-table column of a schema, in table then ordinal order
    async fn fetch_columns(&self, schema_name: Option<&str>) -> Result<Vec<RawColumnRecord>>;
}

/// Schema analyzer for one side of the comparison
pub struct SchemaAnalyzer<'a> {
    config: &'a DatabaseConfig,
}

impl<'a> SchemaAnalyzer<'a> {
    /// Create a new schema analyzer
    pub fn new(config: &'a DatabaseConfig) -> Self {
        Self { config }
    }

    /// Fetch raw records. A live connection is closed before this returns,
    /// whether or not the query succeeded.
    pub async fn fetch_records(&self) -> Result<Vec<RawColumnRecord>> {
        let schema = self.config.schema.as_deref();

        if self.config.driver == "file" {
            return FileIntrospector::new(&self.config.url)
                .fetch_columns(schema)
                .await;
        }

        let connection = DatabaseConnection::connect(self.config).await?;
        let records = match &connection {
            DatabaseConnection::MySql(pool) => MySqlIntrospector { pool }.fetch_columns(schema).await,
            DatabaseConnection::Postgres(pool) => {
                PostgresIntrospector { pool }.fetch_columns(schema).await
            }
        };
        connection.close().await;

        let records = records?;
        tracing::info!(
            driver = %self.config.driver,
            schema = schema.unwrap_or("<default>"),
            columns = records.len(),
            "Introspected schema"
        );
        Ok(records)
    }

    /// Build the snapshot for this side
    pub async fn snapshot(&self) -> Result<SchemaSnapshot> {
        let records = self.fetch_records().await?;
        SchemaSnapshot::from_records(&records)
    }
}

/// A literal followed by a `::type` cast, e.g. `'active'::character varying`
static CAST_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^(?s)('(?:[^']|'')*'|NULL|[+-]?\d+(?:\.\d+)?)::[A-Za-z_][\w ."]*(?:\(\d+(?:,\s*\d+)?\))?(?:\[\])?$"#,
    )
    .expect("valid regex")
});

/// Strip the type cast PostgreSQL adds to literal defaults. Expressions such
/// as `nextval('users_id_seq'::regclass)` are left alone.
pub(crate) fn normalize_postgres_default(raw: &str) -> String {
    let text = raw.trim();
    match CAST_LITERAL.captures(text) {
        Some(caps) => caps[1].to_string(),
        None => text.to_string(),
    }
}

fn introspection_error(e: sqlx::Error) -> Error {
    Error::IntrospectionError(e.to_string())
}

/// MySQL / MariaDB introspection through `INFORMATION_SCHEMA.COLUMNS`
struct MySqlIntrospector<'a> {
    pool: &'a Pool<MySql>,
}

#[async_trait]
impl<'a> Introspector for MySqlIntrospector<'a> {
    async fn fetch_columns(&self, schema_name: Option<&str>) -> Result<Vec<RawColumnRecord>> {
        // CAST keeps MySQL 8 from returning these as binary strings
        let sql = r#"
            SELECT
                CAST(c.TABLE_NAME AS CHAR) AS table_name,
                CAST(c.COLUMN_NAME AS CHAR) AS column_name,
                CAST(c.COLUMN_TYPE AS CHAR) AS column_type,
                CAST(c.COLUMN_KEY AS CHAR) AS column_key,
                CAST(c.IS_NULLABLE AS CHAR) AS is_nullable,
                CAST(c.COLUMN_DEFAULT AS CHAR) AS column_default
            FROM INFORMATION_SCHEMA.COLUMNS c
            JOIN INFORMATION_SCHEMA.TABLES t
              ON t.TABLE_SCHEMA = c.TABLE_SCHEMA
             AND t.TABLE_NAME = c.TABLE_NAME
             AND t.TABLE_TYPE = 'BASE TABLE'
            WHERE c.TABLE_SCHEMA = COALESCE(?, DATABASE())
            ORDER BY c.TABLE_NAME, c.ORDINAL_POSITION
        "#;

        sqlx::query_as::<_, RawColumnRecord>(sql)
            .bind(schema_name)
            .fetch_all(self.pool)
            .await
            .map_err(introspection_error)
    }
}

/// PostgreSQL introspection, shaped like MySQL's column metadata
struct PostgresIntrospector<'a> {
    pool: &'a Pool<Postgres>,
}

#[async_trait]
impl<'a> Introspector for PostgresIntrospector<'a> {
    async fn fetch_columns(&self, schema_name: Option<&str>) -> Result<Vec<RawColumnRecord>> {
        let schema = schema_name.unwrap_or("public");

        let sql = r#"
            SELECT
                c.table_name::text AS table_name,
                c.column_name::text AS column_name,
                CASE
                    WHEN c.character_maximum_length IS NOT NULL
                        THEN c.data_type || '(' || c.character_maximum_length || ')'
                    WHEN c.data_type = 'numeric' AND c.numeric_precision IS NOT NULL
                        THEN c.data_type || '(' || c.numeric_precision || ',' || COALESCE(c.numeric_scale, 0) || ')'
                    ELSE c.data_type
                END::text AS column_type,
                COALESCE(k.column_key, '') AS column_key,
                c.is_nullable::text AS is_nullable,
                c.column_default::text AS column_default
            FROM information_schema.columns c
            JOIN information_schema.tables t
              ON t.table_schema = c.table_schema
             AND t.table_name = c.table_name
             AND t.table_type = 'BASE TABLE'
            LEFT JOIN (
                SELECT
                    kcu.table_name,
                    kcu.column_name,
                    CASE MIN(tc.constraint_type)
                        WHEN 'PRIMARY KEY' THEN 'PRI'
                        ELSE 'UNI'
                    END AS column_key
                FROM information_schema.table_constraints tc
                JOIN information_schema.key_column_usage kcu
                  ON tc.constraint_schema = kcu.constraint_schema
                 AND tc.constraint_name = kcu.constraint_name
                WHERE tc.table_schema = $1
                  AND tc.constraint_type IN ('PRIMARY KEY', 'UNIQUE')
                GROUP BY kcu.table_name, kcu.column_name
            ) k
              ON k.table_name = c.table_name
             AND k.column_name = c.column_name
            WHERE c.table_schema = $1
            ORDER BY c.table_name, c.ordinal_position
        "#;

        let mut records = sqlx::query_as::<_, RawColumnRecord>(sql)
            .bind(schema)
            .fetch_all(self.pool)
            .await
            .map_err(introspection_error)?;

        for record in &mut records {
            record.column_default = record.column_default.as_deref().map(normalize_postgres_default);
        }

        Ok(records)
    }
}

/// Reads records from a JSON or YAML file, as written by the `snapshot` command
pub struct FileIntrospector {
    path: PathBuf,
}

impl FileIntrospector {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn is_yaml(&self) -> bool {
        matches!(
            self.path.extension().and_then(|ext| ext.to_str()),
            Some("yaml") | Some("yml")
        )
    }
}

#[async_trait]
impl Introspector for FileIntrospector {
    /// Files hold a single schema, so `schema_name` is ignored
    async fn fetch_columns(&self, _schema_name: Option<&str>) -> Result<Vec<RawColumnRecord>> {
        let contents = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            Error::IntrospectionError(format!("Failed to read {}: {}", self.path.display(), e))
        })?;

        let records: Vec<RawColumnRecord> = if self.is_yaml() {
            serde_yaml::from_str(&contents).map_err(|e| {
                Error::IntrospectionError(format!("Failed to parse {}: {}", self.path.display(), e))
            })?
        } else {
            serde_json::from_str(&contents).map_err(|e| {
                Error::IntrospectionError(format!("Failed to parse {}: {}", self.path.display(), e))
            })?
        };

        Ok(records)
    }
}
