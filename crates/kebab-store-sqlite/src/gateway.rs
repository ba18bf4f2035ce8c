// crates/kebab-store-sqlite/src/gateway.rs
// ============================================================================
// Module: SQLite Table Gateway
// Description: Relational TableBackend executing bound statements on SQLite.
// Purpose: Run generic table requests against one shared SQLite connection.
// Dependencies: kebab-store-core, rusqlite, serde, thiserror, tracing
// ============================================================================

//! ## Overview
//! [`SqliteTableGateway`] executes one statement per call on a connection
//! held behind a mutex. Values are bound positionally through [`SqlValue`];
//! result columns come back as text so entities decode them the same way as
//! file rows.
//! Security posture: database contents are untrusted; blob columns and
//! invalid UTF-8 are rejected rather than coerced.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;

use kebab_store_core::Exclusions;
use kebab_store_core::Row;
use kebab_store_core::StoreError;
use kebab_store_core::TableBackend;
use kebab_store_core::Value;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::ToSql;
use rusqlite::params_from_iter;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::ValueRef;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::statement;
use crate::statement::Statement;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default busy timeout (ms).
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Largest exclusion set bound into a `NOT IN` clause, counted in values.
/// `SQLite` caps bound parameters at 32766 per statement.
pub const MAX_BOUND_EXCLUSION_VALUES: usize = 10_000;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteJournalMode {
    /// WAL journal mode.
    #[default]
    Wal,
    /// Delete journal mode.
    Delete,
}

impl SqliteJournalMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode.
    #[default]
    Full,
    /// Normal synchronous mode.
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` table gateway.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteGatewayConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    pub journal_mode: SqliteJournalMode,
    /// `SQLite` sync mode.
    pub sync_mode: SqliteSyncMode,
}

impl SqliteGatewayConfig {
    /// Creates a config for `path` with default pragmas.
    #[must_use]
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteJournalMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while opening the gateway.
#[derive(Debug, Error)]
pub enum SqliteGatewayError {
    /// Filesystem error around the database file.
    #[error("sqlite gateway io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite gateway db error: {0}")]
    Db(String),
    /// Invalid gateway configuration.
    #[error("sqlite gateway invalid config: {0}")]
    Invalid(String),
}

impl From<SqliteGatewayError> for StoreError {
    fn from(err: SqliteGatewayError) -> Self {
        Self::persistence_caused("failed to open sqlite gateway", err)
    }
}

// ============================================================================
// SECTION: Parameter Binding
// ============================================================================

/// Binds a [`Value`] as a `SQLite` parameter.
///
/// Booleans bind as integers; decimals, dates, and timestamps bind as their
/// canonical text.
#[derive(Debug, Clone, Copy)]
pub struct SqlValue<'a>(pub &'a Value);

impl ToSql for SqlValue<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self.0 {
            Value::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Value::Integer(value) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(*value)),
            Value::Bool(value) => {
                ToSqlOutput::Owned(rusqlite::types::Value::Integer(i64::from(*value)))
            }
            Value::Text(value) => ToSqlOutput::Borrowed(ValueRef::Text(value.as_bytes())),
            other => match other.to_text() {
                Some(text) => ToSqlOutput::Owned(rusqlite::types::Value::Text(text)),
                None => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            },
        })
    }
}

// ============================================================================
// SECTION: Gateway
// ============================================================================

/// `SQLite`-backed table gateway.
#[derive(Clone)]
pub struct SqliteTableGateway {
    /// Shared connection; one statement runs at a time.
    connection: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for SqliteTableGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteTableGateway").finish_non_exhaustive()
    }
}

impl SqliteTableGateway {
    /// Opens the database described by `config`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteGatewayError`] when the path is invalid or the
    /// connection cannot be opened.
    pub fn open(config: &SqliteGatewayConfig) -> Result<Self, SqliteGatewayError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let connection = open_connection(config)?;
        debug!(path = %config.path.display(), "sqlite gateway opened");
        Ok(Self::from_connection(connection))
    }

    /// Wraps an already-open connection.
    #[must_use]
    pub fn from_connection(connection: Connection) -> Self {
        Self::shared(Arc::new(Mutex::new(connection)))
    }

    /// Wraps a connection shared with other components.
    #[must_use]
    pub const fn shared(connection: Arc<Mutex<Connection>>) -> Self {
        Self {
            connection,
        }
    }

    /// Locks the connection.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.connection
            .lock()
            .map_err(|_| StoreError::persistence("sqlite connection mutex poisoned"))
    }

    /// Runs a query and returns the result column names and every row as text fields.
    fn query_rows(
        &self,
        table: &str,
        statement: &Statement,
    ) -> Result<(Vec<String>, Vec<Row>), StoreError> {
        debug!(table, sql = %statement.sql, params = statement.params.len(), "sqlite query");
        let guard = self.lock()?;
        let mut prepared = guard.prepare(&statement.sql).map_err(|err| {
            StoreError::persistence_caused(format!("failed to prepare query on {table}"), err)
        })?;
        let columns: Vec<String> =
            prepared.column_names().into_iter().map(ToString::to_string).collect();
        let width = columns.len();
        let mut rows = prepared
            .query(params_from_iter(statement.params.iter().map(SqlValue)))
            .map_err(|err| StoreError::persistence_caused(format!("query on {table} failed"), err))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(|err| {
            StoreError::persistence_caused(format!("failed to read {table} row"), err)
        })? {
            let mut fields = Vec::with_capacity(width);
            for index in 0 .. width {
                let value = row.get_ref(index).map_err(|err| {
                    StoreError::persistence_caused(format!("failed to read {table} column"), err)
                })?;
                fields.push(field_text(value)?);
            }
            out.push(Row::new(fields));
        }
        Ok((columns, out))
    }

    /// Executes a statement and returns the affected row count.
    fn execute(
        &self,
        table: &str,
        operation: &str,
        statement: &Statement,
    ) -> Result<usize, StoreError> {
        debug!(table, sql = %statement.sql, params = statement.params.len(), "sqlite execute");
        let guard = self.lock()?;
        guard
            .execute(&statement.sql, params_from_iter(statement.params.iter().map(SqlValue)))
            .map_err(|err| {
                StoreError::persistence_caused(format!("failed to {operation} {table}"), err)
            })
    }
}

impl TableBackend for SqliteTableGateway {
    fn fetch_one(
        &self,
        table: &str,
        id_columns: &[&str],
        id_values: &[Value],
    ) -> Result<Row, StoreError> {
        let statement = statement::select_one(table, id_columns, id_values)?;
        let (_, rows) = self.query_rows(table, &statement)?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::not_found(table, id_values))
    }

    fn fetch_list(
        &self,
        table: &str,
        id_columns: &[&str],
        id_values: &[Value],
        exclusions: &Exclusions,
        want_all: bool,
    ) -> Result<Vec<Row>, StoreError> {
        if exclusions.len() * exclusions.columns().len() <= MAX_BOUND_EXCLUSION_VALUES {
            let statement =
                statement::select_list(table, id_columns, id_values, exclusions, want_all)?;
            return self.query_rows(table, &statement).map(|(_, rows)| rows);
        }
        debug!(table, excluded = exclusions.len(), "sqlite exclusions applied in process");
        let statement =
            statement::select_list(table, id_columns, id_values, &Exclusions::none(), want_all)?;
        let (columns, rows) = self.query_rows(table, &statement)?;
        retain_unexcluded(table, &columns, rows, exclusions)
    }

    fn insert(&self, table: &str, values: &[Value]) -> Result<(), StoreError> {
        self.execute(table, "insert into", &statement::insert(table, values)?).map(|_| ())
    }

    fn update(
        &self,
        table: &str,
        columns: &[&str],
        values: &[Value],
        id_columns: &[&str],
        id_values: &[Value],
    ) -> Result<usize, StoreError> {
        self.execute(
            table,
            "update",
            &statement::update(table, columns, values, id_columns, id_values)?,
        )
    }

    fn delete(
        &self,
        table: &str,
        id_columns: &[&str],
        id_values: &[Value],
    ) -> Result<usize, StoreError> {
        self.execute(table, "delete from", &statement::delete(table, id_columns, id_values)?)
    }

    fn ensure_table(&self, table: &str, columns: &[&str]) -> Result<(), StoreError> {
        self.execute(table, "create table", &statement::create_table(table, columns)?)
            .map(|_| ())
    }

    fn readiness(&self) -> Result<(), StoreError> {
        let guard = self.lock()?;
        guard
            .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map(|_| ())
            .map_err(|err| StoreError::persistence_caused("sqlite readiness check failed", err))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Drops rows whose key fields equal an excluded key, compared as stored text.
fn retain_unexcluded(
    table: &str,
    columns: &[String],
    rows: Vec<Row>,
    exclusions: &Exclusions,
) -> Result<Vec<Row>, StoreError> {
    let positions = exclusions
        .columns()
        .iter()
        .map(|column| {
            columns.iter().position(|name| name == column).ok_or_else(|| {
                StoreError::persistence(format!("{table} has no column {column}"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    let excluded: HashSet<Vec<Option<String>>> = exclusions
        .keys()
        .iter()
        .map(|key| key.iter().map(stored_text).collect())
        .collect();
    Ok(rows
        .into_iter()
        .filter(|row| {
            let key: Vec<Option<String>> = positions
                .iter()
                .map(|position| row.field(*position).map(ToString::to_string))
                .collect();
            !excluded.contains(&key)
        })
        .collect())
}

/// Returns the text `SQLite` hands back for a value bound through [`SqlValue`].
fn stored_text(value: &Value) -> Option<String> {
    match value {
        Value::Bool(flag) => Some(i64::from(*flag).to_string()),
        other => other.to_text(),
    }
}

/// Converts a result column to a raw text field.
fn field_text(value: ValueRef<'_>) -> Result<Option<String>, StoreError> {
    match value {
        ValueRef::Null => Ok(None),
        ValueRef::Integer(number) => Ok(Some(number.to_string())),
        ValueRef::Real(number) => Ok(Some(number.to_string())),
        ValueRef::Text(bytes) => std::str::from_utf8(bytes)
            .map(|text| Some(text.to_string()))
            .map_err(|err| StoreError::persistence_caused("sqlite text column is not utf-8", err)),
        ValueRef::Blob(_) => Err(StoreError::persistence("sqlite blob columns are not supported")),
    }
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteGatewayError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteGatewayError::Invalid("store path must not be empty".to_string()));
    }
    if path.display().to_string().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteGatewayError::Invalid("store path exceeds length limit".to_string()));
    }
    if path
        .components()
        .any(|component| component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH)
    {
        return Err(SqliteGatewayError::Invalid(
            "store path contains an overlong component".to_string(),
        ));
    }
    if path.is_dir() {
        return Err(SqliteGatewayError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Creates the parent directory of the database file when missing.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteGatewayError> {
    let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) else {
        return Ok(());
    };
    std::fs::create_dir_all(parent).map_err(|err| SqliteGatewayError::Io(err.to_string()))
}

/// Opens an `SQLite` connection and applies pragmas.
fn open_connection(config: &SqliteGatewayConfig) -> Result<Connection, SqliteGatewayError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)
        .map_err(|err| SqliteGatewayError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| SqliteGatewayError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| SqliteGatewayError::Db(err.to_string()))?;
    connection
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteGatewayError::Db(err.to_string()))?;
    Ok(connection)
}
