// crates/kebab-store-file/src/store.rs
// ============================================================================
// Module: Flat-File Table Store
// Description: One delimited file per table with reader/writer locking.
// Purpose: Persist rows as text with backup-before-write and atomic rewrites.
// Dependencies: kebab-store-core, tempfile, tracing
// ============================================================================

//! ## Overview
//! [`FileTableStore`] keeps each table in `<root>/<table>.csv`. The first
//! record is the header naming the columns; data rows follow. Whole-file
//! rewrites copy the previous file to `<table>.csv.bak` (best effort) and then
//! replace the target through a temporary file renamed into place.
//! Invariants:
//! - One `RwLock` per store: reads share it, writes hold it exclusively for
//!   the whole read-modify-write.
//! - Line indexes count data rows only; the header cannot be updated or
//!   deleted through them.
//! - A missing file reads as an empty table.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::RwLock;
use std::sync::RwLockReadGuard;
use std::sync::RwLockWriteGuard;

use kebab_store_core::Exclusions;
use kebab_store_core::Row;
use kebab_store_core::StoreError;
use kebab_store_core::TableBackend;
use kebab_store_core::TableShape;
use kebab_store_core::Value;
use kebab_store_core::encode_record;
use kebab_store_core::encode_records;
use kebab_store_core::ensure_bindings;
use kebab_store_core::parse_records;
use kebab_store_core::validate_identifier;
use tempfile::NamedTempFile;
use tracing::debug;
use tracing::warn;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Extension of table files.
pub const TABLE_EXTENSION: &str = "csv";
/// Suffix appended to a table file name for its backup copy.
pub const BACKUP_SUFFIX: &str = ".bak";

// ============================================================================
// SECTION: File Table Store
// ============================================================================

/// Flat-file table store rooted at one directory.
#[derive(Debug)]
pub struct FileTableStore {
    /// Directory holding the table files.
    root: PathBuf,
    /// Guards every file under `root` for this instance.
    lock: RwLock<()>,
}

impl FileTableStore {
    /// Creates a store over `root` without touching the filesystem.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock: RwLock::new(()),
        }
    }

    /// Creates a store over `root`, creating the directory when missing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] when the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let store = Self::new(root);
        fs::create_dir_all(&store.root).map_err(|err| {
            StoreError::persistence_caused(
                format!("failed to create table directory {}", store.root.display()),
                err,
            )
        })?;
        Ok(store)
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the file path for `table`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] when `table` is not a plain identifier.
    pub fn table_path(&self, table: &str) -> Result<PathBuf, StoreError> {
        validate_identifier(table)?;
        Ok(self.root.join(format!("{table}.{TABLE_EXTENSION}")))
    }

    /// Returns the backup path for `table`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] when `table` is not a plain identifier.
    pub fn backup_path(&self, table: &str) -> Result<PathBuf, StoreError> {
        validate_identifier(table)?;
        Ok(self.root.join(format!("{table}.{TABLE_EXTENSION}{BACKUP_SUFFIX}")))
    }

    /// Reads every record including the header.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] on I/O or parse failure.
    pub fn read_all(&self, table: &str) -> Result<Vec<Row>, StoreError> {
        let path = self.table_path(table)?;
        let _guard = self.read_lock()?;
        load_rows(&path)
    }

    /// Reads every data record, skipping the header.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] on I/O or parse failure.
    pub fn read_without_header(&self, table: &str) -> Result<Vec<Row>, StoreError> {
        let mut rows = self.read_all(table)?;
        if !rows.is_empty() {
            rows.remove(0);
        }
        Ok(rows)
    }

    /// Replaces the file content with `rows` (header included).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] when the rewrite fails. Backup
    /// failures are logged only.
    pub fn write_all(&self, table: &str, rows: &[Row]) -> Result<(), StoreError> {
        let _guard = self.write_lock()?;
        self.rewrite(table, rows)
    }

    /// Appends one record without rewriting the file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] on I/O failure.
    pub fn append(&self, table: &str, row: &Row) -> Result<(), StoreError> {
        let path = self.table_path(table)?;
        let _guard = self.write_lock()?;
        append_row(&path, row)
    }

    /// Replaces the data row at `index` (0-based, header excluded).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] for an invalid index or I/O failure.
    pub fn update_line(&self, table: &str, index: usize, row: &Row) -> Result<(), StoreError> {
        let path = self.table_path(table)?;
        let _guard = self.write_lock()?;
        let mut rows = load_rows(&path)?;
        let slot = data_slot(table, &rows, index)?;
        rows[slot] = row.clone();
        self.rewrite(table, &rows)
    }

    /// Removes the data row at `index` (0-based, header excluded).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] for an invalid index or I/O failure.
    pub fn delete_line(&self, table: &str, index: usize) -> Result<(), StoreError> {
        let path = self.table_path(table)?;
        let _guard = self.write_lock()?;
        let mut rows = load_rows(&path)?;
        let slot = data_slot(table, &rows, index)?;
        rows.remove(slot);
        self.rewrite(table, &rows)
    }

    /// Creates the file with `header` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] on I/O failure.
    pub fn ensure_file(&self, table: &str, header: &Row) -> Result<(), StoreError> {
        let path = self.table_path(table)?;
        let _guard = self.write_lock()?;
        if path.exists() {
            return Ok(());
        }
        fs::create_dir_all(&self.root).map_err(|err| {
            StoreError::persistence_caused(
                format!("failed to create table directory {}", self.root.display()),
                err,
            )
        })?;
        append_row(&path, header)?;
        debug!(table, "table file created");
        Ok(())
    }

    /// Backs up and atomically rewrites `table`; the caller holds the write lock.
    fn rewrite(&self, table: &str, rows: &[Row]) -> Result<(), StoreError> {
        let path = self.table_path(table)?;
        if path.exists() {
            let backup = self.backup_path(table)?;
            if let Err(err) = fs::copy(&path, &backup) {
                warn!(table, error = %err, "table backup failed");
            }
        }
        let mut temp = NamedTempFile::new_in(&self.root).map_err(|err| {
            StoreError::persistence_caused(format!("failed to stage rewrite of {table}"), err)
        })?;
        temp.write_all(encode_records(rows).as_bytes())
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|err| {
                StoreError::persistence_caused(format!("failed to write {table}"), err)
            })?;
        temp.persist(&path).map_err(|err| {
            StoreError::persistence_caused(format!("failed to replace {table}"), err.error)
        })?;
        debug!(table, rows = rows.len(), "table file rewritten");
        Ok(())
    }

    /// Reads the table shape and data rows; `None` when the file is empty or missing.
    fn load_table(&self, table: &str) -> Result<Option<(TableShape, Vec<Row>)>, StoreError> {
        let path = self.table_path(table)?;
        let mut rows = load_rows(&path)?;
        if rows.is_empty() {
            return Ok(None);
        }
        let header = rows.remove(0);
        Ok(Some((TableShape::from_header(table, &header)?, rows)))
    }

    /// Acquires the shared lock.
    fn read_lock(&self) -> Result<RwLockReadGuard<'_, ()>, StoreError> {
        self.lock.read().map_err(|_| StoreError::persistence("file table store lock poisoned"))
    }

    /// Acquires the exclusive lock.
    fn write_lock(&self) -> Result<RwLockWriteGuard<'_, ()>, StoreError> {
        self.lock.write().map_err(|_| StoreError::persistence("file table store lock poisoned"))
    }
}

// ============================================================================
// SECTION: Backend Implementation
// ============================================================================

impl TableBackend for FileTableStore {
    fn fetch_one(
        &self,
        table: &str,
        id_columns: &[&str],
        id_values: &[Value],
    ) -> Result<Row, StoreError> {
        ensure_bindings("filter", id_columns, id_values)?;
        let _guard = self.read_lock()?;
        let Some((shape, rows)) = self.load_table(table)? else {
            return Err(StoreError::not_found(table, id_values));
        };
        let indexes = shape.matching_indexes(&rows, id_columns, id_values)?;
        indexes
            .first()
            .and_then(|index| rows.get(*index))
            .cloned()
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
        ensure_bindings("filter", id_columns, id_values)?;
        let _guard = self.read_lock()?;
        let Some((shape, rows)) = self.load_table(table)? else {
            return Ok(Vec::new());
        };
        shape.select(&rows, id_columns, id_values, exclusions, want_all)
    }

    fn insert(&self, table: &str, values: &[Value]) -> Result<(), StoreError> {
        let _guard = self.write_lock()?;
        let Some((shape, _)) = self.load_table(table)? else {
            return Err(StoreError::persistence(format!("table {table} has no header")));
        };
        shape.check_width(values.len())?;
        append_row(&self.table_path(table)?, &Row::from_values(values))
    }

    fn update(
        &self,
        table: &str,
        columns: &[&str],
        values: &[Value],
        id_columns: &[&str],
        id_values: &[Value],
    ) -> Result<usize, StoreError> {
        ensure_bindings("update", columns, values)?;
        ensure_bindings("filter", id_columns, id_values)?;
        let _guard = self.write_lock()?;
        let Some((shape, mut rows)) = self.load_table(table)? else {
            return Ok(0);
        };
        let indexes = shape.matching_indexes(&rows, id_columns, id_values)?;
        if indexes.is_empty() {
            return Ok(0);
        }
        for index in &indexes {
            if let Some(row) = rows.get_mut(*index) {
                shape.apply(row, columns, values)?;
            }
        }
        rows.insert(0, shape.header_row());
        self.rewrite(table, &rows)?;
        Ok(indexes.len())
    }

    fn delete(
        &self,
        table: &str,
        id_columns: &[&str],
        id_values: &[Value],
    ) -> Result<usize, StoreError> {
        ensure_bindings("filter", id_columns, id_values)?;
        let _guard = self.write_lock()?;
        let Some((shape, mut rows)) = self.load_table(table)? else {
            return Ok(0);
        };
        let indexes = shape.matching_indexes(&rows, id_columns, id_values)?;
        if indexes.is_empty() {
            return Ok(0);
        }
        for index in indexes.iter().rev() {
            rows.remove(*index);
        }
        rows.insert(0, shape.header_row());
        self.rewrite(table, &rows)?;
        Ok(indexes.len())
    }

    fn ensure_table(&self, table: &str, columns: &[&str]) -> Result<(), StoreError> {
        for column in columns {
            validate_identifier(column)?;
        }
        self.ensure_file(table, &Row::from_texts(columns.iter().copied()))
    }

    fn readiness(&self) -> Result<(), StoreError> {
        if self.root.is_dir() {
            Ok(())
        } else {
            Err(StoreError::persistence(format!(
                "table directory {} is not available",
                self.root.display()
            )))
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses every record of `path`; a missing file yields no rows.
fn load_rows(path: &Path) -> Result<Vec<Row>, StoreError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            return Err(StoreError::persistence_caused(
                format!("failed to read {}", path.display()),
                err,
            ));
        }
    };
    parse_records(&text).map_err(|err| {
        StoreError::persistence_caused(format!("malformed table file {}", path.display()), err)
    })
}

/// Appends one encoded record to `path`, creating the file when missing.
fn append_row(path: &Path, row: &Row) -> Result<(), StoreError> {
    let mut file = OpenOptions::new().create(true).append(true).open(path).map_err(|err| {
        StoreError::persistence_caused(format!("failed to open {}", path.display()), err)
    })?;
    let mut line = encode_record(row);
    line.push('\n');
    file.write_all(line.as_bytes()).map_err(|err| {
        StoreError::persistence_caused(format!("failed to append to {}", path.display()), err)
    })
}

/// Maps a data-row index to its position in the full record list.
fn data_slot(table: &str, rows: &[Row], index: usize) -> Result<usize, StoreError> {
    let data_rows = rows.len().saturating_sub(1);
    if index < data_rows {
        Ok(index + 1)
    } else {
        Err(StoreError::persistence(format!(
            "invalid index {index} for {table} with {data_rows} data rows"
        )))
    }
}
