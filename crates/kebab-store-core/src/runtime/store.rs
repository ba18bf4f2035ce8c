// crates/kebab-store-core/src/runtime/store.rs
// ============================================================================
// Module: Kebab Store In-Memory Backend
// Description: Volatile table backend and the shared backend wrapper.
// Purpose: Provide a dependency-free backend and a clonable trait object.
// Dependencies: crate::core, crate::interfaces, tracing
// ============================================================================

//! ## Overview
//! [`InMemoryTableBackend`] keeps each table as a header plus text rows, so
//! its query semantics match the file backend exactly. Contents are lost when
//! the process exits. [`SharedTableBackend`] wraps any backend in an `Arc`
//! so the registry and every entity cache can hold the same instance.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use tracing::debug;

use crate::core::Row;
use crate::core::Value;
use crate::interfaces::Exclusions;
use crate::interfaces::StoreError;
use crate::interfaces::TableBackend;
use crate::interfaces::ensure_bindings;
use crate::interfaces::validate_identifier;
use crate::runtime::table::TableShape;

// ============================================================================
// SECTION: In-Memory Backend
// ============================================================================

/// Rows of one in-memory table.
#[derive(Debug, Clone)]
struct MemoryTable {
    /// Column layout.
    shape: TableShape,
    /// Data rows in insertion order.
    rows: Vec<Row>,
}

/// In-memory table backend for tests and ephemeral runs.
#[derive(Debug, Default, Clone)]
pub struct InMemoryTableBackend {
    /// Tables by name, protected by a mutex.
    tables: Arc<Mutex<BTreeMap<String, MemoryTable>>>,
}

impl InMemoryTableBackend {
    /// Creates an empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tables: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    /// Returns the number of rows held for `table`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] when the mutex is poisoned.
    pub fn row_count(&self, table: &str) -> Result<usize, StoreError> {
        Ok(self.lock()?.get(table).map_or(0, |stored| stored.rows.len()))
    }

    /// Locks the table map.
    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, MemoryTable>>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::persistence("in-memory table backend mutex poisoned"))
    }
}

impl TableBackend for InMemoryTableBackend {
    fn fetch_one(
        &self,
        table: &str,
        id_columns: &[&str],
        id_values: &[Value],
    ) -> Result<Row, StoreError> {
        let guard = self.lock()?;
        let Some(stored) = guard.get(table) else {
            return Err(StoreError::not_found(table, id_values));
        };
        let indexes = stored.shape.matching_indexes(&stored.rows, id_columns, id_values)?;
        indexes
            .first()
            .and_then(|index| stored.rows.get(*index))
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
        let guard = self.lock()?;
        let Some(stored) = guard.get(table) else {
            return Ok(Vec::new());
        };
        stored.shape.select(&stored.rows, id_columns, id_values, exclusions, want_all)
    }

    fn insert(&self, table: &str, values: &[Value]) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        let stored = guard
            .get_mut(table)
            .ok_or_else(|| StoreError::persistence(format!("table {table} does not exist")))?;
        stored.shape.check_width(values.len())?;
        stored.rows.push(Row::from_values(values));
        debug!(table, "in-memory row inserted");
        Ok(())
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
        let mut guard = self.lock()?;
        let Some(stored) = guard.get_mut(table) else {
            return Ok(0);
        };
        let indexes = stored.shape.matching_indexes(&stored.rows, id_columns, id_values)?;
        for index in &indexes {
            if let Some(row) = stored.rows.get_mut(*index) {
                stored.shape.apply(row, columns, values)?;
            }
        }
        Ok(indexes.len())
    }

    fn delete(
        &self,
        table: &str,
        id_columns: &[&str],
        id_values: &[Value],
    ) -> Result<usize, StoreError> {
        let mut guard = self.lock()?;
        let Some(stored) = guard.get_mut(table) else {
            return Ok(0);
        };
        let indexes = stored.shape.matching_indexes(&stored.rows, id_columns, id_values)?;
        for index in indexes.iter().rev() {
            stored.rows.remove(*index);
        }
        Ok(indexes.len())
    }

    fn ensure_table(&self, table: &str, columns: &[&str]) -> Result<(), StoreError> {
        validate_identifier(table)?;
        for column in columns {
            validate_identifier(column)?;
        }
        let mut guard = self.lock()?;
        guard.entry(table.to_string()).or_insert_with(|| MemoryTable {
            shape: TableShape::new(table, columns),
            rows: Vec::new(),
        });
        Ok(())
    }
}

// ============================================================================
// SECTION: Shared Backend Wrapper
// ============================================================================

/// Shared table backend backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedTableBackend {
    /// Inner backend implementation.
    inner: Arc<dyn TableBackend + Send + Sync>,
}

impl SharedTableBackend {
    /// Wraps a backend in a shared, clonable wrapper.
    #[must_use]
    pub fn from_backend(backend: impl TableBackend + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(backend),
        }
    }

    /// Wraps an existing shared backend.
    #[must_use]
    pub const fn new(backend: Arc<dyn TableBackend + Send + Sync>) -> Self {
        Self {
            inner: backend,
        }
    }
}

impl std::fmt::Debug for SharedTableBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedTableBackend").finish_non_exhaustive()
    }
}

impl TableBackend for SharedTableBackend {
    fn fetch_one(
        &self,
        table: &str,
        id_columns: &[&str],
        id_values: &[Value],
    ) -> Result<Row, StoreError> {
        self.inner.fetch_one(table, id_columns, id_values)
    }

    fn fetch_list(
        &self,
        table: &str,
        id_columns: &[&str],
        id_values: &[Value],
        exclusions: &Exclusions,
        want_all: bool,
    ) -> Result<Vec<Row>, StoreError> {
        self.inner.fetch_list(table, id_columns, id_values, exclusions, want_all)
    }

    fn insert(&self, table: &str, values: &[Value]) -> Result<(), StoreError> {
        self.inner.insert(table, values)
    }

    fn update(
        &self,
        table: &str,
        columns: &[&str],
        values: &[Value],
        id_columns: &[&str],
        id_values: &[Value],
    ) -> Result<usize, StoreError> {
        self.inner.update(table, columns, values, id_columns, id_values)
    }

    fn delete(
        &self,
        table: &str,
        id_columns: &[&str],
        id_values: &[Value],
    ) -> Result<usize, StoreError> {
        self.inner.delete(table, id_columns, id_values)
    }

    fn ensure_table(&self, table: &str, columns: &[&str]) -> Result<(), StoreError> {
        self.inner.ensure_table(table, columns)
    }

    fn readiness(&self) -> Result<(), StoreError> {
        self.inner.readiness()
    }
}
