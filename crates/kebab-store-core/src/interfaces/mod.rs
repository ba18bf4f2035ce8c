// crates/kebab-store-core/src/interfaces/mod.rs
// ============================================================================
// Module: Kebab Store Interfaces
// Description: Backend-agnostic table interface, entity contract, and errors.
// Purpose: Define the surfaces shared by relational, file, and memory backends.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! [`TableBackend`] is the contract every storage implementation honours. It
//! speaks in table names, column lists, and [`Value`] lists; it never sees a
//! domain type. Hydration happens through the [`Entity`] contract on the
//! caller side.
//! Invariants:
//! - Column/value list mismatches fail with [`StoreError::Persistence`] before
//!   any backend work.
//! - An empty [`Exclusions`] set never adds a filter.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

use crate::core::row::Row;
use crate::core::value::Value;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Boxed error kept as the cause of a [`StoreError`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Persistence layer errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Lower-level causes are reachable through [`std::error::Error::source`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// No stored row matches the requested key.
    #[error("no {table} row for key {key}")]
    NotFound {
        /// Table that was queried.
        table: String,
        /// Rendered key values.
        key: String,
    },
    /// I/O, connectivity, or malformed request failure.
    #[error("persistence error: {message}")]
    Persistence {
        /// Context for the failure.
        message: String,
        /// Underlying cause, when one exists.
        #[source]
        source: Option<BoxError>,
    },
    /// Backend setting missing or unrecognized.
    #[error("store configuration error: {0}")]
    Configuration(String),
    /// Domain error raised by an entity decoder, passed through untouched.
    #[error("entity hydration failed: {0}")]
    Hydration(#[source] BoxError),
}

impl StoreError {
    /// Builds a persistence error without an underlying cause.
    #[must_use]
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
            source: None,
        }
    }

    /// Builds a persistence error wrapping `source`.
    #[must_use]
    pub fn persistence_caused(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Persistence {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Builds a not-found error for `table` and the given key values.
    #[must_use]
    pub fn not_found(table: &str, key: &[Value]) -> Self {
        Self::NotFound {
            table: table.to_string(),
            key: key_label(key),
        }
    }

    /// Wraps a domain error raised while hydrating a row.
    #[must_use]
    pub fn hydration(source: impl StdError + Send + Sync + 'static) -> Self {
        Self::Hydration(Box::new(source))
    }

    /// Returns true for [`StoreError::NotFound`].
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Renders key values as `a/b/c`.
#[must_use]
pub fn key_label(key: &[Value]) -> String {
    key.iter().map(ToString::to_string).collect::<Vec<_>>().join("/")
}

// ============================================================================
// SECTION: Request Validation
// ============================================================================

/// Fails when a column list and its value list differ in length.
///
/// # Errors
///
/// Returns [`StoreError::Persistence`] naming `what` on mismatch.
pub fn ensure_bindings(what: &str, columns: &[&str], values: &[Value]) -> Result<(), StoreError> {
    if columns.len() == values.len() {
        return Ok(());
    }
    Err(StoreError::persistence(format!(
        "{what}: {} columns but {} values",
        columns.len(),
        values.len()
    )))
}

/// Fails unless `name` is a plain identifier (`[A-Za-z_][A-Za-z0-9_]*`).
///
/// # Errors
///
/// Returns [`StoreError::Persistence`] for empty or unsafe identifiers.
pub fn validate_identifier(name: &str) -> Result<(), StoreError> {
    let mut chars = name.chars();
    let valid_start = chars.next().is_some_and(|ch| ch.is_ascii_alphabetic() || ch == '_');
    if valid_start && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
        Ok(())
    } else {
        Err(StoreError::persistence(format!("invalid identifier '{name}'")))
    }
}

// ============================================================================
// SECTION: Exclusion Set
// ============================================================================

/// Keys to leave out of an incremental list fetch.
///
/// # Invariants
/// - Every key has exactly one value per exclusion column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exclusions {
    /// Key columns the values refer to.
    columns: Vec<String>,
    /// Excluded keys, one value per column.
    keys: Vec<Vec<Value>>,
}

impl Exclusions {
    /// Returns an empty exclusion set.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Creates an empty exclusion set over the given key columns.
    #[must_use]
    pub fn over(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(ToString::to_string).collect(),
            keys: Vec::new(),
        }
    }

    /// Adds one excluded key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] when the key arity does not match
    /// the exclusion columns.
    pub fn push(&mut self, key: Vec<Value>) -> Result<(), StoreError> {
        if key.len() != self.columns.len() {
            return Err(StoreError::persistence(format!(
                "exclusion key has {} values for {} key columns",
                key.len(),
                self.columns.len()
            )));
        }
        self.keys.push(key);
        Ok(())
    }

    /// Returns true when no key is excluded.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Returns the number of excluded keys.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns the key column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the excluded keys.
    #[must_use]
    pub fn keys(&self) -> &[Vec<Value>] {
        &self.keys
    }

    /// Returns true when the given key fields (aligned to the columns) match
    /// an excluded key.
    #[must_use]
    pub fn excludes(&self, fields: &[Option<&str>]) -> bool {
        self.keys.iter().any(|key| {
            key.len() == fields.len()
                && key.iter().zip(fields).all(|(value, field)| value.matches(*field))
        })
    }
}

// ============================================================================
// SECTION: Filter
// ============================================================================

/// Equality filter over named columns, or the whole table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    /// Filtered columns.
    columns: Vec<String>,
    /// Required values, aligned to `columns`.
    values: Vec<Value>,
    /// When set, the filter is ignored and the whole table is listed.
    all: bool,
}

impl Filter {
    /// Lists the whole table.
    #[must_use]
    pub fn all() -> Self {
        Self {
            all: true,
            ..Self::default()
        }
    }

    /// Filters on a single column.
    #[must_use]
    pub fn by(column: &str, value: impl Into<Value>) -> Self {
        Self::default().and(column, value)
    }

    /// Adds another column equality.
    #[must_use]
    pub fn and(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.columns.push(column.to_string());
        self.values.push(value.into());
        self
    }

    /// Returns true when the filter lists the whole table.
    #[must_use]
    pub const fn is_all(&self) -> bool {
        self.all
    }

    /// Returns the filtered column names.
    #[must_use]
    pub fn columns(&self) -> Vec<&str> {
        self.columns.iter().map(String::as_str).collect()
    }

    /// Returns the required values.
    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

// ============================================================================
// SECTION: Table Backend
// ============================================================================

/// Backend-agnostic table access.
///
/// All operations are synchronous and blocking.
pub trait TableBackend {
    /// Returns the first row whose identifier columns equal the values.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when nothing matches and
    /// [`StoreError::Persistence`] on request or backend failure.
    fn fetch_one(
        &self,
        table: &str,
        id_columns: &[&str],
        id_values: &[Value],
    ) -> Result<Row, StoreError>;

    /// Returns every matching row not covered by `exclusions`.
    ///
    /// When `want_all` is set the identifier filter is dropped and the table
    /// is scanned; exclusions still apply.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] on request or backend failure.
    fn fetch_list(
        &self,
        table: &str,
        id_columns: &[&str],
        id_values: &[Value],
        exclusions: &Exclusions,
        want_all: bool,
    ) -> Result<Vec<Row>, StoreError>;

    /// Inserts one row; `values` covers every column in declared order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] on request or backend failure.
    fn insert(&self, table: &str, values: &[Value]) -> Result<(), StoreError>;

    /// Updates matching rows and returns how many changed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] on list mismatch or backend failure.
    fn update(
        &self,
        table: &str,
        columns: &[&str],
        values: &[Value],
        id_columns: &[&str],
        id_values: &[Value],
    ) -> Result<usize, StoreError>;

    /// Deletes matching rows and returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] on request or backend failure.
    fn delete(
        &self,
        table: &str,
        id_columns: &[&str],
        id_values: &[Value],
    ) -> Result<usize, StoreError>;

    /// Creates the table with the given columns when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] on request or backend failure.
    fn ensure_table(&self, table: &str, columns: &[&str]) -> Result<(), StoreError>;

    /// Reports backend readiness.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend is unavailable.
    fn readiness(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

// ============================================================================
// SECTION: Entity Contract
// ============================================================================

/// Domain type persisted in one table and cached by key.
///
/// # Invariants
/// - `encode` yields one value per entry in `COLUMNS`, in order.
/// - `key_values` yields one value per entry in `KEY_COLUMNS`.
/// - `decode(Row::from_values(&e.encode()))` reproduces `e`.
pub trait Entity: Sized + Send + Sync + 'static {
    /// Natural key type.
    type Key: Clone + Ord + fmt::Debug + Send + Sync + 'static;

    /// Backing table name.
    const TABLE: &'static str;
    /// Column names in stored order (the file header).
    const COLUMNS: &'static [&'static str];
    /// Columns forming the key.
    const KEY_COLUMNS: &'static [&'static str];

    /// Returns the natural key.
    fn key(&self) -> Self::Key;

    /// Converts a key into values aligned to `KEY_COLUMNS`.
    fn key_values(key: &Self::Key) -> Vec<Value>;

    /// Encodes the entity as values aligned to `COLUMNS`.
    fn encode(&self) -> Vec<Value>;

    /// Hydrates an entity from a stored row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the row is malformed or a domain rule
    /// rejects it.
    fn decode(row: &Row) -> Result<Self, StoreError>;
}
