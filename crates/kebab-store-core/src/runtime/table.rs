// crates/kebab-store-core/src/runtime/table.rs
// ============================================================================
// Module: Kebab Store Header Tables
// Description: Column resolution and row filtering over header-described rows.
// Purpose: Share query semantics between the file and in-memory backends.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! Backends without a query engine keep rows as raw text with a header that
//! names the columns. [`TableShape`] resolves column names to positions and
//! applies identifier filters, exclusions, and updates with the same typed
//! comparison ([`Value::matches`]) everywhere.
//! Invariants:
//! - Unknown column names fail with [`StoreError::Persistence`].
//! - Row width must equal the header width for writes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::Row;
use crate::core::Value;
use crate::interfaces::Exclusions;
use crate::interfaces::StoreError;
use crate::interfaces::ensure_bindings;

// ============================================================================
// SECTION: Table Shape
// ============================================================================

/// Column layout of one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableShape {
    /// Table name.
    table: String,
    /// Column names in stored order.
    columns: Vec<String>,
}

impl TableShape {
    /// Creates a shape from column names.
    #[must_use]
    pub fn new(table: &str, columns: &[&str]) -> Self {
        Self {
            table: table.to_string(),
            columns: columns.iter().map(ToString::to_string).collect(),
        }
    }

    /// Builds a shape from a stored header row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] when the header has a null or
    /// empty column name.
    pub fn from_header(table: &str, header: &Row) -> Result<Self, StoreError> {
        let mut columns = Vec::with_capacity(header.len());
        for (index, field) in header.fields().iter().enumerate() {
            match field.as_deref() {
                Some(name) if !name.is_empty() => columns.push(name.to_string()),
                _ => {
                    return Err(StoreError::persistence(format!(
                        "{table} header column {index} is empty"
                    )));
                }
            }
        }
        Ok(Self {
            table: table.to_string(),
            columns,
        })
    }

    /// Returns the table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the header as a row.
    #[must_use]
    pub fn header_row(&self) -> Row {
        Row::from_texts(self.columns.iter().cloned())
    }

    /// Resolves column names to positions.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] for names missing from the header.
    pub fn positions<S: AsRef<str>>(&self, columns: &[S]) -> Result<Vec<usize>, StoreError> {
        columns
            .iter()
            .map(|column| {
                let column = column.as_ref();
                self.columns.iter().position(|name| name == column).ok_or_else(|| {
                    StoreError::persistence(format!("{} has no column {column}", self.table))
                })
            })
            .collect()
    }

    /// Fails unless `width` equals the number of columns.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] on width mismatch.
    pub fn check_width(&self, width: usize) -> Result<(), StoreError> {
        if width == self.columns.len() {
            return Ok(());
        }
        Err(StoreError::persistence(format!(
            "{} expects {} values but got {width}",
            self.table,
            self.columns.len()
        )))
    }

    /// Returns indexes of rows whose identifier columns equal the values.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] on list mismatch or unknown columns.
    pub fn matching_indexes(
        &self,
        rows: &[Row],
        id_columns: &[&str],
        id_values: &[Value],
    ) -> Result<Vec<usize>, StoreError> {
        ensure_bindings("filter", id_columns, id_values)?;
        let positions = self.positions(id_columns)?;
        Ok(rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row_matches(row, &positions, id_values))
            .map(|(index, _)| index)
            .collect())
    }

    /// Selects rows for a list fetch.
    ///
    /// The identifier filter is skipped when `want_all` is set; exclusions
    /// always apply.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] on list mismatch or unknown columns.
    pub fn select(
        &self,
        rows: &[Row],
        id_columns: &[&str],
        id_values: &[Value],
        exclusions: &Exclusions,
        want_all: bool,
    ) -> Result<Vec<Row>, StoreError> {
        ensure_bindings("filter", id_columns, id_values)?;
        let filter = if want_all { Vec::new() } else { self.positions(id_columns)? };
        let filter_values = if want_all { &[][..] } else { id_values };
        let excluded = if exclusions.is_empty() {
            Vec::new()
        } else {
            self.positions(exclusions.columns())?
        };
        Ok(rows
            .iter()
            .filter(|row| row_matches(row, &filter, filter_values))
            .filter(|row| {
                excluded.is_empty() || {
                    let key: Vec<Option<&str>> =
                        excluded.iter().map(|position| row.field(*position)).collect();
                    !exclusions.excludes(&key)
                }
            })
            .cloned()
            .collect())
    }

    /// Writes `values` into the named columns of `row`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] on list mismatch or unknown columns.
    pub fn apply(&self, row: &mut Row, columns: &[&str], values: &[Value]) -> Result<(), StoreError> {
        ensure_bindings("update", columns, values)?;
        let positions = self.positions(columns)?;
        for (position, value) in positions.into_iter().zip(values) {
            row.set(position, value.to_text());
        }
        Ok(())
    }
}

/// Returns true when every filtered position holds the expected value.
fn row_matches(row: &Row, positions: &[usize], values: &[Value]) -> bool {
    positions.iter().zip(values).all(|(position, value)| value.matches(row.field(*position)))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
