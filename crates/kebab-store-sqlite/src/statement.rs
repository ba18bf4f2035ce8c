// crates/kebab-store-sqlite/src/statement.rs
// ============================================================================
// Module: SQLite Statement Builders
// Description: Parameterized SQL built from column and value lists.
// Purpose: Keep statement text separate from execution and bind every value.
// Dependencies: kebab-store-core
// ============================================================================

//! ## Overview
//! Builders turn generic table requests into SQL text with positional `?`
//! placeholders plus the values to bind, in order. Identifiers are validated
//! and quoted; values never appear in the SQL text.
//! Invariants:
//! - List length mismatches fail before any SQL is produced.
//! - An empty exclusion set adds no `NOT IN` clause.

// ============================================================================
// SECTION: Imports
// ============================================================================

use kebab_store_core::Exclusions;
use kebab_store_core::StoreError;
use kebab_store_core::Value;
use kebab_store_core::ensure_bindings;
use kebab_store_core::validate_identifier;

// ============================================================================
// SECTION: Statement
// ============================================================================

/// SQL text with its positional parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// SQL text with `?` placeholders.
    pub sql: String,
    /// Values bound to the placeholders, in order.
    pub params: Vec<Value>,
}

/// Builds `SELECT * ... LIMIT 1` for a key lookup.
///
/// # Errors
///
/// Returns [`StoreError::Persistence`] on list mismatch or invalid identifiers.
pub fn select_one(
    table: &str,
    id_columns: &[&str],
    id_values: &[Value],
) -> Result<Statement, StoreError> {
    ensure_bindings("filter", id_columns, id_values)?;
    let mut sql = format!("SELECT * FROM {}", quote(table)?);
    push_where(&mut sql, equalities(id_columns)?);
    sql.push_str(" LIMIT 1");
    Ok(Statement {
        sql,
        params: id_values.to_vec(),
    })
}

/// Builds the list query, optionally filtered and minus excluded keys.
///
/// # Errors
///
/// Returns [`StoreError::Persistence`] on list mismatch or invalid identifiers.
pub fn select_list(
    table: &str,
    id_columns: &[&str],
    id_values: &[Value],
    exclusions: &Exclusions,
    want_all: bool,
) -> Result<Statement, StoreError> {
    ensure_bindings("filter", id_columns, id_values)?;
    let mut sql = format!("SELECT * FROM {}", quote(table)?);
    let mut conditions = Vec::new();
    let mut params = Vec::new();
    if !want_all {
        conditions.extend(equalities(id_columns)?);
        params.extend_from_slice(id_values);
    }
    if !exclusions.is_empty() {
        conditions.push(exclusion_clause(exclusions)?);
        params.extend(exclusions.keys().iter().flatten().cloned());
    }
    push_where(&mut sql, conditions);
    sql.push_str(" ORDER BY rowid");
    Ok(Statement {
        sql,
        params,
    })
}

/// Builds `INSERT INTO table VALUES (?, ...)`.
///
/// # Errors
///
/// Returns [`StoreError::Persistence`] for empty values or invalid identifiers.
pub fn insert(table: &str, values: &[Value]) -> Result<Statement, StoreError> {
    if values.is_empty() {
        return Err(StoreError::persistence(format!("insert into {table} has no values")));
    }
    Ok(Statement {
        sql: format!("INSERT INTO {} VALUES ({})", quote(table)?, placeholders(values.len())),
        params: values.to_vec(),
    })
}

/// Builds `UPDATE table SET c = ?, ... WHERE id = ? AND ...`.
///
/// # Errors
///
/// Returns [`StoreError::Persistence`] on list mismatch, empty column list, or
/// invalid identifiers.
pub fn update(
    table: &str,
    columns: &[&str],
    values: &[Value],
    id_columns: &[&str],
    id_values: &[Value],
) -> Result<Statement, StoreError> {
    ensure_bindings("update", columns, values)?;
    ensure_bindings("filter", id_columns, id_values)?;
    if columns.is_empty() {
        return Err(StoreError::persistence(format!("update of {table} sets no columns")));
    }
    let mut sql = format!("UPDATE {} SET {}", quote(table)?, equalities(columns)?.join(", "));
    push_where(&mut sql, equalities(id_columns)?);
    let mut params = values.to_vec();
    params.extend_from_slice(id_values);
    Ok(Statement {
        sql,
        params,
    })
}

/// Builds `DELETE FROM table WHERE id = ? AND ...`.
///
/// # Errors
///
/// Returns [`StoreError::Persistence`] on list mismatch or invalid identifiers.
pub fn delete(
    table: &str,
    id_columns: &[&str],
    id_values: &[Value],
) -> Result<Statement, StoreError> {
    ensure_bindings("filter", id_columns, id_values)?;
    let mut sql = format!("DELETE FROM {}", quote(table)?);
    push_where(&mut sql, equalities(id_columns)?);
    Ok(Statement {
        sql,
        params: id_values.to_vec(),
    })
}

/// Builds `CREATE TABLE IF NOT EXISTS` with untyped columns.
///
/// # Errors
///
/// Returns [`StoreError::Persistence`] for no columns or invalid identifiers.
pub fn create_table(table: &str, columns: &[&str]) -> Result<Statement, StoreError> {
    if columns.is_empty() {
        return Err(StoreError::persistence(format!("table {table} declares no columns")));
    }
    let columns = columns.iter().map(|column| quote(column)).collect::<Result<Vec<_>, _>>()?;
    Ok(Statement {
        sql: format!("CREATE TABLE IF NOT EXISTS {} ({})", quote(table)?, columns.join(", ")),
        params: Vec::new(),
    })
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Validates and double-quotes an identifier.
fn quote(identifier: &str) -> Result<String, StoreError> {
    validate_identifier(identifier)?;
    Ok(format!("\"{identifier}\""))
}

/// Returns `"c" = ?` for each column.
fn equalities(columns: &[&str]) -> Result<Vec<String>, StoreError> {
    columns.iter().map(|column| quote(column).map(|quoted| format!("{quoted} = ?"))).collect()
}

/// Returns `?, ?, ...` with `count` placeholders.
fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// Builds the `NOT IN` clause for a non-empty exclusion set.
fn exclusion_clause(exclusions: &Exclusions) -> Result<String, StoreError> {
    let columns = exclusions
        .columns()
        .iter()
        .map(|column| quote(column))
        .collect::<Result<Vec<_>, _>>()?;
    if let [column] = columns.as_slice() {
        return Ok(format!("{column} NOT IN ({})", placeholders(exclusions.len())));
    }
    if columns.is_empty() {
        return Err(StoreError::persistence("exclusion set names no key columns"));
    }
    let tuple = format!("({})", placeholders(columns.len()));
    let rows = vec![tuple.as_str(); exclusions.len()].join(", ");
    Ok(format!("({}) NOT IN (VALUES {rows})", columns.join(", ")))
}

/// Appends `WHERE a AND b` when any condition exists.
fn push_where(sql: &mut String, conditions: Vec<String>) {
    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions.")]

    use super::*;

    #[test]
    fn key_lookup_binds_every_identifier() {
        let statement =
            select_one("UTENTE", &["ruolo", "email"], &[Value::from("CLIENTE"), Value::from("a@b.it")])
                .unwrap();
        assert_eq!(
            statement.sql,
            "SELECT * FROM \"UTENTE\" WHERE \"ruolo\" = ? AND \"email\" = ? LIMIT 1"
        );
        assert_eq!(statement.params.len(), 2);
    }

    #[test]
    fn empty_exclusions_add_no_clause() {
        let statement =
            select_list("CIBO", &["tipo"], &[Value::from("BASE")], &Exclusions::none(), false)
                .unwrap();
        assert_eq!(statement.sql, "SELECT * FROM \"CIBO\" WHERE \"tipo\" = ? ORDER BY rowid");
    }

    #[test]
    fn single_key_exclusions_are_bound() {
        let mut exclusions = Exclusions::over(&["id"]);
        exclusions.push(vec![Value::from("1'; DROP TABLE CIBO; --")]).unwrap();
        exclusions.push(vec![Value::from("2")]).unwrap();
        let statement = select_list("CIBO", &["tipo"], &[Value::from("BASE")], &exclusions, true)
            .unwrap();
        assert_eq!(statement.sql, "SELECT * FROM \"CIBO\" WHERE \"id\" NOT IN (?, ?) ORDER BY rowid");
        assert_eq!(statement.params.len(), 2);
        assert!(!statement.sql.contains("DROP"));
    }

    #[test]
    fn compound_key_exclusions_use_row_values() {
        let mut exclusions = Exclusions::over(&["ruolo", "email"]);
        exclusions.push(vec![Value::from("CLIENTE"), Value::from("a@b.it")]).unwrap();
        exclusions.push(vec![Value::from("GESTORE"), Value::from("a@b.it")]).unwrap();
        let statement = select_list("UTENTE", &[], &[], &exclusions, false).unwrap();
        assert_eq!(
            statement.sql,
            "SELECT * FROM \"UTENTE\" WHERE (\"ruolo\", \"email\") NOT IN (VALUES (?, ?), (?, ?)) \
             ORDER BY rowid"
        );
        assert_eq!(statement.params.len(), 4);
    }

    #[test]
    fn update_mismatch_fails_before_sql() {
        let err = update("VOUCHER", &["usato", "percentuale"], &[Value::from(true)], &["codice"], &[
            Value::from("X"),
        ])
        .unwrap_err();
        assert!(matches!(err, StoreError::Persistence { .. }));
    }

    #[test]
    fn update_binds_values_then_keys() {
        let statement = update("VOUCHER", &["usato"], &[Value::from(true)], &["codice"], &[
            Value::from("X"),
        ])
        .unwrap();
        assert_eq!(statement.sql, "UPDATE \"VOUCHER\" SET \"usato\" = ? WHERE \"codice\" = ?");
        assert_eq!(statement.params, vec![Value::from(true), Value::from("X")]);
    }

    #[test]
    fn unsafe_identifiers_are_rejected() {
        assert!(delete("CIBO; DROP", &[], &[]).is_err());
        assert!(create_table("CIBO", &["id", "bad name"]).is_err());
    }

    #[test]
    fn insert_has_one_placeholder_per_value() {
        let statement = insert("CLIENTE", &[Value::from("CLI001"), Value::Null]).unwrap();
        assert_eq!(statement.sql, "INSERT INTO \"CLIENTE\" VALUES (?, ?)");
    }
}
