// crates/kebab-store-file/tests/file_store.rs
// ============================================================================
// Module: File Table Store Tests
// Description: Line operations, locking, backups, and backend queries on files.
// Purpose: Ensure flat-file persistence keeps headers, counts, and contents.
// ============================================================================

//! ## Overview
//! Each test runs against a fresh temporary directory.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::fs;
use std::sync::Arc;
use std::thread;

use bigdecimal::BigDecimal;
use kebab_store_core::Entity;
use kebab_store_core::Exclusions;
use kebab_store_core::FoodClass;
use kebab_store_core::FoodItem;
use kebab_store_core::FoodTier;
use kebab_store_core::Row;
use kebab_store_core::StoreError;
use kebab_store_core::TableBackend;
use kebab_store_core::Value;
use kebab_store_core::Voucher;
use kebab_store_file::FileTableStore;
use tempfile::TempDir;
use time::macros::date;

fn store() -> (TempDir, FileTableStore) {
    let dir = TempDir::new().unwrap();
    let store = FileTableStore::open(dir.path()).unwrap();
    (dir, store)
}

fn header() -> Row {
    Row::from_texts(FoodItem::COLUMNS.iter().copied())
}

fn numbered_rows(count: usize) -> Vec<Row> {
    let mut rows = vec![header()];
    for index in 0 .. count {
        rows.push(Row::from_texts([
            index.to_string(),
            format!("Item {index}"),
            "BASE".to_string(),
            "1.00".to_string(),
            "1".to_string(),
            "Patatine".to_string(),
        ]));
    }
    rows
}

// ============================================================================
// SECTION: Line Operations
// ============================================================================

#[test]
fn appended_kebab_row_reads_back_unchanged() {
    let (_dir, store) = store();
    store.ensure_file("CIBO", &header()).unwrap();
    let row = Row::from_texts(["7", "Panino Doner Kebab", "BASE", "5.50", "5", "PaninoDonerKebab"]);

    store.append("CIBO", &row).unwrap();
    let rows = store.read_without_header("CIBO").unwrap();

    assert_eq!(rows, vec![row]);
    let item = FoodItem::decode(&rows[0]).unwrap();
    assert_eq!(item.class, FoodClass::PaninoDonerKebab);
    assert_eq!(item.tier, FoodTier::Base);
    assert_eq!(item.cost, "5.5".parse::<BigDecimal>().unwrap());
}

#[test]
fn delete_line_past_end_is_invalid_index() {
    let (_dir, store) = store();
    store.write_all("CIBO", &numbered_rows(3)).unwrap();

    let err = store.delete_line("CIBO", 5).unwrap_err();

    match err {
        StoreError::Persistence {
            message, ..
        } => assert!(message.contains("invalid index")),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(store.read_without_header("CIBO").unwrap().len(), 3);
}

#[test]
fn line_indexes_skip_the_header() {
    let (_dir, store) = store();
    store.write_all("CIBO", &numbered_rows(2)).unwrap();
    let replacement = Row::from_texts(["9", "Bevanda", "BASE", "2.00", "0", "Bevanda"]);

    store.delete_line("CIBO", 0).unwrap();
    store.update_line("CIBO", 0, &replacement).unwrap();
    let rows = store.read_all("CIBO").unwrap();

    assert_eq!(rows, vec![header(), replacement]);
    assert!(store.update_line("CIBO", 1, &header()).is_err());
}

#[test]
fn missing_file_reads_as_empty() {
    let (_dir, store) = store();

    assert!(store.read_all("ORDINE").unwrap().is_empty());
    assert!(store.read_without_header("ORDINE").unwrap().is_empty());
}

#[test]
fn ensure_file_keeps_existing_rows() {
    let (_dir, store) = store();
    store.write_all("CIBO", &numbered_rows(2)).unwrap();

    store.ensure_file("CIBO", &header()).unwrap();

    assert_eq!(store.read_without_header("CIBO").unwrap().len(), 2);
}

#[test]
fn quoted_fields_survive_the_file() {
    let (_dir, store) = store();
    store.ensure_file("CIBO", &header()).unwrap();
    let row = Row::new(vec![
        Some("3".to_string()),
        Some("Box \"maxi\", con patatine\nextra".to_string()),
        Some(String::new()),
        None,
        Some("10".to_string()),
        Some("KebabBox".to_string()),
    ]);

    store.append("CIBO", &row).unwrap();

    assert_eq!(store.read_without_header("CIBO").unwrap(), vec![row]);
}

#[test]
fn single_column_null_rows_are_kept() {
    let (_dir, store) = store();
    let rows = vec![Row::from_texts(["nota"]), Row::new(vec![None]), Row::from_texts(["x"])];

    store.write_all("NOTA", &rows).unwrap();
    store.append("NOTA", &Row::new(vec![None])).unwrap();

    assert_eq!(store.read_without_header("NOTA").unwrap(), vec![
        Row::new(vec![None]),
        Row::from_texts(["x"]),
        Row::new(vec![None]),
    ]);
}

#[test]
fn invalid_table_name_is_rejected() {
    let (_dir, store) = store();

    let err = store.read_all("../CIBO").unwrap_err();

    assert!(matches!(err, StoreError::Persistence { .. }));
}

// ============================================================================
// SECTION: Locking and Backups
// ============================================================================

#[test]
fn concurrent_deletes_remove_exactly_that_many_rows() {
    let (_dir, store) = store();
    store.write_all("CIBO", &numbered_rows(20)).unwrap();
    let store = Arc::new(store);

    let handles: Vec<_> = (0 .. 8)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || store.delete_line("CIBO", 0).unwrap())
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.read_without_header("CIBO").unwrap().len(), 12);
    assert_eq!(store.read_all("CIBO").unwrap()[0], header());
}

#[test]
fn rewrite_keeps_previous_content_as_backup() {
    let (_dir, store) = store();
    store.write_all("CIBO", &numbered_rows(2)).unwrap();
    let before = fs::read_to_string(store.table_path("CIBO").unwrap()).unwrap();

    store.delete_line("CIBO", 1).unwrap();

    let backup = fs::read_to_string(store.backup_path("CIBO").unwrap()).unwrap();
    assert_eq!(backup, before);
    assert_eq!(store.read_without_header("CIBO").unwrap().len(), 1);
}

#[test]
fn failed_backup_does_not_block_the_write() {
    let (_dir, store) = store();
    store.write_all("CIBO", &numbered_rows(2)).unwrap();
    fs::create_dir(store.backup_path("CIBO").unwrap()).unwrap();

    store.delete_line("CIBO", 0).unwrap();

    assert_eq!(store.read_without_header("CIBO").unwrap().len(), 1);
}

// ============================================================================
// SECTION: Backend Queries
// ============================================================================

fn voucher(code: &str, percent: u8) -> Voucher {
    Voucher {
        code: code.to_string(),
        percent,
        expires_on: date!(2030-12-31),
        redeemed: false,
    }
}

#[test]
fn fetch_one_unknown_voucher_is_not_found() {
    let (_dir, store) = store();
    store.ensure_table(Voucher::TABLE, Voucher::COLUMNS).unwrap();
    store.insert(Voucher::TABLE, &voucher("BENVENUTO", 5).encode()).unwrap();

    let err = store.fetch_one("VOUCHER", &["codice"], &[Value::from("SCONTO10")]).unwrap_err();

    assert!(err.is_not_found());
}

#[test]
fn fetch_list_returns_rows_minus_exclusions() {
    let (_dir, store) = store();
    store.ensure_table(Voucher::TABLE, Voucher::COLUMNS).unwrap();
    for (code, percent) in [("A10", 10), ("B20", 20), ("C30", 30)] {
        store.insert(Voucher::TABLE, &voucher(code, percent).encode()).unwrap();
    }
    let mut exclusions = Exclusions::over(Voucher::KEY_COLUMNS);
    exclusions.push(vec![Value::from("B20")]).unwrap();

    let rows = store.fetch_list(Voucher::TABLE, &[], &[], &exclusions, true).unwrap();
    let codes: Vec<&str> = rows.iter().filter_map(|row| row.field(0)).collect();

    assert_eq!(codes, vec!["A10", "C30"]);
}

#[test]
fn typed_filters_match_stored_text() {
    let (_dir, store) = store();
    store.ensure_table(Voucher::TABLE, Voucher::COLUMNS).unwrap();
    store.insert(Voucher::TABLE, &voucher("A10", 10).encode()).unwrap();

    let rows = store
        .fetch_list(Voucher::TABLE, &["usato"], &[Value::from(false)], &Exclusions::none(), false)
        .unwrap();

    assert_eq!(rows.len(), 1);
}

#[test]
fn update_and_delete_report_affected_rows() {
    let (_dir, store) = store();
    store.ensure_table(Voucher::TABLE, Voucher::COLUMNS).unwrap();
    store.insert(Voucher::TABLE, &voucher("A10", 10).encode()).unwrap();

    let changed = store
        .update(Voucher::TABLE, &["usato"], &[Value::from(true)], &["codice"], &[Value::from("A10")])
        .unwrap();
    let stored = Voucher::decode(
        &store.fetch_one(Voucher::TABLE, &["codice"], &[Value::from("A10")]).unwrap(),
    )
    .unwrap();
    let missing = store
        .update(Voucher::TABLE, &["usato"], &[Value::from(true)], &["codice"], &[Value::from("Z")])
        .unwrap();
    let removed = store.delete(Voucher::TABLE, &["codice"], &[Value::from("A10")]).unwrap();

    assert_eq!(changed, 1);
    assert!(stored.redeemed);
    assert_eq!(missing, 0);
    assert_eq!(removed, 1);
    let header = Row::from_texts(Voucher::COLUMNS.iter().copied());
    assert_eq!(store.read_all(Voucher::TABLE).unwrap(), vec![header]);
}

#[test]
fn update_with_mismatched_lists_fails_fast() {
    let (_dir, store) = store();
    store.ensure_table(Voucher::TABLE, Voucher::COLUMNS).unwrap();

    let err = store
        .update(Voucher::TABLE, &["usato", "percentuale"], &[Value::from(true)], &["codice"], &[
            Value::from("A10"),
        ])
        .unwrap_err();

    assert!(matches!(err, StoreError::Persistence { .. }));
}

#[test]
fn insert_without_header_fails() {
    let (_dir, store) = store();

    let err = store.insert(Voucher::TABLE, &voucher("A10", 10).encode()).unwrap_err();

    assert!(matches!(err, StoreError::Persistence { .. }));
}
