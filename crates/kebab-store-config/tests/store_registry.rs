// crates/kebab-store-config/tests/store_registry.rs
// ============================================================================
// Module: Store Registry Tests
// Description: Backend selection and cache wiring for each backend kind.
// Purpose: Ensure every configured backend serves the same entity caches.
// ============================================================================

//! ## Overview
//! Builds registries from configuration and drives them through the caches.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::sync::Arc;

use bigdecimal::BigDecimal;
use kebab_store_config::BackendKind;
use kebab_store_config::KebabStoreConfig;
use kebab_store_config::StoreConfig;
use kebab_store_config::StoreRegistry;
use kebab_store_config::build_backend;
use kebab_store_core::Client;
use kebab_store_core::Entity;
use kebab_store_core::Filter;
use kebab_store_core::FoodClass;
use kebab_store_core::FoodItem;
use kebab_store_core::Order;
use kebab_store_core::OrderStatus;
use kebab_store_core::StoreError;
use kebab_store_core::TableBackend;
use kebab_store_core::Voucher;
use tempfile::TempDir;
use time::macros::date;
use time::macros::datetime;

fn client(id: &str) -> Client {
    Client {
        id: id.to_string(),
        first_name: "Mario".to_string(),
        last_name: "Rossi".to_string(),
        email: format!("{}@example.it", id.to_lowercase()),
        phone: None,
    }
}

fn order(id: &str, client_id: &str, status: OrderStatus) -> Order {
    Order {
        id: id.to_string(),
        client_id: client_id.to_string(),
        placed_at: datetime!(2024-05-10 12:30:00),
        status,
        total: "12.50".parse::<BigDecimal>().unwrap(),
        voucher_code: None,
    }
}

fn kebab(id: &str, cost: &str) -> FoodItem {
    FoodItem {
        id: id.to_string(),
        description: "Piadina Kebab".to_string(),
        tier: FoodClass::PiadinaKebab.tier(),
        cost: cost.parse::<BigDecimal>().unwrap(),
        prep_minutes: 6,
        class: FoodClass::PiadinaKebab,
    }
}

/// Lists by decimal cost through a warm and a cold registry over one backend.
fn decimal_filters_ignore_scale(config: &StoreConfig) {
    let backend = build_backend(config).unwrap();
    let warm = StoreRegistry::new(backend.clone());
    warm.bootstrap().unwrap();
    warm.foods().create(kebab("1", "5.50")).unwrap();
    warm.foods().create(kebab("2", "5.50")).unwrap();
    let asked = "5.5".parse::<BigDecimal>().unwrap();

    let cold = StoreRegistry::new(backend)
        .foods()
        .get_all_matching(&Filter::by("costo", asked.clone()))
        .unwrap();
    let cached = warm.foods().get_all_matching(&Filter::by("costo", asked)).unwrap();

    assert_eq!(cold.len(), 2);
    assert_eq!(cached.len(), 2);
}

/// Runs the same cache workflow against any registry.
fn exercise(registry: &StoreRegistry) {
    registry.bootstrap().unwrap();
    registry.clients().create(client("CLI001")).unwrap();
    registry.orders().create(order("1", "CLI001", OrderStatus::Pending)).unwrap();
    registry.orders().create(order("2", "CLI001", OrderStatus::Delivered)).unwrap();
    registry.clear_caches().unwrap();

    let first = registry.clients().get_by_key(&"CLI001".to_string()).unwrap();
    let second = registry.clients().get_by_key(&"CLI001".to_string()).unwrap();
    let pending = registry
        .orders()
        .get_all_matching(&Filter::by("stato", OrderStatus::Pending.label()))
        .unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, "1");
    assert!(registry.vouchers().get_by_key(&"SCONTO10".to_string()).unwrap_err().is_not_found());
}

#[test]
fn memory_backend_serves_every_cache() {
    let config = KebabStoreConfig::parse("[store]\nbackend = \"memory\"\n").unwrap();

    let registry = StoreRegistry::from_config(&config).unwrap();

    exercise(&registry);
}

#[test]
fn file_backend_bootstrap_creates_table_files() {
    let dir = TempDir::new().unwrap();
    let config = KebabStoreConfig {
        store: StoreConfig {
            root: Some(dir.path().join("tables")),
            ..StoreConfig::with_backend(BackendKind::File)
        },
    };

    let registry = StoreRegistry::from_config(&config).unwrap();
    exercise(&registry);

    for table in ["CIBO", "CLIENTE", "UTENTE", "ORDINE", "VOUCHER"] {
        assert!(dir.path().join("tables").join(format!("{table}.csv")).is_file());
    }
}

#[test]
fn relational_backend_serves_every_cache() {
    let dir = TempDir::new().unwrap();
    let config = KebabStoreConfig {
        store: StoreConfig {
            path: Some(dir.path().join("kebab.sqlite")),
            ..StoreConfig::with_backend(BackendKind::Relational)
        },
    };

    let registry = StoreRegistry::from_config(&config).unwrap();

    exercise(&registry);
}

#[test]
fn bootstrap_keeps_existing_rows() {
    let dir = TempDir::new().unwrap();
    let config = StoreConfig {
        root: Some(dir.path().to_path_buf()),
        ..StoreConfig::with_backend(BackendKind::File)
    };
    let registry = StoreRegistry::new(build_backend(&config).unwrap());
    registry.bootstrap().unwrap();
    registry
        .vouchers()
        .create(Voucher {
            code: "BENVENUTO".to_string(),
            percent: 5,
            expires_on: date!(2030-12-31),
            redeemed: false,
        })
        .unwrap();

    let reopened = StoreRegistry::new(build_backend(&config).unwrap());
    reopened.bootstrap().unwrap();

    assert!(reopened.vouchers().exists(&"BENVENUTO".to_string()).unwrap());
}

#[test]
fn caches_share_the_registry_backend() {
    let registry = StoreRegistry::from_config(
        &KebabStoreConfig::parse("[store]\nbackend = \"memory\"\n").unwrap(),
    )
    .unwrap();
    registry.bootstrap().unwrap();
    registry.clients().create(client("CLI002")).unwrap();

    let row = registry
        .backend()
        .fetch_one(Client::TABLE, Client::KEY_COLUMNS, &Client::key_values(&"CLI002".to_string()))
        .unwrap();

    assert_eq!(Client::decode(&row).unwrap(), client("CLI002"));
}

#[test]
fn missing_backend_selection_is_configuration_error() {
    let err = build_backend(&StoreConfig::default()).unwrap_err();

    assert!(matches!(err, StoreError::Configuration(_)));
}

#[test]
fn inconsistent_settings_are_configuration_errors() {
    let config = StoreConfig {
        path: Some("kebab.sqlite".into()),
        ..StoreConfig::with_backend(BackendKind::Memory)
    };

    let err = build_backend(&config).unwrap_err();

    assert!(matches!(err, StoreError::Configuration(_)));
}

#[test]
fn decimal_filters_ignore_scale_on_every_backend() {
    let dir = TempDir::new().unwrap();
    let configs = [
        StoreConfig::with_backend(BackendKind::Memory),
        StoreConfig {
            root: Some(dir.path().join("tables")),
            ..StoreConfig::with_backend(BackendKind::File)
        },
        StoreConfig {
            path: Some(dir.path().join("kebab.sqlite")),
            ..StoreConfig::with_backend(BackendKind::Relational)
        },
    ];

    for config in &configs {
        decimal_filters_ignore_scale(config);
    }
}
