// crates/kebab-store-config/src/registry.rs
// ============================================================================
// Module: Store Registry
// Description: Backend selection and the per-entity cache registry.
// Purpose: Wire one configured backend into every entity cache.
// Dependencies: kebab-store-core, kebab-store-file, kebab-store-sqlite, tracing
// ============================================================================

//! ## Overview
//! [`build_backend`] turns validated configuration into a shared backend, and
//! [`StoreRegistry`] owns one [`EntityCache`] per entity over that backend.
//! All caches in a registry observe the same backend instance.

// ============================================================================
// SECTION: Imports
// ============================================================================

use kebab_store_core::Account;
use kebab_store_core::Client;
use kebab_store_core::Entity;
use kebab_store_core::EntityCache;
use kebab_store_core::FoodItem;
use kebab_store_core::InMemoryTableBackend;
use kebab_store_core::Order;
use kebab_store_core::SharedTableBackend;
use kebab_store_core::StoreError;
use kebab_store_core::TableBackend;
use kebab_store_core::Voucher;
use kebab_store_file::FileTableStore;
use kebab_store_sqlite::SqliteTableGateway;
use tracing::info;

use crate::config::BackendKind;
use crate::config::KebabStoreConfig;
use crate::config::StoreConfig;

// ============================================================================
// SECTION: Backend Selection
// ============================================================================

/// Builds the backend selected by `config`.
///
/// # Errors
///
/// Returns [`StoreError::Configuration`] for a missing or inconsistent backend
/// setting, or [`StoreError::Persistence`] when the backend cannot be opened.
pub fn build_backend(config: &StoreConfig) -> Result<SharedTableBackend, StoreError> {
    config.validate()?;
    let kind = config.backend_kind()?;
    let backend = match kind {
        BackendKind::Memory => SharedTableBackend::from_backend(InMemoryTableBackend::new()),
        BackendKind::File => {
            let root = config.file_root()?;
            info!(root = %root.display(), "opening file table store");
            SharedTableBackend::from_backend(FileTableStore::open(root)?)
        }
        BackendKind::Relational => {
            let sqlite = config.sqlite()?;
            info!(path = %sqlite.path.display(), "opening sqlite table gateway");
            SharedTableBackend::from_backend(SqliteTableGateway::open(&sqlite)?)
        }
    };
    info!(backend = kind.label(), "store backend selected");
    Ok(backend)
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// One entity cache per persistent entity, sharing a single backend.
#[derive(Debug)]
pub struct StoreRegistry {
    /// Backend shared by every cache.
    backend: SharedTableBackend,
    /// Menu items (`CIBO`).
    foods: EntityCache<FoodItem>,
    /// Customers (`CLIENTE`).
    clients: EntityCache<Client>,
    /// Login accounts (`UTENTE`).
    accounts: EntityCache<Account>,
    /// Orders (`ORDINE`).
    orders: EntityCache<Order>,
    /// Discount vouchers (`VOUCHER`).
    vouchers: EntityCache<Voucher>,
}

impl StoreRegistry {
    /// Creates a registry over an existing backend.
    #[must_use]
    pub fn new(backend: SharedTableBackend) -> Self {
        Self {
            foods: EntityCache::new(backend.clone()),
            clients: EntityCache::new(backend.clone()),
            accounts: EntityCache::new(backend.clone()),
            orders: EntityCache::new(backend.clone()),
            vouchers: EntityCache::new(backend.clone()),
            backend,
        }
    }

    /// Builds the configured backend and a registry over it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when backend selection or opening fails.
    pub fn from_config(config: &KebabStoreConfig) -> Result<Self, StoreError> {
        build_backend(&config.store).map(Self::new)
    }

    /// Creates every entity table that does not exist yet, then checks readiness.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] when a table cannot be created or the
    /// backend is not ready.
    pub fn bootstrap(&self) -> Result<(), StoreError> {
        for (table, columns) in [
            (FoodItem::TABLE, FoodItem::COLUMNS),
            (Client::TABLE, Client::COLUMNS),
            (Account::TABLE, Account::COLUMNS),
            (Order::TABLE, Order::COLUMNS),
            (Voucher::TABLE, Voucher::COLUMNS),
        ] {
            self.backend.ensure_table(table, columns)?;
        }
        self.backend.readiness()?;
        info!("store tables ready");
        Ok(())
    }

    /// Drops every cached entity; stored rows are untouched.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] when a cache lock is poisoned.
    pub fn clear_caches(&self) -> Result<(), StoreError> {
        self.foods.clear()?;
        self.clients.clear()?;
        self.accounts.clear()?;
        self.orders.clear()?;
        self.vouchers.clear()
    }

    /// Returns the shared backend.
    #[must_use]
    pub const fn backend(&self) -> &SharedTableBackend {
        &self.backend
    }

    /// Returns the menu item cache.
    #[must_use]
    pub const fn foods(&self) -> &EntityCache<FoodItem> {
        &self.foods
    }

    /// Returns the customer cache.
    #[must_use]
    pub const fn clients(&self) -> &EntityCache<Client> {
        &self.clients
    }

    /// Returns the account cache.
    #[must_use]
    pub const fn accounts(&self) -> &EntityCache<Account> {
        &self.accounts
    }

    /// Returns the order cache.
    #[must_use]
    pub const fn orders(&self) -> &EntityCache<Order> {
        &self.orders
    }

    /// Returns the voucher cache.
    #[must_use]
    pub const fn vouchers(&self) -> &EntityCache<Voucher> {
        &self.vouchers
    }
}
