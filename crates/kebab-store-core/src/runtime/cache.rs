// crates/kebab-store-core/src/runtime/cache.rs
// ============================================================================
// Module: Kebab Store Entity Cache
// Description: Per-entity lazy factory memoizing hydrated instances by key.
// Purpose: Guarantee one shared instance per key in front of any backend.
// Dependencies: crate::core, crate::interfaces, crate::runtime, tracing
// ============================================================================

//! ## Overview
//! [`EntityCache`] answers lookups from memory and delegates misses to a
//! [`SharedTableBackend`]. Hydrated entities are kept as `Arc`s, so repeated
//! lookups of one key hand out the same allocation.
//! Invariants:
//! - At most one entry per key; colliding fetches keep the existing entry.
//! - Concurrent misses on one key perform at most one backend fetch.
//! - List merges hold the cache exclusively; writes share it, so no write
//!   lands between a list fetch and its merge.
//! - Failed fetches, inserts, and updates never change the cache.
//! - Entries leave only through [`EntityCache::delete`] or
//!   [`EntityCache::clear`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::RwLock;
use std::sync::RwLockReadGuard;
use std::sync::RwLockWriteGuard;

use tracing::trace;

use crate::core::Row;
use crate::interfaces::Entity;
use crate::interfaces::Exclusions;
use crate::interfaces::Filter;
use crate::interfaces::StoreError;
use crate::interfaces::TableBackend;
use crate::interfaces::key_label;
use crate::runtime::store::SharedTableBackend;

// ============================================================================
// SECTION: Cache State
// ============================================================================

/// Coarse cache occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// No entry is held.
    Empty,
    /// At least one entry is held.
    Populated,
}

// ============================================================================
// SECTION: Entity Cache
// ============================================================================

/// Per-key single-flight gate.
type Gate = Arc<Mutex<()>>;

/// Lazy factory for one entity type.
pub struct EntityCache<E: Entity> {
    /// Backend consulted on misses and writes.
    backend: SharedTableBackend,
    /// Hydrated entries by key.
    entries: Mutex<BTreeMap<E::Key, Arc<E>>>,
    /// Gates serializing backend work per key.
    gates: Mutex<BTreeMap<E::Key, Gate>>,
    /// Shared by writes, held exclusively by list merges.
    merge: RwLock<()>,
}

impl<E: Entity> std::fmt::Debug for EntityCache<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityCache").field("table", &E::TABLE).finish_non_exhaustive()
    }
}

impl<E: Entity> EntityCache<E> {
    /// Creates an empty cache over `backend`.
    #[must_use]
    pub fn new(backend: SharedTableBackend) -> Self {
        Self {
            backend,
            entries: Mutex::new(BTreeMap::new()),
            gates: Mutex::new(BTreeMap::new()),
            merge: RwLock::new(()),
        }
    }

    /// Returns the backend this cache delegates to.
    #[must_use]
    pub const fn backend(&self) -> &SharedTableBackend {
        &self.backend
    }

    /// Returns the entity for `key`, fetching it on a miss.
    ///
    /// # Errors
    ///
    /// Returns backend and hydration errors unchanged; nothing is cached then.
    pub fn get_by_key(&self, key: &E::Key) -> Result<Arc<E>, StoreError> {
        if let Some(hit) = self.cached(key)? {
            trace!(table = E::TABLE, ?key, "entity cache hit");
            return Ok(hit);
        }
        self.single_flight(key, || {
            if let Some(hit) = self.cached(key)? {
                trace!(table = E::TABLE, ?key, "entity cache hit after wait");
                return Ok(hit);
            }
            trace!(table = E::TABLE, ?key, "entity cache miss");
            let row = self.backend.fetch_one(E::TABLE, E::KEY_COLUMNS, &E::key_values(key))?;
            let entity = E::decode(&row)?;
            self.remember(entity)
        })
    }

    /// Returns cached and stored entities matching `filter`, ordered by key.
    ///
    /// Keys already cached are passed as exclusions so the backend returns
    /// only rows not yet loaded.
    ///
    /// # Errors
    ///
    /// Returns backend and hydration errors unchanged; rows decoded before the
    /// failure are not cached.
    pub fn get_all_matching(&self, filter: &Filter) -> Result<Vec<Arc<E>>, StoreError> {
        let positions = filter_positions::<E>(filter)?;
        let _merging = self.merge_exclusive()?;
        let mut exclusions = Exclusions::over(E::KEY_COLUMNS);
        for key in self.lock_entries()?.keys() {
            exclusions.push(E::key_values(key))?;
        }
        let rows = self.backend.fetch_list(
            E::TABLE,
            &filter.columns(),
            filter.values(),
            &exclusions,
            filter.is_all(),
        )?;
        let fetched = rows.iter().map(E::decode).collect::<Result<Vec<_>, _>>()?;
        trace!(table = E::TABLE, fetched = fetched.len(), "entity cache list merge");
        let mut entries = self.lock_entries()?;
        for entity in fetched {
            entries.entry(entity.key()).or_insert_with(|| Arc::new(entity));
        }
        Ok(entries
            .values()
            .filter(|entity| {
                filter.is_all() || {
                    let row = Row::from_values(&entity.encode());
                    positions
                        .iter()
                        .zip(filter.values())
                        .all(|(position, value)| value.matches(row.field(*position)))
                }
            })
            .cloned()
            .collect())
    }

    /// Inserts a new entity and caches it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] when the key is already cached
    /// (without a backend call) and backend errors unchanged.
    pub fn create(&self, entity: E) -> Result<Arc<E>, StoreError> {
        let key = entity.key();
        self.single_flight(&key, || {
            let _writing = self.merge_shared()?;
            if self.contains(&key)? {
                return Err(StoreError::persistence(format!(
                    "{} key {} is already cached",
                    E::TABLE,
                    key_label(&E::key_values(&key))
                )));
            }
            self.backend.insert(E::TABLE, &entity.encode())?;
            trace!(table = E::TABLE, ?key, "entity cache insert");
            let created = Arc::new(entity);
            self.lock_entries()?.insert(key.clone(), Arc::clone(&created));
            Ok(created)
        })
    }

    /// Writes every column of `entity` and replaces the cached entry.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no stored row has the key and
    /// backend errors unchanged; the cache is left untouched then.
    pub fn update(&self, entity: E) -> Result<Arc<E>, StoreError> {
        let key = entity.key();
        let key_values = E::key_values(&key);
        self.single_flight(&key, || {
            let _writing = self.merge_shared()?;
            let changed = self.backend.update(
                E::TABLE,
                E::COLUMNS,
                &entity.encode(),
                E::KEY_COLUMNS,
                &key_values,
            )?;
            if changed == 0 {
                return Err(StoreError::not_found(E::TABLE, &key_values));
            }
            trace!(table = E::TABLE, ?key, changed, "entity cache replace");
            let updated = Arc::new(entity);
            self.lock_entries()?.insert(key.clone(), Arc::clone(&updated));
            Ok(updated)
        })
    }

    /// Deletes the stored rows for `key` and drops the cached entry.
    ///
    /// Returns the number of rows removed by the backend.
    ///
    /// # Errors
    ///
    /// Returns backend errors unchanged; the entry is kept then.
    pub fn delete(&self, key: &E::Key) -> Result<usize, StoreError> {
        self.single_flight(key, || {
            let _writing = self.merge_shared()?;
            let removed = self.backend.delete(E::TABLE, E::KEY_COLUMNS, &E::key_values(key))?;
            self.lock_entries()?.remove(key);
            trace!(table = E::TABLE, ?key, removed, "entity cache remove");
            Ok(removed)
        })
    }

    /// Returns true when `key` is cached or stored.
    ///
    /// A stored entity found by the backend lookup is cached.
    ///
    /// # Errors
    ///
    /// Returns backend errors other than [`StoreError::NotFound`].
    pub fn exists(&self, key: &E::Key) -> Result<bool, StoreError> {
        match self.get_by_key(key) {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Returns the cached entity for `key` without touching the backend.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] when the cache mutex is poisoned.
    pub fn cached(&self, key: &E::Key) -> Result<Option<Arc<E>>, StoreError> {
        Ok(self.lock_entries()?.get(key).cloned())
    }

    /// Returns true when `key` is cached.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] when the cache mutex is poisoned.
    pub fn contains(&self, key: &E::Key) -> Result<bool, StoreError> {
        Ok(self.lock_entries()?.contains_key(key))
    }

    /// Returns the number of cached entries.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] when the cache mutex is poisoned.
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.lock_entries()?.len())
    }

    /// Returns true when nothing is cached.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] when the cache mutex is poisoned.
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.lock_entries()?.is_empty())
    }

    /// Returns the coarse cache state.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] when the cache mutex is poisoned.
    pub fn state(&self) -> Result<CacheState, StoreError> {
        if self.is_empty()? { Ok(CacheState::Empty) } else { Ok(CacheState::Populated) }
    }

    /// Drops every cached entry; the backend is not touched.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] when the cache mutex is poisoned.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.lock_entries()?.clear();
        trace!(table = E::TABLE, "entity cache cleared");
        Ok(())
    }

    /// Caches a freshly decoded entity unless its key is already present.
    fn remember(&self, entity: E) -> Result<Arc<E>, StoreError> {
        let mut entries = self.lock_entries()?;
        match entries.entry(entity.key()) {
            Entry::Occupied(existing) => Ok(Arc::clone(existing.get())),
            Entry::Vacant(slot) => Ok(Arc::clone(slot.insert(Arc::new(entity)))),
        }
    }

    /// Runs `work` while holding the gate for `key`.
    fn single_flight<T>(
        &self,
        key: &E::Key,
        work: impl FnOnce() -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let gate = {
            let mut gates = self.lock_gates()?;
            Arc::clone(gates.entry(key.clone()).or_default())
        };
        let outcome = {
            let _held = gate
                .lock()
                .map_err(|_| StoreError::persistence("entity cache key gate poisoned"))?;
            work()
        };
        let mut gates = self.lock_gates()?;
        if Arc::strong_count(&gate) <= 2 {
            gates.remove(key);
        }
        outcome
    }

    /// Locks the entry map.
    fn lock_entries(&self) -> Result<MutexGuard<'_, BTreeMap<E::Key, Arc<E>>>, StoreError> {
        self.entries.lock().map_err(|_| StoreError::persistence("entity cache mutex poisoned"))
    }

    /// Takes the merge lock for a write.
    fn merge_shared(&self) -> Result<RwLockReadGuard<'_, ()>, StoreError> {
        self.merge.read().map_err(|_| StoreError::persistence("entity cache merge lock poisoned"))
    }

    /// Takes the merge lock for a list fetch and merge.
    fn merge_exclusive(&self) -> Result<RwLockWriteGuard<'_, ()>, StoreError> {
        self.merge.write().map_err(|_| StoreError::persistence("entity cache merge lock poisoned"))
    }

    /// Locks the gate map.
    fn lock_gates(&self) -> Result<MutexGuard<'_, BTreeMap<E::Key, Gate>>, StoreError> {
        self.gates.lock().map_err(|_| StoreError::persistence("entity cache gate mutex poisoned"))
    }
}

/// Resolves filter columns to positions in the entity's column list.
fn filter_positions<E: Entity>(filter: &Filter) -> Result<Vec<usize>, StoreError> {
    if filter.is_all() {
        return Ok(Vec::new());
    }
    filter
        .columns()
        .into_iter()
        .map(|column| {
            E::COLUMNS.iter().position(|name| *name == column).ok_or_else(|| {
                StoreError::persistence(format!("{} has no column {column}", E::TABLE))
            })
        })
        .collect()
}
