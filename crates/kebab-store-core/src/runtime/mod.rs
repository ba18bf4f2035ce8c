// crates/kebab-store-core/src/runtime/mod.rs
// ============================================================================
// Module: Kebab Store Runtime
// Description: Entity cache, in-memory backend, and header-table helpers.
// Purpose: Run entity lookups and writes against any table backend.
// Dependencies: crate::{core, interfaces}, tracing
// ============================================================================

//! ## Overview
//! Runtime modules sit between callers and a [`crate::interfaces::TableBackend`]:
//! the entity cache memoizes hydrated instances, and the in-memory backend
//! provides a volatile store with the same query semantics as the file one.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod cache;
pub mod store;
pub mod table;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use cache::CacheState;
pub use cache::EntityCache;
pub use store::InMemoryTableBackend;
pub use store::SharedTableBackend;
pub use table::TableShape;
