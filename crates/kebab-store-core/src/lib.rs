// crates/kebab-store-core/src/lib.rs
// ============================================================================
// Module: Kebab Store Core Library
// Description: Public API surface for the kebab-shop persistence core.
// Purpose: Expose values, entities, the backend contract, and the entity cache.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Kebab store core provides a backend-agnostic data-access layer for the
//! shop: a typed value and row model, a table backend contract implemented
//! by relational, file, and in-memory stores, and a per-entity cache that
//! hands out one shared instance per key. Backends live in sibling crates;
//! the in-memory backend ships here.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use interfaces::BoxError;
pub use interfaces::Entity;
pub use interfaces::Exclusions;
pub use interfaces::Filter;
pub use interfaces::StoreError;
pub use interfaces::TableBackend;
pub use interfaces::ensure_bindings;
pub use interfaces::key_label;
pub use interfaces::validate_identifier;
pub use runtime::CacheState;
pub use runtime::EntityCache;
pub use runtime::InMemoryTableBackend;
pub use runtime::SharedTableBackend;
pub use runtime::TableShape;
