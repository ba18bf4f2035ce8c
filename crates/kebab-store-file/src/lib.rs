// crates/kebab-store-file/src/lib.rs
// ============================================================================
// Module: Kebab Store File Backend
// Description: Flat-file table backend for the kebab store.
// Purpose: Provide text-file persistence without an external database.
// Dependencies: kebab-store-core, tempfile, tracing
// ============================================================================

//! ## Overview
//! This crate stores each table as a comma-delimited file with a header row.
//! It exposes line-level operations for direct use and implements the
//! [`kebab_store_core::TableBackend`] contract for the entity caches.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::BACKUP_SUFFIX;
pub use store::FileTableStore;
pub use store::TABLE_EXTENSION;
