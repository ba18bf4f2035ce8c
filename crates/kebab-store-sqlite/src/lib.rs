// crates/kebab-store-sqlite/src/lib.rs
// ============================================================================
// Module: Kebab Store SQLite Backend
// Description: Relational table gateway for the kebab store.
// Purpose: Provide SQLite persistence through bound, generated statements.
// Dependencies: kebab-store-core, rusqlite, serde, thiserror, tracing
// ============================================================================

//! ## Overview
//! This crate implements [`kebab_store_core::TableBackend`] on `SQLite`.
//! Statements are generated from column/value lists with every value bound
//! as a parameter, including exclusion keys for incremental list fetches.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod gateway;
pub mod statement;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use gateway::DEFAULT_BUSY_TIMEOUT_MS;
pub use gateway::MAX_BOUND_EXCLUSION_VALUES;
pub use gateway::SqlValue;
pub use gateway::SqliteGatewayConfig;
pub use gateway::SqliteGatewayError;
pub use gateway::SqliteJournalMode;
pub use gateway::SqliteSyncMode;
pub use gateway::SqliteTableGateway;
pub use statement::Statement;
