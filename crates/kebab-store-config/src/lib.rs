// crates/kebab-store-config/src/lib.rs
// ============================================================================
// Module: Kebab Store Config
// Description: Configuration and backend selection for the kebab store.
// Purpose: Load `kebab-store.toml` and build the entity cache registry.
// Dependencies: kebab-store-core, kebab-store-file, kebab-store-sqlite
// ============================================================================

//! ## Overview
//! Loads the store configuration, selects one backend (relational, file, or
//! memory), and exposes a [`StoreRegistry`] with an entity cache per table.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod registry;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::BackendKind;
pub use config::CONFIG_ENV_VAR;
pub use config::ConfigError;
pub use config::KebabStoreConfig;
pub use config::StoreConfig;
pub use registry::StoreRegistry;
pub use registry::build_backend;
