// crates/kebab-store-core/src/core/mod.rs
// ============================================================================
// Module: Kebab Store Core Types
// Description: Column values, raw rows, the flat-file codec, and entities.
// Purpose: Provide the typed data model every backend and cache shares.
// Dependencies: bigdecimal, time, thiserror
// ============================================================================

//! ## Overview
//! Core types describe what is stored: typed [`Value`]s, raw [`Row`]s, the
//! delimited record codec used by the file backend, and the kebab-shop
//! entities (menu, customers, accounts, orders, vouchers).

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod catalog;
pub mod codec;
pub mod customers;
pub mod orders;
pub mod row;
pub mod value;
pub mod variant;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use catalog::FoodClass;
pub use catalog::FoodItem;
pub use catalog::FoodTier;
pub use codec::CodecError;
pub use codec::encode_record;
pub use codec::encode_records;
pub use codec::parse_records;
pub use customers::Account;
pub use customers::Client;
pub use customers::Role;
pub use orders::Order;
pub use orders::OrderStatus;
pub use orders::Voucher;
pub use row::FieldError;
pub use row::FromField;
pub use row::Row;
pub use value::Value;
pub use variant::UnknownVariant;
