// crates/kebab-store-core/src/core/variant.rs
// ============================================================================
// Module: Kebab Store Stored Variants
// Description: Shared error for closed enumerations stored as text labels.
// Purpose: Reject unknown discriminator labels during hydration.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Discriminator columns (food class, order status, account role) hold a
//! label from a closed set. Decoding matches the known labels and falls back
//! to [`UnknownVariant`]; no label is ever resolved by name lookup.

use thiserror::Error;

/// Stored label outside the known variant set.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown {kind} label '{label}'")]
pub struct UnknownVariant {
    /// Enumeration being decoded.
    pub kind: &'static str,
    /// Offending label.
    pub label: String,
}

impl UnknownVariant {
    /// Creates the error for `kind` and `label`.
    #[must_use]
    pub fn new(kind: &'static str, label: &str) -> Self {
        Self {
            kind,
            label: label.to_string(),
        }
    }
}
