// crates/kebab-store-core/src/core/value.rs
// ============================================================================
// Module: Kebab Store Column Values
// Description: Typed column values bound into statements and encoded as text.
// Purpose: Provide one value model shared by every storage backend.
// Dependencies: bigdecimal, time
// ============================================================================

//! ## Overview
//! [`Value`] is the typed side of the row codec. Backends bind values into
//! statements (relational) or encode them as text fields (file, in-memory).
//! Invariants:
//! - [`Value::to_text`] output is accepted by the matching `FromField` decoder.
//! - [`Value::Null`] has no textual form; it is stored as an absent field.
//! - Decimals render without trailing zeros, so equal amounts share one text
//!   and compare equal inside a relational store.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use time::Date;
use time::PrimitiveDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

// ============================================================================
// SECTION: Formats
// ============================================================================

/// ISO-8601 calendar date layout (`YYYY-MM-DD`).
const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
/// ISO-8601 local timestamp layout (`YYYY-MM-DDTHH:MM:SS`).
const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

// ============================================================================
// SECTION: Value
// ============================================================================

/// Typed column value.
///
/// # Invariants
/// - Timestamps carry whole seconds; sub-second precision is not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// Explicit SQL/flat-file null.
    Null,
    /// Signed integer.
    Integer(i64),
    /// Exact decimal (prices, totals).
    Decimal(BigDecimal),
    /// Plain text.
    Text(String),
    /// Boolean flag.
    Bool(bool),
    /// Calendar date.
    Date(Date),
    /// Local date-time.
    Timestamp(PrimitiveDateTime),
}

impl Value {
    /// Returns the canonical textual form, or `None` for [`Value::Null`].
    #[must_use]
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Integer(value) => Some(value.to_string()),
            Self::Decimal(value) => Some(value.normalized().to_plain_string()),
            Self::Text(value) => Some(value.clone()),
            Self::Bool(value) => Some(bool_text(*value).to_string()),
            Self::Date(value) => Some(date_text(*value)),
            Self::Timestamp(value) => Some(timestamp_text(*value)),
        }
    }

    /// Returns true when this value is [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns true when a stored textual field holds this value.
    ///
    /// Comparison is typed: `5.5` matches `"5.50"` for decimals and `1`
    /// matches `"true"` for booleans.
    #[must_use]
    pub fn matches(&self, field: Option<&str>) -> bool {
        let Some(field) = field else {
            return self.is_null();
        };
        match self {
            Self::Null => false,
            Self::Integer(value) => field.trim().parse::<i64>().is_ok_and(|parsed| parsed == *value),
            Self::Decimal(value) => {
                BigDecimal::from_str(field.trim()).is_ok_and(|parsed| parsed == *value)
            }
            Self::Text(value) => field == value,
            Self::Bool(value) => parse_bool(field) == Some(*value),
            Self::Date(value) => parse_date(field).is_some_and(|parsed| parsed == *value),
            Self::Timestamp(value) => {
                parse_timestamp(field).is_some_and(|parsed| parsed == *value)
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_text() {
            Some(text) => f.write_str(&text),
            None => f.write_str("null"),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u8> for Value {
    fn from(value: u8) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<BigDecimal> for Value {
    fn from(value: BigDecimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<Date> for Value {
    fn from(value: Date) -> Self {
        Self::Date(value)
    }
}

impl From<PrimitiveDateTime> for Value {
    fn from(value: PrimitiveDateTime) -> Self {
        Self::Timestamp(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

// ============================================================================
// SECTION: Text Helpers
// ============================================================================

/// Literal text used for booleans.
pub(crate) const fn bool_text(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

/// Formats a date as `YYYY-MM-DD`.
fn date_text(value: Date) -> String {
    format!("{:04}-{:02}-{:02}", value.year(), u8::from(value.month()), value.day())
}

/// Formats a timestamp as `YYYY-MM-DDTHH:MM:SS`.
fn timestamp_text(value: PrimitiveDateTime) -> String {
    format!(
        "{}T{:02}:{:02}:{:02}",
        date_text(value.date()),
        value.hour(),
        value.minute(),
        value.second()
    )
}

/// Parses a boolean field. Relational stores hand back `0`/`1`.
pub(crate) fn parse_bool(field: &str) -> Option<bool> {
    match field.trim() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Parses an ISO-8601 calendar date.
pub(crate) fn parse_date(field: &str) -> Option<Date> {
    Date::parse(field.trim(), DATE_FORMAT).ok()
}

/// Parses an ISO-8601 local timestamp.
pub(crate) fn parse_timestamp(field: &str) -> Option<PrimitiveDateTime> {
    PrimitiveDateTime::parse(field.trim(), TIMESTAMP_FORMAT).ok()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions.")]

    use std::str::FromStr;

    use bigdecimal::BigDecimal;
    use time::macros::date;
    use time::macros::datetime;

    use super::Value;

    #[test]
    fn dates_and_timestamps_use_iso_text() {
        assert_eq!(Value::Date(date!(2024-03-07)).to_text().as_deref(), Some("2024-03-07"));
        assert_eq!(
            Value::Timestamp(datetime!(2024-03-07 18:05:09)).to_text().as_deref(),
            Some("2024-03-07T18:05:09")
        );
    }

    #[test]
    fn decimal_matching_ignores_trailing_zeros() {
        let price = Value::Decimal(BigDecimal::from_str("5.5").unwrap());
        assert!(price.matches(Some("5.50")));
        assert!(!price.matches(Some("5.51")));
        assert!(!price.matches(None));
    }

    #[test]
    fn equal_decimals_share_one_text() {
        let listed = Value::Decimal(BigDecimal::from_str("5.50").unwrap());
        let asked = Value::Decimal(BigDecimal::from_str("5.5").unwrap());
        assert_eq!(listed.to_text(), asked.to_text());
        assert_eq!(listed.to_text().as_deref(), Some("5.5"));
        assert_eq!(
            Value::Decimal(BigDecimal::from_str("1200").unwrap()).to_text().as_deref(),
            Some("1200")
        );
    }

    #[test]
    fn bool_matching_accepts_relational_integers() {
        assert!(Value::Bool(true).matches(Some("1")));
        assert!(Value::Bool(false).matches(Some("false")));
        assert!(!Value::Bool(false).matches(Some("yes")));
    }

    #[test]
    fn null_only_matches_absent_fields() {
        assert!(Value::Null.matches(None));
        assert!(!Value::Null.matches(Some("")));
        assert_eq!(Value::from(None::<String>), Value::Null);
    }
}
