// crates/kebab-store-core/src/core/row.rs
// ============================================================================
// Module: Kebab Store Rows
// Description: Raw backend rows and typed field decoding.
// Purpose: Decode untyped textual fields into domain values during hydration.
// Dependencies: bigdecimal, time, thiserror
// ============================================================================

//! ## Overview
//! A [`Row`] is the ordered list of raw fields a backend returns for one
//! entity. Fields are textual or absent (null). [`FromField`] is the decoding
//! half of the row codec; [`Value::to_text`](crate::Value::to_text) is the
//! encoding half.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::str::FromStr;

use bigdecimal::BigDecimal;
use thiserror::Error;
use time::Date;
use time::PrimitiveDateTime;

use crate::core::value::Value;
use crate::core::value::parse_bool;
use crate::core::value::parse_date;
use crate::core::value::parse_timestamp;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Field Errors
// ============================================================================

/// Errors raised when a stored field cannot be decoded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// Field was null where a value is required.
    #[error("field is null")]
    Null,
    /// Field text does not parse as the requested type.
    #[error("cannot parse '{text}' as {expected}")]
    Malformed {
        /// Offending field text.
        text: String,
        /// Expected type label.
        expected: &'static str,
    },
    /// Row is shorter than the requested index.
    #[error("row has {len} fields, index {index} requested")]
    OutOfRange {
        /// Requested index.
        index: usize,
        /// Row length.
        len: usize,
    },
}

// ============================================================================
// SECTION: Row
// ============================================================================

/// Ordered raw fields for one stored entity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row {
    /// Raw fields; `None` is null.
    fields: Vec<Option<String>>,
}

impl Row {
    /// Creates a row from raw fields.
    #[must_use]
    pub const fn new(fields: Vec<Option<String>>) -> Self {
        Self {
            fields,
        }
    }

    /// Creates a row of non-null text fields (headers, literal rows).
    #[must_use]
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(texts.into_iter().map(|text| Some(text.into())).collect())
    }

    /// Encodes typed values into a row.
    #[must_use]
    pub fn from_values(values: &[Value]) -> Self {
        Self::new(values.iter().map(Value::to_text).collect())
    }

    /// Returns the number of fields.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true when the row has no fields.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the raw field at `index`; `None` for null or out of range.
    #[must_use]
    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).and_then(Option::as_deref)
    }

    /// Returns all raw fields.
    #[must_use]
    pub fn fields(&self) -> &[Option<String>] {
        &self.fields
    }

    /// Replaces the field at `index`. Out-of-range indexes are ignored.
    pub fn set(&mut self, index: usize, field: Option<String>) {
        if let Some(slot) = self.fields.get_mut(index) {
            *slot = field;
        }
    }

    /// Consumes the row and returns its fields.
    #[must_use]
    pub fn into_fields(self) -> Vec<Option<String>> {
        self.fields
    }

    /// Decodes the field at `index` into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] when the field is missing or
    /// malformed; the [`FieldError`] is kept as the source.
    pub fn get<T: FromField>(&self, index: usize) -> Result<T, StoreError> {
        let decoded = match self.fields.get(index) {
            Some(field) => T::from_field(field.as_deref()),
            None => Err(FieldError::OutOfRange {
                index,
                len: self.fields.len(),
            }),
        };
        decoded.map_err(|err| {
            StoreError::persistence_caused(format!("malformed row field {index}"), err)
        })
    }
}

// ============================================================================
// SECTION: Field Decoding
// ============================================================================

/// Decodes one raw field.
pub trait FromField: Sized {
    /// Decodes the raw field (`None` is null).
    ///
    /// # Errors
    ///
    /// Returns [`FieldError`] when the field is null or malformed.
    fn from_field(field: Option<&str>) -> Result<Self, FieldError>;
}

/// Returns the field text or [`FieldError::Null`].
fn required(field: Option<&str>) -> Result<&str, FieldError> {
    field.ok_or(FieldError::Null)
}

/// Builds a malformed-field error.
fn malformed(text: &str, expected: &'static str) -> FieldError {
    FieldError::Malformed {
        text: text.to_string(),
        expected,
    }
}

impl FromField for String {
    fn from_field(field: Option<&str>) -> Result<Self, FieldError> {
        required(field).map(ToString::to_string)
    }
}

impl FromField for i64 {
    fn from_field(field: Option<&str>) -> Result<Self, FieldError> {
        let text = required(field)?;
        text.trim().parse().map_err(|_| malformed(text, "integer"))
    }
}

impl FromField for u32 {
    fn from_field(field: Option<&str>) -> Result<Self, FieldError> {
        let text = required(field)?;
        text.trim().parse().map_err(|_| malformed(text, "unsigned integer"))
    }
}

impl FromField for u8 {
    fn from_field(field: Option<&str>) -> Result<Self, FieldError> {
        let text = required(field)?;
        text.trim().parse().map_err(|_| malformed(text, "small unsigned integer"))
    }
}

impl FromField for bool {
    fn from_field(field: Option<&str>) -> Result<Self, FieldError> {
        let text = required(field)?;
        parse_bool(text).ok_or_else(|| malformed(text, "boolean"))
    }
}

impl FromField for BigDecimal {
    fn from_field(field: Option<&str>) -> Result<Self, FieldError> {
        let text = required(field)?;
        Self::from_str(text.trim()).map_err(|_| malformed(text, "decimal"))
    }
}

impl FromField for Date {
    fn from_field(field: Option<&str>) -> Result<Self, FieldError> {
        let text = required(field)?;
        parse_date(text).ok_or_else(|| malformed(text, "ISO-8601 date"))
    }
}

impl FromField for PrimitiveDateTime {
    fn from_field(field: Option<&str>) -> Result<Self, FieldError> {
        let text = required(field)?;
        parse_timestamp(text).ok_or_else(|| malformed(text, "ISO-8601 timestamp"))
    }
}

impl<T: FromField> FromField for Option<T> {
    fn from_field(field: Option<&str>) -> Result<Self, FieldError> {
        field.map(|text| T::from_field(Some(text))).transpose()
    }
}
