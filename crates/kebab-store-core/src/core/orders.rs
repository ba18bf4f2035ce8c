// crates/kebab-store-core/src/core/orders.rs
// ============================================================================
// Module: Kebab Store Order Entities
// Description: Orders with tracked status and discount vouchers.
// Purpose: Persist order headers and voucher codes.
// Dependencies: crate::core, crate::interfaces, bigdecimal, time
// ============================================================================

//! ## Overview
//! [`Order`] rows track status through [`OrderStatus`]. [`Voucher`] rows are
//! keyed by their code; probing an unknown code yields
//! [`StoreError::NotFound`], which callers use for uniqueness checks.

// ============================================================================
// SECTION: Imports
// ============================================================================

use bigdecimal::BigDecimal;
use time::Date;
use time::PrimitiveDateTime;

use crate::core::row::Row;
use crate::core::value::Value;
use crate::core::variant::UnknownVariant;
use crate::interfaces::Entity;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Order Status
// ============================================================================

/// Lifecycle state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    /// Placed, not yet picked up by the kitchen.
    Pending,
    /// Being prepared.
    Preparing,
    /// Ready for pickup.
    Ready,
    /// Handed over.
    Delivered,
    /// Cancelled before delivery.
    Cancelled,
}

impl OrderStatus {
    /// Returns the stored label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "IN_ATTESA",
            Self::Preparing => "IN_PREPARAZIONE",
            Self::Ready => "PRONTO",
            Self::Delivered => "CONSEGNATO",
            Self::Cancelled => "ANNULLATO",
        }
    }

    /// Parses a stored label.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownVariant`] for labels outside the closed set.
    pub fn from_label(label: &str) -> Result<Self, UnknownVariant> {
        match label {
            "IN_ATTESA" => Ok(Self::Pending),
            "IN_PREPARAZIONE" => Ok(Self::Preparing),
            "PRONTO" => Ok(Self::Ready),
            "CONSEGNATO" => Ok(Self::Delivered),
            "ANNULLATO" => Ok(Self::Cancelled),
            other => Err(UnknownVariant::new("order status", other)),
        }
    }

    /// Returns true once no further transition is possible.
    #[must_use]
    pub const fn is_final(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

// ============================================================================
// SECTION: Order
// ============================================================================

/// Order header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Order identifier.
    pub id: String,
    /// Ordering client identifier.
    pub client_id: String,
    /// Placement time.
    pub placed_at: PrimitiveDateTime,
    /// Current status.
    pub status: OrderStatus,
    /// Total after discounts.
    pub total: BigDecimal,
    /// Voucher applied, if any.
    pub voucher_code: Option<String>,
}

impl Entity for Order {
    type Key = String;

    const TABLE: &'static str = "ORDINE";
    const COLUMNS: &'static [&'static str] =
        &["id", "cliente", "data", "stato", "totale", "voucher"];
    const KEY_COLUMNS: &'static [&'static str] = &["id"];

    fn key(&self) -> String {
        self.id.clone()
    }

    fn key_values(key: &String) -> Vec<Value> {
        vec![Value::from(key.as_str())]
    }

    fn encode(&self) -> Vec<Value> {
        vec![
            Value::from(self.id.as_str()),
            Value::from(self.client_id.as_str()),
            Value::from(self.placed_at),
            Value::from(self.status.label()),
            Value::from(self.total.clone()),
            Value::from(self.voucher_code.clone()),
        ]
    }

    fn decode(row: &Row) -> Result<Self, StoreError> {
        let status: String = row.get(3)?;
        Ok(Self {
            id: row.get(0)?,
            client_id: row.get(1)?,
            placed_at: row.get(2)?,
            status: OrderStatus::from_label(&status).map_err(StoreError::hydration)?,
            total: row.get(4)?,
            voucher_code: row.get(5)?,
        })
    }
}

// ============================================================================
// SECTION: Voucher
// ============================================================================

/// Percentage discount code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voucher {
    /// Unique code (`SCONTO10`).
    pub code: String,
    /// Discount percentage.
    pub percent: u8,
    /// Last valid day.
    pub expires_on: Date,
    /// Whether the voucher was redeemed.
    pub redeemed: bool,
}

impl Entity for Voucher {
    type Key = String;

    const TABLE: &'static str = "VOUCHER";
    const COLUMNS: &'static [&'static str] = &["codice", "percentuale", "scadenza", "usato"];
    const KEY_COLUMNS: &'static [&'static str] = &["codice"];

    fn key(&self) -> String {
        self.code.clone()
    }

    fn key_values(key: &String) -> Vec<Value> {
        vec![Value::from(key.as_str())]
    }

    fn encode(&self) -> Vec<Value> {
        vec![
            Value::from(self.code.as_str()),
            Value::from(self.percent),
            Value::from(self.expires_on),
            Value::from(self.redeemed),
        ]
    }

    fn decode(row: &Row) -> Result<Self, StoreError> {
        Ok(Self {
            code: row.get(0)?,
            percent: row.get(1)?,
            expires_on: row.get(2)?,
            redeemed: row.get(3)?,
        })
    }
}
