// crates/kebab-store-core/src/core/customers.rs
// ============================================================================
// Module: Kebab Store Customer Entities
// Description: Client records and role-scoped accounts.
// Purpose: Persist customers and staff accounts keyed by id or role/email.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! [`Client`] rows are keyed by a single alphanumeric id (`CLI001`).
//! [`Account`] rows use the compound key (`ruolo`, `email`), so the same
//! email may hold one account per role.

use crate::core::row::Row;
use crate::core::value::Value;
use crate::core::variant::UnknownVariant;
use crate::interfaces::Entity;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Client
// ============================================================================

/// Registered customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    /// Client identifier (`CLI001`).
    pub id: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact email.
    pub email: String,
    /// Optional phone number.
    pub phone: Option<String>,
}

impl Entity for Client {
    type Key = String;

    const TABLE: &'static str = "CLIENTE";
    const COLUMNS: &'static [&'static str] = &["id", "nome", "cognome", "email", "telefono"];
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
            Value::from(self.first_name.as_str()),
            Value::from(self.last_name.as_str()),
            Value::from(self.email.as_str()),
            Value::from(self.phone.clone()),
        ]
    }

    fn decode(row: &Row) -> Result<Self, StoreError> {
        Ok(Self {
            id: row.get(0)?,
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            email: row.get(3)?,
            phone: row.get(4)?,
        })
    }
}

// ============================================================================
// SECTION: Account
// ============================================================================

/// Role an account acts under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    /// Ordering customer.
    Customer,
    /// Shop manager.
    Manager,
    /// Kitchen staff.
    Cook,
}

impl Role {
    /// Returns the stored label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Customer => "CLIENTE",
            Self::Manager => "GESTORE",
            Self::Cook => "CUOCO",
        }
    }

    /// Parses a stored label.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownVariant`] for labels outside the closed set.
    pub fn from_label(label: &str) -> Result<Self, UnknownVariant> {
        match label {
            "CLIENTE" => Ok(Self::Customer),
            "GESTORE" => Ok(Self::Manager),
            "CUOCO" => Ok(Self::Cook),
            other => Err(UnknownVariant::new("role", other)),
        }
    }
}

/// Login account; credentials are verified elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Role the account acts under.
    pub role: Role,
    /// Login email.
    pub email: String,
    /// Opaque credential digest.
    pub password_digest: String,
    /// Linked client identifier for customer accounts.
    pub client_id: Option<String>,
}

impl Entity for Account {
    type Key = (Role, String);

    const TABLE: &'static str = "UTENTE";
    const COLUMNS: &'static [&'static str] = &["ruolo", "email", "password", "cliente"];
    const KEY_COLUMNS: &'static [&'static str] = &["ruolo", "email"];

    fn key(&self) -> (Role, String) {
        (self.role, self.email.clone())
    }

    fn key_values(key: &(Role, String)) -> Vec<Value> {
        vec![Value::from(key.0.label()), Value::from(key.1.as_str())]
    }

    fn encode(&self) -> Vec<Value> {
        vec![
            Value::from(self.role.label()),
            Value::from(self.email.as_str()),
            Value::from(self.password_digest.as_str()),
            Value::from(self.client_id.clone()),
        ]
    }

    fn decode(row: &Row) -> Result<Self, StoreError> {
        let role: String = row.get(0)?;
        Ok(Self {
            role: Role::from_label(&role).map_err(StoreError::hydration)?,
            email: row.get(1)?,
            password_digest: row.get(2)?,
            client_id: row.get(3)?,
        })
    }
}
