// crates/kebab-store-core/src/core/catalog.rs
// ============================================================================
// Module: Kebab Store Catalog Entities
// Description: Food items and add-ons offered by the shop.
// Purpose: Persist the menu with a closed food-class discriminator.
// Dependencies: crate::core, crate::interfaces, bigdecimal
// ============================================================================

//! ## Overview
//! [`FoodItem`] rows live in the `CIBO` table. The `classe` column stores a
//! [`FoodClass`] label; decoding is a closed match with an explicit fallback
//! that rejects unknown labels as a hydration error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use bigdecimal::BigDecimal;

use crate::core::row::Row;
use crate::core::value::Value;
use crate::core::variant::UnknownVariant;
use crate::interfaces::Entity;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Food Tier
// ============================================================================

/// Whether an item is ordered on its own or added onto another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FoodTier {
    /// Standalone item.
    Base,
    /// Add-on decorating a base item.
    Addon,
}

impl FoodTier {
    /// Returns the stored label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Base => "BASE",
            Self::Addon => "AGGIUNTA",
        }
    }

    /// Parses a stored label.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownVariant`] for labels outside the closed set.
    pub fn from_label(label: &str) -> Result<Self, UnknownVariant> {
        match label {
            "BASE" => Ok(Self::Base),
            "AGGIUNTA" => Ok(Self::Addon),
            other => Err(UnknownVariant::new("food tier", other)),
        }
    }
}

// ============================================================================
// SECTION: Food Class
// ============================================================================

/// Concrete menu item kind stored in the `classe` discriminator column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FoodClass {
    /// Doner kebab in a panino.
    PaninoDonerKebab,
    /// Kebab wrapped in a piadina.
    PiadinaKebab,
    /// Kebab box with fries.
    KebabBox,
    /// Falafel plate.
    Falafel,
    /// Side of fries.
    Patatine,
    /// Canned drink.
    Bevanda,
    /// Yogurt sauce add-on.
    SalsaYogurt,
    /// Hot sauce add-on.
    SalsaPiccante,
    /// Extra cheese add-on.
    Formaggio,
    /// Extra onion add-on.
    Cipolla,
}

impl FoodClass {
    /// Returns the stored label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::PaninoDonerKebab => "PaninoDonerKebab",
            Self::PiadinaKebab => "PiadinaKebab",
            Self::KebabBox => "KebabBox",
            Self::Falafel => "Falafel",
            Self::Patatine => "Patatine",
            Self::Bevanda => "Bevanda",
            Self::SalsaYogurt => "SalsaYogurt",
            Self::SalsaPiccante => "SalsaPiccante",
            Self::Formaggio => "Formaggio",
            Self::Cipolla => "Cipolla",
        }
    }

    /// Parses a stored label.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownVariant`] for labels outside the closed set.
    pub fn from_label(label: &str) -> Result<Self, UnknownVariant> {
        match label {
            "PaninoDonerKebab" => Ok(Self::PaninoDonerKebab),
            "PiadinaKebab" => Ok(Self::PiadinaKebab),
            "KebabBox" => Ok(Self::KebabBox),
            "Falafel" => Ok(Self::Falafel),
            "Patatine" => Ok(Self::Patatine),
            "Bevanda" => Ok(Self::Bevanda),
            "SalsaYogurt" => Ok(Self::SalsaYogurt),
            "SalsaPiccante" => Ok(Self::SalsaPiccante),
            "Formaggio" => Ok(Self::Formaggio),
            "Cipolla" => Ok(Self::Cipolla),
            other => Err(UnknownVariant::new("food class", other)),
        }
    }

    /// Returns the tier this class belongs to.
    #[must_use]
    pub const fn tier(self) -> FoodTier {
        match self {
            Self::SalsaYogurt | Self::SalsaPiccante | Self::Formaggio | Self::Cipolla => {
                FoodTier::Addon
            }
            _ => FoodTier::Base,
        }
    }
}

// ============================================================================
// SECTION: Food Item
// ============================================================================

/// Menu entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoodItem {
    /// Catalog identifier.
    pub id: String,
    /// Display description.
    pub description: String,
    /// Base item or add-on.
    pub tier: FoodTier,
    /// Price.
    pub cost: BigDecimal,
    /// Preparation time in minutes.
    pub prep_minutes: u32,
    /// Concrete kind.
    pub class: FoodClass,
}

impl Entity for FoodItem {
    type Key = String;

    const TABLE: &'static str = "CIBO";
    const COLUMNS: &'static [&'static str] =
        &["id", "descrizione", "tipo", "costo", "durata", "classe"];
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
            Value::from(self.description.as_str()),
            Value::from(self.tier.label()),
            Value::from(self.cost.clone()),
            Value::from(self.prep_minutes),
            Value::from(self.class.label()),
        ]
    }

    fn decode(row: &Row) -> Result<Self, StoreError> {
        let tier: String = row.get(2)?;
        let class: String = row.get(5)?;
        Ok(Self {
            id: row.get(0)?,
            description: row.get(1)?,
            tier: FoodTier::from_label(&tier).map_err(StoreError::hydration)?,
            cost: row.get(3)?,
            prep_minutes: row.get(4)?,
            class: FoodClass::from_label(&class).map_err(StoreError::hydration)?,
        })
    }
}
