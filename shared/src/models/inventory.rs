//! Inventory ledger models

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{DishId, ItemId, RecordId};

/// Unit of measure for a stock entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Kg,
    #[serde(alias = "g", alias = "gram", alias = "grams")]
    Gm,
    #[serde(alias = "liter", alias = "l")]
    Litre,
    Ml,
    #[serde(alias = "pieces", alias = "pc", alias = "pcs")]
    Piece,
    #[serde(alias = "packs")]
    Pack,
    #[serde(alias = "bottles")]
    Bottle,
    Single,
}

/// Conversion family of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitFamily {
    Mass,
    Volume,
    Count,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unsupported unit '{0}'")]
pub struct UnitParseError(pub String);

impl Unit {
    pub const ALL: [Unit; 8] = [
        Unit::Kg,
        Unit::Gm,
        Unit::Litre,
        Unit::Ml,
        Unit::Piece,
        Unit::Pack,
        Unit::Bottle,
        Unit::Single,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Kg => "kg",
            Unit::Gm => "gm",
            Unit::Litre => "litre",
            Unit::Ml => "ml",
            Unit::Piece => "piece",
            Unit::Pack => "pack",
            Unit::Bottle => "bottle",
            Unit::Single => "single",
        }
    }

    pub fn family(&self) -> UnitFamily {
        match self {
            Unit::Kg | Unit::Gm => UnitFamily::Mass,
            Unit::Litre | Unit::Ml => UnitFamily::Volume,
            Unit::Piece | Unit::Pack | Unit::Bottle | Unit::Single => UnitFamily::Count,
        }
    }

    /// Multiplier from this unit to the smallest unit of its family
    fn base_factor(&self) -> Decimal {
        match self {
            Unit::Kg | Unit::Litre => Decimal::ONE_THOUSAND,
            _ => Decimal::ONE,
        }
    }

    /// Whether quantities in `self` can be expressed in `other`.
    /// Count units only convert to themselves.
    pub fn is_compatible(&self, other: Unit) -> bool {
        match self.family() {
            UnitFamily::Count => *self == other,
            family => family == other.family(),
        }
    }

    /// Convert `quantity` expressed in `self` into `to`.
    /// `None` when the units are incompatible or the result overflows.
    pub fn convert(&self, quantity: Decimal, to: Unit) -> Option<Decimal> {
        if !self.is_compatible(to) {
            return None;
        }
        if *self == to {
            return Some(quantity);
        }
        quantity
            .checked_mul(self.base_factor())?
            .checked_div(to.base_factor())
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Unit {
    type Err = UnitParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "kg" | "kgs" => Ok(Unit::Kg),
            "gm" | "g" | "gram" | "grams" => Ok(Unit::Gm),
            "litre" | "liter" | "l" => Ok(Unit::Litre),
            "ml" => Ok(Unit::Ml),
            "piece" | "pieces" | "pc" | "pcs" => Ok(Unit::Piece),
            "pack" | "packs" => Ok(Unit::Pack),
            "bottle" | "bottles" => Ok(Unit::Bottle),
            "single" => Ok(Unit::Single),
            _ => Err(UnitParseError(s.to_string())),
        }
    }
}

/// How the cost of a new stock entry was supplied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostInput {
    PricePerUnit(Decimal),
    TotalCost(Decimal),
}

/// Problems resolving the two optional cost fields into a [`CostInput`]
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum CostInputError {
    #[error("Either price_per_unit or total_cost must be provided")]
    Missing,
    #[error("Provide only one of price_per_unit or total_cost")]
    Conflicting,
}

impl CostInput {
    /// Resolve the request fields. Exactly one of them must be present.
    pub fn from_fields(
        price_per_unit: Option<Decimal>,
        total_cost: Option<Decimal>,
    ) -> Result<Option<CostInput>, CostInputError> {
        match (price_per_unit, total_cost) {
            (Some(_), Some(_)) => Err(CostInputError::Conflicting),
            (Some(p), None) => Ok(Some(CostInput::PricePerUnit(p))),
            (None, Some(t)) => Ok(Some(CostInput::TotalCost(t))),
            (None, None) => Ok(None),
        }
    }

    /// Like [`CostInput::from_fields`] but a missing cost is an error
    pub fn require(
        price_per_unit: Option<Decimal>,
        total_cost: Option<Decimal>,
    ) -> Result<CostInput, CostInputError> {
        Self::from_fields(price_per_unit, total_cost)?.ok_or(CostInputError::Missing)
    }

    pub fn amount(&self) -> Decimal {
        match self {
            CostInput::PricePerUnit(v) | CostInput::TotalCost(v) => *v,
        }
    }

    /// Returns `(price_per_unit, total_cost)` for `quantity`, or `None` when
    /// the derived field does not fit in a `Decimal`.
    /// A zero quantity keeps a zero unit price when only the total is known.
    pub fn resolve(&self, quantity: Decimal) -> Option<(Decimal, Decimal)> {
        match *self {
            CostInput::PricePerUnit(price) => Some((price, price.checked_mul(quantity)?)),
            CostInput::TotalCost(total) => {
                let price = if quantity.is_zero() {
                    Decimal::ZERO
                } else {
                    total.checked_div(quantity)?
                };
                Some((price, total))
            }
        }
    }
}

/// A ledger entry: one purchase batch of a stock item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryItem {
    pub id: ItemId,
    pub name: String,
    pub quantity: Decimal,
    pub unit: Unit,
    pub price_per_unit: Decimal,
    pub total_cost: Decimal,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,
    pub date_added: NaiveDate,
}

impl InventoryItem {
    /// Case-insensitive exact name match
    pub fn is_named(&self, name: &str) -> bool {
        self.name.trim().to_lowercase() == name.trim().to_lowercase()
    }

    /// Ordering key used for FIFO consumption and search results
    pub fn ledger_key(&self) -> (NaiveDate, ItemId) {
        (self.date_added, self.id)
    }
}

/// Flat export row of a ledger entry; every column is always written
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InventoryCsvRow<'a> {
    pub id: ItemId,
    pub name: &'a str,
    pub quantity: Decimal,
    pub unit: Unit,
    pub price_per_unit: Decimal,
    pub total_cost: Decimal,
    #[serde(rename = "type")]
    pub item_type: &'a str,
    pub date_added: NaiveDate,
}

impl<'a> From<&'a InventoryItem> for InventoryCsvRow<'a> {
    fn from(item: &'a InventoryItem) -> Self {
        Self {
            id: item.id,
            name: &item.name,
            quantity: item.quantity,
            unit: item.unit,
            price_per_unit: item.price_per_unit,
            total_cost: item.total_cost,
            item_type: item.item_type.as_deref().unwrap_or(""),
            date_added: item.date_added,
        }
    }
}

/// Quantity taken from one batch during a preparation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchDeduction {
    pub item_id: ItemId,
    /// Amount removed, in the batch's own unit
    pub quantity_consumed: Decimal,
    /// Stock left in the batch, in the batch's own unit
    pub quantity_left: Decimal,
}

/// Audit record written for each ingredient consumed by a preparation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConsumptionRecord {
    pub id: RecordId,
    pub ingredient_id: ItemId,
    pub ingredient_name: String,
    pub unit: Unit,
    pub date: NaiveDate,
    pub quantity_consumed: Decimal,
    /// Stock of the ingredient after the deduction, in `unit`
    pub quantity_left: Decimal,
    pub dish_id: DishId,
    pub dish_name: String,
    pub batches: Vec<BatchDeduction>,
}

/// Consumption of one ingredient on a given date, folded over every
/// preparation that touched it that day
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryOnDateRow {
    pub ingredient_id: ItemId,
    pub ingredient_name: String,
    pub unit: Unit,
    pub quantity_consumed: Decimal,
    /// Stock after the last preparation of the day
    pub quantity_left: Decimal,
    pub preparations: usize,
    pub dishes: Vec<String>,
}

/// Deficit of one ingredient found while checking a preparation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Shortfall {
    pub ingredient_name: String,
    pub unit: Unit,
    pub required: Decimal,
    pub available: Decimal,
    pub shortfall: Decimal,
}

impl std::fmt::Display for Shortfall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: need {} {}, have {} (short by {})",
            self.ingredient_name, self.required, self.unit, self.available, self.shortfall
        )
    }
}
