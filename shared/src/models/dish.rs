//! Recipe catalog models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Unit;
use crate::types::{DishId, ItemId};

/// Menu sections a dish can be filed under before any are added at runtime
pub const DEFAULT_DISH_TYPES: &[&str] = &[
    "South Indian",
    "Indian Snacks",
    "Parathas",
    "Beverages",
    "Sandwiches",
    "Burgers",
    "Pizza",
    "Pasta",
    "Shakes",
    "Soups",
    "Indian Starter",
    "Indian Main Course",
    "Chinese Starter",
    "Chinese Main Course",
    "Continental",
    "Dessert",
];

/// A dish and the ingredients one serving needs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dish {
    pub id: DishId,
    pub name: String,
    #[serde(rename = "type")]
    pub dish_type: String,
    pub ingredients: Vec<DishIngredient>,
}

impl Dish {
    pub fn is_named(&self, name: &str) -> bool {
        self.name.trim().to_lowercase() == name.trim().to_lowercase()
    }
}

/// Link from a dish to the stock it consumes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DishIngredient {
    /// Ledger entry the name resolved to when the dish was written
    pub ingredient_id: ItemId,
    pub ingredient_name: String,
    /// Per serving, in `unit`
    pub quantity_required: Decimal,
    pub unit: Unit,
}

/// Requested ingredient before it is resolved against the ledger
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngredientSpec {
    pub name: String,
    pub quantity_required: Decimal,
    #[serde(default)]
    pub unit: Option<Unit>,
}

/// Cost of one ingredient within a serving
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngredientCost {
    pub ingredient: String,
    pub quantity_required: Decimal,
    pub unit: Unit,
    /// Price per unit of the batch used for pricing, in the batch's unit
    pub unit_price: Decimal,
    pub priced_from_item: ItemId,
    pub cost: Decimal,
}

/// Per-serving cost of a dish
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DishCost {
    pub dish_id: DishId,
    pub dish_name: String,
    pub ingredient_breakdown: Vec<IngredientCost>,
    pub total_cost: Decimal,
}
