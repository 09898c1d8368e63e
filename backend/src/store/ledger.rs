//! Inventory ledger state: stock entries and the consumption audit trail

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    contains_ignore_case, eq_ignore_case, normalize_tag, validate_cost_amount, validate_name,
    validate_new_stock_quantity, validate_stock_quantity, ConsumptionRecord, CostInput, DateRange,
    InventoryItem, InventoryOnDateRow, ItemId, RecordId, Unit,
};

use crate::error::{AppError, AppResult};

/// A stock entry about to be written to the ledger
#[derive(Debug, Clone)]
pub struct NewItem {
    pub name: String,
    pub quantity: Decimal,
    pub unit: Unit,
    pub cost: CostInput,
    pub item_type: Option<String>,
    pub date_added: NaiveDate,
}

/// Partial update of a stock entry. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub quantity: Option<Decimal>,
    pub unit: Option<Unit>,
    pub price_per_unit: Option<Decimal>,
    pub total_cost: Option<Decimal>,
    /// A blank value clears the type
    pub item_type: Option<String>,
    pub date_added: Option<NaiveDate>,
}

/// Filters for [`Ledger::search`]
#[derive(Debug, Clone, Default)]
pub struct ItemSearch {
    pub name: Option<String>,
    pub item_type: Option<String>,
    pub range: DateRange,
}

/// Stock entries keyed by id plus the append-only consumption log
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
    next_item_id: ItemId,
    next_record_id: RecordId,
    items: BTreeMap<ItemId, InventoryItem>,
    consumption: Vec<ConsumptionRecord>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: ItemId) -> Option<&InventoryItem> {
        self.items.get(&id)
    }

    /// All entries ordered by id
    pub fn items(&self) -> impl Iterator<Item = &InventoryItem> {
        self.items.values()
    }

    pub fn consumption(&self) -> &[ConsumptionRecord] {
        &self.consumption
    }

    /// Write a new entry, deriving whichever cost field was not supplied
    pub fn insert(&mut self, new: NewItem) -> AppResult<InventoryItem> {
        validate_name(&new.name).map_err(|m| AppError::validation("name", m))?;
        validate_new_stock_quantity(new.quantity).map_err(|m| AppError::validation("quantity", m))?;
        validate_cost_amount(new.cost.amount()).map_err(|m| AppError::validation("cost", m))?;

        let (price_per_unit, total_cost) = new
            .cost
            .resolve(new.quantity)
            .ok_or_else(|| AppError::overflow("cost"))?;
        self.next_item_id += 1;
        let item = InventoryItem {
            id: self.next_item_id,
            name: new.name.trim().to_string(),
            quantity: new.quantity,
            unit: new.unit,
            price_per_unit,
            total_cost,
            item_type: normalize_tag(new.item_type.as_deref()),
            date_added: new.date_added,
        };
        self.items.insert(item.id, item.clone());
        Ok(item)
    }

    /// Merge `patch` into entry `id`.
    ///
    /// `total_cost` follows quantity and unit price; an explicit total
    /// re-derives the unit price instead. Nothing is written when any field
    /// is rejected.
    pub fn update(&mut self, id: ItemId, patch: ItemPatch) -> AppResult<InventoryItem> {
        let current = self
            .items
            .get(&id)
            .ok_or_else(|| AppError::NotFound(format!("Item {}", id)))?;
        let mut updated = current.clone();

        if let Some(name) = patch.name {
            validate_name(&name).map_err(|m| AppError::validation("name", m))?;
            updated.name = name.trim().to_string();
        }
        let quantity_changed = match patch.quantity {
            Some(quantity) => {
                validate_stock_quantity(quantity)
                    .map_err(|m| AppError::validation("quantity", m))?;
                let changed = quantity != updated.quantity;
                updated.quantity = quantity;
                changed
            }
            None => false,
        };
        if let Some(unit) = patch.unit {
            updated.unit = unit;
        }
        if let Some(item_type) = patch.item_type {
            updated.item_type = normalize_tag(Some(&item_type));
        }
        if let Some(date_added) = patch.date_added {
            updated.date_added = date_added;
        }

        let cost = CostInput::from_fields(patch.price_per_unit, patch.total_cost)
            .map_err(|e| AppError::validation("cost", e.to_string()))?;
        match cost {
            Some(cost) => {
                validate_cost_amount(cost.amount()).map_err(|m| AppError::validation("cost", m))?;
                let (price_per_unit, total_cost) = cost
                    .resolve(updated.quantity)
                    .ok_or_else(|| AppError::overflow("cost"))?;
                updated.price_per_unit = price_per_unit;
                updated.total_cost = total_cost;
            }
            None if quantity_changed => {
                updated.total_cost = updated
                    .price_per_unit
                    .checked_mul(updated.quantity)
                    .ok_or_else(|| AppError::overflow("quantity"))?;
            }
            None => {}
        }

        self.items.insert(id, updated.clone());
        Ok(updated)
    }

    /// Remove entry `id`. Dish links to it are left in place.
    pub fn remove(&mut self, id: ItemId) -> AppResult<InventoryItem> {
        self.items
            .remove(&id)
            .ok_or_else(|| AppError::NotFound(format!("Item {}", id)))
    }

    /// Remove every stock entry. The consumption log is kept.
    pub fn clear(&mut self) -> usize {
        let removed = self.items.len();
        self.items.clear();
        removed
    }

    /// Entries matching every given filter, by `date_added` then id
    pub fn search(&self, filter: &ItemSearch) -> Vec<InventoryItem> {
        let mut found: Vec<InventoryItem> = self
            .items
            .values()
            .filter(|item| {
                filter
                    .name
                    .as_deref()
                    .map_or(true, |n| contains_ignore_case(&item.name, n))
            })
            .filter(|item| {
                filter.item_type.as_deref().map_or(true, |t| {
                    item.item_type
                        .as_deref()
                        .map_or(false, |it| contains_ignore_case(it, t))
                })
            })
            .filter(|item| filter.range.contains(item.date_added))
            .cloned()
            .collect();
        found.sort_by_key(InventoryItem::ledger_key);
        found
    }

    /// Whether an entry identical in every recorded field already exists
    pub fn find_exact(&self, candidate: &NewItem) -> Option<ItemId> {
        let (price_per_unit, total_cost) = candidate.cost.resolve(candidate.quantity)?;
        let item_type = normalize_tag(candidate.item_type.as_deref());
        self.items
            .values()
            .find(|item| {
                item.name == candidate.name.trim()
                    && item.quantity == candidate.quantity
                    && item.unit == candidate.unit
                    && item.price_per_unit == price_per_unit
                    && item.total_cost == total_cost
                    && item.item_type == item_type
                    && item.date_added == candidate.date_added
            })
            .map(|item| item.id)
    }

    /// Batches of an ingredient in FIFO order (oldest first)
    pub fn batches_named(&self, name: &str) -> Vec<&InventoryItem> {
        let mut batches: Vec<&InventoryItem> =
            self.items.values().filter(|i| i.is_named(name)).collect();
        batches.sort_by_key(|i| i.ledger_key());
        batches
    }

    /// Batches behind a dish link. The link's name is tried first; when the
    /// linked entry was renamed, its current name is used instead.
    pub fn batches_for(&self, ingredient_id: ItemId, name: &str) -> Vec<&InventoryItem> {
        let batches = self.batches_named(name);
        if !batches.is_empty() {
            return batches;
        }
        match self.items.get(&ingredient_id) {
            Some(linked) => self.batches_named(&linked.name),
            None => Vec::new(),
        }
    }

    /// Lowest-id entry with this name; the stable target of a dish link
    pub fn first_named(&self, name: &str) -> Option<&InventoryItem> {
        self.items.values().find(|i| i.is_named(name))
    }

    /// Most recently purchased batch with this name
    pub fn latest_named(&self, name: &str) -> Option<&InventoryItem> {
        self.items
            .values()
            .filter(|i| i.is_named(name))
            .max_by_key(|i| i.ledger_key())
    }

    pub(crate) fn item_mut(&mut self, id: ItemId) -> Option<&mut InventoryItem> {
        self.items.get_mut(&id)
    }

    pub(crate) fn allocate_record_id(&mut self) -> RecordId {
        self.next_record_id += 1;
        self.next_record_id
    }

    pub(crate) fn push_record(&mut self, record: ConsumptionRecord) {
        self.consumption.push(record);
    }

    /// One row per ingredient consumed on `date`, ordered by ingredient id
    pub fn consumption_on(&self, date: NaiveDate) -> AppResult<Vec<InventoryOnDateRow>> {
        let mut rows: BTreeMap<ItemId, InventoryOnDateRow> = BTreeMap::new();
        for record in self.consumption.iter().filter(|r| r.date == date) {
            let row = rows
                .entry(record.ingredient_id)
                .or_insert_with(|| InventoryOnDateRow {
                    ingredient_id: record.ingredient_id,
                    ingredient_name: record.ingredient_name.clone(),
                    unit: record.unit,
                    quantity_consumed: Decimal::ZERO,
                    quantity_left: record.quantity_left,
                    preparations: 0,
                    dishes: Vec::new(),
                });
            // Records are appended in commit order, so the last one wins.
            row.quantity_left = record.quantity_left;
            row.quantity_consumed = row
                .quantity_consumed
                .checked_add(record.quantity_consumed)
                .ok_or_else(|| AppError::overflow("quantity_consumed"))?;
            row.preparations += 1;
            if !row.dishes.iter().any(|d| eq_ignore_case(d, &record.dish_name)) {
                row.dishes.push(record.dish_name.clone());
            }
        }
        Ok(rows.into_values().collect())
    }
}
