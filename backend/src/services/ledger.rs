//! Ledger service: stock entries, searches and daily consumption views

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{parse_optional_date, CostInput, DateRange, InventoryItem, InventoryOnDateRow, ItemId, Unit};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::store::{ItemPatch, ItemSearch, NewItem, Store};

#[derive(Clone)]
pub struct LedgerService {
    store: Arc<Store>,
}

/// Input for adding a stock entry
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddItemInput {
    #[validate(length(min = 1, max = 120, message = "Name must be 1-120 characters"))]
    pub name: String,
    pub quantity: Decimal,
    pub unit: String,
    pub price_per_unit: Option<Decimal>,
    pub total_cost: Option<Decimal>,
    #[serde(rename = "type", default)]
    pub item_type: Option<String>,
    /// `YYYY-MM-DD`; today when absent
    #[serde(default)]
    pub date_added: Option<String>,
}

/// Input for a partial update; absent fields are left as they are
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateItemInput {
    #[validate(length(min = 1, max = 120, message = "Name must be 1-120 characters"))]
    pub name: Option<String>,
    pub quantity: Option<Decimal>,
    pub unit: Option<String>,
    pub price_per_unit: Option<Decimal>,
    pub total_cost: Option<Decimal>,
    #[serde(rename = "type", default)]
    pub item_type: Option<String>,
    #[serde(default)]
    pub date_added: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchItemsInput {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub item_type: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

pub(crate) fn parse_unit(field: &str, value: &str) -> AppResult<Unit> {
    value
        .parse::<Unit>()
        .map_err(|e| AppError::validation(field, e.to_string()))
}

pub(crate) fn parse_date_field(field: &str, value: Option<&str>) -> AppResult<Option<NaiveDate>> {
    parse_optional_date(value).map_err(|m| AppError::validation(field, m))
}

/// Inclusive range from two optional query dates; an inverted range is rejected
pub(crate) fn parse_range(start: Option<&str>, end: Option<&str>) -> AppResult<DateRange> {
    let range = DateRange::new(
        parse_date_field("start_date", start)?,
        parse_date_field("end_date", end)?,
    );
    if range.is_inverted() {
        return Err(AppError::validation(
            "start_date",
            "start_date must not be after end_date",
        ));
    }
    Ok(range)
}

impl AddItemInput {
    /// Resolve the raw request into a ledger entry
    pub(crate) fn into_new_item(self) -> AppResult<NewItem> {
        self.validate()?;
        let cost = CostInput::require(self.price_per_unit, self.total_cost)
            .map_err(|e| AppError::validation("cost", e.to_string()))?;
        Ok(NewItem {
            unit: parse_unit("unit", &self.unit)?,
            date_added: parse_date_field("date_added", self.date_added.as_deref())?
                .unwrap_or_else(|| Utc::now().date_naive()),
            name: self.name,
            quantity: self.quantity,
            cost,
            item_type: self.item_type,
        })
    }
}

impl UpdateItemInput {
    fn into_patch(self) -> AppResult<ItemPatch> {
        self.validate()?;
        Ok(ItemPatch {
            unit: self
                .unit
                .as_deref()
                .map(|u| parse_unit("unit", u))
                .transpose()?,
            date_added: parse_date_field("date_added", self.date_added.as_deref())?,
            name: self.name,
            quantity: self.quantity,
            price_per_unit: self.price_per_unit,
            total_cost: self.total_cost,
            item_type: self.item_type,
        })
    }
}

impl LedgerService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Add a stock entry
    pub async fn add_item(&self, input: AddItemInput) -> AppResult<InventoryItem> {
        let new_item = input.into_new_item()?;
        let mut ledger = self.store.ledger_mut().await;
        let mut staged = ledger.clone();
        let item = staged.insert(new_item)?;
        self.store.commit_ledger(&mut ledger, staged).await?;

        tracing::info!(
            item_id = item.id,
            name = %item.name,
            quantity = %item.quantity,
            unit = %item.unit,
            total_cost = %item.total_cost,
            "Inventory item added"
        );
        Ok(item)
    }

    /// Add an entry unless an identical one already exists.
    /// Returns `None` when the entry was a duplicate.
    pub async fn add_item_if_new(&self, input: AddItemInput) -> AppResult<Option<InventoryItem>> {
        let new_item = input.into_new_item()?;
        let mut ledger = self.store.ledger_mut().await;
        if let Some(existing) = ledger.find_exact(&new_item) {
            tracing::debug!(item_id = existing, "Skipping duplicate inventory entry");
            return Ok(None);
        }
        let mut staged = ledger.clone();
        let item = staged.insert(new_item)?;
        self.store.commit_ledger(&mut ledger, staged).await?;
        tracing::info!(item_id = item.id, name = %item.name, "Inventory item imported");
        Ok(Some(item))
    }

    pub async fn update_item(&self, id: ItemId, input: UpdateItemInput) -> AppResult<InventoryItem> {
        let patch = input.into_patch()?;
        let mut ledger = self.store.ledger_mut().await;
        let mut staged = ledger.clone();
        let item = staged.update(id, patch)?;
        self.store.commit_ledger(&mut ledger, staged).await?;

        tracing::info!(item_id = id, quantity = %item.quantity, "Inventory item updated");
        Ok(item)
    }

    pub async fn delete_item(&self, id: ItemId) -> AppResult<InventoryItem> {
        let mut ledger = self.store.ledger_mut().await;
        let mut staged = ledger.clone();
        let item = staged.remove(id)?;
        self.store.commit_ledger(&mut ledger, staged).await?;

        tracing::info!(item_id = id, name = %item.name, "Inventory item deleted");
        Ok(item)
    }

    /// Remove every stock entry; refused unless `confirm` is set
    pub async fn delete_all_items(&self, confirm: bool) -> AppResult<usize> {
        if !confirm {
            return Err(AppError::ConfirmationRequired(
                "Deleting all inventory requires confirm=true".to_string(),
            ));
        }
        let mut ledger = self.store.ledger_mut().await;
        let mut staged = ledger.clone();
        let removed = staged.clear();
        self.store.commit_ledger(&mut ledger, staged).await?;

        tracing::warn!(removed, "All inventory items deleted");
        Ok(removed)
    }

    pub async fn get_item(&self, id: ItemId) -> AppResult<InventoryItem> {
        self.store
            .ledger()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Item {}", id)))
    }

    /// Every entry ordered by id
    pub async fn list_items(&self) -> Vec<InventoryItem> {
        self.store.ledger().await.items().cloned().collect()
    }

    pub async fn search_items(&self, input: SearchItemsInput) -> AppResult<Vec<InventoryItem>> {
        let filter = ItemSearch {
            range: parse_range(input.start_date.as_deref(), input.end_date.as_deref())?,
            name: input.name.filter(|n| !n.trim().is_empty()),
            item_type: input.item_type.filter(|t| !t.trim().is_empty()),
        };
        Ok(self.store.ledger().await.search(&filter))
    }

    /// Consumption per ingredient on `date`
    pub async fn inventory_on_date(&self, date: NaiveDate) -> AppResult<Vec<InventoryOnDateRow>> {
        self.store.ledger().await.consumption_on(date)
    }
}
