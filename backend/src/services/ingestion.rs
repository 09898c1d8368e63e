//! Ingestion adapter for spreadsheet exports
//!
//! Each sheet arrives as CSV text with a header row. Rows are turned into the
//! same requests the JSON endpoints take; rows that fail are reported back
//! with their spreadsheet row number (the header is row 1).

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use csv::StringRecord;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::{eq_ignore_case, DishRef, IngredientSpec, ItemId};

use crate::error::{AppError, AppResult};
use crate::services::consumption::PrepareDishInput;
use crate::services::ledger::{parse_date_field, parse_unit, AddItemInput, UpdateItemInput};
use crate::services::recipe::AddDishInput;
use crate::services::{ConsumptionService, LedgerService, RecipeService};
use crate::store::Store;

#[derive(Clone)]
pub struct IngestionService {
    store: Arc<Store>,
}

/// Outcome of an inventory sheet, with entries listed by name
#[derive(Debug, Clone, Default, Serialize)]
pub struct InventoryImportSummary {
    pub added_items: Vec<String>,
    pub updated_items: Vec<String>,
    pub duplicate_rows: Vec<usize>,
    pub skipped_rows: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DishImportSummary {
    pub added_dishes: Vec<String>,
    pub skipped_rows: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PreparationImportSummary {
    pub prepared: Vec<String>,
    pub failed_rows: Vec<String>,
}

/// Header lookup for one sheet
struct Sheet {
    columns: HashMap<String, usize>,
    rows: Vec<(usize, Result<StringRecord, csv::Error>)>,
}

impl Sheet {
    fn parse(text: &str, required: &[&str]) -> AppResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| AppError::validation("file", format!("Unreadable header row: {}", e)))?;
        let columns: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_lowercase(), i))
            .collect();

        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|c| !columns.contains_key(*c))
            .collect();
        if !missing.is_empty() {
            return Err(AppError::validation(
                "file",
                format!("Missing required columns: {}", missing.join(", ")),
            ));
        }

        let rows = reader
            .records()
            .enumerate()
            .map(|(i, record)| (i + 2, record))
            .collect();
        Ok(Self { columns, rows })
    }

    /// Trimmed cell value; blank cells read as absent
    fn cell<'r>(&self, record: &'r StringRecord, column: &str) -> Option<&'r str> {
        self.columns
            .get(column)
            .and_then(|i| record.get(*i))
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    fn required<'r>(&self, record: &'r StringRecord, column: &str) -> Result<&'r str, String> {
        self.cell(record, column)
            .ok_or_else(|| format!("missing {}", column))
    }

    fn decimal(&self, record: &StringRecord, column: &str) -> Result<Option<Decimal>, String> {
        self.cell(record, column)
            .map(|v| Decimal::from_str(v).map_err(|_| format!("invalid {} '{}'", column, v)))
            .transpose()
    }
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|v| v.trim().is_empty())
}

fn row_error(row: usize, message: impl std::fmt::Display) -> String {
    format!("Row {}: {}", row, message)
}

/// One parsed inventory row
enum InventoryRow {
    Add(AddItemInput),
    Update(ItemId, UpdateItemInput),
}

impl IngestionService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Import an inventory sheet. Rows whose `id` names an existing entry
    /// update it; every other row adds a new entry.
    pub async fn import_inventory(&self, text: &str) -> AppResult<InventoryImportSummary> {
        let sheet = Sheet::parse(text, &["name", "quantity", "unit", "date_added"])?;
        let ledger = LedgerService::new(self.store.clone());
        let mut summary = InventoryImportSummary::default();

        for (row, record) in &sheet.rows {
            let record = match record {
                Ok(record) if is_blank(record) => continue,
                Ok(record) => record,
                Err(e) => {
                    summary.skipped_rows.push(row_error(*row, e));
                    continue;
                }
            };
            let parsed = match self.inventory_row(&sheet, record).await {
                Ok(parsed) => parsed,
                Err(message) => {
                    summary.skipped_rows.push(row_error(*row, message));
                    continue;
                }
            };
            match parsed {
                InventoryRow::Add(input) => match ledger.add_item_if_new(input).await {
                    Ok(Some(item)) => summary.added_items.push(item.name),
                    Ok(None) => summary.duplicate_rows.push(*row),
                    Err(e) => summary.skipped_rows.push(row_error(*row, e)),
                },
                InventoryRow::Update(id, input) => match ledger.update_item(id, input).await {
                    Ok(item) => summary.updated_items.push(item.name),
                    Err(e) => summary.skipped_rows.push(row_error(*row, e)),
                },
            }
        }

        tracing::info!(
            added = summary.added_items.len(),
            updated = summary.updated_items.len(),
            duplicates = summary.duplicate_rows.len(),
            skipped = summary.skipped_rows.len(),
            "Inventory sheet imported"
        );
        Ok(summary)
    }

    async fn inventory_row(&self, sheet: &Sheet, record: &StringRecord) -> Result<InventoryRow, String> {
        let name = sheet.required(record, "name")?.to_string();
        let quantity = sheet
            .decimal(record, "quantity")?
            .ok_or_else(|| "missing quantity".to_string())?;
        let unit = sheet.required(record, "unit")?.to_string();
        let date_added = sheet.required(record, "date_added")?.to_string();
        let price_per_unit = sheet.decimal(record, "price_per_unit")?;
        let total_cost = sheet.decimal(record, "total_cost")?;
        let item_type = sheet.cell(record, "type").map(str::to_string);

        let id = sheet
            .cell(record, "id")
            .map(|v| v.parse::<ItemId>().map_err(|_| format!("invalid id '{}'", v)))
            .transpose()?;
        if let Some(id) = id {
            if self.store.ledger().await.get(id).is_some() {
                return Ok(InventoryRow::Update(
                    id,
                    UpdateItemInput {
                        name: Some(name),
                        quantity: Some(quantity),
                        unit: Some(unit),
                        price_per_unit,
                        total_cost,
                        item_type,
                        date_added: Some(date_added),
                    },
                ));
            }
        }

        Ok(InventoryRow::Add(AddItemInput {
            name,
            quantity,
            unit,
            price_per_unit,
            total_cost,
            item_type,
            date_added: Some(date_added),
        }))
    }

    /// Import a dish sheet with one row per ingredient. A dish is created
    /// only when every one of its rows parses.
    pub async fn import_dishes(&self, text: &str) -> AppResult<DishImportSummary> {
        let sheet = Sheet::parse(text, &["name", "type", "ingredient_name", "quantity_required"])?;
        let recipes = RecipeService::new(self.store.clone());
        let mut summary = DishImportSummary::default();

        struct Group {
            name: String,
            dish_type: String,
            rows: Vec<usize>,
            ingredients: Vec<IngredientSpec>,
            errors: Vec<String>,
        }
        let mut groups: Vec<Group> = Vec::new();

        for (row, record) in &sheet.rows {
            let record = match record {
                Ok(record) if is_blank(record) => continue,
                Ok(record) => record,
                Err(e) => {
                    summary.skipped_rows.push(row_error(*row, e));
                    continue;
                }
            };
            let Ok(name) = sheet.required(record, "name") else {
                summary.skipped_rows.push(row_error(*row, "missing name"));
                continue;
            };
            let index = match groups.iter().position(|g| eq_ignore_case(&g.name, name)) {
                Some(index) => index,
                None => {
                    groups.push(Group {
                        name: name.to_string(),
                        dish_type: sheet.cell(record, "type").unwrap_or_default().to_string(),
                        rows: Vec::new(),
                        ingredients: Vec::new(),
                        errors: Vec::new(),
                    });
                    groups.len() - 1
                }
            };
            let group = &mut groups[index];
            group.rows.push(*row);
            match dish_ingredient(&sheet, record) {
                Ok(spec) => group.ingredients.push(spec),
                Err(message) => group.errors.push(row_error(*row, message)),
            }
        }

        for group in groups {
            let rows = group
                .rows
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            if !group.errors.is_empty() {
                summary.skipped_rows.push(format!(
                    "Dish '{}' (rows {}): {}",
                    group.name,
                    rows,
                    group.errors.join("; ")
                ));
                continue;
            }
            let input = AddDishInput {
                name: group.name.clone(),
                dish_type: group.dish_type,
                ingredients: group.ingredients,
            };
            match recipes.add_dish(input).await {
                Ok(dish) => summary.added_dishes.push(dish.name),
                Err(e) => summary
                    .skipped_rows
                    .push(format!("Dish '{}' (rows {}): {}", group.name, rows, e)),
            }
        }

        tracing::info!(
            added = summary.added_dishes.len(),
            skipped = summary.skipped_rows.len(),
            "Dish sheet imported"
        );
        Ok(summary)
    }

    /// Import a preparation sheet; each row is one preparation, applied in order
    pub async fn import_preparations(&self, text: &str) -> AppResult<PreparationImportSummary> {
        let sheet = Sheet::parse(text, &["dish_name", "quantity", "date"])?;
        let consumption = ConsumptionService::new(self.store.clone());
        let mut summary = PreparationImportSummary::default();

        for (row, record) in &sheet.rows {
            let record = match record {
                Ok(record) if is_blank(record) => continue,
                Ok(record) => record,
                Err(e) => {
                    summary.failed_rows.push(row_error(*row, e));
                    continue;
                }
            };
            let input = match preparation_input(&sheet, record) {
                Ok(input) => input,
                Err(message) => {
                    summary.failed_rows.push(row_error(*row, message));
                    continue;
                }
            };
            match consumption.prepare_dish(input).await {
                Ok(outcome) => summary.prepared.push(format!(
                    "{} x{} on {}",
                    outcome.dish_name, outcome.servings, outcome.date
                )),
                Err(e) => summary.failed_rows.push(row_error(*row, e)),
            }
        }

        tracing::info!(
            prepared = summary.prepared.len(),
            failed = summary.failed_rows.len(),
            "Preparation sheet imported"
        );
        Ok(summary)
    }
}

fn dish_ingredient(sheet: &Sheet, record: &StringRecord) -> Result<IngredientSpec, String> {
    Ok(IngredientSpec {
        name: sheet.required(record, "ingredient_name")?.to_string(),
        quantity_required: sheet
            .decimal(record, "quantity_required")?
            .ok_or_else(|| "missing quantity_required".to_string())?,
        unit: sheet
            .cell(record, "unit")
            .map(|u| parse_unit("unit", u).map_err(|e| e.to_string()))
            .transpose()?,
    })
}

fn preparation_input(sheet: &Sheet, record: &StringRecord) -> Result<PrepareDishInput, String> {
    Ok(PrepareDishInput {
        dish: DishRef::Name(sheet.required(record, "dish_name")?.to_string()),
        quantity: sheet
            .decimal(record, "quantity")?
            .ok_or_else(|| "missing quantity".to_string())?,
        date: parse_date_field("date", Some(sheet.required(record, "date")?))
            .map_err(|e| e.to_string())?,
    })
}
