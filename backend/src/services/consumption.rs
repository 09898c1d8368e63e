//! Consumption engine: turns a dish preparation into ingredient deductions
//!
//! A preparation is checked in full before anything is deducted. Stock is
//! drawn from the oldest batch first.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    validate_servings, BatchDeduction, ConsumptionRecord, Dish, DishId, DishRef, InventoryItem,
    ItemId, Shortfall, Unit,
};

use crate::error::{AppError, AppResult};
use crate::services::ledger::parse_date_field;
use crate::store::{Catalog, Ledger, Store};

#[derive(Clone)]
pub struct ConsumptionService {
    store: Arc<Store>,
}

/// Request body for a preparation. Exactly one of `dish_id` and
/// `dish_name` must be given.
#[derive(Debug, Clone, Deserialize)]
pub struct PrepareDishRequest {
    pub dish_id: Option<DishId>,
    pub dish_name: Option<String>,
    pub quantity: Decimal,
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PrepareDishInput {
    pub dish: DishRef,
    pub quantity: Decimal,
    pub date: Option<NaiveDate>,
}

/// Outcome of a committed preparation
#[derive(Debug, Clone, Serialize)]
pub struct PreparationOutcome {
    pub dish_id: DishId,
    pub dish_name: String,
    pub servings: Decimal,
    pub date: NaiveDate,
    pub records: Vec<ConsumptionRecord>,
    /// Ledger after the deductions, ordered by id
    pub inventory: Vec<InventoryItem>,
}

impl TryFrom<PrepareDishRequest> for PrepareDishInput {
    type Error = AppError;

    fn try_from(req: PrepareDishRequest) -> Result<Self, Self::Error> {
        let dish = match (req.dish_id, req.dish_name.filter(|n| !n.trim().is_empty())) {
            (Some(id), None) => DishRef::Id(id),
            (None, Some(name)) => DishRef::Name(name),
            (Some(_), Some(_)) => {
                return Err(AppError::validation(
                    "dish",
                    "Provide only one of dish_id or dish_name",
                ))
            }
            (None, None) => {
                return Err(AppError::validation(
                    "dish",
                    "Either dish_id or dish_name must be provided",
                ))
            }
        };
        Ok(Self {
            dish,
            quantity: req.quantity,
            date: parse_date_field("date", req.date.as_deref())?,
        })
    }
}

/// Total need of one ingredient for a preparation, in the recipe unit
#[derive(Debug, Clone)]
pub struct Requirement {
    pub ingredient_id: ItemId,
    pub ingredient_name: String,
    pub unit: Unit,
    pub required: Decimal,
}

/// Deductions planned for one requirement
#[derive(Debug, Clone)]
struct PlannedDraw {
    requirement: Requirement,
    /// `(batch id, amount in the batch's unit)`
    draws: Vec<(ItemId, Decimal)>,
    /// Stock left after the draw, in the recipe unit
    remaining: Decimal,
}

/// Scale every ingredient of `dish` by `servings`, in ascending ingredient id
pub fn requirements_for(dish: &Dish, servings: Decimal) -> AppResult<Vec<Requirement>> {
    let mut requirements = dish
        .ingredients
        .iter()
        .map(|link| -> AppResult<Requirement> {
            Ok(Requirement {
                ingredient_id: link.ingredient_id,
                ingredient_name: link.ingredient_name.clone(),
                unit: link.unit,
                required: link
                    .quantity_required
                    .checked_mul(servings)
                    .ok_or_else(|| AppError::overflow("quantity"))?,
            })
        })
        .collect::<AppResult<Vec<_>>>()?;
    requirements.sort_by_key(|r| r.ingredient_id);
    Ok(requirements)
}

/// Check every requirement against the ledger without touching it.
///
/// Missing ingredients are reported ahead of shortfalls. Batches in a unit
/// that cannot be converted to the recipe unit do not count as stock.
fn plan(ledger: &Ledger, requirements: &[Requirement]) -> AppResult<Vec<PlannedDraw>> {
    // Stock still undrawn per batch, so two requirements never claim the same units
    let mut undrawn: HashMap<ItemId, Decimal> = HashMap::new();
    let mut missing = Vec::new();
    let mut shortfalls = Vec::new();
    let mut planned = Vec::with_capacity(requirements.len());

    for req in requirements {
        let batches = ledger.batches_for(req.ingredient_id, &req.ingredient_name);
        if batches.is_empty() {
            missing.push(req.ingredient_name.clone());
            continue;
        }
        let batches: Vec<&InventoryItem> = batches
            .into_iter()
            .filter(|b| b.unit.is_compatible(req.unit))
            .collect();

        let available = batches
            .iter()
            .filter_map(|b| {
                let left = *undrawn.get(&b.id).unwrap_or(&b.quantity);
                b.unit.convert(left, req.unit)
            })
            .try_fold(Decimal::ZERO, |sum, left| sum.checked_add(left))
            .ok_or_else(|| AppError::overflow("quantity"))?;
        if available < req.required {
            shortfalls.push(Shortfall {
                ingredient_name: req.ingredient_name.clone(),
                unit: req.unit,
                required: req.required,
                available,
                shortfall: req.required - available,
            });
            continue;
        }

        let mut outstanding = req.required;
        let mut draws = Vec::new();
        for batch in batches {
            if outstanding.is_zero() {
                break;
            }
            let left = *undrawn.get(&batch.id).unwrap_or(&batch.quantity);
            let Some(left_in_recipe_unit) = batch.unit.convert(left, req.unit) else {
                continue;
            };
            if left_in_recipe_unit.is_zero() {
                continue;
            }
            let (take, take_in_batch_unit) = if left_in_recipe_unit <= outstanding {
                (left_in_recipe_unit, left)
            } else {
                let converted = req.unit.convert(outstanding, batch.unit).unwrap_or(outstanding);
                (outstanding, converted)
            };
            outstanding -= take;
            undrawn.insert(batch.id, left - take_in_batch_unit);
            draws.push((batch.id, take_in_batch_unit));
        }

        planned.push(PlannedDraw {
            requirement: req.clone(),
            draws,
            remaining: available - req.required,
        });
    }

    if !missing.is_empty() {
        return Err(AppError::UnknownIngredient(missing));
    }
    if !shortfalls.is_empty() {
        return Err(AppError::InsufficientStock(shortfalls));
    }
    Ok(planned)
}

/// Apply a checked plan and append one record per ingredient
fn commit(
    ledger: &mut Ledger,
    planned: Vec<PlannedDraw>,
    dish: &Dish,
    date: NaiveDate,
) -> Vec<ConsumptionRecord> {
    let mut records = Vec::with_capacity(planned.len());
    for draw in planned {
        let mut batches = Vec::with_capacity(draw.draws.len());
        for (item_id, amount) in draw.draws {
            if let Some(item) = ledger.item_mut(item_id) {
                item.quantity -= amount;
                batches.push(BatchDeduction {
                    item_id,
                    quantity_consumed: amount,
                    quantity_left: item.quantity,
                });
            }
        }
        let record = ConsumptionRecord {
            id: ledger.allocate_record_id(),
            ingredient_id: draw.requirement.ingredient_id,
            ingredient_name: draw.requirement.ingredient_name,
            unit: draw.requirement.unit,
            date,
            quantity_consumed: draw.requirement.required,
            quantity_left: draw.remaining,
            dish_id: dish.id,
            dish_name: dish.name.clone(),
            batches,
        };
        ledger.push_record(record.clone());
        records.push(record);
    }
    records
}

/// Check and apply a preparation of `servings` of `dish` in one step
pub fn prepare(
    ledger: &mut Ledger,
    dish: &Dish,
    servings: Decimal,
    date: NaiveDate,
) -> AppResult<Vec<ConsumptionRecord>> {
    validate_servings(servings).map_err(|m| AppError::validation("quantity", m))?;
    let requirements = requirements_for(dish, servings)?;
    let planned = plan(ledger, &requirements)?;
    Ok(commit(ledger, planned, dish, date))
}

fn resolve_dish<'a>(catalog: &'a Catalog, dish: &DishRef) -> AppResult<&'a Dish> {
    match dish {
        DishRef::Id(id) => catalog
            .get(*id)
            .ok_or_else(|| AppError::NotFound(format!("Dish {}", id))),
        DishRef::Name(name) => catalog
            .find_by_name(name)
            .ok_or_else(|| AppError::NotFound(format!("Dish '{}'", name.trim()))),
    }
}

impl ConsumptionService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Prepare `quantity` servings of a dish.
    ///
    /// The ledger write lock is held from the stock check until the records
    /// are persisted, so concurrent preparations are serialized. Deductions
    /// are applied to a staged copy; if the snapshot write fails the stock is
    /// left untouched.
    #[tracing::instrument(skip(self, input), fields(dish = %input.dish, servings = %input.quantity))]
    pub async fn prepare_dish(&self, input: PrepareDishInput) -> AppResult<PreparationOutcome> {
        validate_servings(input.quantity).map_err(|m| AppError::validation("quantity", m))?;
        let date = input.date.unwrap_or_else(|| Utc::now().date_naive());

        let catalog = self.store.catalog().await;
        let dish = resolve_dish(&catalog, &input.dish)?;

        let mut ledger = self.store.ledger_mut().await;
        let mut staged = ledger.clone();
        let records = match prepare(&mut staged, dish, input.quantity, date) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(dish_id = dish.id, error = %e, "Preparation rejected");
                return Err(e);
            }
        };
        self.store.commit_ledger(&mut ledger, staged).await?;

        tracing::info!(
            dish_id = dish.id,
            records = records.len(),
            %date,
            "Dish prepared"
        );

        Ok(PreparationOutcome {
            dish_id: dish.id,
            dish_name: dish.name.clone(),
            servings: input.quantity,
            date,
            records,
            inventory: ledger.items().cloned().collect(),
        })
    }
}
