//! Recipe catalog service: dishes, dish types and per-serving cost

use std::collections::HashSet;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    validate_name, validate_quantity_required, Dish, DishCost, DishId, DishIngredient,
    IngredientCost, IngredientSpec,
};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::store::{Ledger, Store};

#[derive(Clone)]
pub struct RecipeService {
    store: Arc<Store>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddDishInput {
    #[validate(length(min = 1, max = 120, message = "Name must be 1-120 characters"))]
    pub name: String,
    #[serde(rename = "type")]
    pub dish_type: String,
    pub ingredients: Vec<IngredientSpec>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateDishInput {
    #[validate(length(min = 1, max = 120, message = "Name must be 1-120 characters"))]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub dish_type: Option<String>,
    /// Replaces the whole ingredient list when present
    #[serde(default)]
    pub ingredients: Option<Vec<IngredientSpec>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddDishTypeInput {
    #[validate(length(min = 1, max = 120, message = "Dish type must be 1-120 characters"))]
    pub name: String,
}

/// Result of registering a dish type
#[derive(Debug, Clone, Serialize)]
pub struct DishTypeAdded {
    pub name: String,
    pub created: bool,
    pub dish_types: Vec<String>,
}

/// Resolve requested ingredients against the ledger.
///
/// Input problems are reported before lookups, and every unresolved name is
/// reported together so nothing is half-written.
pub(crate) fn resolve_ingredients(
    specs: &[IngredientSpec],
    ledger: &Ledger,
) -> AppResult<Vec<DishIngredient>> {
    if specs.is_empty() {
        return Err(AppError::validation(
            "ingredients",
            "A dish needs at least one ingredient",
        ));
    }

    let mut seen = HashSet::new();
    for spec in specs {
        validate_name(&spec.name).map_err(|m| AppError::validation("ingredients", m))?;
        validate_quantity_required(spec.quantity_required)
            .map_err(|m| AppError::validation("ingredients", format!("{}: {}", spec.name.trim(), m)))?;
        if !seen.insert(spec.name.trim().to_lowercase()) {
            return Err(AppError::validation(
                "ingredients",
                format!("Ingredient '{}' is listed more than once", spec.name.trim()),
            ));
        }
    }

    let unresolved: Vec<String> = specs
        .iter()
        .filter(|spec| ledger.first_named(&spec.name).is_none())
        .map(|spec| spec.name.trim().to_string())
        .collect();
    if !unresolved.is_empty() {
        return Err(AppError::UnknownIngredient(unresolved));
    }

    let mut resolved = Vec::with_capacity(specs.len());
    for spec in specs {
        let item = ledger
            .first_named(&spec.name)
            .ok_or_else(|| AppError::UnknownIngredient(vec![spec.name.trim().to_string()]))?;
        let unit = spec.unit.unwrap_or(item.unit);
        if !unit.is_compatible(item.unit) {
            return Err(AppError::validation(
                "ingredients",
                format!(
                    "'{}' is stocked in {}, which cannot be measured in {}",
                    item.name, item.unit, unit
                ),
            ));
        }
        resolved.push(DishIngredient {
            ingredient_id: item.id,
            ingredient_name: item.name.clone(),
            quantity_required: spec.quantity_required,
            unit,
        });
    }
    Ok(resolved)
}

/// Price one serving from the most recent batch of each ingredient
pub(crate) fn price_dish(dish: &Dish, ledger: &Ledger) -> AppResult<DishCost> {
    let mut breakdown = Vec::with_capacity(dish.ingredients.len());
    let mut unresolved = Vec::new();
    let mut total = Decimal::ZERO;

    for link in &dish.ingredients {
        let Some(batch) = ledger
            .batches_for(link.ingredient_id, &link.ingredient_name)
            .into_iter()
            .max_by_key(|b| b.ledger_key())
        else {
            unresolved.push(link.ingredient_name.clone());
            continue;
        };
        let quantity = link
            .unit
            .convert(link.quantity_required, batch.unit)
            .ok_or_else(|| {
                AppError::validation(
                    "ingredients",
                    format!(
                        "'{}' is stocked in {}, which cannot be measured in {}",
                        batch.name, batch.unit, link.unit
                    ),
                )
            })?;
        let cost = quantity
            .checked_mul(batch.price_per_unit)
            .ok_or_else(|| AppError::overflow("cost"))?;
        total = total
            .checked_add(cost)
            .ok_or_else(|| AppError::overflow("cost"))?;
        breakdown.push(IngredientCost {
            ingredient: link.ingredient_name.clone(),
            quantity_required: link.quantity_required,
            unit: link.unit,
            unit_price: batch.price_per_unit,
            priced_from_item: batch.id,
            cost: cost.round_dp(2),
        });
    }

    if !unresolved.is_empty() {
        return Err(AppError::UnknownIngredient(unresolved));
    }
    Ok(DishCost {
        dish_id: dish.id,
        dish_name: dish.name.clone(),
        ingredient_breakdown: breakdown,
        total_cost: total.round_dp(2),
    })
}

impl RecipeService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Create a dish, resolving every ingredient name against the ledger
    pub async fn add_dish(&self, input: AddDishInput) -> AppResult<Dish> {
        input.validate()?;
        let mut catalog = self.store.catalog_mut().await;
        if catalog.find_by_name(&input.name).is_some() {
            return Err(AppError::DuplicateDish(input.name.trim().to_string()));
        }
        let dish_type = catalog.canonical_type(&input.dish_type)?;
        let ingredients = {
            let ledger = self.store.ledger().await;
            resolve_ingredients(&input.ingredients, &ledger)?
        };
        let mut staged = catalog.clone();
        let dish = staged.insert(&input.name, dish_type, ingredients)?;
        self.store.commit_catalog(&mut catalog, staged).await?;

        tracing::info!(
            dish_id = dish.id,
            name = %dish.name,
            ingredients = dish.ingredients.len(),
            "Dish added"
        );
        Ok(dish)
    }

    pub async fn update_dish(&self, id: DishId, input: UpdateDishInput) -> AppResult<Dish> {
        input.validate()?;
        let mut catalog = self.store.catalog_mut().await;
        if catalog.get(id).is_none() {
            return Err(AppError::NotFound(format!("Dish {}", id)));
        }
        let dish_type = input
            .dish_type
            .as_deref()
            .map(|t| catalog.canonical_type(t))
            .transpose()?;
        let ingredients = match &input.ingredients {
            Some(specs) => {
                let ledger = self.store.ledger().await;
                Some(resolve_ingredients(specs, &ledger)?)
            }
            None => None,
        };
        let mut staged = catalog.clone();
        let dish = staged.replace(id, input.name.as_deref(), dish_type, ingredients)?;
        self.store.commit_catalog(&mut catalog, staged).await?;

        tracing::info!(dish_id = id, name = %dish.name, "Dish updated");
        Ok(dish)
    }

    pub async fn delete_dish(&self, name: &str, confirm: bool) -> AppResult<Dish> {
        let mut catalog = self.store.catalog_mut().await;
        let mut staged = catalog.clone();
        let dish = staged.remove_by_name(name, confirm)?;
        self.store.commit_catalog(&mut catalog, staged).await?;

        tracing::info!(dish_id = dish.id, name = %dish.name, "Dish deleted");
        Ok(dish)
    }

    pub async fn get_dish(&self, id: DishId) -> AppResult<Dish> {
        self.store
            .catalog()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Dish {}", id)))
    }

    /// Dishes whose name contains `partial_name`; empty when nothing matches
    pub async fn list_dishes(&self, partial_name: Option<&str>) -> Vec<Dish> {
        let partial_name = partial_name.filter(|p| !p.trim().is_empty());
        self.store.catalog().await.list(partial_name)
    }

    pub async fn list_dish_types(&self) -> Vec<String> {
        self.store.catalog().await.dish_types().to_vec()
    }

    /// Register a dish type; adding a known type again is a no-op
    pub async fn add_dish_type(&self, input: AddDishTypeInput) -> AppResult<DishTypeAdded> {
        input.validate()?;
        let mut catalog = self.store.catalog_mut().await;
        let mut staged = catalog.clone();
        let (name, created) = staged.add_dish_type(&input.name)?;
        if created {
            self.store.commit_catalog(&mut catalog, staged).await?;
            tracing::info!(dish_type = %name, "Dish type added");
        }
        Ok(DishTypeAdded {
            name,
            created,
            dish_types: catalog.dish_types().to_vec(),
        })
    }

    /// Per-serving cost of dish `id`
    pub async fn dish_cost(&self, id: DishId) -> AppResult<DishCost> {
        let catalog = self.store.catalog().await;
        let dish = catalog
            .get(id)
            .ok_or_else(|| AppError::NotFound(format!("Dish {}", id)))?;
        let ledger = self.store.ledger().await;
        price_dish(dish, &ledger)
    }
}
