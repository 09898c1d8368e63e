//! Recipe catalog state: dishes and the dish-type vocabulary

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use shared::{
    canonical_dish_type, contains_ignore_case, validate_name, Dish, DishId, DishIngredient,
    DEFAULT_DISH_TYPES,
};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    next_dish_id: DishId,
    dishes: BTreeMap<DishId, Dish>,
    dish_types: Vec<String>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::with_dish_types(&[])
    }
}

impl Catalog {
    /// Empty catalog whose vocabulary is the built-in menu sections plus `extra`
    pub fn with_dish_types(extra: &[String]) -> Self {
        let mut catalog = Self {
            next_dish_id: 0,
            dishes: BTreeMap::new(),
            dish_types: DEFAULT_DISH_TYPES.iter().map(|t| t.to_string()).collect(),
        };
        catalog.merge_dish_types(extra);
        catalog
    }

    /// Add configured types missing from a restored vocabulary
    pub fn merge_dish_types(&mut self, extra: &[String]) {
        for dish_type in extra {
            // Blank config entries are ignored
            let _ = self.add_dish_type(dish_type);
        }
    }

    pub fn len(&self) -> usize {
        self.dishes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dishes.is_empty()
    }

    pub fn dish_types(&self) -> &[String] {
        &self.dish_types
    }

    /// Register a dish type. Returns the canonical spelling and whether it was new.
    pub fn add_dish_type(&mut self, name: &str) -> AppResult<(String, bool)> {
        validate_name(name).map_err(|m| AppError::validation("type", m))?;
        if let Some(existing) = canonical_dish_type(name, &self.dish_types) {
            return Ok((existing.to_string(), false));
        }
        let canonical = name.trim().to_string();
        self.dish_types.push(canonical.clone());
        Ok((canonical, true))
    }

    /// Canonical spelling of a known dish type
    pub fn canonical_type(&self, input: &str) -> AppResult<String> {
        canonical_dish_type(input, &self.dish_types)
            .map(str::to_string)
            .ok_or_else(|| {
                AppError::validation("type", format!("Unknown dish type '{}'", input.trim()))
            })
    }

    pub fn get(&self, id: DishId) -> Option<&Dish> {
        self.dishes.get(&id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Dish> {
        self.dishes.values().find(|d| d.is_named(name))
    }

    /// Dishes whose name contains `partial_name`, ordered by id
    pub fn list(&self, partial_name: Option<&str>) -> Vec<Dish> {
        self.dishes
            .values()
            .filter(|d| partial_name.map_or(true, |p| contains_ignore_case(&d.name, p)))
            .cloned()
            .collect()
    }

    /// Store a dish whose ingredients were already resolved
    pub fn insert(
        &mut self,
        name: &str,
        dish_type: String,
        ingredients: Vec<DishIngredient>,
    ) -> AppResult<Dish> {
        validate_name(name).map_err(|m| AppError::validation("name", m))?;
        if self.find_by_name(name).is_some() {
            return Err(AppError::DuplicateDish(name.trim().to_string()));
        }
        self.next_dish_id += 1;
        let dish = Dish {
            id: self.next_dish_id,
            name: name.trim().to_string(),
            dish_type,
            ingredients,
        };
        self.dishes.insert(dish.id, dish.clone());
        Ok(dish)
    }

    /// Overwrite the provided parts of dish `id`. A new ingredient list
    /// replaces the old one wholesale.
    pub fn replace(
        &mut self,
        id: DishId,
        name: Option<&str>,
        dish_type: Option<String>,
        ingredients: Option<Vec<DishIngredient>>,
    ) -> AppResult<Dish> {
        let mut updated = self
            .dishes
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Dish {}", id)))?;

        if let Some(name) = name {
            validate_name(name).map_err(|m| AppError::validation("name", m))?;
            if self.dishes.values().any(|d| d.id != id && d.is_named(name)) {
                return Err(AppError::DuplicateDish(name.trim().to_string()));
            }
            updated.name = name.trim().to_string();
        }
        if let Some(dish_type) = dish_type {
            updated.dish_type = dish_type;
        }
        if let Some(ingredients) = ingredients {
            updated.ingredients = ingredients;
        }

        self.dishes.insert(id, updated.clone());
        Ok(updated)
    }

    /// Delete a dish by name. Existence is checked before confirmation.
    pub fn remove_by_name(&mut self, name: &str, confirm: bool) -> AppResult<Dish> {
        let id = self
            .find_by_name(name)
            .map(|d| d.id)
            .ok_or_else(|| AppError::NotFound(format!("Dish '{}'", name.trim())))?;
        if !confirm {
            return Err(AppError::ConfirmationRequired(format!(
                "Deleting dish '{}' requires confirm=true",
                name.trim()
            )));
        }
        self.dishes
            .remove(&id)
            .ok_or_else(|| AppError::NotFound(format!("Dish {}", id)))
    }
}
