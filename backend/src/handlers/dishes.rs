//! HTTP handlers for the recipe catalog

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use shared::{Dish, DishCost, DishId};

use crate::error::AppResult;
use crate::handlers::inventory::ConfirmQuery;
use crate::services::recipe::{AddDishInput, AddDishTypeInput, DishTypeAdded, UpdateDishInput};
use crate::services::RecipeService;
use crate::AppState;

#[derive(Deserialize)]
pub struct ListDishesQuery {
    pub partial_name: Option<String>,
}

/// List dishes, optionally filtered by part of the name
pub async fn list_dishes(
    State(state): State<AppState>,
    Query(query): Query<ListDishesQuery>,
) -> Json<Vec<Dish>> {
    let service = RecipeService::new(state.store.clone());
    Json(service.list_dishes(query.partial_name.as_deref()).await)
}

/// Create a dish
pub async fn add_dish(
    State(state): State<AppState>,
    Json(input): Json<AddDishInput>,
) -> AppResult<(StatusCode, Json<Dish>)> {
    let service = RecipeService::new(state.store.clone());
    let dish = service.add_dish(input).await?;
    Ok((StatusCode::CREATED, Json(dish)))
}

/// Update a dish
pub async fn update_dish(
    State(state): State<AppState>,
    Path(dish_id): Path<DishId>,
    Json(input): Json<UpdateDishInput>,
) -> AppResult<Json<Dish>> {
    let service = RecipeService::new(state.store.clone());
    let dish = service.update_dish(dish_id, input).await?;
    Ok(Json(dish))
}

/// Per-serving cost breakdown
pub async fn dish_cost(
    State(state): State<AppState>,
    Path(dish_id): Path<DishId>,
) -> AppResult<Json<DishCost>> {
    let service = RecipeService::new(state.store.clone());
    let cost = service.dish_cost(dish_id).await?;
    Ok(Json(cost))
}

/// Delete a dish by name
pub async fn delete_dish(
    State(state): State<AppState>,
    Path(dish_name): Path<String>,
    Query(query): Query<ConfirmQuery>,
) -> AppResult<Json<Dish>> {
    let service = RecipeService::new(state.store.clone());
    let dish = service.delete_dish(&dish_name, query.confirm).await?;
    Ok(Json(dish))
}

pub async fn list_dish_types(State(state): State<AppState>) -> Json<Vec<String>> {
    let service = RecipeService::new(state.store.clone());
    Json(service.list_dish_types().await)
}

pub async fn add_dish_type(
    State(state): State<AppState>,
    Json(input): Json<AddDishTypeInput>,
) -> AppResult<Json<DishTypeAdded>> {
    let service = RecipeService::new(state.store.clone());
    let added = service.add_dish_type(input).await?;
    Ok(Json(added))
}
