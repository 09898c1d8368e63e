//! HTTP handlers for inventory ledger endpoints

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use shared::{InventoryCsvRow, InventoryItem, InventoryOnDateRow, ItemId};

use crate::error::{AppError, AppResult};
use crate::services::analytics::AnalyticsService;
use crate::services::ledger::{parse_date_field, AddItemInput, SearchItemsInput, UpdateItemInput};
use crate::services::LedgerService;
use crate::AppState;

#[derive(Deserialize)]
pub struct ListQuery {
    pub format: Option<String>, // "json" or "csv"
}

#[derive(Deserialize)]
pub struct ConfirmQuery {
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Deserialize)]
pub struct OnDateQuery {
    pub date: Option<String>,
}

#[derive(Serialize)]
pub struct DeleteAllResponse {
    pub deleted: usize,
}

/// List every stock entry
pub async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<impl IntoResponse> {
    let service = LedgerService::new(state.store.clone());
    let items = service.list_items().await;

    if query.format.as_deref() == Some("csv") {
        let rows: Vec<InventoryCsvRow> = items.iter().map(InventoryCsvRow::from).collect();
        let csv = AnalyticsService::export_to_csv(&rows)?;
        Ok((
            [(header::CONTENT_TYPE, "text/csv"), (header::CONTENT_DISPOSITION, "attachment; filename=\"inventory.csv\"")],
            csv,
        ).into_response())
    } else {
        Ok(Json(items).into_response())
    }
}

/// Add a stock entry
pub async fn add_item(
    State(state): State<AppState>,
    Json(input): Json<AddItemInput>,
) -> AppResult<(StatusCode, Json<InventoryItem>)> {
    let service = LedgerService::new(state.store.clone());
    let item = service.add_item(input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Remove all stock entries
pub async fn delete_all_items(
    State(state): State<AppState>,
    Query(query): Query<ConfirmQuery>,
) -> AppResult<Json<DeleteAllResponse>> {
    let service = LedgerService::new(state.store.clone());
    let deleted = service.delete_all_items(query.confirm).await?;
    Ok(Json(DeleteAllResponse { deleted }))
}

/// Search by name, type and purchase date
pub async fn search_items(
    State(state): State<AppState>,
    Query(query): Query<SearchItemsInput>,
) -> AppResult<Json<Vec<InventoryItem>>> {
    let service = LedgerService::new(state.store.clone());
    let items = service.search_items(query).await?;
    Ok(Json(items))
}

/// Consumption per ingredient on one date
pub async fn inventory_on_date(
    State(state): State<AppState>,
    Query(query): Query<OnDateQuery>,
) -> AppResult<Json<Vec<InventoryOnDateRow>>> {
    let date = parse_date_field("date", query.date.as_deref())?
        .ok_or_else(|| AppError::validation("date", "date is required"))?;
    let service = LedgerService::new(state.store.clone());
    Ok(Json(service.inventory_on_date(date).await?))
}

/// Get a stock entry by id
pub async fn get_item(
    State(state): State<AppState>,
    Path(item_id): Path<ItemId>,
) -> AppResult<Json<InventoryItem>> {
    let service = LedgerService::new(state.store.clone());
    let item = service.get_item(item_id).await?;
    Ok(Json(item))
}

/// Update a stock entry
pub async fn update_item(
    State(state): State<AppState>,
    Path(item_id): Path<ItemId>,
    Json(input): Json<UpdateItemInput>,
) -> AppResult<Json<InventoryItem>> {
    let service = LedgerService::new(state.store.clone());
    let item = service.update_item(item_id, input).await?;
    Ok(Json(item))
}

/// Delete a stock entry
pub async fn delete_item(
    State(state): State<AppState>,
    Path(item_id): Path<ItemId>,
) -> AppResult<Json<InventoryItem>> {
    let service = LedgerService::new(state.store.clone());
    let item = service.delete_item(item_id).await?;
    Ok(Json(item))
}
