//! Spreadsheet import handlers. Bodies are CSV text.

use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::services::ingestion::{
    DishImportSummary, IngestionService, InventoryImportSummary, PreparationImportSummary,
};
use crate::AppState;

pub async fn import_inventory(
    State(state): State<AppState>,
    body: String,
) -> AppResult<Json<InventoryImportSummary>> {
    let service = IngestionService::new(state.store.clone());
    Ok(Json(service.import_inventory(&body).await?))
}

pub async fn import_dishes(
    State(state): State<AppState>,
    body: String,
) -> AppResult<Json<DishImportSummary>> {
    let service = IngestionService::new(state.store.clone());
    Ok(Json(service.import_dishes(&body).await?))
}

pub async fn import_preparations(
    State(state): State<AppState>,
    body: String,
) -> AppResult<Json<PreparationImportSummary>> {
    let service = IngestionService::new(state.store.clone());
    Ok(Json(service.import_preparations(&body).await?))
}
