//! HTTP handler for dish preparations

use axum::{extract::State, response::IntoResponse, Json};

use crate::error::AppResult;
use crate::services::consumption::{PrepareDishInput, PrepareDishRequest};
use crate::services::ConsumptionService;
use crate::AppState;

/// Prepare servings of a dish. Repeating the request consumes stock again,
/// so the response is marked non-idempotent.
pub async fn prepare_dish(
    State(state): State<AppState>,
    Json(request): Json<PrepareDishRequest>,
) -> AppResult<impl IntoResponse> {
    let input = PrepareDishInput::try_from(request)?;
    let service = ConsumptionService::new(state.store.clone());
    let outcome = service.prepare_dish(input).await?;
    Ok(([("x-idempotent", "false")], Json(outcome)))
}
