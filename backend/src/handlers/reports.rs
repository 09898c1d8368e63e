//! Reporting handlers for expense analytics and export

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::error::AppResult;
use crate::services::analytics::{AnalyticsService, ExpenseQuery};
use crate::AppState;

#[derive(Deserialize)]
pub struct ExpenseReportQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub inventory_name: Option<String>,
    #[serde(rename = "type")]
    pub item_type: Option<String>,
    pub format: Option<String>, // "json" or "csv"
}

/// Get the expense report; `format=csv` exports the daily breakdown
pub async fn expense_report(
    State(state): State<AppState>,
    Query(query): Query<ExpenseReportQuery>,
) -> AppResult<impl IntoResponse> {
    let service = AnalyticsService::new(state.store.clone());
    let report = service
        .expense_report(ExpenseQuery {
            start_date: query.start_date,
            end_date: query.end_date,
            inventory_name: query.inventory_name,
            item_type: query.item_type,
        })
        .await?;

    if query.format.as_deref() == Some("csv") {
        let csv = AnalyticsService::export_to_csv(&report.daily_expenses)?;
        Ok((
            [(header::CONTENT_TYPE, "text/csv"), (header::CONTENT_DISPOSITION, "attachment; filename=\"expenses.csv\"")],
            csv,
        ).into_response())
    } else {
        Ok(Json(report).into_response())
    }
}
