//! Route definitions for the Kitchen Ledger service

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/inventory", inventory_routes())
        .nest("/dishes", dish_routes())
        .route("/preparations", post(handlers::prepare_dish))
        .nest("/reports", report_routes())
        .nest("/import", import_routes())
}

/// Inventory ledger routes
fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_items)
                .post(handlers::add_item)
                .delete(handlers::delete_all_items),
        )
        .route("/search", get(handlers::search_items))
        .route("/on-date", get(handlers::inventory_on_date))
        .route(
            "/:item_id",
            get(handlers::get_item)
                .put(handlers::update_item)
                .delete(handlers::delete_item),
        )
}

/// Recipe catalog routes
fn dish_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_dishes).post(handlers::add_dish))
        .route(
            "/types",
            get(handlers::list_dish_types).post(handlers::add_dish_type),
        )
        .route("/:dish_id", put(handlers::update_dish))
        .route("/:dish_id/cost", get(handlers::dish_cost))
        .route("/by-name/:dish_name", delete(handlers::delete_dish))
}

/// Analytics routes
fn report_routes() -> Router<AppState> {
    Router::new().route("/expenses", get(handlers::expense_report))
}

/// Spreadsheet import routes
fn import_routes() -> Router<AppState> {
    Router::new()
        .route("/inventory", post(handlers::import_inventory))
        .route("/dishes", post(handlers::import_dishes))
        .route("/preparations", post(handlers::import_preparations))
}
