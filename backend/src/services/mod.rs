//! Business logic services for the Kitchen Ledger service

pub mod analytics;
pub mod consumption;
pub mod ingestion;
pub mod ledger;
pub mod recipe;

pub use analytics::AnalyticsService;
pub use consumption::ConsumptionService;
pub use ingestion::IngestionService;
pub use ledger::LedgerService;
pub use recipe::RecipeService;
