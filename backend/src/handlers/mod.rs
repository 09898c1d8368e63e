//! HTTP handlers

pub mod dishes;
pub mod health;
pub mod ingestion;
pub mod inventory;
pub mod preparation;
pub mod reports;

pub use dishes::*;
pub use health::*;
pub use ingestion::*;
pub use inventory::*;
pub use preparation::*;
pub use reports::*;
