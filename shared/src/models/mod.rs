//! Domain models for the Kitchen Ledger platform

mod dish;
mod inventory;
mod report;

pub use dish::*;
pub use inventory::*;
pub use report::*;
