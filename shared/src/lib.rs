//! Shared types and models for the Kitchen Ledger platform
//!
//! This crate contains the inventory, recipe and expense types shared by the
//! backend service and its import tooling. It performs no I/O.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
