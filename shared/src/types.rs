//! Common types used across the platform

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Stable identifier of a ledger entry. Assigned in increasing order and never reused.
pub type ItemId = u64;

/// Stable identifier of a dish in the recipe catalog.
pub type DishId = u64;

/// Identifier of a consumption record.
pub type RecordId = u64;

/// Inclusive date range for queries. Either bound may be open.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// Whether `date` falls inside the range, bounds included
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }

    pub fn is_inverted(&self) -> bool {
        matches!((self.start, self.end), (Some(s), Some(e)) if s > e)
    }
}

/// Reference to a dish either by id or by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DishRef {
    Id(DishId),
    Name(String),
}

impl std::fmt::Display for DishRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DishRef::Id(id) => write!(f, "#{}", id),
            DishRef::Name(name) => write!(f, "'{}'", name),
        }
    }
}
