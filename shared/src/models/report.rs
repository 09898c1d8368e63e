//! Expense analytics models

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Expense total for one calendar date
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpenseDay {
    pub date: NaiveDate,
    pub amount: Decimal,
}

/// Filter an expense report was computed with
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExpenseFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub inventory_name: Option<String>,
    #[serde(rename = "type")]
    pub item_type: Option<String>,
}

/// Aggregates over a filtered slice of the ledger.
///
/// Every aggregate is `None` when no entry matched the filter, so "no data"
/// is distinguishable from "zero expense".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpenseReport {
    pub filter: ExpenseFilter,
    pub entry_count: usize,
    pub total_expense: Option<Decimal>,
    /// Total divided by the number of distinct dates
    pub average_expense: Option<Decimal>,
    pub highest_expense_day: Option<ExpenseDay>,
    pub lowest_expense_day: Option<ExpenseDay>,
    pub highest_expense_item: Option<String>,
    pub lowest_expense_item: Option<String>,
    pub most_frequent_inventory: Option<String>,
    pub daily_expenses: Vec<ExpenseDay>,
}

impl ExpenseReport {
    /// Report for a filter that matched nothing
    pub fn empty(filter: ExpenseFilter) -> Self {
        Self {
            filter,
            entry_count: 0,
            total_expense: None,
            average_expense: None,
            highest_expense_day: None,
            lowest_expense_day: None,
            highest_expense_item: None,
            lowest_expense_item: None,
            most_frequent_inventory: None,
            daily_expenses: Vec::new(),
        }
    }

    pub fn has_data(&self) -> bool {
        self.entry_count > 0
    }
}
