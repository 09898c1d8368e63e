//! Analytics service for expense reports and data export

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{eq_ignore_case, DateRange, ExpenseDay, ExpenseFilter, ExpenseReport, InventoryItem};

use crate::error::{AppError, AppResult};
use crate::services::ledger::parse_range;
use crate::store::Store;

#[derive(Clone)]
pub struct AnalyticsService {
    store: Arc<Store>,
}

/// Report query parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpenseQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub inventory_name: Option<String>,
    #[serde(rename = "type")]
    pub item_type: Option<String>,
}

/// Spend and entry count of one ingredient, names compared ignoring case
struct ItemTotals<'a> {
    /// Spelling of the first entry seen
    name: &'a str,
    spent: Decimal,
    entries: usize,
}

/// Build the report for entries already known to match `filter`.
///
/// Entries are grouped per ingredient ignoring case. Ties go to the earliest
/// date for day extremes and to the alphabetically first name for item
/// extremes.
pub fn build_expense_report(
    entries: &[&InventoryItem],
    filter: ExpenseFilter,
) -> AppResult<ExpenseReport> {
    if entries.is_empty() {
        return Ok(ExpenseReport::empty(filter));
    }

    let mut by_day: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    let mut by_item: BTreeMap<String, ItemTotals> = BTreeMap::new();
    for entry in entries {
        let day = by_day.entry(entry.date_added).or_default();
        *day = day
            .checked_add(entry.total_cost)
            .ok_or_else(|| AppError::overflow("total_cost"))?;

        let item = by_item
            .entry(entry.name.trim().to_lowercase())
            .or_insert_with(|| ItemTotals {
                name: entry.name.trim(),
                spent: Decimal::ZERO,
                entries: 0,
            });
        item.spent = item
            .spent
            .checked_add(entry.total_cost)
            .ok_or_else(|| AppError::overflow("total_cost"))?;
        item.entries += 1;
    }

    let total = by_day
        .values()
        .try_fold(Decimal::ZERO, |sum, amount| sum.checked_add(*amount))
        .ok_or_else(|| AppError::overflow("total_cost"))?;
    let distinct_days = Decimal::from(by_day.len());

    let daily_expenses: Vec<ExpenseDay> = by_day
        .iter()
        .map(|(date, amount)| ExpenseDay {
            date: *date,
            amount: *amount,
        })
        .collect();
    let items: Vec<&ItemTotals> = by_item.values().collect();
    let item_name = |found: Option<&&ItemTotals>| found.map(|i| i.name.to_string());

    Ok(ExpenseReport {
        filter,
        entry_count: entries.len(),
        total_expense: Some(total),
        average_expense: Some((total / distinct_days).round_dp(2)),
        highest_expense_day: first_by(&daily_expenses, |a, b| a.amount > b.amount).cloned(),
        lowest_expense_day: first_by(&daily_expenses, |a, b| a.amount < b.amount).cloned(),
        highest_expense_item: item_name(first_by(&items, |a, b| a.spent > b.spent)),
        lowest_expense_item: item_name(first_by(&items, |a, b| a.spent < b.spent)),
        most_frequent_inventory: item_name(first_by(&items, |a, b| a.entries > b.entries)),
        daily_expenses,
    })
}

/// First element that no later element beats; inputs are already in tie-break order
fn first_by<T>(values: &[T], beats: impl Fn(&T, &T) -> bool) -> Option<&T> {
    values
        .iter()
        .fold(None, |best: Option<&T>, candidate| match best {
            Some(current) if !beats(candidate, current) => Some(current),
            _ => Some(candidate),
        })
}

impl AnalyticsService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Expense aggregates over entries whose `date_added` falls in the range
    /// and whose name and type match exactly, ignoring case
    pub async fn expense_report(&self, query: ExpenseQuery) -> AppResult<ExpenseReport> {
        let range: DateRange = parse_range(query.start_date.as_deref(), query.end_date.as_deref())?;
        let filter = ExpenseFilter {
            start_date: range.start,
            end_date: range.end,
            inventory_name: query.inventory_name.filter(|n| !n.trim().is_empty()),
            item_type: query.item_type.filter(|t| !t.trim().is_empty()),
        };

        let ledger = self.store.ledger().await;
        let entries: Vec<&InventoryItem> = ledger
            .items()
            .filter(|item| range.contains(item.date_added))
            .filter(|item| {
                filter
                    .inventory_name
                    .as_deref()
                    .map_or(true, |n| eq_ignore_case(&item.name, n))
            })
            .filter(|item| {
                filter.item_type.as_deref().map_or(true, |t| {
                    item.item_type.as_deref().map_or(false, |it| eq_ignore_case(it, t))
                })
            })
            .collect();

        let report = build_expense_report(&entries, filter)?;
        if report.has_data() {
            tracing::debug!(entries = report.entry_count, "Expense report computed");
        } else {
            tracing::debug!("No ledger entries matched the expense filter");
        }
        Ok(report)
    }

    /// Export data as CSV
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record)
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Unit;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn entry(id: u64, name: &str, total: &str, day: u32) -> InventoryItem {
        InventoryItem {
            id,
            name: name.to_string(),
            quantity: Decimal::ONE,
            unit: Unit::Kg,
            price_per_unit: dec(total),
            total_cost: dec(total),
            item_type: None,
            date_added: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
        }
    }

    #[test]
    fn test_ties_prefer_earliest_day_and_first_name() {
        let items = vec![
            entry(1, "Tomato", "50", 3),
            entry(2, "Onion", "50", 1),
            entry(3, "Garlic", "20", 2),
        ];
        let refs: Vec<&InventoryItem> = items.iter().collect();
        let report = build_expense_report(&refs, ExpenseFilter::default()).unwrap();

        let highest = report.highest_expense_day.unwrap();
        assert_eq!(highest.date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(report.highest_expense_item.as_deref(), Some("Onion"));
        assert_eq!(report.lowest_expense_item.as_deref(), Some("Garlic"));
        assert_eq!(report.most_frequent_inventory.as_deref(), Some("Garlic"));
    }

    #[test]
    fn test_items_group_ignoring_case() {
        let items = vec![
            entry(1, "Rice", "100", 1),
            entry(2, "rice", "100", 2),
            entry(3, "Dal", "150", 1),
            entry(4, "Dal", "10", 2),
        ];
        let refs: Vec<&InventoryItem> = items.iter().collect();
        let report = build_expense_report(&refs, ExpenseFilter::default()).unwrap();

        assert_eq!(report.highest_expense_item.as_deref(), Some("Rice"));
        assert_eq!(report.lowest_expense_item.as_deref(), Some("Dal"));
        assert_eq!(report.most_frequent_inventory.as_deref(), Some("Dal"));
    }

    #[test]
    fn test_name_ties_ignore_case() {
        let items = vec![entry(1, "Banana", "40", 1), entry(2, "apple", "40", 1)];
        let refs: Vec<&InventoryItem> = items.iter().collect();
        let report = build_expense_report(&refs, ExpenseFilter::default()).unwrap();

        assert_eq!(report.highest_expense_item.as_deref(), Some("apple"));
        assert_eq!(report.lowest_expense_item.as_deref(), Some("apple"));
    }

    #[test]
    fn test_total_overflow_is_invalid_input() {
        let items = vec![
            entry(1, "Saffron", "70000000000000000000000000000", 1),
            entry(2, "Saffron", "70000000000000000000000000000", 2),
        ];
        let refs: Vec<&InventoryItem> = items.iter().collect();
        let err = build_expense_report(&refs, ExpenseFilter::default()).unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "total_cost"));
    }

    #[test]
    fn test_csv_export_has_header() {
        let days = vec![ExpenseDay {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            amount: dec("12.50"),
        }];
        let csv = AnalyticsService::export_to_csv(&days).unwrap();
        assert!(csv.starts_with("date,amount\n"));
        assert!(csv.contains("2024-01-01,12.50"));
    }
}
