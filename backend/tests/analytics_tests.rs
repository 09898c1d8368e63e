//! Expense analytics tests
//!
//! Tests for the expense report including:
//! - Average over distinct purchase dates
//! - Empty selections reporting no data
//! - Name, type and date filters

use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use kitchen_ledger_backend::config::CatalogConfig;
use kitchen_ledger_backend::services::analytics::{build_expense_report, ExpenseQuery};
use kitchen_ledger_backend::services::ledger::AddItemInput;
use kitchen_ledger_backend::services::{AnalyticsService, LedgerService};
use kitchen_ledger_backend::{AppError, Store};
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{ExpenseFilter, InventoryItem, Unit};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

struct Books {
    ledger: LedgerService,
    analytics: AnalyticsService,
}

fn books() -> Books {
    let store = Arc::new(Store::in_memory(&CatalogConfig::default()));
    Books {
        ledger: LedgerService::new(store.clone()),
        analytics: AnalyticsService::new(store),
    }
}

async fn buy(b: &Books, name: &str, total: &str, item_type: Option<&str>, day: &str) {
    b.ledger
        .add_item(AddItemInput {
            name: name.to_string(),
            quantity: dec("1"),
            unit: "kg".to_string(),
            price_per_unit: None,
            total_cost: Some(dec(total)),
            item_type: item_type.map(str::to_string),
            date_added: Some(day.to_string()),
        })
        .await
        .unwrap();
}

fn range(start: &str, end: &str) -> ExpenseQuery {
    ExpenseQuery {
        start_date: Some(start.to_string()),
        end_date: Some(end.to_string()),
        ..Default::default()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[tokio::test]
    async fn test_average_is_per_distinct_date() {
        let b = books();
        buy(&b, "Rice", "50", None, "2024-06-01").await;
        buy(&b, "Dal", "50", None, "2024-06-01").await;
        buy(&b, "Oil", "60", None, "2024-06-02").await;
        buy(&b, "Rice", "40", None, "2024-06-03").await;
        buy(&b, "Salt", "100", None, "2024-06-03").await;

        let report = b.analytics.expense_report(range("2024-06-01", "2024-06-03")).await.unwrap();

        assert_eq!(report.entry_count, 5);
        assert_eq!(report.total_expense, Some(dec("300")));
        assert_eq!(report.average_expense, Some(dec("100")));

        let highest = report.highest_expense_day.unwrap();
        assert_eq!(highest.date, NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
        assert_eq!(highest.amount, dec("140"));
        let lowest = report.lowest_expense_day.unwrap();
        assert_eq!(lowest.amount, dec("60"));

        assert_eq!(report.highest_expense_item.as_deref(), Some("Salt"));
        assert_eq!(report.lowest_expense_item.as_deref(), Some("Dal"));
        assert_eq!(report.most_frequent_inventory.as_deref(), Some("Rice"));
        assert_eq!(report.daily_expenses.len(), 3);
    }

    #[tokio::test]
    async fn test_empty_range_reports_no_data() {
        let b = books();
        buy(&b, "Rice", "50", None, "2024-06-01").await;

        let report = b.analytics.expense_report(range("2025-01-01", "2025-01-31")).await.unwrap();

        assert!(!report.has_data());
        assert_eq!(report.total_expense, None);
        assert_eq!(report.average_expense, None);
        assert_eq!(report.highest_expense_day, None);
        assert_eq!(report.lowest_expense_item, None);
        assert_eq!(report.most_frequent_inventory, None);
        assert!(report.daily_expenses.is_empty());
    }

    #[tokio::test]
    async fn test_name_and_type_filters_are_exact_and_combined() {
        let b = books();
        buy(&b, "Milk", "60", Some("Dairy"), "2024-06-01").await;
        buy(&b, "Milk Powder", "300", Some("Dairy"), "2024-06-01").await;
        buy(&b, "milk", "40", Some("Dairy"), "2024-06-02").await;
        buy(&b, "Milk", "55", Some("Beverage"), "2024-06-02").await;

        let report = b
            .analytics
            .expense_report(ExpenseQuery {
                inventory_name: Some("MILK".into()),
                item_type: Some("dairy".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(report.entry_count, 2);
        assert_eq!(report.total_expense, Some(dec("100")));
        assert_eq!(report.filter.item_type.as_deref(), Some("dairy"));
    }

    #[tokio::test]
    async fn test_inverted_range_is_rejected() {
        let b = books();
        let result = b.analytics.expense_report(range("2024-06-30", "2024-06-01")).await;
        assert!(matches!(result, Err(AppError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_average_rounds_to_cents() {
        let b = books();
        buy(&b, "Rice", "100", None, "2024-06-01").await;
        buy(&b, "Rice", "0", None, "2024-06-02").await;
        buy(&b, "Rice", "0", None, "2024-06-03").await;

        let report = b.analytics.expense_report(ExpenseQuery::default()).await.unwrap();
        assert_eq!(report.average_expense, Some(dec("33.33")));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn entry(id: u64, name_index: usize, cents: u32, day: u32) -> InventoryItem {
        let names = ["Rice", "Dal", "Oil", "Salt"];
        InventoryItem {
            id,
            name: names[name_index % names.len()].to_string(),
            quantity: Decimal::ONE,
            unit: Unit::Kg,
            price_per_unit: Decimal::new(cents as i64, 2),
            total_cost: Decimal::new(cents as i64, 2),
            item_type: None,
            date_added: NaiveDate::from_ymd_opt(2024, 7, day).unwrap(),
        }
    }

    proptest! {
        /// Daily totals add up to the total, and the day extremes bound every day
        #[test]
        fn prop_daily_breakdown_is_consistent(
            rows in proptest::collection::vec((0usize..4, 0u32..100_000, 1u32..29), 1..40)
        ) {
            let items: Vec<InventoryItem> = rows
                .iter()
                .enumerate()
                .map(|(i, (n, c, d))| entry(i as u64 + 1, *n, *c, *d))
                .collect();
            let refs: Vec<&InventoryItem> = items.iter().collect();
            let report = build_expense_report(&refs, ExpenseFilter::default()).unwrap();

            let total = report.total_expense.unwrap();
            let daily_sum: Decimal = report.daily_expenses.iter().map(|d| d.amount).sum();
            prop_assert_eq!(total, daily_sum);

            let high = report.highest_expense_day.clone().unwrap();
            let low = report.lowest_expense_day.clone().unwrap();
            for day in &report.daily_expenses {
                prop_assert!(day.amount <= high.amount);
                prop_assert!(day.amount >= low.amount);
            }
            for pair in report.daily_expenses.windows(2) {
                prop_assert!(pair[0].date < pair[1].date);
            }
        }
    }
}
