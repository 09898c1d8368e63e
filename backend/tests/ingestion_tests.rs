//! Spreadsheet ingestion tests
//!
//! Tests for CSV imports including:
//! - Inventory rows as adds, updates and skipped duplicates
//! - Dish rows grouped per dish, all or nothing
//! - Preparation rows applied in order

use std::str::FromStr;
use std::sync::Arc;

use kitchen_ledger_backend::config::CatalogConfig;
use kitchen_ledger_backend::services::{IngestionService, LedgerService, RecipeService};
use kitchen_ledger_backend::{AppError, Store};
use rust_decimal::Decimal;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

struct Kitchen {
    import: IngestionService,
    ledger: LedgerService,
    recipes: RecipeService,
}

fn kitchen() -> Kitchen {
    let store = Arc::new(Store::in_memory(&CatalogConfig::default()));
    Kitchen {
        import: IngestionService::new(store.clone()),
        ledger: LedgerService::new(store.clone()),
        recipes: RecipeService::new(store),
    }
}

const INVENTORY: &str = "\
name,quantity,unit,price_per_unit,total_cost,type,date_added
Rice,10,kg,60,,Grains,2024-07-01
Urad Dal,5,kg,,600,Pulses,2024-07-01
,,,,,,
Oil,5,litre,150,750,Oil,2024-07-02
Salt,1,bushel,20,,,2024-07-02
Rice,10,kg,60,,Grains,2024-07-01
";

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[tokio::test]
    async fn test_inventory_import_adds_and_skips() {
        let k = kitchen();
        let summary = k.import.import_inventory(INVENTORY).await.unwrap();

        assert_eq!(summary.added_items, vec!["Rice".to_string(), "Urad Dal".to_string()]);
        assert_eq!(summary.duplicate_rows, vec![7]);
        assert_eq!(summary.skipped_rows.len(), 2);
        assert!(summary.skipped_rows[0].starts_with("Row 5:"));
        assert!(summary.skipped_rows[1].starts_with("Row 6:"));

        let items = k.ledger.list_items().await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].price_per_unit, dec("120"));
    }

    #[tokio::test]
    async fn test_inventory_import_updates_rows_with_known_id() {
        let k = kitchen();
        k.import.import_inventory(INVENTORY).await.unwrap();

        let sheet = "\
id,name,quantity,unit,price_per_unit,date_added
1,Rice,12,kg,65,2024-07-01
99,Jaggery,2,kg,80,2024-07-03
";
        let summary = k.import.import_inventory(sheet).await.unwrap();
        assert_eq!(summary.updated_items, vec!["Rice".to_string()]);
        assert_eq!(summary.added_items, vec!["Jaggery".to_string()]);

        let rice = k.ledger.get_item(1).await.unwrap();
        assert_eq!(rice.quantity, dec("12"));
        assert_eq!(rice.total_cost, dec("780"));
    }

    #[tokio::test]
    async fn test_missing_columns_fail_the_import() {
        let k = kitchen();
        let result = k.import.import_inventory("name,quantity\nRice,1\n").await;
        match result {
            Err(AppError::Validation { message, .. }) => {
                assert!(message.contains("unit"));
                assert!(message.contains("date_added"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dish_import_is_all_or_nothing_per_dish() {
        let k = kitchen();
        k.import.import_inventory(INVENTORY).await.unwrap();

        let sheet = "\
name,type,ingredient_name,quantity_required,unit
Idli,South Indian,Rice,100,gm
Idli,South Indian,Urad Dal,40,gm
Medu Vada,South Indian,Urad Dal,60,gm
Medu Vada,South Indian,Curry Leaves,2,gm
Tadka Rice,Indian Main Course,Rice,abc,gm
Tadka Rice,Indian Main Course,Oil,10,ml
";
        let summary = k.import.import_dishes(sheet).await.unwrap();

        assert_eq!(summary.added_dishes, vec!["Idli".to_string()]);
        assert_eq!(summary.skipped_rows.len(), 2);
        assert!(summary.skipped_rows[0].contains("Medu Vada"));
        assert!(summary.skipped_rows[0].contains("Curry Leaves"));
        assert!(summary.skipped_rows[1].contains("Tadka Rice"));

        let dishes = k.recipes.list_dishes(None).await;
        assert_eq!(dishes.len(), 1);
        assert_eq!(dishes[0].ingredients.len(), 2);
    }

    #[tokio::test]
    async fn test_preparation_import_applies_rows_in_order() {
        let k = kitchen();
        k.import.import_inventory(INVENTORY).await.unwrap();
        k.import
            .import_dishes("name,type,ingredient_name,quantity_required,unit\nPlain Rice,South Indian,Rice,4,kg\n")
            .await
            .unwrap();

        let sheet = "\
dish_name,quantity,date
Plain Rice,2,2024-07-05
Plain Rice,1,2024-07-05
Biryani,1,2024-07-05
Plain Rice,1,not-a-date
";
        let summary = k.import.import_preparations(sheet).await.unwrap();

        assert_eq!(summary.prepared.len(), 1);
        assert_eq!(summary.failed_rows.len(), 3);
        assert!(summary.failed_rows[0].starts_with("Row 3:"));
        assert!(summary.failed_rows[1].starts_with("Row 4:"));
        assert!(summary.failed_rows[2].starts_with("Row 5:"));

        let rice = k.ledger.get_item(1).await.unwrap();
        assert_eq!(rice.quantity, dec("2"));
    }
}
