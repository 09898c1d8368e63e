//! Consumption engine tests
//!
//! Tests for dish preparation including:
//! - All-or-nothing checks before any deduction
//! - FIFO draws across batches with unit conversion
//! - Consumption records and the per-date view
//! - Concurrent preparations never overdrawing stock

use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use kitchen_ledger_backend::config::CatalogConfig;
use kitchen_ledger_backend::services::consumption::{PrepareDishInput, PrepareDishRequest};
use kitchen_ledger_backend::services::ledger::{AddItemInput, UpdateItemInput};
use kitchen_ledger_backend::services::recipe::AddDishInput;
use kitchen_ledger_backend::services::{ConsumptionService, LedgerService, RecipeService};
use kitchen_ledger_backend::{AppError, Config, Store};
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{DishRef, IngredientSpec, Unit};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

struct Kitchen {
    store: Arc<Store>,
    ledger: LedgerService,
    recipes: RecipeService,
    kitchen: ConsumptionService,
}

fn kitchen() -> Kitchen {
    kitchen_on(Arc::new(Store::in_memory(&CatalogConfig::default())))
}

fn kitchen_on(store: Arc<Store>) -> Kitchen {
    Kitchen {
        ledger: LedgerService::new(store.clone()),
        recipes: RecipeService::new(store.clone()),
        kitchen: ConsumptionService::new(store.clone()),
        store,
    }
}

async fn stock(k: &Kitchen, name: &str, quantity: &str, unit: &str, day: &str) -> u64 {
    k.ledger
        .add_item(AddItemInput {
            name: name.to_string(),
            quantity: dec(quantity),
            unit: unit.to_string(),
            price_per_unit: Some(dec("10")),
            total_cost: None,
            item_type: None,
            date_added: Some(day.to_string()),
        })
        .await
        .unwrap()
        .id
}

async fn recipe(k: &Kitchen, name: &str, ingredients: &[(&str, &str, Option<Unit>)]) -> u64 {
    k.recipes
        .add_dish(AddDishInput {
            name: name.to_string(),
            dish_type: "Continental".to_string(),
            ingredients: ingredients
                .iter()
                .map(|(n, q, u)| IngredientSpec {
                    name: n.to_string(),
                    quantity_required: dec(q),
                    unit: *u,
                })
                .collect(),
        })
        .await
        .unwrap()
        .id
}

fn prepare(dish_id: u64, servings: &str, day: &str) -> PrepareDishInput {
    PrepareDishInput {
        dish: DishRef::Id(dish_id),
        quantity: dec(servings),
        date: Some(date(day)),
    }
}

async fn quantity_of(k: &Kitchen, id: u64) -> Decimal {
    k.ledger.get_item(id).await.unwrap().quantity
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[tokio::test]
    async fn test_shortfall_leaves_every_ingredient_untouched() {
        let k = kitchen();
        let a = stock(&k, "Flour", "5", "kg", "2024-05-01").await;
        let b = stock(&k, "Butter", "2", "kg", "2024-05-01").await;
        let dish = recipe(&k, "Croissant", &[("Flour", "3", None), ("Butter", "3", None)]).await;

        let err = k.kitchen.prepare_dish(prepare(dish, "1", "2024-05-02")).await.unwrap_err();
        match err {
            AppError::InsufficientStock(shortfalls) => {
                assert_eq!(shortfalls.len(), 1);
                assert_eq!(shortfalls[0].ingredient_name, "Butter");
                assert_eq!(shortfalls[0].required, dec("3"));
                assert_eq!(shortfalls[0].available, dec("2"));
                assert_eq!(shortfalls[0].shortfall, dec("1"));
            }
            other => panic!("unexpected error: {:?}", other),
        }

        assert_eq!(quantity_of(&k, a).await, dec("5"));
        assert_eq!(quantity_of(&k, b).await, dec("2"));
        assert!(k.store.ledger().await.consumption().is_empty());
    }

    #[tokio::test]
    async fn test_failed_snapshot_write_leaves_stock_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("kitchen");
        let mut config = Config::in_memory();
        config.storage.data_dir = Some(data_dir.clone());

        let k = kitchen_on(Arc::new(Store::open(&config).await.unwrap()));
        let eggs = stock(&k, "Eggs", "10", "piece", "2024-05-01").await;
        let dish = recipe(&k, "Omelette", &[("Eggs", "1", None)]).await;

        std::fs::remove_dir_all(&data_dir).unwrap();

        let err = k.kitchen.prepare_dish(prepare(dish, "2", "2024-05-02")).await.unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
        assert_eq!(quantity_of(&k, eggs).await, dec("10"));
        assert!(k.store.ledger().await.consumption().is_empty());

        // A retry once storage is back draws the stock exactly once
        std::fs::create_dir_all(&data_dir).unwrap();
        k.kitchen.prepare_dish(prepare(dish, "2", "2024-05-02")).await.unwrap();
        assert_eq!(quantity_of(&k, eggs).await, dec("8"));
    }

    #[tokio::test]
    async fn test_oversized_preparation_is_invalid_input() {
        let k = kitchen();
        let rice = stock(&k, "Rice", "50", "kg", "2024-05-01").await;
        let dish = recipe(&k, "Rice Bowl", &[("Rice", "1000000000000000", None)]).await;

        let err = k
            .kitchen
            .prepare_dish(prepare(dish, "100000000000000000", "2024-05-02"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "quantity"));
        assert_eq!(quantity_of(&k, rice).await, dec("50"));
    }

    #[tokio::test]
    async fn test_every_shortfall_is_listed() {
        let k = kitchen();
        stock(&k, "Flour", "1", "kg", "2024-05-01").await;
        stock(&k, "Butter", "1", "kg", "2024-05-01").await;
        let dish = recipe(&k, "Croissant", &[("Flour", "3", None), ("Butter", "3", None)]).await;

        match k.kitchen.prepare_dish(prepare(dish, "1", "2024-05-02")).await {
            Err(AppError::InsufficientStock(shortfalls)) => assert_eq!(shortfalls.len(), 2),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_successful_preparation_deducts_and_records() {
        let k = kitchen();
        let milk = stock(&k, "Milk", "10", "litre", "2024-05-01").await;
        let sugar = stock(&k, "Sugar", "2", "kg", "2024-05-01").await;
        let dish = recipe(
            &k,
            "Masala Chai",
            &[("Milk", "150", Some(Unit::Ml)), ("Sugar", "10", Some(Unit::Gm))],
        )
        .await;

        let outcome = k.kitchen.prepare_dish(prepare(dish, "4", "2024-05-03")).await.unwrap();

        assert_eq!(quantity_of(&k, milk).await, dec("9.4"));
        assert_eq!(quantity_of(&k, sugar).await, dec("1.96"));
        assert_eq!(outcome.records.len(), 2);

        let milk_record = &outcome.records[0];
        assert_eq!(milk_record.ingredient_id, milk);
        assert_eq!(milk_record.unit, Unit::Ml);
        assert_eq!(milk_record.quantity_consumed, dec("600"));
        assert_eq!(milk_record.quantity_left, dec("9400"));
        assert_eq!(milk_record.date, date("2024-05-03"));
        assert_eq!(milk_record.dish_name, "Masala Chai");

        let in_outcome = outcome.inventory.iter().find(|i| i.id == sugar).unwrap();
        assert_eq!(in_outcome.quantity, dec("1.96"));
    }

    #[tokio::test]
    async fn test_consumption_keeps_purchase_cost() {
        let k = kitchen();
        let rice = stock(&k, "Rice", "10", "kg", "2024-05-01").await;
        let dish = recipe(&k, "Rice Bowl", &[("Rice", "1", None)]).await;
        k.kitchen.prepare_dish(prepare(dish, "2", "2024-05-02")).await.unwrap();

        let item = k.ledger.get_item(rice).await.unwrap();
        assert_eq!(item.quantity, dec("8"));
        assert_eq!(item.total_cost, dec("100"));
    }

    #[tokio::test]
    async fn test_draws_oldest_batch_first() {
        let k = kitchen();
        let newer = stock(&k, "Tomato", "5", "kg", "2024-05-04").await;
        let older = stock(&k, "Tomato", "2", "kg", "2024-05-01").await;
        let dish = recipe(&k, "Tomato Soup", &[("Tomato", "500", Some(Unit::Gm))]).await;

        let outcome = k.kitchen.prepare_dish(prepare(dish, "6", "2024-05-05")).await.unwrap();

        assert_eq!(quantity_of(&k, older).await, Decimal::ZERO);
        assert_eq!(quantity_of(&k, newer).await, dec("4"));

        let record = &outcome.records[0];
        assert_eq!(record.batches.len(), 2);
        assert_eq!(record.batches[0].item_id, older);
        assert_eq!(record.batches[0].quantity_consumed, dec("2"));
        assert_eq!(record.batches[1].item_id, newer);
        assert_eq!(record.batches[1].quantity_consumed, dec("1"));
        assert_eq!(record.quantity_left, dec("4000"));
    }

    #[tokio::test]
    async fn test_deleted_ingredient_is_unknown_at_prepare_time() {
        let k = kitchen();
        let basil = stock(&k, "Basil", "1", "kg", "2024-05-01").await;
        stock(&k, "Pasta", "5", "kg", "2024-05-01").await;
        let dish = recipe(&k, "Pesto Pasta", &[("Basil", "0.05", None), ("Pasta", "0.2", None)]).await;
        k.ledger.delete_item(basil).await.unwrap();

        match k.kitchen.prepare_dish(prepare(dish, "1", "2024-05-02")).await {
            Err(AppError::UnknownIngredient(names)) => assert_eq!(names, vec!["Basil".to_string()]),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_renamed_ingredient_still_resolves_by_id() {
        let k = kitchen();
        let cheese = stock(&k, "Cheese", "2", "kg", "2024-05-01").await;
        let dish = recipe(&k, "Cheese Toast", &[("Cheese", "0.05", None)]).await;
        k.ledger
            .update_item(
                cheese,
                UpdateItemInput {
                    name: Some("Mozzarella".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        k.kitchen.prepare_dish(prepare(dish, "2", "2024-05-02")).await.unwrap();
        assert_eq!(quantity_of(&k, cheese).await, dec("1.9"));
    }

    #[tokio::test]
    async fn test_prepare_by_name_and_request_validation() {
        let k = kitchen();
        stock(&k, "Bread", "20", "piece", "2024-05-01").await;
        recipe(&k, "Toast", &[("Bread", "2", None)]).await;

        let input = PrepareDishInput::try_from(PrepareDishRequest {
            dish_id: None,
            dish_name: Some("TOAST".into()),
            quantity: dec("3"),
            date: Some("2024-05-02".into()),
        })
        .unwrap();
        let outcome = k.kitchen.prepare_dish(input).await.unwrap();
        assert_eq!(outcome.records[0].quantity_consumed, dec("6"));

        let neither = PrepareDishInput::try_from(PrepareDishRequest {
            dish_id: None,
            dish_name: None,
            quantity: dec("1"),
            date: None,
        });
        assert!(matches!(neither, Err(AppError::Validation { .. })));

        let missing = k
            .kitchen
            .prepare_dish(PrepareDishInput {
                dish: DishRef::Name("Bagel".into()),
                quantity: dec("1"),
                date: None,
            })
            .await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));

        let zero = k
            .kitchen
            .prepare_dish(PrepareDishInput {
                dish: DishRef::Name("Toast".into()),
                quantity: Decimal::ZERO,
                date: None,
            })
            .await;
        assert!(matches!(zero, Err(AppError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_inventory_on_date_folds_preparations() {
        let k = kitchen();
        let coffee = stock(&k, "Coffee Beans", "1", "kg", "2024-05-01").await;
        stock(&k, "Milk", "5", "litre", "2024-05-01").await;
        let espresso = recipe(&k, "Espresso", &[("Coffee Beans", "18", Some(Unit::Gm))]).await;
        let latte = recipe(
            &k,
            "Latte",
            &[("Coffee Beans", "18", Some(Unit::Gm)), ("Milk", "200", Some(Unit::Ml))],
        )
        .await;

        k.kitchen.prepare_dish(prepare(espresso, "2", "2024-05-06")).await.unwrap();
        k.kitchen.prepare_dish(prepare(latte, "1", "2024-05-06")).await.unwrap();
        k.kitchen.prepare_dish(prepare(latte, "1", "2024-05-07")).await.unwrap();

        let rows = k.ledger.inventory_on_date(date("2024-05-06")).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].ingredient_id, coffee);
        assert_eq!(rows[0].quantity_consumed, dec("54"));
        assert_eq!(rows[0].quantity_left, dec("946"));
        assert_eq!(rows[0].preparations, 2);
        assert_eq!(rows[0].dishes, vec!["Espresso".to_string(), "Latte".to_string()]);
        assert_eq!(rows[1].quantity_consumed, dec("200"));

        assert!(k.ledger.inventory_on_date(date("2024-05-08")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_preparations_never_overdraw() {
        let k = kitchen();
        let eggs = stock(&k, "Eggs", "10", "piece", "2024-05-01").await;
        let dish = recipe(&k, "Omelette", &[("Eggs", "3", None)]).await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let kitchen = k.kitchen.clone();
            handles.push(tokio::spawn(async move {
                kitchen.prepare_dish(prepare(dish, "1", "2024-05-02")).await
            }));
        }

        let mut succeeded = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(AppError::InsufficientStock(_)) => {}
                Err(other) => panic!("unexpected error: {:?}", other),
            }
        }

        assert_eq!(succeeded, 3);
        assert_eq!(quantity_of(&k, eggs).await, dec("1"));
        assert_eq!(k.store.ledger().await.consumption().len(), 3);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        /// Stock after a run of preparations is never negative, and every
        /// successful preparation removes exactly its requirement
        #[test]
        fn prop_stock_never_negative(
            initial in 1u32..200,
            per_serving in 1u32..20,
            servings in proptest::collection::vec(1u32..6, 1..15),
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let (remaining, consumed) = rt.block_on(async {
                let k = kitchen();
                let id = stock(&k, "Paneer", &initial.to_string(), "gm", "2024-05-01").await;
                let dish = recipe(&k, "Paneer Tikka", &[("Paneer", &per_serving.to_string(), None)]).await;
                let mut consumed = Decimal::ZERO;
                for n in &servings {
                    if let Ok(outcome) = k.kitchen.prepare_dish(prepare(dish, &n.to_string(), "2024-05-02")).await {
                        consumed += outcome.records[0].quantity_consumed;
                    }
                }
                (quantity_of(&k, id).await, consumed)
            });
            prop_assert!(remaining >= Decimal::ZERO);
            prop_assert_eq!(remaining + consumed, Decimal::from(initial));
        }
    }
}
