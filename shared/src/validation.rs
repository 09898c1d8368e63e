//! Validation utilities for the Kitchen Ledger platform

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Longest accepted item or dish name
pub const MAX_NAME_LENGTH: usize = 120;

// ============================================================================
// Stock Validations
// ============================================================================

/// Validate an item or dish name
pub fn validate_name(name: &str) -> Result<(), &'static str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Name must not be empty");
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err("Name must be at most 120 characters");
    }
    Ok(())
}

/// Quantity of a newly purchased batch
pub fn validate_new_stock_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Quantity must be positive");
    }
    Ok(())
}

/// Quantity of an existing batch, which may be fully consumed
pub fn validate_stock_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity < Decimal::ZERO {
        return Err("Quantity cannot be negative");
    }
    Ok(())
}

pub fn validate_cost_amount(amount: Decimal) -> Result<(), &'static str> {
    if amount < Decimal::ZERO {
        return Err("Cost cannot be negative");
    }
    Ok(())
}

/// Per-serving quantity of a recipe ingredient
pub fn validate_quantity_required(quantity: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Quantity required must be positive");
    }
    Ok(())
}

/// Number of servings in a preparation
pub fn validate_servings(servings: Decimal) -> Result<(), &'static str> {
    if servings <= Decimal::ZERO {
        return Err("Servings must be positive");
    }
    Ok(())
}

// ============================================================================
// Parsing & Matching
// ============================================================================

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(value: &str) -> Result<NaiveDate, &'static str> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| "Invalid date format. Use YYYY-MM-DD")
}

/// Parse an optional query date; blank strings count as absent
pub fn parse_optional_date(value: Option<&str>) -> Result<Option<NaiveDate>, &'static str> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => parse_date(v).map(Some),
    }
}

/// Trim a free-text tag, mapping blank values to `None`
pub fn normalize_tag(tag: Option<&str>) -> Option<String> {
    tag.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Case-insensitive substring match
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.trim().to_lowercase())
}

/// Case-insensitive equality after trimming
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Find the canonical spelling of `input` within `vocabulary`
pub fn canonical_dish_type<'a, I>(input: &str, vocabulary: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a String>,
{
    vocabulary
        .into_iter()
        .find(|known| eq_ignore_case(known, input))
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Basmati Rice").is_ok());
        assert!(validate_name("   ").is_err());
        assert!(validate_name("").is_err());
        assert!(validate_name(&"x".repeat(121)).is_err());
    }

    #[test]
    fn test_quantities() {
        assert!(validate_new_stock_quantity(Decimal::ONE).is_ok());
        assert!(validate_new_stock_quantity(Decimal::ZERO).is_err());
        assert!(validate_stock_quantity(Decimal::ZERO).is_ok());
        assert!(validate_stock_quantity(Decimal::NEGATIVE_ONE).is_err());
        assert!(validate_quantity_required(Decimal::ZERO).is_err());
        assert!(validate_servings(Decimal::NEGATIVE_ONE).is_err());
        assert!(validate_cost_amount(Decimal::ZERO).is_ok());
        assert!(validate_cost_amount(Decimal::NEGATIVE_ONE).is_err());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert!(parse_date("29/02/2024").is_err());
        assert!(parse_date("2023-02-29").is_err());
        assert_eq!(parse_optional_date(Some("  ")).unwrap(), None);
        assert_eq!(parse_optional_date(None).unwrap(), None);
        assert!(parse_optional_date(Some("soon")).is_err());
    }

    #[test]
    fn test_normalize_tag() {
        assert_eq!(normalize_tag(Some(" Dairy ")), Some("Dairy".to_string()));
        assert_eq!(normalize_tag(Some("")), None);
        assert_eq!(normalize_tag(None), None);
    }

    #[test]
    fn test_canonical_dish_type() {
        let vocabulary = vec!["South Indian".to_string(), "Dessert".to_string()];
        assert_eq!(canonical_dish_type("dessert", &vocabulary), Some("Dessert"));
        assert_eq!(canonical_dish_type(" south indian", &vocabulary), Some("South Indian"));
        assert_eq!(canonical_dish_type("Tapas", &vocabulary), None);
    }

    proptest! {
        #[test]
        fn prop_contains_ignores_case(word in "[a-zA-Z]{1,12}", prefix in "[a-z ]{0,6}") {
            let haystack = format!("{}{}", prefix, word.to_lowercase());
            prop_assert!(contains_ignore_case(&haystack, &word.to_uppercase()));
        }
    }
}
