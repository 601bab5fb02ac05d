//! # Repository Module
//!
//! Database repository implementations for Larder.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  CLI command                                                           │
//! │       │                                                                 │
//! │       │  db.ingredients().search(tenant, "tomate", 20)                 │
//! │       ▼                                                                 │
//! │  IngredientRepository                                                  │
//! │  ├── create / insert                                                   │
//! │  ├── get_by_id / list_active / search                                  │
//! │  └── update_price / soft_delete                                        │
//! │       │                                                                 │
//! │       │  SQL Query, Row struct ──► domain type                          │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Decimal Columns
//! Prices, quantities and percentages are TEXT columns. Each repository
//! reads them into a `*Row` struct and converts with [`parse_decimal`], so a
//! hand-edited value that isn't a number surfaces as `DbError::Corrupt`
//! instead of a panic.
//!
//! ## Available Repositories
//!
//! - [`IngredientRepository`](ingredient::IngredientRepository) - Ingredient catalogue
//! - [`TechnicalSheetRepository`](sheet::TechnicalSheetRepository) - Recipes and their items
//! - [`SettingsRepository`](settings::SettingsRepository) - Per-tenant costing settings
//! - [`CashEntryRepository`](cash::CashEntryRepository) - Cash-flow ledger

pub mod cash;
pub mod ingredient;
pub mod settings;
pub mod sheet;

use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{DbError, DbResult};

/// Generates a new record ID (UUID v4).
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Parses a decimal TEXT column.
pub(crate) fn parse_decimal(column: &str, raw: &str) -> DbResult<Decimal> {
    Decimal::from_str(raw.trim()).map_err(|_| DbError::corrupt(column, raw))
}

/// Escapes `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern.
pub(crate) fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("unit_price", "12.50").unwrap(), dec!(12.50));
        assert_eq!(parse_decimal("unit_price", " 3 ").unwrap(), dec!(3));

        let err = parse_decimal("unit_price", "twelve").unwrap_err();
        assert!(matches!(err, DbError::Corrupt { ref column, .. } if column == "unit_price"));
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("tomate"), "%tomate%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
