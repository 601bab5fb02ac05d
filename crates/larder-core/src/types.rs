//! # Domain Types
//!
//! Core domain types used throughout Larder.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌──────────────────┐   ┌─────────────────┐      │
//! │  │   Ingredient    │   │  TechnicalSheet  │   │   CashEntry     │      │
//! │  │  ─────────────  │   │  ──────────────  │   │  ─────────────  │      │
//! │  │  id (UUID)      │◄──│  items[]         │   │  category       │      │
//! │  │  unit_price     │   │  yield_portions  │   │  amount (Money) │      │
//! │  │  correction_f.  │   │                  │   │  occurred_on    │      │
//! │  └─────────────────┘   └──────────────────┘   └─────────────────┘      │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌──────────────────┐                            │
//! │  │ CostingSettings │   │  CashCategory    │                            │
//! │  │  tenant_id      │   │  sales, rent,    │                            │
//! │  │  CostingConfig  │   │  ingredients ... │                            │
//! │  └─────────────────┘   └──────────────────┘                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::costing::{CostingConfig, CostingResult, IngredientCost, IngredientLine};
use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Unit of Measure
// =============================================================================

/// Purchase / recipe unit for an ingredient. Prices are per unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Kg,
    G,
    L,
    Ml,
    /// Countable items (eggs, buns).
    Unit,
}

impl Unit {
    pub const ALL: [Unit; 5] = [Unit::Kg, Unit::G, Unit::L, Unit::Ml, Unit::Unit];

    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Kg => "kg",
            Unit::G => "g",
            Unit::L => "l",
            Unit::Ml => "ml",
            Unit::Unit => "unit",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        Unit::ALL
            .into_iter()
            .find(|unit| unit.as_str() == s)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "unit".to_string(),
                allowed: Unit::ALL.iter().map(|u| u.as_str().to_string()).collect(),
            })
    }
}

// =============================================================================
// Ingredient
// =============================================================================

/// A catalogue ingredient with its current purchase price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Tenant this ingredient belongs to.
    pub tenant_id: String,

    /// Display name ("Tomate italiano").
    pub name: String,

    pub unit: Unit,

    /// Price per `unit`.
    #[ts(as = "String")]
    pub unit_price: Decimal,

    /// Gross ÷ net weight. 1 means no loss.
    #[ts(as = "String")]
    pub correction_factor: Decimal,

    /// Whether the ingredient is active (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Ingredient {
    /// Costs `net_quantity` of this ingredient, including yield loss.
    pub fn cost_for(&self, net_quantity: Decimal) -> IngredientCost {
        IngredientLine {
            net_quantity,
            unit_price: self.unit_price,
            correction_factor: self.correction_factor,
        }
        .to_cost()
    }
}

// =============================================================================
// Technical Sheet
// =============================================================================

/// A recipe: what goes into a dish and how many portions it yields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalSheet {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub yield_portions: i64,
    pub notes: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// One ingredient quantity on a technical sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalSheetItem {
    pub id: String,
    pub sheet_id: String,
    pub ingredient_id: String,
    /// Net (clean, usable) quantity in the ingredient's unit.
    #[ts(as = "String")]
    pub net_quantity: Decimal,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A sheet item joined with its ingredient's current price.
///
/// Unlike a sale snapshot, prices are live: re-costing a sheet after a
/// supplier price change reflects the new price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SheetLine {
    pub item_id: String,
    pub ingredient_id: String,
    pub ingredient_name: String,
    pub unit: Unit,
    #[ts(as = "String")]
    pub unit_price: Decimal,
    #[ts(as = "String")]
    pub correction_factor: Decimal,
    #[ts(as = "String")]
    pub net_quantity: Decimal,
}

impl SheetLine {
    pub fn cost(&self) -> IngredientCost {
        IngredientLine {
            net_quantity: self.net_quantity,
            unit_price: self.unit_price,
            correction_factor: self.correction_factor,
        }
        .to_cost()
    }
}

/// A technical sheet with its lines and the costing computed from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SheetCosting {
    pub sheet: TechnicalSheet,
    pub lines: Vec<SheetLine>,
    pub result: CostingResult,
}

// =============================================================================
// Costing Settings
// =============================================================================

/// The persisted, per-tenant costing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CostingSettings {
    pub tenant_id: String,
    pub config: CostingConfig,
    /// `None` until the tenant saves settings for the first time.
    #[ts(as = "Option<String>")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CostingSettings {
    /// Settings for a tenant that never configured anything.
    pub fn defaults_for(tenant_id: impl Into<String>) -> Self {
        CostingSettings {
            tenant_id: tenant_id.into(),
            config: CostingConfig::default(),
            updated_at: None,
        }
    }

    #[inline]
    pub fn config(&self) -> &CostingConfig {
        &self.config
    }
}

// =============================================================================
// Cash Flow
// =============================================================================

/// Whether an entry brings money in or takes it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CashDirection {
    Inflow,
    Outflow,
}

/// Where a category lands on the income statement (DRE).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DreLine {
    Revenue,
    /// Taxes charged on sales, deducted from gross revenue.
    Deduction,
    /// Cost of goods sold (CMV).
    CostOfGoods,
    OperatingExpense,
}

/// Category of a cash-flow entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CashCategory {
    Sales,
    SalesTax,
    Ingredients,
    Payroll,
    Rent,
    Utilities,
    Marketing,
    OtherExpense,
    OtherIncome,
}

impl CashCategory {
    pub const ALL: [CashCategory; 9] = [
        CashCategory::Sales,
        CashCategory::SalesTax,
        CashCategory::Ingredients,
        CashCategory::Payroll,
        CashCategory::Rent,
        CashCategory::Utilities,
        CashCategory::Marketing,
        CashCategory::OtherExpense,
        CashCategory::OtherIncome,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CashCategory::Sales => "sales",
            CashCategory::SalesTax => "sales_tax",
            CashCategory::Ingredients => "ingredients",
            CashCategory::Payroll => "payroll",
            CashCategory::Rent => "rent",
            CashCategory::Utilities => "utilities",
            CashCategory::Marketing => "marketing",
            CashCategory::OtherExpense => "other_expense",
            CashCategory::OtherIncome => "other_income",
        }
    }

    pub fn direction(&self) -> CashDirection {
        match self {
            CashCategory::Sales | CashCategory::OtherIncome => CashDirection::Inflow,
            _ => CashDirection::Outflow,
        }
    }

    pub fn dre_line(&self) -> DreLine {
        match self {
            CashCategory::Sales | CashCategory::OtherIncome => DreLine::Revenue,
            CashCategory::SalesTax => DreLine::Deduction,
            CashCategory::Ingredients => DreLine::CostOfGoods,
            CashCategory::Payroll
            | CashCategory::Rent
            | CashCategory::Utilities
            | CashCategory::Marketing
            | CashCategory::OtherExpense => DreLine::OperatingExpense,
        }
    }
}

impl fmt::Display for CashCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CashCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase().replace('-', "_");
        CashCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "category".to_string(),
                allowed: CashCategory::ALL
                    .iter()
                    .map(|c| c.as_str().to_string())
                    .collect(),
            })
    }
}

/// A cash-flow ledger line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CashEntry {
    pub id: String,
    pub tenant_id: String,
    pub category: CashCategory,
    pub description: String,
    /// Always positive; the sign comes from `category.direction()`.
    pub amount: Money,
    #[ts(as = "String")]
    pub occurred_on: NaiveDate,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl CashEntry {
    /// Amount with the direction applied (outflows negative).
    pub fn signed_amount(&self) -> Money {
        match self.category.direction() {
            CashDirection::Inflow => self.amount,
            CashDirection::Outflow => -self.amount,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_ingredient() -> Ingredient {
        let now = Utc::now();
        Ingredient {
            id: "ing-1".to_string(),
            tenant_id: crate::DEFAULT_TENANT_ID.to_string(),
            name: "Batata".to_string(),
            unit: Unit::Kg,
            unit_price: dec!(6.00),
            correction_factor: dec!(1.20),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_ingredient_cost_for_applies_yield_loss() {
        let cost = sample_ingredient().cost_for(dec!(0.5));
        assert_eq!(cost.net_quantity, dec!(0.5));
        assert_eq!(cost.unit_price, dec!(6.00));
        assert_eq!(cost.total_cost, dec!(3.6));
    }

    #[test]
    fn test_unit_parsing() {
        assert_eq!("kg".parse::<Unit>().unwrap(), Unit::Kg);
        assert_eq!(" ML ".parse::<Unit>().unwrap(), Unit::Ml);
        assert!("cup".parse::<Unit>().is_err());
    }

    #[test]
    fn test_category_parsing_and_direction() {
        assert_eq!(
            "sales-tax".parse::<CashCategory>().unwrap(),
            CashCategory::SalesTax
        );
        assert_eq!(CashCategory::Sales.direction(), CashDirection::Inflow);
        assert_eq!(CashCategory::Rent.direction(), CashDirection::Outflow);
        assert_eq!(CashCategory::Ingredients.dre_line(), DreLine::CostOfGoods);
        assert!("lottery".parse::<CashCategory>().is_err());
    }

    #[test]
    fn test_signed_amount() {
        let entry = CashEntry {
            id: "c-1".to_string(),
            tenant_id: crate::DEFAULT_TENANT_ID.to_string(),
            category: CashCategory::Utilities,
            description: "Energia".to_string(),
            amount: Money::from_cents(45_000),
            occurred_on: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            created_at: Utc::now(),
        };
        assert_eq!(entry.signed_amount().cents(), -45_000);
    }

    #[test]
    fn test_default_settings() {
        let settings = CostingSettings::defaults_for("t-1");
        assert_eq!(settings.config().standard_markup_percent, dec!(300));
        assert!(settings.updated_at.is_none());
    }
}
