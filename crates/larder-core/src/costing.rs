//! # Dish Costing Engine
//!
//! Turns a technical sheet's ingredient costs, its yield and the restaurant's
//! cost parameters into a suggested menu price and a viability verdict.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Σ ingredient total_cost                                               │
//! │       │  × (1 + safety margin)                                         │
//! │       ▼                                                                 │
//! │  margin-adjusted cost ── ÷ max(yield, 1) ──► per-portion cost          │
//! │                                                   │                     │
//! │  monthly fixed ÷ max(dishes sold, 1) ─────────────┤ + fixed per dish    │
//! │  per-portion × variable % ────────────────────────┤ + variable expense  │
//! │                                                   ▼                     │
//! │                                              final cost                 │
//! │                                                   │ × markup            │
//! │                                                   ▼                     │
//! │                                              base price                 │
//! │                                                   │ ÷ (1 − tax)         │
//! │                                                   ▼                     │
//! │                                           suggested price               │
//! │                                                   │                     │
//! │               profits, margins, viability, break-even portions         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```rust
//! use larder_core::costing::{compute_costing, CostingConfig, IngredientCost, Viability};
//! use rust_decimal::Decimal;
//!
//! let ingredients = vec![IngredientCost::from_total(Decimal::from(10))];
//! let config = CostingConfig {
//!     standard_markup_percent: Decimal::from(300),
//!     monthly_fixed_expense: Decimal::from(3000),
//!     monthly_dishes_sold: 1000,
//!     safety_margin_percent: Decimal::from(10),
//!     tax_percent: Decimal::from(10),
//!     variable_expense_percent: Decimal::from(5),
//! };
//!
//! let result = compute_costing(&ingredients, 2, &config).unwrap();
//! assert_eq!(result.suggested_price, Decimal::new(2925, 2));
//! assert_eq!(result.viability, Viability::Healthy);
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::finance::cmv_percent;
use crate::money::Money;
use crate::validation::validate_costing_config;
use crate::LOW_MARGIN_THRESHOLD_PERCENT;

// =============================================================================
// Inputs
// =============================================================================

/// Cost of one ingredient line of a technical sheet.
///
/// `total_cost` is trusted as given: the engine sums it and never recomputes
/// it from `net_quantity × unit_price`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct IngredientCost {
    #[ts(as = "String")]
    pub net_quantity: Decimal,
    #[ts(as = "String")]
    pub unit_price: Decimal,
    #[ts(as = "String")]
    pub total_cost: Decimal,
}

impl IngredientCost {
    /// A line known only by its total (quantity and price unknown).
    pub fn from_total(total_cost: Decimal) -> Self {
        IngredientCost {
            net_quantity: Decimal::ZERO,
            unit_price: Decimal::ZERO,
            total_cost,
        }
    }
}

/// An ingredient line before yield-loss correction.
///
/// ## Correction Factor
/// Peeling, trimming and cooking lose weight. A factor of 1.25 means 1.25 kg
/// must be bought to serve 1 kg, so the line costs
/// `net_quantity × correction_factor × unit_price`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IngredientLine {
    pub net_quantity: Decimal,
    pub unit_price: Decimal,
    pub correction_factor: Decimal,
}

impl IngredientLine {
    /// Gross quantity that has to be purchased.
    #[inline]
    pub fn gross_quantity(&self) -> Decimal {
        self.net_quantity * self.correction_factor
    }

    /// Converts to the engine input, applying the correction factor.
    pub fn to_cost(&self) -> IngredientCost {
        IngredientCost {
            net_quantity: self.net_quantity,
            unit_price: self.unit_price,
            total_cost: self.gross_quantity() * self.unit_price,
        }
    }
}

/// Restaurant-level cost parameters.
///
/// Percentages are expressed as percent (10 = 10%). Monetary values are in
/// major currency units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CostingConfig {
    /// Price multiplier over final cost (300 = price is 3× cost).
    #[ts(as = "String")]
    pub standard_markup_percent: Decimal,
    /// Fixed expenses of one month (rent, salaries, ...).
    #[ts(as = "String")]
    pub monthly_fixed_expense: Decimal,
    /// Dishes sold per month, used to allocate the fixed expense.
    pub monthly_dishes_sold: i64,
    /// Cushion added on top of ingredient cost.
    #[ts(as = "String")]
    pub safety_margin_percent: Decimal,
    /// Tax charged on the selling price. Must stay below 100.
    #[ts(as = "String")]
    pub tax_percent: Decimal,
    /// Card fees, packaging and other per-sale expenses.
    #[ts(as = "String")]
    pub variable_expense_percent: Decimal,
}

impl Default for CostingConfig {
    /// A new restaurant prices at 3× cost with nothing else configured.
    fn default() -> Self {
        CostingConfig {
            standard_markup_percent: Decimal::from(300),
            monthly_fixed_expense: Decimal::ZERO,
            monthly_dishes_sold: 0,
            safety_margin_percent: Decimal::ZERO,
            tax_percent: Decimal::ZERO,
            variable_expense_percent: Decimal::ZERO,
        }
    }
}

// =============================================================================
// Outputs
// =============================================================================

/// Profitability verdict for a dish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Viability {
    /// Net profit is negative.
    Loss,
    /// Profitable, but net margin under 20%.
    LowMargin,
    /// Net margin of 20% or more.
    Healthy,
}

impl Viability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Viability::Loss => "loss",
            Viability::LowMargin => "low_margin",
            Viability::Healthy => "healthy",
        }
    }
}

/// Portions that must be sold for net profit to cover the allocated fixed
/// cost. Saturates at `Portions(u64::MAX)` when net profit is positive but
/// vanishingly small.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", content = "portions", rename_all = "snake_case")]
pub enum BreakEven {
    Portions(u64),
    /// No positive net profit per dish: no quantity ever breaks even.
    Unbounded,
}

impl BreakEven {
    #[inline]
    pub fn is_unbounded(&self) -> bool {
        matches!(self, BreakEven::Unbounded)
    }
}

/// Snapshot of one costing run. Recomputed on every input change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CostingResult {
    #[ts(as = "String")]
    pub ingredient_cost: Decimal,
    #[ts(as = "String")]
    pub margin_adjusted_cost: Decimal,
    #[ts(as = "String")]
    pub per_portion_cost: Decimal,
    #[ts(as = "String")]
    pub fixed_cost_per_dish: Decimal,
    #[ts(as = "String")]
    pub variable_expense: Decimal,
    #[ts(as = "String")]
    pub final_cost: Decimal,
    #[ts(as = "String")]
    pub base_price: Decimal,
    #[ts(as = "String")]
    pub suggested_price: Decimal,
    #[ts(as = "String")]
    pub gross_profit: Decimal,
    #[ts(as = "String")]
    pub net_profit: Decimal,
    #[ts(as = "String")]
    pub gross_margin_percent: Decimal,
    #[ts(as = "String")]
    pub net_margin_percent: Decimal,
    pub viability: Viability,
    pub break_even: BreakEven,
}

impl CostingResult {
    /// Suggested price rounded to the cent, for menus and the ledger.
    pub fn suggested_price_money(&self) -> CoreResult<Money> {
        Money::from_decimal(self.suggested_price)
    }

    /// Food-cost (CMV) share of the suggested price.
    pub fn cmv_percent(&self) -> Option<Decimal> {
        cmv_percent(self.per_portion_cost, self.suggested_price)
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Computes price and profitability for one dish.
///
/// ## Guards
/// - `yield_portions` and `monthly_dishes_sold` are floored at 1 before
///   dividing, so 0 and 1 give the same result.
/// - The configuration is validated first: a tax of 100% or more (which
///   would divide by zero or flip the price sign) and negative percentages
///   are reported as [`crate::ValidationError`], never priced.
/// - Every step uses checked arithmetic. Inputs large enough to overflow a
///   `Decimal` give [`CoreError::CostingOverflow`] naming the step.
///
/// Ingredient lines are summed as given.
pub fn compute_costing(
    ingredients: &[IngredientCost],
    yield_portions: i64,
    config: &CostingConfig,
) -> CoreResult<CostingResult> {
    validate_costing_config(config)?;

    let ingredient_cost = ingredients
        .iter()
        .try_fold(Decimal::ZERO, |sum, i| sum.checked_add(i.total_cost))
        .ok_or_else(|| overflow("ingredient_cost"))?;
    let margin_adjusted_cost = ingredient_cost
        .checked_mul(Decimal::ONE + fraction(config.safety_margin_percent))
        .ok_or_else(|| overflow("margin_adjusted_cost"))?;
    let per_portion_cost = margin_adjusted_cost / Decimal::from(yield_portions.max(1));

    let fixed_cost_per_dish =
        config.monthly_fixed_expense / Decimal::from(config.monthly_dishes_sold.max(1));
    let variable_expense = per_portion_cost
        .checked_mul(fraction(config.variable_expense_percent))
        .ok_or_else(|| overflow("variable_expense"))?;
    let final_cost = per_portion_cost
        .checked_add(fixed_cost_per_dish)
        .and_then(|sum| sum.checked_add(variable_expense))
        .ok_or_else(|| overflow("final_cost"))?;

    let base_price = final_cost
        .checked_mul(fraction(config.standard_markup_percent))
        .ok_or_else(|| overflow("base_price"))?;
    // tax_percent < 100 was validated, the divisor is positive
    let suggested_price = base_price
        .checked_div(Decimal::ONE - fraction(config.tax_percent))
        .ok_or_else(|| overflow("suggested_price"))?;

    let gross_profit = suggested_price
        .checked_sub(per_portion_cost)
        .ok_or_else(|| overflow("gross_profit"))?;
    let net_profit = suggested_price
        .checked_sub(final_cost)
        .ok_or_else(|| overflow("net_profit"))?;
    let gross_margin_percent = margin_percent(gross_profit, suggested_price)
        .ok_or_else(|| overflow("gross_margin_percent"))?;
    let net_margin_percent = margin_percent(net_profit, suggested_price)
        .ok_or_else(|| overflow("net_margin_percent"))?;

    let viability = if net_profit < Decimal::ZERO {
        Viability::Loss
    } else if net_margin_percent < LOW_MARGIN_THRESHOLD_PERCENT {
        Viability::LowMargin
    } else {
        Viability::Healthy
    };

    Ok(CostingResult {
        ingredient_cost,
        margin_adjusted_cost,
        per_portion_cost,
        fixed_cost_per_dish,
        variable_expense,
        final_cost,
        base_price,
        suggested_price,
        gross_profit,
        net_profit,
        gross_margin_percent,
        net_margin_percent,
        viability,
        break_even: break_even(fixed_cost_per_dish, net_profit),
    })
}

/// Portions needed for `net_profit` per dish to cover `fixed_cost_per_dish`.
///
/// Any positive net profit breaks even eventually. A count too large for
/// `u64` saturates at `u64::MAX` instead of reading as [`BreakEven::Unbounded`].
fn break_even(fixed_cost_per_dish: Decimal, net_profit: Decimal) -> BreakEven {
    if net_profit <= Decimal::ZERO {
        return BreakEven::Unbounded;
    }

    let portions = fixed_cost_per_dish
        .checked_div(net_profit)
        .and_then(|ratio| ratio.ceil().to_u64())
        .unwrap_or(u64::MAX);
    BreakEven::Portions(portions)
}

#[inline]
fn fraction(percent: Decimal) -> Decimal {
    percent / Decimal::ONE_HUNDRED
}

fn margin_percent(profit: Decimal, price: Decimal) -> Option<Decimal> {
    if price > Decimal::ZERO {
        profit.checked_div(price)?.checked_mul(Decimal::ONE_HUNDRED)
    } else {
        Some(Decimal::ZERO)
    }
}

fn overflow(step: &str) -> CoreError {
    CoreError::CostingOverflow {
        step: step.to_string(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use rust_decimal_macros::dec;

    fn scenario_a_config() -> CostingConfig {
        CostingConfig {
            standard_markup_percent: dec!(300),
            monthly_fixed_expense: dec!(3000),
            monthly_dishes_sold: 1000,
            safety_margin_percent: dec!(10),
            tax_percent: dec!(10),
            variable_expense_percent: dec!(5),
        }
    }

    fn plain_config() -> CostingConfig {
        CostingConfig {
            standard_markup_percent: dec!(100),
            monthly_fixed_expense: dec!(0),
            monthly_dishes_sold: 1,
            safety_margin_percent: dec!(0),
            tax_percent: dec!(0),
            variable_expense_percent: dec!(0),
        }
    }

    #[test]
    fn test_scenario_healthy_dish() {
        let ingredients = vec![
            IngredientCost::from_total(dec!(6.40)),
            IngredientCost::from_total(dec!(3.60)),
        ];
        let result = compute_costing(&ingredients, 2, &scenario_a_config()).unwrap();

        assert_eq!(result.ingredient_cost, dec!(10.00));
        assert_eq!(result.margin_adjusted_cost, dec!(11.00));
        assert_eq!(result.per_portion_cost, dec!(5.50));
        assert_eq!(result.fixed_cost_per_dish, dec!(3.00));
        assert_eq!(result.variable_expense, dec!(0.275));
        assert_eq!(result.final_cost, dec!(8.775));
        assert_eq!(result.base_price, dec!(26.325));
        assert_eq!(result.suggested_price, dec!(29.25));
        assert_eq!(result.gross_profit, dec!(23.75));
        assert_eq!(result.net_profit, dec!(20.475));
        assert_eq!(result.net_margin_percent, dec!(70));
        assert_eq!(result.viability, Viability::Healthy);
        assert_eq!(result.break_even, BreakEven::Portions(1));
        assert_eq!(result.suggested_price_money().unwrap().cents(), 2925);
    }

    #[test]
    fn test_scenario_loss_dish() {
        let config = CostingConfig {
            standard_markup_percent: dec!(50),
            monthly_fixed_expense: dec!(20000),
            monthly_dishes_sold: 1000,
            ..plain_config()
        };
        let ingredients = vec![IngredientCost::from_total(dec!(50))];
        let result = compute_costing(&ingredients, 1, &config).unwrap();

        assert_eq!(result.fixed_cost_per_dish, dec!(20));
        assert_eq!(result.final_cost, dec!(70));
        assert_eq!(result.base_price, dec!(35));
        assert_eq!(result.suggested_price, dec!(35));
        assert_eq!(result.net_profit, dec!(-35));
        assert_eq!(result.viability, Viability::Loss);
        assert!(result.break_even.is_unbounded());
    }

    #[test]
    fn test_empty_ingredients_cost_only_fixed_share() {
        let result = compute_costing(&[], 4, &scenario_a_config()).unwrap();

        assert_eq!(result.ingredient_cost, Decimal::ZERO);
        assert_eq!(result.variable_expense, Decimal::ZERO);
        assert_eq!(result.final_cost, result.fixed_cost_per_dish);
        assert_eq!(result.viability, Viability::Healthy);
    }

    #[test]
    fn test_empty_ingredients_at_cost_price_is_not_a_loss() {
        // price == final cost: zero profit is low margin, not loss
        let config = CostingConfig {
            monthly_fixed_expense: dec!(500),
            monthly_dishes_sold: 100,
            ..plain_config()
        };
        let result = compute_costing(&[], 1, &config).unwrap();

        assert_eq!(result.final_cost, dec!(5));
        assert_eq!(result.suggested_price, dec!(5));
        assert_eq!(result.net_profit, Decimal::ZERO);
        assert_eq!(result.viability, Viability::LowMargin);
        assert!(result.break_even.is_unbounded());
    }

    #[test]
    fn test_everything_zero_prices_at_zero() {
        let result = compute_costing(&[], 0, &plain_config()).unwrap();

        assert_eq!(result.suggested_price, Decimal::ZERO);
        assert_eq!(result.gross_margin_percent, Decimal::ZERO);
        assert_eq!(result.net_margin_percent, Decimal::ZERO);
        assert_eq!(result.viability, Viability::LowMargin);
        assert!(result.break_even.is_unbounded());
    }

    #[test]
    fn test_markup_below_cost_is_a_loss() {
        let config = CostingConfig {
            standard_markup_percent: dec!(80),
            ..plain_config()
        };
        let result =
            compute_costing(&[IngredientCost::from_total(dec!(10))], 1, &config).unwrap();

        assert_eq!(result.suggested_price, dec!(8));
        assert_eq!(result.viability, Viability::Loss);
    }

    #[test]
    fn test_low_margin_threshold_is_exclusive() {
        // markup 125% with no tax: net margin = 25/125 = 20% exactly
        let config = CostingConfig {
            standard_markup_percent: dec!(125),
            ..plain_config()
        };
        let result =
            compute_costing(&[IngredientCost::from_total(dec!(100))], 1, &config).unwrap();
        assert_eq!(result.net_margin_percent, dec!(20));
        assert_eq!(result.viability, Viability::Healthy);

        let config = CostingConfig {
            standard_markup_percent: dec!(124),
            ..plain_config()
        };
        let result =
            compute_costing(&[IngredientCost::from_total(dec!(100))], 1, &config).unwrap();
        assert!(result.net_margin_percent < dec!(20));
        assert_eq!(result.viability, Viability::LowMargin);
    }

    #[test]
    fn test_zero_and_negative_yield_match_single_portion() {
        let ingredients = vec![IngredientCost::from_total(dec!(12.34))];
        let config = scenario_a_config();

        let one = compute_costing(&ingredients, 1, &config).unwrap();
        let zero = compute_costing(&ingredients, 0, &config).unwrap();
        let negative = compute_costing(&ingredients, -3, &config).unwrap();

        assert_eq!(zero.per_portion_cost, one.per_portion_cost);
        assert_eq!(negative.per_portion_cost, one.per_portion_cost);
        assert_eq!(zero, one);
    }

    #[test]
    fn test_zero_dishes_sold_matches_one() {
        let ingredients = vec![IngredientCost::from_total(dec!(10))];
        let mut config = scenario_a_config();

        config.monthly_dishes_sold = 0;
        let zero = compute_costing(&ingredients, 2, &config).unwrap();
        config.monthly_dishes_sold = 1;
        let one = compute_costing(&ingredients, 2, &config).unwrap();

        assert_eq!(zero.fixed_cost_per_dish, dec!(3000));
        assert_eq!(zero, one);
    }

    #[test]
    fn test_idempotent() {
        let ingredients = vec![
            IngredientCost::from_total(dec!(3.333)),
            IngredientCost::from_total(dec!(1.7)),
        ];
        let config = scenario_a_config();

        let first = compute_costing(&ingredients, 3, &config).unwrap();
        let second = compute_costing(&ingredients, 3, &config).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_monotonic_in_ingredient_cost() {
        let config = scenario_a_config();
        let mut ingredients = vec![
            IngredientCost::from_total(dec!(2)),
            IngredientCost::from_total(dec!(5)),
        ];
        let mut previous = compute_costing(&ingredients, 3, &config).unwrap();

        for step in 1..=25 {
            ingredients[1].total_cost += Decimal::new(step * 37, 2);
            let current = compute_costing(&ingredients, 3, &config).unwrap();

            assert!(current.final_cost >= previous.final_cost);
            assert!(current.suggested_price >= previous.suggested_price);
            previous = current;
        }
    }

    #[test]
    fn test_tax_at_or_above_hundred_is_rejected() {
        let ingredients = vec![IngredientCost::from_total(dec!(10))];

        for tax in [dec!(100), dec!(150)] {
            let config = CostingConfig {
                tax_percent: tax,
                ..scenario_a_config()
            };
            let err = compute_costing(&ingredients, 1, &config).unwrap_err();
            assert!(matches!(
                err,
                CoreError::Validation(ValidationError::MustBeBelow { ref field, .. })
                    if field == "tax_percent"
            ));
        }
    }

    #[test]
    fn test_out_of_scale_settings_overflow_instead_of_panicking() {
        // fixed share 1e27 per dish, markup 100x: the base price exceeds Decimal::MAX
        let config = CostingConfig {
            standard_markup_percent: dec!(10000),
            monthly_fixed_expense: Decimal::from_i128_with_scale(10_i128.pow(27), 0),
            monthly_dishes_sold: 1,
            ..plain_config()
        };
        let err = compute_costing(&[], 1, &config).unwrap_err();
        assert!(matches!(
            err,
            CoreError::CostingOverflow { ref step } if step == "base_price"
        ));

        let huge = vec![
            IngredientCost::from_total(Decimal::MAX),
            IngredientCost::from_total(Decimal::MAX),
        ];
        let err = compute_costing(&huge, 1, &plain_config()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::CostingOverflow { ref step } if step == "ingredient_cost"
        ));
    }

    #[test]
    fn test_break_even_saturates_for_tiny_profit() {
        assert_eq!(
            break_even(dec!(1000000), dec!(0.00000000000000001)),
            BreakEven::Portions(u64::MAX)
        );
        assert_eq!(break_even(dec!(3), dec!(20.475)), BreakEven::Portions(1));
        assert_eq!(break_even(dec!(0), dec!(5)), BreakEven::Portions(0));
        assert!(break_even(dec!(3), Decimal::ZERO).is_unbounded());
        assert!(break_even(dec!(3), dec!(-1)).is_unbounded());
    }

    #[test]
    fn test_negative_percentages_are_rejected() {
        let config = CostingConfig {
            safety_margin_percent: dec!(-5),
            ..scenario_a_config()
        };
        let err = compute_costing(&[], 1, &config).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::Negative { .. })
        ));
    }

    #[test]
    fn test_ingredient_line_applies_correction_factor() {
        let line = IngredientLine {
            net_quantity: dec!(0.200),
            unit_price: dec!(40.00),
            correction_factor: dec!(1.25),
        };

        assert_eq!(line.gross_quantity(), dec!(0.25));
        assert_eq!(line.to_cost().total_cost, dec!(10));
    }

    #[test]
    fn test_result_serializes_for_dashboard() {
        let result = compute_costing(&[], 1, &plain_config()).unwrap();
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["viability"], "low_margin");
        assert_eq!(json["breakEven"]["kind"], "unbounded");
        assert!(json["suggestedPrice"].is_string());
    }

    #[test]
    fn test_cmv_percent_of_result() {
        let result = compute_costing(
            &[IngredientCost::from_total(dec!(10))],
            1,
            &CostingConfig {
                standard_markup_percent: dec!(400),
                ..plain_config()
            },
        )
        .unwrap();

        assert_eq!(result.cmv_percent(), Some(dec!(25)));
    }
}
