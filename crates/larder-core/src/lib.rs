//! # larder-core: Pure Business Logic for Larder
//!
//! Dish costing, financial reports and plan rules for restaurant back
//! offices. Everything here is a pure function over in-memory values.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Larder Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    larder (CLI)                                 │   │
//! │  │    ingredient ──► sheet ──► cost ──► cash ──► dre              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ larder-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  costing  │  │  finance  │  │   plan    │  │ validation│  │   │
//! │  │   │  engine   │  │ DRE / CMV │  │  gating   │  │   rules   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    larder-db (Database Layer)                   │   │
//! │  │         SQLite repositories for ingredients, sheets, cash       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`costing`] - Dish costing engine (suggested price, viability, break-even)
//! - [`finance`] - CMV, income statement (DRE), cash-flow summaries
//! - [`plan`] - Subscription plans and feature gating
//! - [`rate_limit`] - Sliding-window limiter over an injected store
//! - [`types`] - Domain records (Ingredient, TechnicalSheet, CashEntry, ...)
//! - [`money`] - Ledger amounts in integer cents
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Numbers
//!
//! Costing works in [`rust_decimal::Decimal`] so per-portion figures such as
//! `0.275` stay exact. Ledger amounts are [`Money`] (integer cents).
//!
//! ## Example Usage
//!
//! ```rust
//! use larder_core::{compute_costing, BreakEven, CostingConfig, IngredientCost, Viability};
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
//! assert_eq!(result.break_even, BreakEven::Portions(1));
//! ```

use rust_decimal::Decimal;

// =============================================================================
// Module Declarations
// =============================================================================

pub mod costing;
pub mod error;
pub mod finance;
pub mod money;
pub mod plan;
pub mod rate_limit;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use costing::{
    compute_costing, BreakEven, CostingConfig, CostingResult, IngredientCost, IngredientLine,
    Viability,
};
pub use error::{CoreError, CoreResult, ValidationError};
pub use finance::{CashFlowSummary, IncomeStatement};
pub use money::Money;
pub use plan::{Feature, Plan};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default tenant ID (single-tenant runtime with multi-tenant schema).
pub const DEFAULT_TENANT_ID: &str = "00000000-0000-0000-0000-000000000001";

/// Net margin (percent) below which a profitable dish is `low_margin`.
/// Exclusive: exactly 20% is healthy.
pub const LOW_MARGIN_THRESHOLD_PERCENT: Decimal = Decimal::from_parts(20, 0, 0, false, 0);

/// Maximum length of ingredient, sheet and entry names.
pub const MAX_NAME_LENGTH: usize = 120;

/// Maximum portions a stored technical sheet may yield.
pub const MAX_YIELD_PORTIONS: i64 = 10_000;
