//! # Validation Module
//!
//! Input validation utilities for Larder.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Dashboard / CLI                                              │
//! │  └── Type validation (clap / serde parsing)                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Names, quantities, percentages                                    │
//! │  └── Whole costing configurations (tax < 100%)                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use larder_core::validation::{validate_name, validate_tax_percent};
//! use rust_decimal::Decimal;
//!
//! assert_eq!(validate_name("name", "  Feijoada ").unwrap(), "Feijoada");
//! assert!(validate_tax_percent(Decimal::from(100)).is_err());
//! ```

use rust_decimal::Decimal;

use crate::costing::CostingConfig;
use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_NAME_LENGTH, MAX_YIELD_PORTIONS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a display name (ingredient, technical sheet, cash entry).
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most `MAX_NAME_LENGTH` characters
///
/// ## Returns
/// The trimmed name.
pub fn validate_name(field: &str, name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LENGTH,
        });
    }

    Ok(name.to_string())
}

/// Validates a UUID string format.
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Rejects negative decimals. Zero is allowed.
pub fn validate_non_negative(field: &str, value: Decimal) -> ValidationResult<()> {
    if value < Decimal::ZERO {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Rejects zero and negative decimals.
pub fn validate_positive(field: &str, value: Decimal) -> ValidationResult<()> {
    if value <= Decimal::ZERO {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a tax rate in percent.
///
/// ## Rules
/// - Must be in `[0, 100)`
/// - 100% or more would make `price / (1 − tax)` divide by zero or go
///   negative
pub fn validate_tax_percent(value: Decimal) -> ValidationResult<()> {
    validate_non_negative("tax_percent", value)?;

    if value >= Decimal::ONE_HUNDRED {
        return Err(ValidationError::MustBeBelow {
            field: "tax_percent".to_string(),
            limit: "100".to_string(),
        });
    }

    Ok(())
}

/// Validates a yield-loss correction factor (gross ÷ net weight).
///
/// A factor below 1 would mean the ingredient gains weight when trimmed.
pub fn validate_correction_factor(value: Decimal) -> ValidationResult<()> {
    if value < Decimal::ONE {
        return Err(ValidationError::TooSmall {
            field: "correction_factor".to_string(),
            min: "1".to_string(),
        });
    }

    Ok(())
}

/// Validates the yield of a stored technical sheet.
///
/// The costing engine tolerates zero (it floors at one portion), but a
/// saved recipe must state how many portions it serves.
pub fn validate_yield_portions(portions: i64) -> ValidationResult<()> {
    if !(1..=MAX_YIELD_PORTIONS).contains(&portions) {
        return Err(ValidationError::OutOfRange {
            field: "yield_portions".to_string(),
            min: 1,
            max: MAX_YIELD_PORTIONS,
        });
    }

    Ok(())
}

/// Validates a cash-entry amount. Direction comes from the category, so the
/// amount itself is always positive.
pub fn validate_entry_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Configuration Validators
// =============================================================================

/// Validates a costing configuration before it is priced or stored.
///
/// ## Rules
/// - markup, safety margin and variable expense percentages: `>= 0`
/// - monthly fixed expense: `>= 0`
/// - tax: `[0, 100)`
/// - `monthly_dishes_sold` is not checked (the engine floors it at 1)
pub fn validate_costing_config(config: &CostingConfig) -> ValidationResult<()> {
    validate_non_negative("standard_markup_percent", config.standard_markup_percent)?;
    validate_non_negative("monthly_fixed_expense", config.monthly_fixed_expense)?;
    validate_non_negative("safety_margin_percent", config.safety_margin_percent)?;
    validate_non_negative("variable_expense_percent", config.variable_expense_percent)?;
    validate_tax_percent(config.tax_percent)?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
