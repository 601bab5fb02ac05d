//! # Error Types
//!
//! Domain-specific error types for larder-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  larder-core errors (this file)                                        │
//! │  ├── CoreError        - Domain errors (plans, limits, lookups)         │
//! │  └── ValidationError  - Input / configuration validation failures     │
//! │                                                                         │
//! │  larder-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → CLI (anyhow + exit code)│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (field, plan, limit)
//! 3. Errors are enum variants, never String
//! 4. Decimal bounds are carried as text so messages print them verbatim

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Ingredient cannot be found.
    #[error("Ingredient not found: {0}")]
    IngredientNotFound(String),

    /// Technical sheet (recipe) cannot be found.
    #[error("Technical sheet not found: {0}")]
    TechnicalSheetNotFound(String),

    /// The tenant's subscription plan does not include the feature.
    ///
    /// ## User Workflow
    /// ```text
    /// Free plan opens "DRE report"
    ///      │
    ///      ▼
    /// ensure_feature(Free, FinancialReports)
    ///      │
    ///      ▼
    /// FeatureNotInPlan { plan: "free", feature: "financial_reports" }
    ///      │
    ///      ▼
    /// UI shows upgrade prompt
    /// ```
    #[error("{feature} is not available on the {plan} plan")]
    FeatureNotInPlan { plan: String, feature: String },

    /// A countable plan quota (technical sheets) is exhausted.
    #[error("The {plan} plan allows at most {max} technical sheets")]
    PlanLimitReached { plan: String, max: usize },

    /// Too many attempts for one action+identifier inside the window.
    #[error("Too many {action} attempts, retry in {retry_after_secs}s")]
    RateLimited {
        action: String,
        retry_after_secs: i64,
    },

    /// A decimal amount cannot be represented as integer cents.
    #[error("Amount {amount} cannot be represented as money")]
    MoneyOverflow { amount: String },

    /// A costing step does not fit in a decimal (inputs far out of scale).
    #[error("Costing overflowed at {step}, check the cost settings")]
    CostingOverflow { step: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Also used to reject costing configurations the engine cannot price
/// (negative percentages, tax at or above 100%).
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Integer value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Value must be strictly below a limit (e.g. tax < 100%).
    #[error("{field} must be below {limit}")]
    MustBeBelow { field: String, limit: String },

    /// Value must be at least a minimum (e.g. correction factor >= 1).
    #[error("{field} must be at least {min}")]
    TooSmall { field: String, min: String },

    /// Invalid format (e.g., invalid UUID, invalid date range).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::PlanLimitReached {
            plan: "free".to_string(),
            max: 5,
        };
        assert_eq!(
            err.to_string(),
            "The free plan allows at most 5 technical sheets"
        );

        let err = CoreError::RateLimited {
            action: "login".to_string(),
            retry_after_secs: 42,
        };
        assert_eq!(err.to_string(), "Too many login attempts, retry in 42s");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::MustBeBelow {
            field: "tax_percent".to_string(),
            limit: "100".to_string(),
        };
        assert_eq!(err.to_string(), "tax_percent must be below 100");

        let err = ValidationError::Negative {
            field: "safety_margin_percent".to_string(),
        };
        assert_eq!(err.to_string(), "safety_margin_percent must not be negative");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
