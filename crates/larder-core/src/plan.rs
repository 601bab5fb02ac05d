//! # Subscription Plans
//!
//! Which features and quotas each subscription plan unlocks.
//!
//! ```text
//! ┌──────────────────────┬────────┬────────┬────────┐
//! │ Feature              │ Free   │ Basic  │ Pro    │
//! ├──────────────────────┼────────┼────────┼────────┤
//! │ Costing              │   ✓    │   ✓    │   ✓    │
//! │ Technical sheets     │ 5      │ 50     │ ∞      │
//! │ Cash flow            │        │   ✓    │   ✓    │
//! │ Financial reports    │        │   ✓    │   ✓    │
//! │ AI content           │        │        │   ✓    │
//! │ Analytics            │        │        │   ✓    │
//! └──────────────────────┴────────┴────────┴────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    #[default]
    Free,
    Basic,
    Pro,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Costing,
    TechnicalSheets,
    CashFlow,
    FinancialReports,
    AiContent,
    Analytics,
}

impl Feature {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::Costing => "costing",
            Feature::TechnicalSheets => "technical_sheets",
            Feature::CashFlow => "cash_flow",
            Feature::FinancialReports => "financial_reports",
            Feature::AiContent => "ai_content",
            Feature::Analytics => "analytics",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const FREE_FEATURES: &[Feature] = &[Feature::Costing, Feature::TechnicalSheets];

const BASIC_FEATURES: &[Feature] = &[
    Feature::Costing,
    Feature::TechnicalSheets,
    Feature::CashFlow,
    Feature::FinancialReports,
];

const PRO_FEATURES: &[Feature] = &[
    Feature::Costing,
    Feature::TechnicalSheets,
    Feature::CashFlow,
    Feature::FinancialReports,
    Feature::AiContent,
    Feature::Analytics,
];

impl Plan {
    pub const ALL: [Plan; 3] = [Plan::Free, Plan::Basic, Plan::Pro];

    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Basic => "basic",
            Plan::Pro => "pro",
        }
    }

    pub fn features(&self) -> &'static [Feature] {
        match self {
            Plan::Free => FREE_FEATURES,
            Plan::Basic => BASIC_FEATURES,
            Plan::Pro => PRO_FEATURES,
        }
    }

    #[inline]
    pub fn allows(&self, feature: Feature) -> bool {
        self.features().contains(&feature)
    }

    /// Active technical sheets the plan may hold. `None` means unlimited.
    pub fn max_technical_sheets(&self) -> Option<usize> {
        match self {
            Plan::Free => Some(5),
            Plan::Basic => Some(50),
            Plan::Pro => None,
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plan {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        Plan::ALL
            .into_iter()
            .find(|plan| plan.as_str() == s)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "plan".to_string(),
                allowed: Plan::ALL.iter().map(|p| p.as_str().to_string()).collect(),
            })
    }
}

/// Fails with [`CoreError::FeatureNotInPlan`] unless `plan` includes
/// `feature`.
pub fn ensure_feature(plan: Plan, feature: Feature) -> CoreResult<()> {
    if plan.allows(feature) {
        Ok(())
    } else {
        Err(CoreError::FeatureNotInPlan {
            plan: plan.to_string(),
            feature: feature.to_string(),
        })
    }
}

/// Checks there is room for one more technical sheet given `current`
/// active sheets.
pub fn ensure_sheet_capacity(plan: Plan, current: usize) -> CoreResult<()> {
    ensure_feature(plan, Feature::TechnicalSheets)?;

    match plan.max_technical_sheets() {
        Some(max) if current >= max => Err(CoreError::PlanLimitReached {
            plan: plan.to_string(),
            max,
        }),
        _ => Ok(()),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
