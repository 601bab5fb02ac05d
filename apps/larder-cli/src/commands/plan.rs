//! Plan command - what the configured subscription plan unlocks.

use anyhow::Result;
use serde::Serialize;

use larder_core::{Feature, Plan};

use super::{print_json, Context};

const ALL_FEATURES: [Feature; 6] = [
    Feature::Costing,
    Feature::TechnicalSheets,
    Feature::CashFlow,
    Feature::FinancialReports,
    Feature::AiContent,
    Feature::Analytics,
];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanReport {
    plan: Plan,
    features: &'static [Feature],
    technical_sheets: i64,
    /// `None` means unlimited.
    max_technical_sheets: Option<usize>,
}

pub async fn execute(ctx: &Context) -> Result<()> {
    let plan = ctx.config.plan;
    let report = PlanReport {
        plan,
        features: plan.features(),
        technical_sheets: ctx.db.sheets().count_active(ctx.tenant()).await?,
        max_technical_sheets: plan.max_technical_sheets(),
    };

    if ctx.json {
        return print_json(&report);
    }

    println!("Plan: {}", report.plan);
    println!();
    for feature in ALL_FEATURES {
        let mark = if plan.allows(feature) { "✓" } else { " " };
        println!("  [{mark}] {feature}");
    }
    println!();
    match report.max_technical_sheets {
        Some(max) => println!("Technical sheets: {} of {}", report.technical_sheets, max),
        None => println!("Technical sheets: {} (unlimited)", report.technical_sheets),
    }

    Ok(())
}
