//! # Financial Reports
//!
//! CMV ratios, the income statement (DRE) and cash-flow summaries, all
//! computed from in-memory ledger entries.
//!
//! ## DRE Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Gross revenue            sales + other income                          │
//! │  (−) Deductions           sales tax                                     │
//! │  = Net revenue                                                          │
//! │  (−) CMV                  ingredients                                   │
//! │  = Gross profit                                                         │
//! │  (−) Operating expenses   payroll, rent, utilities, marketing, other   │
//! │  = Operating result                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{CashDirection, CashEntry, DreLine};

// =============================================================================
// CMV
// =============================================================================

/// Cost share of a price in percent (CMV). `None` when the price is not
/// positive.
///
/// ## Example
/// ```rust
/// use larder_core::finance::cmv_percent;
/// use rust_decimal::Decimal;
///
/// let cmv = cmv_percent(Decimal::from(30), Decimal::from(100));
/// assert_eq!(cmv, Some(Decimal::from(30)));
/// assert_eq!(cmv_percent(Decimal::from(30), Decimal::ZERO), None);
/// ```
pub fn cmv_percent(cost: Decimal, price: Decimal) -> Option<Decimal> {
    share_percent(cost, price)
}

fn share_percent(part: Decimal, whole: Decimal) -> Option<Decimal> {
    if whole > Decimal::ZERO {
        Some(part / whole * Decimal::ONE_HUNDRED)
    } else {
        None
    }
}

/// Entries whose date falls in `[from, to]`.
pub fn filter_period(entries: &[CashEntry], from: NaiveDate, to: NaiveDate) -> Vec<&CashEntry> {
    entries
        .iter()
        .filter(|entry| entry.occurred_on >= from && entry.occurred_on <= to)
        .collect()
}

// =============================================================================
// Income Statement (DRE)
// =============================================================================

/// Income statement for a set of ledger entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct IncomeStatement {
    pub gross_revenue: Money,
    pub deductions: Money,
    pub net_revenue: Money,
    pub cost_of_goods_sold: Money,
    pub gross_profit: Money,
    pub operating_expenses: Money,
    pub operating_result: Money,
    /// CMV over net revenue.
    #[ts(as = "Option<String>")]
    pub cmv_percent: Option<Decimal>,
    /// Operating result over net revenue.
    #[ts(as = "Option<String>")]
    pub net_margin_percent: Option<Decimal>,
}

impl IncomeStatement {
    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a CashEntry>,
    {
        let mut gross_revenue = Money::zero();
        let mut deductions = Money::zero();
        let mut cost_of_goods_sold = Money::zero();
        let mut operating_expenses = Money::zero();

        for entry in entries {
            match entry.category.dre_line() {
                DreLine::Revenue => gross_revenue += entry.amount,
                DreLine::Deduction => deductions += entry.amount,
                DreLine::CostOfGoods => cost_of_goods_sold += entry.amount,
                DreLine::OperatingExpense => operating_expenses += entry.amount,
            }
        }

        let net_revenue = gross_revenue - deductions;
        let gross_profit = net_revenue - cost_of_goods_sold;
        let operating_result = gross_profit - operating_expenses;

        IncomeStatement {
            gross_revenue,
            deductions,
            net_revenue,
            cost_of_goods_sold,
            gross_profit,
            operating_expenses,
            operating_result,
            cmv_percent: cmv_percent(cost_of_goods_sold.to_decimal(), net_revenue.to_decimal()),
            net_margin_percent: share_percent(
                operating_result.to_decimal(),
                net_revenue.to_decimal(),
            ),
        }
    }
}

// =============================================================================
// Cash Flow
// =============================================================================

/// Totals for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyCashFlow {
    /// `YYYY-MM`
    pub month: String,
    pub inflow: Money,
    pub outflow: Money,
    pub net: Money,
    /// Running balance at the end of the month.
    pub closing_balance: Money,
}

/// Cash movement over a set of entries, bucketed by month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CashFlowSummary {
    pub opening_balance: Money,
    pub total_inflow: Money,
    pub total_outflow: Money,
    pub net_flow: Money,
    pub closing_balance: Money,
    /// Chronological, only months that have entries.
    pub months: Vec<MonthlyCashFlow>,
}

impl CashFlowSummary {
    pub fn from_entries<'a, I>(entries: I, opening_balance: Money) -> Self
    where
        I: IntoIterator<Item = &'a CashEntry>,
    {
        // (year, month) -> (inflow, outflow)
        let mut buckets: BTreeMap<(i32, u32), (Money, Money)> = BTreeMap::new();

        for entry in entries {
            let key = (entry.occurred_on.year(), entry.occurred_on.month());
            let bucket = buckets.entry(key).or_default();
            match entry.category.direction() {
                CashDirection::Inflow => bucket.0 += entry.amount,
                CashDirection::Outflow => bucket.1 += entry.amount,
            }
        }

        let mut balance = opening_balance;
        let mut total_inflow = Money::zero();
        let mut total_outflow = Money::zero();
        let months = buckets
            .into_iter()
            .map(|((year, month), (inflow, outflow))| {
                let net = inflow - outflow;
                balance += net;
                total_inflow += inflow;
                total_outflow += outflow;
                MonthlyCashFlow {
                    month: format!("{year:04}-{month:02}"),
                    inflow,
                    outflow,
                    net,
                    closing_balance: balance,
                }
            })
            .collect();

        CashFlowSummary {
            opening_balance,
            total_inflow,
            total_outflow,
            net_flow: total_inflow - total_outflow,
            closing_balance: balance,
            months,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
