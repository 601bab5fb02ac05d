//! Cash command - the ledger, cash-flow summary and income statement (DRE).

use anyhow::{Context as _, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;

use larder_core::validation::validate_uuid;
use larder_core::{CashCategory, CashEntry, CashFlowSummary, Feature, IncomeStatement, Money};

use super::ingredient::truncate;
use super::{print_json, Context, PeriodArgs};

#[derive(Subcommand)]
pub enum CashCommand {
    /// Record money in or out
    Add(AddArgs),

    /// List entries in a period
    List(PeriodArgs),

    /// Delete an entry
    Remove {
        /// Entry ID
        id: String,
    },

    /// Inflow, outflow and running balance per month
    Summary(PeriodArgs),

    /// Income statement (DRE) for a period
    Dre(PeriodArgs),
}

#[derive(Args)]
pub struct AddArgs {
    /// sales, sales_tax, ingredients, payroll, rent, utilities, marketing,
    /// other_expense, other_income
    #[arg(short, long)]
    category: CashCategory,

    /// Amount, always positive; the category gives the direction
    #[arg(short, long)]
    amount: Decimal,

    /// What it was for
    #[arg(short, long, default_value = "")]
    description: String,

    /// Date (YYYY-MM-DD), default: today
    #[arg(long)]
    date: Option<NaiveDate>,
}

/// Period bounds echoed back with every report.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report<T> {
    from: NaiveDate,
    to: NaiveDate,
    #[serde(flatten)]
    report: T,
}

pub async fn execute(ctx: &Context, command: CashCommand) -> Result<()> {
    execute_on(ctx, command, Local::now().date_naive()).await
}

/// `today` anchors default dates and periods.
async fn execute_on(ctx: &Context, command: CashCommand, today: NaiveDate) -> Result<()> {
    let repo = ctx.db.cash_entries();

    match command {
        CashCommand::Add(args) => {
            ctx.require(Feature::CashFlow)?;
            let amount = Money::from_decimal(args.amount)?;
            let entry = repo
                .create(
                    ctx.tenant(),
                    args.category,
                    &args.description,
                    amount,
                    args.date.unwrap_or(today),
                )
                .await
                .context("recording cash entry")?;

            if ctx.json {
                print_json(&entry)?;
            } else {
                println!(
                    "Recorded {} {} on {} ({})",
                    entry.category,
                    ctx.money(entry.amount),
                    entry.occurred_on,
                    entry.id
                );
            }
        }

        CashCommand::List(period) => {
            ctx.require(Feature::CashFlow)?;
            let (from, to) = period.resolve(today);
            let entries = repo.list_between(ctx.tenant(), from, to).await?;

            if ctx.json {
                print_json(&entries)?;
            } else {
                print_entries(ctx, &entries);
            }
        }

        CashCommand::Remove { id } => {
            ctx.require(Feature::CashFlow)?;
            validate_uuid(&id)?;
            repo.delete(ctx.tenant(), &id).await?;

            if ctx.json {
                print_json(&serde_json::json!({ "id": id, "removed": true }))?;
            } else {
                println!("Removed entry {id}");
            }
        }

        CashCommand::Summary(period) => {
            ctx.require(Feature::CashFlow)?;
            let (from, to) = period.resolve(today);
            let opening = repo.balance_before(ctx.tenant(), from).await?;
            let entries = repo.list_between(ctx.tenant(), from, to).await?;
            let summary = CashFlowSummary::from_entries(&entries, opening);

            if ctx.json {
                print_json(&Report { from, to, report: summary })?;
            } else {
                print_summary(ctx, from, to, &summary);
            }
        }

        CashCommand::Dre(period) => {
            ctx.require(Feature::FinancialReports)?;
            let (from, to) = period.resolve(today);
            let entries = repo.list_between(ctx.tenant(), from, to).await?;
            let statement = IncomeStatement::from_entries(&entries);

            if ctx.json {
                print_json(&Report { from, to, report: statement })?;
            } else {
                print_statement(ctx, from, to, &statement);
            }
        }
    }

    Ok(())
}

// =============================================================================
// Text Output
// =============================================================================

fn print_entries(ctx: &Context, entries: &[CashEntry]) {
    if entries.is_empty() {
        println!("No entries in this period.");
        return;
    }

    println!(
        "{:<10}  {:<14}  {:<30}  {:>14}  {}",
        "DATE", "CATEGORY", "DESCRIPTION", "AMOUNT", "ID"
    );
    for e in entries {
        println!(
            "{:<10}  {:<14}  {:<30}  {:>14}  {}",
            e.occurred_on,
            e.category,
            truncate(&e.description, 30),
            ctx.money(e.signed_amount()),
            e.id
        );
    }
}

fn print_summary(ctx: &Context, from: NaiveDate, to: NaiveDate, s: &CashFlowSummary) {
    println!("Cash flow {from} to {to}");
    println!();
    println!(
        "{:<8}  {:>14}  {:>14}  {:>14}  {:>14}",
        "MONTH", "IN", "OUT", "NET", "BALANCE"
    );
    for m in &s.months {
        println!(
            "{:<8}  {:>14}  {:>14}  {:>14}  {:>14}",
            m.month,
            ctx.money(m.inflow),
            ctx.money(m.outflow),
            ctx.money(m.net),
            ctx.money(m.closing_balance)
        );
    }
    println!();
    println!("{:<18}{:>16}", "Opening balance", ctx.money(s.opening_balance));
    println!("{:<18}{:>16}", "Net flow", ctx.money(s.net_flow));
    println!("{:<18}{:>16}", "Closing balance", ctx.money(s.closing_balance));
}

fn print_statement(ctx: &Context, from: NaiveDate, to: NaiveDate, s: &IncomeStatement) {
    let row = |label: &str, value: Money| println!("{label:<28}{:>16}", ctx.money(value));
    let percent = |value: Option<Decimal>| match value {
        Some(v) => format!("{:.1}%", v.round_dp(1)),
        None => "n/a".to_string(),
    };

    println!("Income statement {from} to {to}");
    println!();
    row("Gross revenue", s.gross_revenue);
    row("(-) Sales taxes", s.deductions);
    row("= Net revenue", s.net_revenue);
    row("(-) Cost of goods (CMV)", s.cost_of_goods_sold);
    row("= Gross profit", s.gross_profit);
    row("(-) Operating expenses", s.operating_expenses);
    row("= Operating result", s.operating_result);
    println!();
    println!("{:<28}{:>16}", "CMV", percent(s.cmv_percent));
    println!("{:<28}{:>16}", "Net margin", percent(s.net_margin_percent));
}
