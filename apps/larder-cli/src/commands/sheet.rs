//! Sheet command - technical sheets (recipes) and dish costing.
//!
//! ```text
//! sheet create ──► ensure_sheet_capacity(plan, active sheets)
//! sheet cost   ──► Database::sheet_costing ──► CostingResult
//! ```

use anyhow::Result;
use clap::{Args, Subcommand};
use rust_decimal::Decimal;
use tracing::info;

use larder_core::plan::ensure_sheet_capacity;
use larder_core::validation::validate_uuid;
use larder_core::{BreakEven, CostingResult, Feature, SheetLine, TechnicalSheet};

use super::ingredient::truncate;
use super::{print_json, Context};

#[derive(Subcommand)]
pub enum SheetCommand {
    /// Create a technical sheet
    Create(CreateArgs),

    /// Put an ingredient on a sheet (replaces its quantity if present)
    AddItem(ItemArgs),

    /// Take an ingredient off a sheet
    RemoveItem {
        /// Sheet ID
        sheet_id: String,
        /// Ingredient ID
        ingredient_id: String,
    },

    /// List active sheets
    List,

    /// Show a sheet with its ingredients
    Show {
        /// Sheet ID
        id: String,
    },

    /// Price a dish with current ingredient prices and settings
    Cost {
        /// Sheet ID
        id: String,
    },

    /// Remove a sheet (frees a slot on the plan)
    Remove {
        /// Sheet ID
        id: String,
    },
}

#[derive(Args)]
pub struct CreateArgs {
    /// Dish name
    name: String,

    /// Portions the recipe yields
    #[arg(short = 'y', long = "yield", default_value_t = 1)]
    yield_portions: i64,

    /// Free-form preparation notes
    #[arg(short, long)]
    notes: Option<String>,
}

#[derive(Args)]
pub struct ItemArgs {
    /// Sheet ID
    sheet_id: String,

    /// Ingredient ID
    ingredient_id: String,

    /// Net quantity, in the ingredient's unit
    quantity: Decimal,
}

pub async fn execute(ctx: &Context, command: SheetCommand) -> Result<()> {
    ctx.require(Feature::TechnicalSheets)?;
    let repo = ctx.db.sheets();

    match command {
        SheetCommand::Create(args) => {
            let active = repo.count_active(ctx.tenant()).await?;
            ensure_sheet_capacity(ctx.config.plan, usize::try_from(active).unwrap_or(0))?;

            let sheet = repo
                .create(
                    ctx.tenant(),
                    &args.name,
                    args.yield_portions,
                    args.notes.as_deref(),
                )
                .await?;
            info!(id = %sheet.id, "Technical sheet created");

            if ctx.json {
                print_json(&sheet)?;
            } else {
                println!("Created {} ({})", sheet.name, sheet.id);
            }
        }

        SheetCommand::AddItem(args) => {
            let sheet = ctx.active_sheet(&args.sheet_id).await?;
            let ingredient = ctx.active_ingredient(&args.ingredient_id).await?;
            let item = repo.add_item(&sheet.id, &ingredient.id, args.quantity).await?;

            if ctx.json {
                print_json(&item)?;
            } else {
                println!(
                    "{}: {} {} of {}",
                    sheet.name,
                    item.net_quantity.normalize(),
                    ingredient.unit,
                    ingredient.name
                );
            }
        }

        SheetCommand::RemoveItem {
            sheet_id,
            ingredient_id,
        } => {
            let sheet = ctx.active_sheet(&sheet_id).await?;
            validate_uuid(&ingredient_id)?;
            repo.remove_item(&sheet.id, &ingredient_id).await?;

            if ctx.json {
                print_json(&serde_json::json!({
                    "sheetId": sheet.id,
                    "ingredientId": ingredient_id,
                    "removed": true,
                }))?;
            } else {
                println!("Removed ingredient from {}", sheet.name);
            }
        }

        SheetCommand::List => {
            let sheets = repo.list_active(ctx.tenant()).await?;

            if ctx.json {
                print_json(&sheets)?;
            } else {
                print_sheets(&sheets);
            }
        }

        SheetCommand::Show { id } => {
            let sheet = ctx.active_sheet(&id).await?;
            let lines = repo.lines(&sheet.id).await?;

            if ctx.json {
                print_json(&serde_json::json!({ "sheet": sheet, "lines": lines }))?;
            } else {
                print_header(&sheet);
                print_lines(ctx, &lines);
            }
        }

        SheetCommand::Cost { id } => {
            ctx.require(Feature::Costing)?;
            let sheet = ctx.active_sheet(&id).await?;
            let costing = ctx.db.sheet_costing(&sheet.id).await?;

            if ctx.json {
                print_json(&costing)?;
            } else {
                print_header(&costing.sheet);
                print_lines(ctx, &costing.lines);
                println!();
                print_result(ctx, &costing.result);
            }
        }

        SheetCommand::Remove { id } => {
            let sheet = ctx.active_sheet(&id).await?;
            repo.soft_delete(&sheet.id).await?;

            if ctx.json {
                print_json(&serde_json::json!({ "id": sheet.id, "removed": true }))?;
            } else {
                println!("Removed {}", sheet.name);
            }
        }
    }

    Ok(())
}

// =============================================================================
// Text Output
// =============================================================================

fn print_sheets(sheets: &[TechnicalSheet]) {
    if sheets.is_empty() {
        println!("No technical sheets.");
        return;
    }

    println!("{:<36}  {:<32}  {:>8}", "ID", "NAME", "PORTIONS");
    for sheet in sheets {
        println!(
            "{:<36}  {:<32}  {:>8}",
            sheet.id,
            truncate(&sheet.name, 32),
            sheet.yield_portions
        );
    }
}

fn print_header(sheet: &TechnicalSheet) {
    println!("{} ({} portions)", sheet.name, sheet.yield_portions);
    if let Some(notes) = &sheet.notes {
        println!("{notes}");
    }
    println!();
}

fn print_lines(ctx: &Context, lines: &[SheetLine]) {
    if lines.is_empty() {
        println!("No ingredients on this sheet.");
        return;
    }

    println!(
        "{:<28}  {:>10}  {:<4}  {:>6}  {:>12}",
        "INGREDIENT", "NET QTY", "UNIT", "FACTOR", "COST"
    );
    for line in lines {
        println!(
            "{:<28}  {:>10}  {:<4}  {:>6}  {:>12}",
            truncate(&line.ingredient_name, 28),
            line.net_quantity.normalize(),
            line.unit,
            line.correction_factor.normalize(),
            ctx.amount(line.cost().total_cost)
        );
    }
}

fn print_result(ctx: &Context, r: &CostingResult) {
    let row = |label: &str, value: String| println!("{label:<24}{value:>16}");
    let percent = |value: Decimal| format!("{:.1}%", value.round_dp(1));

    row("Ingredient cost", ctx.amount(r.ingredient_cost));
    row("With safety margin", ctx.amount(r.margin_adjusted_cost));
    row("Cost per portion", ctx.amount(r.per_portion_cost));
    row("Fixed cost per dish", ctx.amount(r.fixed_cost_per_dish));
    row("Variable expenses", ctx.amount(r.variable_expense));
    row("Final cost", ctx.amount(r.final_cost));
    row("Base price", ctx.amount(r.base_price));
    row("Suggested price", ctx.amount(r.suggested_price));
    row("Gross profit", ctx.amount(r.gross_profit));
    row("Net profit", ctx.amount(r.net_profit));
    row("Gross margin", percent(r.gross_margin_percent));
    row("Net margin", percent(r.net_margin_percent));
    if let Some(cmv) = r.cmv_percent() {
        row("Food cost (CMV)", percent(cmv));
    }
    row("Viability", r.viability.as_str().to_string());
    row(
        "Break-even",
        match r.break_even {
            BreakEven::Portions(n) => format!("{n} portions"),
            BreakEven::Unbounded => "never".to_string(),
        },
    );
}
