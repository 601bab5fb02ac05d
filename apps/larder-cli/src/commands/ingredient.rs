//! Ingredient command - the purchase-price catalogue.

use anyhow::Result;
use clap::{Args, Subcommand};
use rust_decimal::Decimal;
use tracing::info;

use larder_core::{Feature, Ingredient, Unit};

use super::{print_json, Context};

#[derive(Subcommand)]
pub enum IngredientCommand {
    /// Add an ingredient with its purchase price
    Add(AddArgs),

    /// List active ingredients
    List(ListArgs),

    /// Change an ingredient's purchase price
    Price(PriceArgs),

    /// Remove an ingredient from the catalogue
    Remove {
        /// Ingredient ID
        id: String,
    },
}

#[derive(Args)]
pub struct AddArgs {
    /// Ingredient name
    name: String,

    /// Purchase unit (kg, g, l, ml, unit)
    #[arg(short, long)]
    unit: Unit,

    /// Price per unit
    #[arg(short, long)]
    price: Decimal,

    /// Gross/net ratio for trimming loss (1 = no loss)
    #[arg(short = 'f', long, default_value = "1")]
    correction_factor: Decimal,
}

#[derive(Args)]
pub struct ListArgs {
    /// Only names containing this text
    #[arg(short, long)]
    search: Option<String>,

    /// Maximum rows
    #[arg(short, long, default_value_t = 50)]
    limit: u32,
}

#[derive(Args)]
pub struct PriceArgs {
    /// Ingredient ID
    id: String,

    /// New price per unit
    price: Decimal,
}

pub async fn execute(ctx: &Context, command: IngredientCommand) -> Result<()> {
    ctx.require(Feature::Costing)?;
    let repo = ctx.db.ingredients();

    match command {
        IngredientCommand::Add(args) => {
            let ingredient = repo
                .create(
                    ctx.tenant(),
                    &args.name,
                    args.unit,
                    args.price,
                    args.correction_factor,
                )
                .await?;
            info!(id = %ingredient.id, "Ingredient added");

            if ctx.json {
                print_json(&ingredient)?;
            } else {
                println!("Added {} ({})", ingredient.name, ingredient.id);
            }
        }

        IngredientCommand::List(args) => {
            let ingredients = match args.search.as_deref() {
                Some(query) => repo.search(ctx.tenant(), query, args.limit).await?,
                None => repo.list_active(ctx.tenant(), args.limit).await?,
            };

            if ctx.json {
                print_json(&ingredients)?;
            } else {
                print_table(ctx, &ingredients);
            }
        }

        IngredientCommand::Price(args) => {
            let ingredient = ctx.active_ingredient(&args.id).await?;
            repo.update_price(&ingredient.id, args.price).await?;

            if ctx.json {
                print_json(&serde_json::json!({
                    "id": ingredient.id,
                    "previousPrice": ingredient.unit_price,
                    "unitPrice": args.price,
                }))?;
            } else {
                println!(
                    "{}: {} -> {} per {}",
                    ingredient.name,
                    ctx.amount(ingredient.unit_price),
                    ctx.amount(args.price),
                    ingredient.unit
                );
            }
        }

        IngredientCommand::Remove { id } => {
            let ingredient = ctx.active_ingredient(&id).await?;
            repo.soft_delete(&ingredient.id).await?;

            if ctx.json {
                print_json(&serde_json::json!({ "id": ingredient.id, "removed": true }))?;
            } else {
                println!("Removed {}", ingredient.name);
            }
        }
    }

    Ok(())
}

fn print_table(ctx: &Context, ingredients: &[Ingredient]) {
    if ingredients.is_empty() {
        println!("No ingredients.");
        return;
    }

    println!(
        "{:<36}  {:<28}  {:<4}  {:>12}  {:>6}",
        "ID", "NAME", "UNIT", "PRICE", "FACTOR"
    );
    for i in ingredients {
        println!(
            "{:<36}  {:<28}  {:<4}  {:>12}  {:>6}",
            i.id,
            truncate(&i.name, 28),
            i.unit,
            ctx.amount(i.unit_price),
            i.correction_factor.normalize()
        );
    }
}

pub(crate) fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}
