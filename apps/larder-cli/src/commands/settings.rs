//! Settings command - the tenant's costing configuration.

use anyhow::Result;
use clap::{Args, Subcommand};
use rust_decimal::Decimal;

use larder_core::{CostingSettings, Feature};

use super::{print_json, Context};

#[derive(Subcommand)]
pub enum SettingsCommand {
    /// Show the current settings
    Show,

    /// Change one or more settings
    Set(SetArgs),
}

/// Only the flags given change; the rest keep their saved values.
#[derive(Args)]
pub struct SetArgs {
    /// Markup over final cost, percent (300 = price is 3x cost)
    #[arg(long)]
    markup: Option<Decimal>,

    /// Fixed expenses per month (rent, payroll, ...)
    #[arg(long)]
    fixed_expense: Option<Decimal>,

    /// Dishes sold per month, spreads the fixed expense
    #[arg(long)]
    dishes_sold: Option<i64>,

    /// Extra percent on ingredient cost for waste
    #[arg(long)]
    safety_margin: Option<Decimal>,

    /// Sales tax, percent of the price (below 100)
    #[arg(long)]
    tax: Option<Decimal>,

    /// Card fees, commissions, ... percent of portion cost
    #[arg(long)]
    variable_expense: Option<Decimal>,
}

impl SetArgs {
    fn apply(&self, settings: &mut CostingSettings) {
        let config = &mut settings.config;
        if let Some(v) = self.markup {
            config.standard_markup_percent = v;
        }
        if let Some(v) = self.fixed_expense {
            config.monthly_fixed_expense = v;
        }
        if let Some(v) = self.dishes_sold {
            config.monthly_dishes_sold = v;
        }
        if let Some(v) = self.safety_margin {
            config.safety_margin_percent = v;
        }
        if let Some(v) = self.tax {
            config.tax_percent = v;
        }
        if let Some(v) = self.variable_expense {
            config.variable_expense_percent = v;
        }
    }
}

pub async fn execute(ctx: &Context, command: SettingsCommand) -> Result<()> {
    ctx.require(Feature::Costing)?;
    let repo = ctx.db.settings();

    let settings = match command {
        SettingsCommand::Show => repo.get(ctx.tenant()).await?,
        SettingsCommand::Set(args) => {
            let mut settings = repo.get(ctx.tenant()).await?;
            args.apply(&mut settings);
            repo.upsert(&settings).await?
        }
    };

    if ctx.json {
        print_json(&settings)?;
    } else {
        print_settings(ctx, &settings);
    }

    Ok(())
}

fn print_settings(ctx: &Context, settings: &CostingSettings) {
    let c = settings.config();
    let row = |label: &str, value: String| println!("{label:<24}{value:>16}");

    row("Markup", format!("{}%", c.standard_markup_percent.normalize()));
    row("Monthly fixed expense", ctx.amount(c.monthly_fixed_expense));
    row("Monthly dishes sold", c.monthly_dishes_sold.to_string());
    row("Safety margin", format!("{}%", c.safety_margin_percent.normalize()));
    row("Tax", format!("{}%", c.tax_percent.normalize()));
    row("Variable expenses", format!("{}%", c.variable_expense_percent.normalize()));
    match settings.updated_at {
        Some(at) => row("Updated", at.format("%Y-%m-%d %H:%M").to_string()),
        None => row("Updated", "never (defaults)".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::super::dispatch;
    use super::super::tests::{context, parse};
    use larder_core::Plan;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_set_only_changes_given_flags() {
        let ctx = context(Plan::Free).await;
        dispatch(&ctx, parse(&["settings", "set", "--tax", "6", "--dishes-sold", "2400"]))
            .await
            .unwrap();
        dispatch(&ctx, parse(&["settings", "set", "--markup", "250"]))
            .await
            .unwrap();

        let settings = ctx.db.settings().get(ctx.tenant()).await.unwrap();
        assert_eq!(settings.config.tax_percent, dec!(6));
        assert_eq!(settings.config.monthly_dishes_sold, 2400);
        assert_eq!(settings.config.standard_markup_percent, dec!(250));
    }

    #[tokio::test]
    async fn test_tax_of_100_is_rejected() {
        let ctx = context(Plan::Free).await;
        let err = dispatch(&ctx, parse(&["settings", "set", "--tax", "100"]))
            .await
            .unwrap_err();
        assert_eq!(crate::categorize_error(&err), crate::ExitCodes::VALIDATION_FAILURE);
    }
}
