//! CLI command definitions.
//!
//! Each subcommand group lives in its own module with an `execute`
//! function. Every group checks the configured plan before touching the
//! database.

use std::path::PathBuf;

use anyhow::Result;
use chrono::{Datelike, Months, NaiveDate};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;

use larder_core::plan::ensure_feature;
use larder_core::validation::validate_uuid;
use larder_core::{CoreError, CoreResult, Feature, Ingredient, Money, TechnicalSheet};
use larder_db::Database;

use crate::config::AppConfig;

pub mod cash;
pub mod ingredient;
pub mod plan;
pub mod settings;
pub mod sheet;

/// Larder - dish costing and restaurant finance
#[derive(Parser)]
#[command(name = "larder")]
#[command(version, about = "Larder - dish costing and restaurant finance")]
#[command(long_about = r#"
Larder prices dishes from their technical sheets (recipes) and keeps a
simple cash-flow ledger with monthly income statements.

COMMANDS:
  ingredient  → Ingredient catalogue and purchase prices
  sheet       → Technical sheets and dish costing
  settings    → Markup, fixed expenses, taxes
  cash        → Cash-flow ledger, summary and income statement (DRE)
  plan        → Subscription plan, features and quotas

EXIT CODES:
  0 - Success
  1 - General error
  2 - Validation failure
  3 - Not available on the configured plan
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (default: ./larder.toml if present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Database file, overrides the configured path
    #[arg(long, global = true, value_name = "FILE", env = "LARDER_DB")]
    pub db: Option<PathBuf>,

    /// Print JSON instead of text tables
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage the ingredient catalogue
    #[command(subcommand)]
    Ingredient(ingredient::IngredientCommand),

    /// Manage technical sheets and cost dishes
    #[command(subcommand)]
    Sheet(sheet::SheetCommand),

    /// Show or change costing settings
    #[command(subcommand)]
    Settings(settings::SettingsCommand),

    /// Cash-flow ledger and reports
    #[command(subcommand)]
    Cash(cash::CashCommand),

    /// Show the configured plan and its quotas
    Plan,
}

pub async fn dispatch(ctx: &Context, command: Commands) -> Result<()> {
    match command {
        Commands::Ingredient(cmd) => ingredient::execute(ctx, cmd).await,
        Commands::Sheet(cmd) => sheet::execute(ctx, cmd).await,
        Commands::Settings(cmd) => settings::execute(ctx, cmd).await,
        Commands::Cash(cmd) => cash::execute(ctx, cmd).await,
        Commands::Plan => plan::execute(ctx).await,
    }
}

// =============================================================================
// Context
// =============================================================================

/// Everything a command needs: the database, configuration and output mode.
pub struct Context {
    pub db: Database,
    pub config: AppConfig,
    pub json: bool,
}

impl Context {
    pub fn new(db: Database, config: AppConfig, json: bool) -> Self {
        Context { db, config, json }
    }

    #[inline]
    pub fn tenant(&self) -> &str {
        &self.config.tenant_id
    }

    /// Fails unless the configured plan includes `feature`.
    pub fn require(&self, feature: Feature) -> CoreResult<()> {
        ensure_feature(self.config.plan, feature)
    }

    pub fn money(&self, amount: Money) -> String {
        amount.format_with(&self.config.currency_symbol)
    }

    /// Decimal amount shown to the cent.
    pub fn amount(&self, amount: Decimal) -> String {
        format!("{} {:.2}", self.config.currency_symbol, amount.round_dp(2))
    }

    /// Active ingredient owned by this tenant.
    pub async fn active_ingredient(&self, id: &str) -> Result<Ingredient> {
        validate_uuid(id)?;
        self.db
            .ingredients()
            .get_by_id(id)
            .await?
            .filter(|i| i.is_active && i.tenant_id == self.tenant())
            .ok_or_else(|| CoreError::IngredientNotFound(id.to_string()).into())
    }

    /// Active technical sheet owned by this tenant.
    pub async fn active_sheet(&self, id: &str) -> Result<TechnicalSheet> {
        validate_uuid(id)?;
        self.db
            .sheets()
            .get_by_id(id)
            .await?
            .filter(|s| s.is_active && s.tenant_id == self.tenant())
            .ok_or_else(|| CoreError::TechnicalSheetNotFound(id.to_string()).into())
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// =============================================================================
// Period
// =============================================================================

/// Date range shared by the ledger commands.
#[derive(Args, Debug, Clone, Default)]
pub struct PeriodArgs {
    /// First day (YYYY-MM-DD), default: first day of the current month
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Last day (YYYY-MM-DD), default: end of the month `--from` falls in
    #[arg(long)]
    pub to: Option<NaiveDate>,
}

impl PeriodArgs {
    /// Resolves the inclusive `[from, to]` range relative to `today`.
    pub fn resolve(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let from = self.from.unwrap_or_else(|| month_start(today));
        let to = self.to.unwrap_or_else(|| month_end(from));
        (from, to)
    }
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn month_end(date: NaiveDate) -> NaiveDate {
    month_start(date)
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

// =============================================================================
// Unit Tests
// =============================================================================
