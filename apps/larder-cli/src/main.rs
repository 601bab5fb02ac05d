//! Larder CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Validation failure (bad input, or costing settings out of range)
//! - 3: Not available on the configured plan

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use larder_core::{CoreError, ValidationError};
use larder_db::{Database, DbConfig, DbError};

mod commands;
mod config;

use crate::commands::{Cli, Context};
use crate::config::AppConfig;

/// Script-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const VALIDATION_FAILURE: u8 = 2;
    pub const PLAN_RESTRICTED: u8 = 3;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Logs go to stderr so `--json` output on stdout stays parseable.
///
/// `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "info,larder=debug,sqlx=warn"
    } else {
        "warn"
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // Already initialized is fine (tests)
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::load(cli.config.as_deref())?;

    let db_path = match &cli.db {
        Some(path) => path.clone(),
        None => config.database_path()?,
    };
    tracing::debug!(path = %db_path.display(), plan = %config.plan, "Opening database");

    let db = Database::new(DbConfig::new(&db_path)).await?;
    let ctx = Context::new(db, config, cli.json);

    let result = commands::dispatch(&ctx, cli.command).await;
    ctx.db.close().await;
    result
}

/// Maps the first domain error in the chain to an exit code.
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        let domain = cause
            .downcast_ref::<CoreError>()
            .or_else(|| cause.downcast_ref::<DbError>().and_then(DbError::as_domain));

        if let Some(err) = domain {
            return match err {
                CoreError::Validation(_) | CoreError::CostingOverflow { .. } => {
                    ExitCodes::VALIDATION_FAILURE
                }
                CoreError::FeatureNotInPlan { .. } | CoreError::PlanLimitReached { .. } => {
                    ExitCodes::PLAN_RESTRICTED
                }
                _ => ExitCodes::GENERAL_ERROR,
            };
        }

        if cause.downcast_ref::<ValidationError>().is_some() {
            return ExitCodes::VALIDATION_FAILURE;
        }
    }

    ExitCodes::GENERAL_ERROR
}
