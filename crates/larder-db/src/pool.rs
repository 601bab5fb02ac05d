//! # Database Pool Management
//!
//! Connection pool creation and configuration for SQLite.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Connection Pool                           │
//! │                                                                         │
//! │  CLI startup                                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbConfig::new(path) ← Configure pool settings                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config).await ← Create pool + run migrations            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │            SqlitePool                    │                           │
//! │  │  ┌─────┐ ┌─────┐ ┌─────┐ ┌─────┐       │                           │
//! │  │  │Conn1│ │Conn2│ │Conn3│ │Conn4│ ...   │  (max_connections)        │
//! │  │  └─────┘ └─────┘ └─────┘ └─────┘       │                           │
//! │  └─────────────────────────────────────────┘                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  db.ingredients() / db.sheets() / db.settings() / db.cash_entries()    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## WAL Mode
//! SQLite WAL (Write-Ahead Logging) mode is enabled so readers don't block
//! writers.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use larder_core::{compute_costing, CoreError, IngredientCost, SheetCosting};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::cash::CashEntryRepository;
use crate::repository::ingredient::IngredientRepository;
use crate::repository::settings::SettingsRepository;
use crate::repository::sheet::TechnicalSheetRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/path/to/larder.db")
///     .max_connections(5)
///     .min_connections(1);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 5
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// Connection timeout duration.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection.
    /// Default: 10 minutes
    pub idle_timeout: Duration,

    /// Whether to run migrations on connect.
    /// Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// Creates a new database configuration with the given path.
    /// The file is created if it doesn't exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            run_migrations: true,
        }
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets whether to run migrations on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Creates an in-memory database configuration (for testing).
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1, // In-memory requires single connection
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            run_migrations: true,
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle providing repository access.
///
/// Cheap to clone: every clone shares the same pool.
///
/// ## Usage
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("./larder.db")).await?;
/// let flour = db.ingredients().search(DEFAULT_TENANT_ID, "flour", 20).await?;
/// let costing = db.sheet_costing(&sheet_id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    /// The SQLite connection pool.
    pool: SqlitePool,
}

impl Database {
    /// Creates a new database connection pool.
    ///
    /// ## What This Does
    /// 1. Creates the database file if it doesn't exist
    /// 2. Configures SQLite: WAL, NORMAL synchronous, foreign keys on
    /// 3. Creates the connection pool
    /// 4. Runs migrations (if enabled)
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing database connection"
        );

        // sqlite://path creates file if not exists
        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());

        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            // SQLite has them disabled by default
            .foreign_keys(true)
            .create_if_missing(true);

        debug!("Connection options configured");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Database pool created"
        );

        let db = Database { pool };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Runs database migrations. Called by `new()` unless disabled.
    pub async fn run_migrations(&self) -> DbResult<()> {
        info!("Running database migrations");
        migrations::run_migrations(&self.pool).await?;
        info!("Migrations complete");
        Ok(())
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns the ingredient repository.
    pub fn ingredients(&self) -> IngredientRepository {
        IngredientRepository::new(self.pool.clone())
    }

    /// Returns the technical sheet repository.
    pub fn sheets(&self) -> TechnicalSheetRepository {
        TechnicalSheetRepository::new(self.pool.clone())
    }

    /// Returns the costing settings repository.
    pub fn settings(&self) -> SettingsRepository {
        SettingsRepository::new(self.pool.clone())
    }

    /// Returns the cash-flow ledger repository.
    pub fn cash_entries(&self) -> CashEntryRepository {
        CashEntryRepository::new(self.pool.clone())
    }

    /// Costs a technical sheet with current ingredient prices and the
    /// tenant's settings.
    ///
    /// ```text
    /// technical_sheets ──► technical_sheet_items ⋈ ingredients ──► SheetLine[]
    ///                                                                 │
    /// costing_settings (or defaults) ──► CostingConfig ──────────────┤
    ///                                                                 ▼
    ///                                               compute_costing(...)
    /// ```
    pub async fn sheet_costing(&self, sheet_id: &str) -> DbResult<SheetCosting> {
        let sheet = self
            .sheets()
            .get_by_id(sheet_id)
            .await?
            .filter(|sheet| sheet.is_active)
            .ok_or_else(|| CoreError::TechnicalSheetNotFound(sheet_id.to_string()))?;

        let lines = self.sheets().lines(sheet_id).await?;
        let settings = self.settings().get(&sheet.tenant_id).await?;

        let costs: Vec<IngredientCost> = lines.iter().map(|line| line.cost()).collect();
        let result = compute_costing(&costs, sheet.yield_portions, settings.config())?;

        debug!(
            sheet_id = %sheet.id,
            lines = lines.len(),
            suggested_price = %result.suggested_price,
            viability = result.viability.as_str(),
            "Costed technical sheet"
        );

        Ok(SheetCosting {
            sheet,
            lines,
            result,
        })
    }

    /// Closes the database connection pool.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// Checks if the database is healthy (can execute queries).
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use larder_core::{
        BreakEven, CostingConfig, CostingSettings, Unit, Viability, DEFAULT_TENANT_ID,
    };
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_in_memory_database() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.health_check().await);
    }

    #[tokio::test]
    async fn test_config_builder() {
        let config = DbConfig::new("/tmp/test.db")
            .max_connections(10)
            .min_connections(2)
            .run_migrations(false);

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert!(!config.run_migrations);
    }

    /// Scenario: 10.00 of ingredients, 2 portions, 10% margin, 3000 fixed
    /// over 1000 dishes, 5% variable, 300% markup, 10% tax.
    #[tokio::test]
    async fn test_sheet_costing_end_to_end() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let beans = db
            .ingredients()
            .create(DEFAULT_TENANT_ID, "Feijão preto", Unit::Kg, dec!(8), dec!(1))
            .await
            .unwrap();
        let pork = db
            .ingredients()
            .create(DEFAULT_TENANT_ID, "Costela suína", Unit::Kg, dec!(16), dec!(1.25))
            .await
            .unwrap();

        let sheet = db
            .sheets()
            .create(DEFAULT_TENANT_ID, "Feijoada", 2, None)
            .await
            .unwrap();
        db.sheets().add_item(&sheet.id, &beans.id, dec!(0.5)).await.unwrap();
        // 0.3 kg net × 1.25 × 16.00 = 6.00
        db.sheets().add_item(&sheet.id, &pork.id, dec!(0.3)).await.unwrap();

        db.settings()
            .upsert(&CostingSettings {
                tenant_id: DEFAULT_TENANT_ID.to_string(),
                config: CostingConfig {
                    standard_markup_percent: dec!(300),
                    monthly_fixed_expense: dec!(3000),
                    monthly_dishes_sold: 1000,
                    safety_margin_percent: dec!(10),
                    tax_percent: dec!(10),
                    variable_expense_percent: dec!(5),
                },
                updated_at: None,
            })
            .await
            .unwrap();

        let costing = db.sheet_costing(&sheet.id).await.unwrap();

        assert_eq!(costing.lines.len(), 2);
        assert_eq!(costing.result.ingredient_cost, dec!(10));
        assert_eq!(costing.result.final_cost, dec!(8.775));
        assert_eq!(costing.result.suggested_price, dec!(29.25));
        assert_eq!(costing.result.viability, Viability::Healthy);
        assert_eq!(costing.result.break_even, BreakEven::Portions(1));
    }

    #[tokio::test]
    async fn test_sheet_costing_reflects_price_changes() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let rice = db
            .ingredients()
            .create(DEFAULT_TENANT_ID, "Arroz", Unit::Kg, dec!(5), dec!(1))
            .await
            .unwrap();
        let sheet = db
            .sheets()
            .create(DEFAULT_TENANT_ID, "Arroz branco", 1, None)
            .await
            .unwrap();
        db.sheets().add_item(&sheet.id, &rice.id, dec!(1)).await.unwrap();

        let before = db.sheet_costing(&sheet.id).await.unwrap();
        db.ingredients().update_price(&rice.id, dec!(7.5)).await.unwrap();
        let after = db.sheet_costing(&sheet.id).await.unwrap();

        assert_eq!(before.result.ingredient_cost, dec!(5));
        assert_eq!(after.result.ingredient_cost, dec!(7.5));
        // Default settings: 300% markup, no tax.
        assert_eq!(after.result.suggested_price, dec!(22.5));
    }

    #[tokio::test]
    async fn test_sheet_costing_missing_sheet() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db.sheet_costing("missing").await.unwrap_err();
        assert!(matches!(
            err.as_domain(),
            Some(CoreError::TechnicalSheetNotFound(id)) if id == "missing"
        ));
    }

    #[tokio::test]
    async fn test_sheet_costing_rejects_stored_bad_tax() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let sheet = db
            .sheets()
            .create(DEFAULT_TENANT_ID, "Caldo", 4, None)
            .await
            .unwrap();

        // Bypass the repository validation to simulate a hand-edited row.
        sqlx::query(
            "INSERT INTO costing_settings VALUES (?1, '300', '0', 0, '0', '100', '0', '2026-01-01T00:00:00Z')",
        )
        .bind(DEFAULT_TENANT_ID)
        .execute(db.pool())
        .await
        .unwrap();

        let err = db.sheet_costing(&sheet.id).await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::Validation(_))));
    }
}
