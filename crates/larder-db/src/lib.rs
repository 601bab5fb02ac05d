//! # larder-db: Database Layer for Larder
//!
//! SQLite storage for the ingredient catalogue, technical sheets, costing
//! settings and the cash-flow ledger, using sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Larder Data Flow                                 │
//! │                                                                         │
//! │  CLI command (larder sheet cost <id>)                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     larder-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐ │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │ │   │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │ │   │
//! │  │   │               │    │ Ingredient     │    │              │ │   │
//! │  │   │ SqlitePool    │◄───│ TechnicalSheet │    │ 001_init.sql │ │   │
//! │  │   │ sheet_costing │    │ Settings, Cash │    │              │ │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘ │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   ~/.local/share/larder/larder.db (per-platform data dir)       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use larder_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/larder.db")).await?;
//!
//! let sheet = db.sheets().create(tenant, "Feijoada", 8, None).await?;
//! db.sheets().add_item(&sheet.id, &beans.id, dec!(0.5)).await?;
//! let costing = db.sheet_costing(&sheet.id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::cash::CashEntryRepository;
pub use repository::ingredient::IngredientRepository;
pub use repository::settings::SettingsRepository;
pub use repository::sheet::TechnicalSheetRepository;
