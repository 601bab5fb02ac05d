//! # Settings Repository
//!
//! Per-tenant costing configuration, one row per tenant.
//!
//! A tenant that never saved settings gets [`CostingSettings::defaults_for`]
//! (300% markup, everything else zero) with `updated_at: None`.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use larder_core::validation::validate_costing_config;
use larder_core::{CostingConfig, CostingSettings};

use super::parse_decimal;
use crate::error::{DbError, DbResult};

#[derive(Debug, sqlx::FromRow)]
struct SettingsRow {
    tenant_id: String,
    standard_markup_percent: String,
    monthly_fixed_expense: String,
    monthly_dishes_sold: i64,
    safety_margin_percent: String,
    tax_percent: String,
    variable_expense_percent: String,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SettingsRow> for CostingSettings {
    type Error = DbError;

    fn try_from(row: SettingsRow) -> DbResult<Self> {
        let config = CostingConfig {
            standard_markup_percent: parse_decimal(
                "costing_settings.standard_markup_percent",
                &row.standard_markup_percent,
            )?,
            monthly_fixed_expense: parse_decimal(
                "costing_settings.monthly_fixed_expense",
                &row.monthly_fixed_expense,
            )?,
            monthly_dishes_sold: row.monthly_dishes_sold,
            safety_margin_percent: parse_decimal(
                "costing_settings.safety_margin_percent",
                &row.safety_margin_percent,
            )?,
            tax_percent: parse_decimal("costing_settings.tax_percent", &row.tax_percent)?,
            variable_expense_percent: parse_decimal(
                "costing_settings.variable_expense_percent",
                &row.variable_expense_percent,
            )?,
        };

        Ok(CostingSettings {
            tenant_id: row.tenant_id,
            config,
            updated_at: Some(row.updated_at),
        })
    }
}

/// Repository for costing settings.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Loads the tenant's settings, or the defaults when none were saved.
    pub async fn get(&self, tenant_id: &str) -> DbResult<CostingSettings> {
        let row = sqlx::query_as::<_, SettingsRow>(
            r#"
            SELECT
                tenant_id, standard_markup_percent, monthly_fixed_expense,
                monthly_dishes_sold, safety_margin_percent, tax_percent,
                variable_expense_percent, updated_at
            FROM costing_settings
            WHERE tenant_id = ?1
            "#,
        )
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => CostingSettings::try_from(row),
            None => {
                debug!(tenant_id = %tenant_id, "No saved settings, using defaults");
                Ok(CostingSettings::defaults_for(tenant_id))
            }
        }
    }

    /// Validates and saves the settings, replacing any previous row.
    ///
    /// Returns the stored settings with `updated_at` set.
    pub async fn upsert(&self, settings: &CostingSettings) -> DbResult<CostingSettings> {
        let config = settings.config();
        validate_costing_config(config)?;

        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO costing_settings (
                tenant_id, standard_markup_percent, monthly_fixed_expense,
                monthly_dishes_sold, safety_margin_percent, tax_percent,
                variable_expense_percent, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT (tenant_id) DO UPDATE SET
                standard_markup_percent = excluded.standard_markup_percent,
                monthly_fixed_expense = excluded.monthly_fixed_expense,
                monthly_dishes_sold = excluded.monthly_dishes_sold,
                safety_margin_percent = excluded.safety_margin_percent,
                tax_percent = excluded.tax_percent,
                variable_expense_percent = excluded.variable_expense_percent,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&settings.tenant_id)
        .bind(config.standard_markup_percent.to_string())
        .bind(config.monthly_fixed_expense.to_string())
        .bind(config.monthly_dishes_sold)
        .bind(config.safety_margin_percent.to_string())
        .bind(config.tax_percent.to_string())
        .bind(config.variable_expense_percent.to_string())
        .bind(now)
        .execute(&self.pool)
        .await?;

        info!(tenant_id = %settings.tenant_id, "Costing settings saved");

        Ok(CostingSettings {
            tenant_id: settings.tenant_id.clone(),
            config: config.clone(),
            updated_at: Some(now),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig, DbError};
    use larder_core::{CoreError, CostingConfig, CostingSettings, DEFAULT_TENANT_ID};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_defaults_when_missing() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let settings = db.settings().get(DEFAULT_TENANT_ID).await.unwrap();

        assert_eq!(settings.tenant_id, DEFAULT_TENANT_ID);
        assert_eq!(settings.config, CostingConfig::default());
        assert!(settings.updated_at.is_none());
    }

    #[tokio::test]
    async fn test_upsert_round_trip_and_replace() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.settings();

        let mut settings = CostingSettings::defaults_for(DEFAULT_TENANT_ID);
        settings.config.tax_percent = dec!(8.5);
        settings.config.monthly_fixed_expense = dec!(12000.00);
        settings.config.monthly_dishes_sold = 2400;

        let saved = repo.upsert(&settings).await.unwrap();
        assert!(saved.updated_at.is_some());

        let loaded = repo.get(DEFAULT_TENANT_ID).await.unwrap();
        assert_eq!(loaded.config, settings.config);

        settings.config.standard_markup_percent = dec!(250);
        repo.upsert(&settings).await.unwrap();
        let loaded = repo.get(DEFAULT_TENANT_ID).await.unwrap();
        assert_eq!(loaded.config.standard_markup_percent, dec!(250));
        assert_eq!(loaded.config.tax_percent, dec!(8.5));
    }

    #[tokio::test]
    async fn test_upsert_rejects_invalid_config() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.settings();

        let mut settings = CostingSettings::defaults_for(DEFAULT_TENANT_ID);
        settings.config.tax_percent = dec!(100);

        let err = repo.upsert(&settings).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));

        // Nothing was stored.
        assert!(repo.get(DEFAULT_TENANT_ID).await.unwrap().updated_at.is_none());
    }
}
