//! # Cash Entry Repository
//!
//! The cash-flow ledger. Amounts are positive integer cents; the category
//! decides whether an entry is money in or out.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use larder_core::validation::{validate_entry_amount, validate_name};
use larder_core::{CashCategory, CashDirection, CashEntry, Money, ValidationError};

use super::generate_id;
use crate::error::{DbError, DbResult};

#[derive(Debug, sqlx::FromRow)]
struct CashEntryRow {
    id: String,
    tenant_id: String,
    category: CashCategory,
    description: String,
    amount_cents: i64,
    occurred_on: NaiveDate,
    created_at: DateTime<Utc>,
}

impl From<CashEntryRow> for CashEntry {
    fn from(row: CashEntryRow) -> Self {
        CashEntry {
            id: row.id,
            tenant_id: row.tenant_id,
            category: row.category,
            description: row.description,
            amount: Money::from_cents(row.amount_cents),
            occurred_on: row.occurred_on,
            created_at: row.created_at,
        }
    }
}

/// Repository for the cash-flow ledger.
#[derive(Debug, Clone)]
pub struct CashEntryRepository {
    pool: SqlitePool,
}

impl CashEntryRepository {
    /// Creates a new CashEntryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CashEntryRepository { pool }
    }

    /// Validates and records a ledger entry.
    ///
    /// ## Rules
    /// - `amount` must be positive
    /// - `description` may be empty; otherwise at most 120 characters
    pub async fn create(
        &self,
        tenant_id: &str,
        category: CashCategory,
        description: &str,
        amount: Money,
        occurred_on: NaiveDate,
    ) -> DbResult<CashEntry> {
        validate_entry_amount(amount)?;
        let description = match description.trim() {
            "" => String::new(),
            text => validate_name("description", text)?,
        };

        let entry = CashEntry {
            id: generate_id(),
            tenant_id: tenant_id.to_string(),
            category,
            description,
            amount,
            occurred_on,
            created_at: Utc::now(),
        };

        self.insert(&entry).await
    }

    /// Inserts an entry as given.
    pub async fn insert(&self, entry: &CashEntry) -> DbResult<CashEntry> {
        debug!(
            category = %entry.category,
            amount = %entry.amount,
            occurred_on = %entry.occurred_on,
            "Recording cash entry"
        );

        sqlx::query(
            r#"
            INSERT INTO cash_entries (
                id, tenant_id, category, description, amount_cents,
                occurred_on, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.tenant_id)
        .bind(entry.category.as_str())
        .bind(&entry.description)
        .bind(entry.amount.cents())
        .bind(entry.occurred_on)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(entry.clone())
    }

    /// Entries dated within `[from, to]`, oldest first.
    pub async fn list_between(
        &self,
        tenant_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<Vec<CashEntry>> {
        if from > to {
            return Err(ValidationError::InvalidFormat {
                field: "period".to_string(),
                reason: format!("{from} is after {to}"),
            }
            .into());
        }

        let rows = sqlx::query_as::<_, CashEntryRow>(
            r#"
            SELECT id, tenant_id, category, description, amount_cents, occurred_on, created_at
            FROM cash_entries
            WHERE tenant_id = ?1 AND occurred_on BETWEEN ?2 AND ?3
            ORDER BY occurred_on, rowid
            "#,
        )
        .bind(tenant_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), %from, %to, "Loaded cash entries");
        Ok(rows.into_iter().map(CashEntry::from).collect())
    }

    /// Net of every entry dated before `date` (the opening balance of a
    /// period starting on `date`).
    pub async fn balance_before(&self, tenant_id: &str, date: NaiveDate) -> DbResult<Money> {
        let inflow_categories = CashCategory::ALL
            .iter()
            .filter(|c| c.direction() == CashDirection::Inflow)
            .map(|c| format!("'{}'", c.as_str()))
            .collect::<Vec<_>>()
            .join(", ");

        let cents: i64 = sqlx::query_scalar(&format!(
            r#"
            SELECT COALESCE(SUM(
                CASE WHEN category IN ({inflow_categories}) THEN amount_cents ELSE -amount_cents END
            ), 0)
            FROM cash_entries
            WHERE tenant_id = ?1 AND occurred_on < ?2
            "#
        ))
        .bind(tenant_id)
        .bind(date)
        .fetch_one(&self.pool)
        .await?;

        Ok(Money::from_cents(cents))
    }

    /// Deletes one of the tenant's entries.
    pub async fn delete(&self, tenant_id: &str, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting cash entry");

        let result = sqlx::query("DELETE FROM cash_entries WHERE id = ?1 AND tenant_id = ?2")
            .bind(id)
            .bind(tenant_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("CashEntry", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig, DbError};
    use chrono::NaiveDate;
    use larder_core::{CashCategory, IncomeStatement, Money, DEFAULT_TENANT_ID};

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, d).unwrap()
    }

    async fn seeded() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.cash_entries();
        for (category, cents, date) in [
            (CashCategory::Sales, 900_000, day(1, 31)),
            (CashCategory::Rent, 300_000, day(1, 5)),
            (CashCategory::Sales, 1_000_000, day(2, 28)),
            (CashCategory::SalesTax, 60_000, day(2, 28)),
            (CashCategory::Ingredients, 320_000, day(2, 10)),
            (CashCategory::Payroll, 250_000, day(2, 5)),
            (CashCategory::Sales, 50_000, day(3, 1)),
        ] {
            repo.create(DEFAULT_TENANT_ID, category, "", Money::from_cents(cents), date)
                .await
                .unwrap();
        }
        db
    }

    #[tokio::test]
    async fn test_list_between_is_inclusive_and_sorted() {
        let db = seeded().await;
        let entries = db
            .cash_entries()
            .list_between(DEFAULT_TENANT_ID, day(2, 1), day(2, 28))
            .await
            .unwrap();

        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].category, CashCategory::Payroll);
        assert_eq!(entries[3].occurred_on, day(2, 28));

        let dre = IncomeStatement::from_entries(&entries);
        assert_eq!(dre.net_revenue.cents(), 940_000);
        assert_eq!(dre.operating_result.cents(), 370_000);
    }

    #[tokio::test]
    async fn test_list_between_rejects_inverted_period() {
        let db = seeded().await;
        let err = db
            .cash_entries()
            .list_between(DEFAULT_TENANT_ID, day(3, 1), day(2, 1))
            .await
            .unwrap_err();
        assert!(err.as_domain().is_some());
    }

    #[tokio::test]
    async fn test_balance_before() {
        let db = seeded().await;
        let repo = db.cash_entries();

        assert_eq!(repo.balance_before(DEFAULT_TENANT_ID, day(1, 1)).await.unwrap(), Money::zero());
        assert_eq!(
            repo.balance_before(DEFAULT_TENANT_ID, day(2, 1)).await.unwrap().cents(),
            600_000
        );
    }

    #[tokio::test]
    async fn test_create_validates_and_delete() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.cash_entries();

        assert!(repo
            .create(DEFAULT_TENANT_ID, CashCategory::Rent, "", Money::zero(), day(1, 1))
            .await
            .is_err());

        let entry = repo
            .create(
                DEFAULT_TENANT_ID,
                CashCategory::Marketing,
                "  Flyers ",
                Money::from_cents(15_000),
                day(1, 2),
            )
            .await
            .unwrap();
        assert_eq!(entry.description, "Flyers");

        assert!(matches!(
            repo.delete("other-tenant", &entry.id).await,
            Err(DbError::NotFound { .. })
        ));
        repo.delete(DEFAULT_TENANT_ID, &entry.id).await.unwrap();
        assert!(matches!(
            repo.delete(DEFAULT_TENANT_ID, &entry.id).await,
            Err(DbError::NotFound { .. })
        ));
        assert!(repo
            .list_between(DEFAULT_TENANT_ID, day(1, 1), day(12, 31))
            .await
            .unwrap()
            .is_empty());
    }
}
