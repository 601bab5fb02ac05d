//! # Ingredient Repository
//!
//! Database operations for the ingredient catalogue.
//!
//! ## Key Operations
//! - Create with validation (name, price, correction factor)
//! - Name search (case-insensitive substring)
//! - Price updates, which every technical sheet picks up on its next costing
//! - Soft delete

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::SqlitePool;
use tracing::debug;

use larder_core::validation::{validate_correction_factor, validate_name, validate_non_negative};
use larder_core::{Ingredient, Unit};

use super::{generate_id, like_pattern, parse_decimal};
use crate::error::{DbError, DbResult};

const COLUMNS: &str = "id, tenant_id, name, unit, unit_price, correction_factor, \
                       is_active, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct IngredientRow {
    id: String,
    tenant_id: String,
    name: String,
    unit: Unit,
    unit_price: String,
    correction_factor: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<IngredientRow> for Ingredient {
    type Error = DbError;

    fn try_from(row: IngredientRow) -> DbResult<Self> {
        Ok(Ingredient {
            unit_price: parse_decimal("ingredients.unit_price", &row.unit_price)?,
            correction_factor: parse_decimal(
                "ingredients.correction_factor",
                &row.correction_factor,
            )?,
            id: row.id,
            tenant_id: row.tenant_id,
            name: row.name,
            unit: row.unit,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_ingredients(rows: Vec<IngredientRow>) -> DbResult<Vec<Ingredient>> {
    rows.into_iter().map(Ingredient::try_from).collect()
}

/// Repository for ingredient database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.ingredients();
/// let onion = repo.create(tenant, "Cebola", Unit::Kg, dec!(6.90), dec!(1.1)).await?;
/// let hits = repo.search(tenant, "ceb", 20).await?;
/// ```
#[derive(Debug, Clone)]
pub struct IngredientRepository {
    pool: SqlitePool,
}

impl IngredientRepository {
    /// Creates a new IngredientRepository.
    pub fn new(pool: SqlitePool) -> Self {
        IngredientRepository { pool }
    }

    /// Validates and inserts a new active ingredient.
    ///
    /// ## Rules
    /// - `name`: non-empty after trimming, at most 120 characters
    /// - `unit_price`: `>= 0`
    /// - `correction_factor`: `>= 1`
    pub async fn create(
        &self,
        tenant_id: &str,
        name: &str,
        unit: Unit,
        unit_price: Decimal,
        correction_factor: Decimal,
    ) -> DbResult<Ingredient> {
        let name = validate_name("name", name)?;
        validate_non_negative("unit_price", unit_price)?;
        validate_correction_factor(correction_factor)?;

        let now = Utc::now();
        let ingredient = Ingredient {
            id: generate_id(),
            tenant_id: tenant_id.to_string(),
            name,
            unit,
            unit_price,
            correction_factor,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        self.insert(&ingredient).await
    }

    /// Inserts an ingredient as given (id generated beforehand).
    pub async fn insert(&self, ingredient: &Ingredient) -> DbResult<Ingredient> {
        debug!(name = %ingredient.name, unit = %ingredient.unit, "Inserting ingredient");

        sqlx::query(
            r#"
            INSERT INTO ingredients (
                id, tenant_id, name, unit, unit_price, correction_factor,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&ingredient.id)
        .bind(&ingredient.tenant_id)
        .bind(&ingredient.name)
        .bind(ingredient.unit.as_str())
        .bind(ingredient.unit_price.to_string())
        .bind(ingredient.correction_factor.to_string())
        .bind(ingredient.is_active)
        .bind(ingredient.created_at)
        .bind(ingredient.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(ingredient.clone())
    }

    /// Gets an ingredient by its ID, active or not.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Ingredient>> {
        let row = sqlx::query_as::<_, IngredientRow>(&format!(
            "SELECT {COLUMNS} FROM ingredients WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Ingredient::try_from).transpose()
    }

    /// Lists active ingredients sorted by name.
    pub async fn list_active(&self, tenant_id: &str, limit: u32) -> DbResult<Vec<Ingredient>> {
        let rows = sqlx::query_as::<_, IngredientRow>(&format!(
            r#"
            SELECT {COLUMNS} FROM ingredients
            WHERE tenant_id = ?1 AND is_active = 1
            ORDER BY name COLLATE NOCASE
            LIMIT ?2
            "#
        ))
        .bind(tenant_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        into_ingredients(rows)
    }

    /// Searches active ingredients by name. An empty query lists all.
    pub async fn search(
        &self,
        tenant_id: &str,
        query: &str,
        limit: u32,
    ) -> DbResult<Vec<Ingredient>> {
        let query = query.trim();

        debug!(query = %query, limit = %limit, "Searching ingredients");

        if query.is_empty() {
            return self.list_active(tenant_id, limit).await;
        }

        let rows = sqlx::query_as::<_, IngredientRow>(&format!(
            r#"
            SELECT {COLUMNS} FROM ingredients
            WHERE tenant_id = ?1 AND is_active = 1
            AND name LIKE ?2 ESCAPE '\'
            ORDER BY name COLLATE NOCASE
            LIMIT ?3
            "#
        ))
        .bind(tenant_id)
        .bind(like_pattern(query))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Search returned ingredients");
        into_ingredients(rows)
    }

    /// Sets a new purchase price for an active ingredient.
    pub async fn update_price(&self, id: &str, unit_price: Decimal) -> DbResult<()> {
        validate_non_negative("unit_price", unit_price)?;

        debug!(id = %id, unit_price = %unit_price, "Updating ingredient price");

        let result = sqlx::query(
            r#"
            UPDATE ingredients
            SET unit_price = ?2, updated_at = ?3
            WHERE id = ?1 AND is_active = 1
            "#,
        )
        .bind(id)
        .bind(unit_price.to_string())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Ingredient", id));
        }

        Ok(())
    }

    /// Soft-deletes an ingredient by setting is_active = false.
    ///
    /// Sheets that already use it keep costing with its last price.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting ingredient");

        let result = sqlx::query(
            r#"
            UPDATE ingredients
            SET is_active = 0, updated_at = ?2
            WHERE id = ?1 AND is_active = 1
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Ingredient", id));
        }

        Ok(())
    }

    /// Counts active ingredients.
    pub async fn count(&self, tenant_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM ingredients WHERE tenant_id = ?1 AND is_active = 1",
        )
        .bind(tenant_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig, DbError};
    use larder_core::{CoreError, Unit, ValidationError, DEFAULT_TENANT_ID};
    use rust_decimal_macros::dec;

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let db = db().await;
        let repo = db.ingredients();

        let created = repo
            .create(DEFAULT_TENANT_ID, "  Tomate italiano ", Unit::Kg, dec!(7.49), dec!(1.1))
            .await
            .unwrap();
        assert_eq!(created.name, "Tomate italiano");

        let loaded = repo.get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Tomate italiano");
        assert_eq!(loaded.unit, Unit::Kg);
        assert_eq!(loaded.unit_price, dec!(7.49));
        assert_eq!(loaded.correction_factor, dec!(1.1));
        assert!(loaded.is_active);

        assert!(repo.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_validates() {
        let db = db().await;
        let repo = db.ingredients();

        let err = repo
            .create(DEFAULT_TENANT_ID, " ", Unit::G, dec!(1), dec!(1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::Required { .. }))
        ));

        assert!(repo
            .create(DEFAULT_TENANT_ID, "Sal", Unit::G, dec!(-0.01), dec!(1))
            .await
            .is_err());
        assert!(repo
            .create(DEFAULT_TENANT_ID, "Sal", Unit::G, dec!(0.01), dec!(0.5))
            .await
            .is_err());
        assert_eq!(repo.count(DEFAULT_TENANT_ID).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_search_and_list() {
        let db = db().await;
        let repo = db.ingredients();

        for (name, unit) in [
            ("Cebola", Unit::Kg),
            ("Cebolinha", Unit::G),
            ("Azeite 100%", Unit::Ml),
            ("Ovo", Unit::Unit),
        ] {
            repo.create(DEFAULT_TENANT_ID, name, unit, dec!(1), dec!(1))
                .await
                .unwrap();
        }

        let hits = repo.search(DEFAULT_TENANT_ID, "CEBO", 10).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].name, "Cebola");

        let hits = repo.search(DEFAULT_TENANT_ID, "100%", 10).await.unwrap();
        assert_eq!(hits.len(), 1);

        let all = repo.search(DEFAULT_TENANT_ID, "", 10).await.unwrap();
        let names: Vec<_> = all.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["Azeite 100%", "Cebola", "Cebolinha", "Ovo"]);

        assert_eq!(repo.list_active(DEFAULT_TENANT_ID, 2).await.unwrap().len(), 2);
        assert!(repo.list_active("other-tenant", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_price() {
        let db = db().await;
        let repo = db.ingredients();
        let milk = repo
            .create(DEFAULT_TENANT_ID, "Leite", Unit::L, dec!(4.99), dec!(1))
            .await
            .unwrap();

        repo.update_price(&milk.id, dec!(5.49)).await.unwrap();
        let loaded = repo.get_by_id(&milk.id).await.unwrap().unwrap();
        assert_eq!(loaded.unit_price, dec!(5.49));

        assert!(repo.update_price(&milk.id, dec!(-1)).await.is_err());
        assert!(matches!(
            repo.update_price("missing", dec!(1)).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_soft_delete() {
        let db = db().await;
        let repo = db.ingredients();
        let egg = repo
            .create(DEFAULT_TENANT_ID, "Ovo", Unit::Unit, dec!(0.8), dec!(1))
            .await
            .unwrap();

        repo.soft_delete(&egg.id).await.unwrap();

        assert_eq!(repo.count(DEFAULT_TENANT_ID).await.unwrap(), 0);
        assert!(!repo.get_by_id(&egg.id).await.unwrap().unwrap().is_active);
        assert!(repo.soft_delete(&egg.id).await.is_err());
        assert!(repo.update_price(&egg.id, dec!(1)).await.is_err());
    }

    #[tokio::test]
    async fn test_corrupt_price_is_reported() {
        let db = db().await;
        let repo = db.ingredients();
        let flour = repo
            .create(DEFAULT_TENANT_ID, "Farinha", Unit::Kg, dec!(3), dec!(1))
            .await
            .unwrap();

        sqlx::query("UPDATE ingredients SET unit_price = 'abc' WHERE id = ?1")
            .bind(&flour.id)
            .execute(db.pool())
            .await
            .unwrap();

        let err = repo.get_by_id(&flour.id).await.unwrap_err();
        assert!(matches!(err, DbError::Corrupt { .. }));
    }
}
