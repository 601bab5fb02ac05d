//! # Technical Sheet Repository
//!
//! Database operations for technical sheets (recipes) and their items.
//!
//! ## Sheet Structure
//! ```text
//! technical_sheets                 technical_sheet_items             ingredients
//! ┌──────────────────────┐        ┌────────────────────────┐        ┌──────────────┐
//! │ id                   │◄───────│ sheet_id               │        │ id           │
//! │ name  "Feijoada"     │   1:N  │ ingredient_id ─────────┼───────►│ unit_price   │
//! │ yield_portions  8    │        │ net_quantity  0.500    │        │ correction_f │
//! └──────────────────────┘        └────────────────────────┘        └──────────────┘
//!                                   UNIQUE(sheet_id, ingredient_id)
//! ```
//!
//! Adding an ingredient that is already on the sheet replaces its quantity.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::SqlitePool;
use tracing::debug;

use larder_core::validation::{validate_name, validate_positive, validate_yield_portions};
use larder_core::{CoreError, SheetLine, TechnicalSheet, TechnicalSheetItem, Unit};

use super::ingredient::IngredientRepository;
use super::{generate_id, parse_decimal};
use crate::error::{DbError, DbResult};

const SHEET_COLUMNS: &str =
    "id, tenant_id, name, yield_portions, notes, is_active, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct SheetItemRow {
    id: String,
    sheet_id: String,
    ingredient_id: String,
    net_quantity: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<SheetItemRow> for TechnicalSheetItem {
    type Error = DbError;

    fn try_from(row: SheetItemRow) -> DbResult<Self> {
        Ok(TechnicalSheetItem {
            net_quantity: parse_decimal("technical_sheet_items.net_quantity", &row.net_quantity)?,
            id: row.id,
            sheet_id: row.sheet_id,
            ingredient_id: row.ingredient_id,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SheetLineRow {
    item_id: String,
    ingredient_id: String,
    ingredient_name: String,
    unit: Unit,
    unit_price: String,
    correction_factor: String,
    net_quantity: String,
}

impl TryFrom<SheetLineRow> for SheetLine {
    type Error = DbError;

    fn try_from(row: SheetLineRow) -> DbResult<Self> {
        Ok(SheetLine {
            unit_price: parse_decimal("ingredients.unit_price", &row.unit_price)?,
            correction_factor: parse_decimal(
                "ingredients.correction_factor",
                &row.correction_factor,
            )?,
            net_quantity: parse_decimal("technical_sheet_items.net_quantity", &row.net_quantity)?,
            item_id: row.item_id,
            ingredient_id: row.ingredient_id,
            ingredient_name: row.ingredient_name,
            unit: row.unit,
        })
    }
}

/// Repository for technical sheet database operations.
#[derive(Debug, Clone)]
pub struct TechnicalSheetRepository {
    pool: SqlitePool,
}

impl TechnicalSheetRepository {
    /// Creates a new TechnicalSheetRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TechnicalSheetRepository { pool }
    }

    /// Validates and inserts a new, empty technical sheet.
    ///
    /// Plan quotas are not checked here; callers run
    /// `ensure_sheet_capacity` against [`count_active`](Self::count_active)
    /// first.
    pub async fn create(
        &self,
        tenant_id: &str,
        name: &str,
        yield_portions: i64,
        notes: Option<&str>,
    ) -> DbResult<TechnicalSheet> {
        let name = validate_name("name", name)?;
        validate_yield_portions(yield_portions)?;

        let now = Utc::now();
        let sheet = TechnicalSheet {
            id: generate_id(),
            tenant_id: tenant_id.to_string(),
            name,
            yield_portions,
            notes: notes
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        self.insert(&sheet).await
    }

    /// Inserts a technical sheet as given.
    pub async fn insert(&self, sheet: &TechnicalSheet) -> DbResult<TechnicalSheet> {
        debug!(name = %sheet.name, yield_portions = sheet.yield_portions, "Inserting technical sheet");

        sqlx::query(
            r#"
            INSERT INTO technical_sheets (
                id, tenant_id, name, yield_portions, notes,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&sheet.id)
        .bind(&sheet.tenant_id)
        .bind(&sheet.name)
        .bind(sheet.yield_portions)
        .bind(&sheet.notes)
        .bind(sheet.is_active)
        .bind(sheet.created_at)
        .bind(sheet.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(sheet.clone())
    }

    /// Gets a technical sheet by its ID, active or not.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<TechnicalSheet>> {
        let sheet = sqlx::query_as::<_, TechnicalSheet>(&format!(
            "SELECT {SHEET_COLUMNS} FROM technical_sheets WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sheet)
    }

    /// Lists active sheets sorted by name.
    pub async fn list_active(&self, tenant_id: &str) -> DbResult<Vec<TechnicalSheet>> {
        let sheets = sqlx::query_as::<_, TechnicalSheet>(&format!(
            r#"
            SELECT {SHEET_COLUMNS} FROM technical_sheets
            WHERE tenant_id = ?1 AND is_active = 1
            ORDER BY name COLLATE NOCASE
            "#
        ))
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sheets)
    }

    /// Counts active sheets (the figure plan quotas apply to).
    pub async fn count_active(&self, tenant_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM technical_sheets WHERE tenant_id = ?1 AND is_active = 1",
        )
        .bind(tenant_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Puts `net_quantity` of an ingredient on a sheet.
    ///
    /// ## Errors
    /// - `TechnicalSheetNotFound` / `IngredientNotFound` when either side is
    ///   missing or inactive
    /// - validation error when `net_quantity <= 0`
    pub async fn add_item(
        &self,
        sheet_id: &str,
        ingredient_id: &str,
        net_quantity: Decimal,
    ) -> DbResult<TechnicalSheetItem> {
        validate_positive("net_quantity", net_quantity)?;
        self.require_active(sheet_id).await?;

        IngredientRepository::new(self.pool.clone())
            .get_by_id(ingredient_id)
            .await?
            .filter(|ingredient| ingredient.is_active)
            .ok_or_else(|| CoreError::IngredientNotFound(ingredient_id.to_string()))?;

        debug!(
            sheet_id = %sheet_id,
            ingredient_id = %ingredient_id,
            net_quantity = %net_quantity,
            "Adding sheet item"
        );

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO technical_sheet_items (id, sheet_id, ingredient_id, net_quantity, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (sheet_id, ingredient_id)
            DO UPDATE SET net_quantity = excluded.net_quantity
            "#,
        )
        .bind(generate_id())
        .bind(sheet_id)
        .bind(ingredient_id)
        .bind(net_quantity.to_string())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE technical_sheets SET updated_at = ?2 WHERE id = ?1")
            .bind(sheet_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query_as::<_, SheetItemRow>(
            r#"
            SELECT id, sheet_id, ingredient_id, net_quantity, created_at
            FROM technical_sheet_items
            WHERE sheet_id = ?1 AND ingredient_id = ?2
            "#,
        )
        .bind(sheet_id)
        .bind(ingredient_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        TechnicalSheetItem::try_from(row)
    }

    /// Takes an ingredient off a sheet.
    pub async fn remove_item(&self, sheet_id: &str, ingredient_id: &str) -> DbResult<()> {
        debug!(sheet_id = %sheet_id, ingredient_id = %ingredient_id, "Removing sheet item");

        let result = sqlx::query(
            "DELETE FROM technical_sheet_items WHERE sheet_id = ?1 AND ingredient_id = ?2",
        )
        .bind(sheet_id)
        .bind(ingredient_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(
                "TechnicalSheetItem",
                format!("{sheet_id}/{ingredient_id}"),
            ));
        }

        Ok(())
    }

    /// Items of a sheet in insertion order.
    pub async fn items(&self, sheet_id: &str) -> DbResult<Vec<TechnicalSheetItem>> {
        let rows = sqlx::query_as::<_, SheetItemRow>(
            r#"
            SELECT id, sheet_id, ingredient_id, net_quantity, created_at
            FROM technical_sheet_items
            WHERE sheet_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(sheet_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TechnicalSheetItem::try_from).collect()
    }

    /// Items joined with their ingredient's current name, unit and price.
    pub async fn lines(&self, sheet_id: &str) -> DbResult<Vec<SheetLine>> {
        let rows = sqlx::query_as::<_, SheetLineRow>(
            r#"
            SELECT
                item.id             AS item_id,
                item.ingredient_id  AS ingredient_id,
                ing.name            AS ingredient_name,
                ing.unit            AS unit,
                ing.unit_price      AS unit_price,
                ing.correction_factor AS correction_factor,
                item.net_quantity   AS net_quantity
            FROM technical_sheet_items item
            INNER JOIN ingredients ing ON ing.id = item.ingredient_id
            WHERE item.sheet_id = ?1
            ORDER BY item.rowid
            "#,
        )
        .bind(sheet_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(SheetLine::try_from).collect()
    }

    /// Soft-deletes a sheet. It stops counting against the plan quota.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting technical sheet");

        let result = sqlx::query(
            r#"
            UPDATE technical_sheets
            SET is_active = 0, updated_at = ?2
            WHERE id = ?1 AND is_active = 1
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("TechnicalSheet", id));
        }

        Ok(())
    }

    async fn require_active(&self, sheet_id: &str) -> DbResult<TechnicalSheet> {
        self.get_by_id(sheet_id)
            .await?
            .filter(|sheet| sheet.is_active)
            .ok_or_else(|| CoreError::TechnicalSheetNotFound(sheet_id.to_string()).into())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig, DbError};
    use larder_core::{CoreError, Ingredient, Unit, DEFAULT_TENANT_ID};
    use rust_decimal_macros::dec;

    async fn setup() -> (Database, Ingredient, Ingredient) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let onion = db
            .ingredients()
            .create(DEFAULT_TENANT_ID, "Cebola", Unit::Kg, dec!(6), dec!(1.1))
            .await
            .unwrap();
        let garlic = db
            .ingredients()
            .create(DEFAULT_TENANT_ID, "Alho", Unit::G, dec!(0.04), dec!(1.2))
            .await
            .unwrap();
        (db, onion, garlic)
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let (db, _, _) = setup().await;
        let repo = db.sheets();

        let sheet = repo
            .create(DEFAULT_TENANT_ID, "Refogado", 10, Some("  base de tudo "))
            .await
            .unwrap();
        repo.create(DEFAULT_TENANT_ID, "Arroz", 4, Some("   ")).await.unwrap();

        let loaded = repo.get_by_id(&sheet.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Refogado");
        assert_eq!(loaded.yield_portions, 10);
        assert_eq!(loaded.notes.as_deref(), Some("base de tudo"));

        let names: Vec<_> = repo
            .list_active(DEFAULT_TENANT_ID)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, ["Arroz", "Refogado"]);
        assert_eq!(repo.count_active(DEFAULT_TENANT_ID).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_create_rejects_zero_yield() {
        let (db, _, _) = setup().await;
        let err = db
            .sheets()
            .create(DEFAULT_TENANT_ID, "Molho", 0, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_items_and_lines() {
        let (db, onion, garlic) = setup().await;
        let repo = db.sheets();
        let sheet = repo.create(DEFAULT_TENANT_ID, "Refogado", 10, None).await.unwrap();

        repo.add_item(&sheet.id, &onion.id, dec!(0.5)).await.unwrap();
        repo.add_item(&sheet.id, &garlic.id, dec!(30)).await.unwrap();

        // Re-adding replaces the quantity.
        let item = repo.add_item(&sheet.id, &onion.id, dec!(0.75)).await.unwrap();
        assert_eq!(item.net_quantity, dec!(0.75));

        let items = repo.items(&sheet.id).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].ingredient_id, onion.id);

        let lines = repo.lines(&sheet.id).await.unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].ingredient_name, "Cebola");
        assert_eq!(lines[0].unit, Unit::Kg);
        // 0.75 × 1.1 × 6
        assert_eq!(lines[0].cost().total_cost, dec!(4.95));
        // 30 × 1.2 × 0.04
        assert_eq!(lines[1].cost().total_cost, dec!(1.44));

        repo.remove_item(&sheet.id, &garlic.id).await.unwrap();
        assert_eq!(repo.lines(&sheet.id).await.unwrap().len(), 1);
        assert!(matches!(
            repo.remove_item(&sheet.id, &garlic.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_add_item_requires_active_records() {
        let (db, onion, _) = setup().await;
        let repo = db.sheets();
        let sheet = repo.create(DEFAULT_TENANT_ID, "Sopa", 6, None).await.unwrap();

        let err = repo.add_item("missing", &onion.id, dec!(1)).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::TechnicalSheetNotFound(_))));

        let err = repo.add_item(&sheet.id, "missing", dec!(1)).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::IngredientNotFound(_))));

        assert!(repo.add_item(&sheet.id, &onion.id, dec!(0)).await.is_err());

        db.ingredients().soft_delete(&onion.id).await.unwrap();
        assert!(repo.add_item(&sheet.id, &onion.id, dec!(1)).await.is_err());
    }

    #[tokio::test]
    async fn test_soft_delete_frees_quota() {
        let (db, _, _) = setup().await;
        let repo = db.sheets();
        let sheet = repo.create(DEFAULT_TENANT_ID, "Pudim", 12, None).await.unwrap();

        repo.soft_delete(&sheet.id).await.unwrap();

        assert_eq!(repo.count_active(DEFAULT_TENANT_ID).await.unwrap(), 0);
        assert!(repo.list_active(DEFAULT_TENANT_ID).await.unwrap().is_empty());
        assert!(repo.soft_delete(&sheet.id).await.is_err());
        assert!(db.sheet_costing(&sheet.id).await.is_err());
    }
}
