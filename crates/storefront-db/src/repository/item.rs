//! # Item Repository
//!
//! Read access to the catalog. Items are administratively managed elsewhere;
//! the workflow reads prices here and *copies* them into purchase lines.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::parse_decimal;
use storefront_core::Item;

#[derive(Debug, FromRow)]
struct ItemRow {
    id: String,
    description: String,
    price: String,
    stock_quantity: i64,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ItemRow {
    fn into_item(self) -> DbResult<Item> {
        Ok(Item {
            price: parse_decimal("price", &self.price)?,
            id: self.id,
            description: self.description,
            stock_quantity: self.stock_quantity,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Repository for catalog item operations.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    /// Creates a new ItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Gets an item by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Item>> {
        let row: Option<ItemRow> = sqlx::query_as(
            r#"
            SELECT id, description, price, stock_quantity, is_active, created_at, updated_at
            FROM items
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ItemRow::into_item).transpose()
    }

    /// Lists all items, oldest first.
    pub async fn list_all(&self) -> DbResult<Vec<Item>> {
        let rows: Vec<ItemRow> = sqlx::query_as(
            r#"
            SELECT id, description, price, stock_quantity, is_active, created_at, updated_at
            FROM items
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ItemRow::into_item).collect()
    }

    /// Updates an item's catalog price (administrative path).
    ///
    /// Existing purchase lines are unaffected: they carry their own frozen
    /// price snapshot.
    pub async fn update_price(
        &self,
        id: &str,
        price: Decimal,
        updated_at: DateTime<Utc>,
    ) -> DbResult<()> {
        debug!(id = %id, price = %price, "Updating item price");

        let result = sqlx::query(
            r#"
            UPDATE items SET price = ?2, updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(price.to_string())
        .bind(updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", id));
        }

        Ok(())
    }

    /// Inserts an item (bootstrap/test fixture path).
    pub async fn insert(&self, item: &Item) -> DbResult<()> {
        debug!(id = %item.id, "Inserting item");

        sqlx::query(
            r#"
            INSERT INTO items (
                id, description, price, stock_quantity, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&item.id)
        .bind(&item.description)
        .bind(item.price.to_string())
        .bind(item.stock_quantity)
        .bind(item.is_active)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
