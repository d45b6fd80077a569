//! # Cart Repository
//!
//! Database operations for carts and cart lines.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Cart Lifecycle                                    │
//! │                                                                         │
//! │  1. FIRST ADD                                                          │
//! │     └── insert_cart() + insert_line()  (one transaction)               │
//! │                                                                         │
//! │  2. MUTATIONS                                                          │
//! │     └── insert_line()            new item                              │
//! │     └── update_line_quantity()   merge / explicit update               │
//! │     └── delete_line()            remove item (cart row survives)       │
//! │                                                                         │
//! │  3. FINALIZE (purchase module drives this)                             │
//! │     └── delete_cart()  removes the cart and all lines, in the same     │
//! │         transaction that inserts the purchase                          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The "one cart per customer" rule is load-bearing here: lookups are always
//! by customer id, and the UNIQUE(customer_id) constraint plus the service
//! layer's per-customer lock make find-or-create atomic.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::parse_decimal;
use storefront_core::{Cart, CartLine};

#[derive(Debug, FromRow)]
struct CartRow {
    id: String,
    customer_id: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct CartLineRow {
    id: String,
    cart_id: String,
    item_id: String,
    quantity: i64,
    created_by: String,
    created_at: DateTime<Utc>,
    modified_by: Option<String>,
    modified_at: Option<DateTime<Utc>>,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        CartLine {
            id: row.id,
            cart_id: row.cart_id,
            item_id: row.item_id,
            quantity: row.quantity,
            created_by: row.created_by,
            created_at: row.created_at,
            modified_by: row.modified_by,
            modified_at: row.modified_at,
        }
    }
}

/// A cart line joined with the current catalog detail of its item.
///
/// The price here is the item's *current* price. Carts never freeze prices;
/// the snapshot happens only at purchase time.
#[derive(Debug, Clone)]
pub struct CartLineDetail {
    pub line: CartLine,
    pub description: String,
    pub unit_price: Decimal,
}

#[derive(Debug, FromRow)]
struct CartLineDetailRow {
    id: String,
    cart_id: String,
    item_id: String,
    quantity: i64,
    created_by: String,
    created_at: DateTime<Utc>,
    modified_by: Option<String>,
    modified_at: Option<DateTime<Utc>>,
    description: String,
    price: String,
}

impl CartLineDetailRow {
    fn into_detail(self) -> DbResult<CartLineDetail> {
        Ok(CartLineDetail {
            unit_price: parse_decimal("price", &self.price)?,
            description: self.description,
            line: CartLine {
                id: self.id,
                cart_id: self.cart_id,
                item_id: self.item_id,
                quantity: self.quantity,
                created_by: self.created_by,
                created_at: self.created_at,
                modified_by: self.modified_by,
                modified_at: self.modified_at,
            },
        })
    }
}

/// Repository for cart database operations.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    /// Creates a new CartRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// Finds a customer's cart with its lines, if one exists.
    pub async fn find_by_customer(&self, customer_id: &str) -> DbResult<Option<Cart>> {
        let row: Option<CartRow> = sqlx::query_as(
            r#"
            SELECT id, customer_id, created_at
            FROM carts
            WHERE customer_id = ?1
            "#,
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.load_lines(row).await?)),
            None => Ok(None),
        }
    }

    /// Finds a cart by id with its lines.
    pub async fn find_by_id(&self, cart_id: &str) -> DbResult<Option<Cart>> {
        let row: Option<CartRow> = sqlx::query_as(
            r#"
            SELECT id, customer_id, created_at
            FROM carts
            WHERE id = ?1
            "#,
        )
        .bind(cart_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.load_lines(row).await?)),
            None => Ok(None),
        }
    }

    async fn load_lines(&self, row: CartRow) -> DbResult<Cart> {
        let lines: Vec<CartLineRow> = sqlx::query_as(
            r#"
            SELECT id, cart_id, item_id, quantity,
                   created_by, created_at, modified_by, modified_at
            FROM cart_lines
            WHERE cart_id = ?1
            ORDER BY created_at, id
            "#,
        )
        .bind(&row.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Cart {
            id: row.id,
            customer_id: row.customer_id,
            created_at: row.created_at,
            lines: lines.into_iter().map(CartLine::from).collect(),
        })
    }

    /// Returns a cart's lines joined with item description and current price.
    pub async fn lines_with_items(&self, cart_id: &str) -> DbResult<Vec<CartLineDetail>> {
        let rows: Vec<CartLineDetailRow> = sqlx::query_as(
            r#"
            SELECT cl.id, cl.cart_id, cl.item_id, cl.quantity,
                   cl.created_by, cl.created_at, cl.modified_by, cl.modified_at,
                   i.description, i.price
            FROM cart_lines cl
            JOIN items i ON i.id = cl.item_id
            WHERE cl.cart_id = ?1
            ORDER BY cl.created_at, cl.id
            "#,
        )
        .bind(cart_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(CartLineDetailRow::into_detail).collect()
    }

    /// Gets a single cart line by id.
    pub async fn get_line(&self, line_id: &str) -> DbResult<Option<CartLine>> {
        let row: Option<CartLineRow> = sqlx::query_as(
            r#"
            SELECT id, cart_id, item_id, quantity,
                   created_by, created_at, modified_by, modified_at
            FROM cart_lines
            WHERE id = ?1
            "#,
        )
        .bind(line_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CartLine::from))
    }

    /// Inserts a cart row (lines are inserted separately).
    ///
    /// Transactional: the UNIQUE(customer_id) constraint makes a racing
    /// second insert fail instead of creating a duplicate cart.
    pub async fn insert_cart(&self, conn: &mut SqliteConnection, cart: &Cart) -> DbResult<()> {
        debug!(id = %cart.id, customer_id = %cart.customer_id, "Inserting cart");

        sqlx::query(
            r#"
            INSERT INTO carts (id, customer_id, created_at)
            VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(&cart.id)
        .bind(&cart.customer_id)
        .bind(cart.created_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Inserts a cart line.
    pub async fn insert_line(&self, conn: &mut SqliteConnection, line: &CartLine) -> DbResult<()> {
        debug!(cart_id = %line.cart_id, item_id = %line.item_id, "Inserting cart line");

        sqlx::query(
            r#"
            INSERT INTO cart_lines (
                id, cart_id, item_id, quantity,
                created_by, created_at, modified_by, modified_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&line.id)
        .bind(&line.cart_id)
        .bind(&line.item_id)
        .bind(line.quantity)
        .bind(&line.created_by)
        .bind(line.created_at)
        .bind(&line.modified_by)
        .bind(line.modified_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Overwrites a line's quantity and modification metadata.
    pub async fn update_line_quantity(
        &self,
        conn: &mut SqliteConnection,
        line_id: &str,
        quantity: i64,
        modified_by: &str,
        modified_at: DateTime<Utc>,
    ) -> DbResult<()> {
        debug!(line_id = %line_id, quantity = %quantity, "Updating cart line quantity");

        let result = sqlx::query(
            r#"
            UPDATE cart_lines SET
                quantity = ?2,
                modified_by = ?3,
                modified_at = ?4
            WHERE id = ?1
            "#,
        )
        .bind(line_id)
        .bind(quantity)
        .bind(modified_by)
        .bind(modified_at)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Cart line", line_id));
        }

        Ok(())
    }

    /// Deletes a single line. The cart row survives even when empty.
    pub async fn delete_line(&self, conn: &mut SqliteConnection, line_id: &str) -> DbResult<()> {
        debug!(line_id = %line_id, "Deleting cart line");

        let result = sqlx::query("DELETE FROM cart_lines WHERE id = ?1")
            .bind(line_id)
            .execute(conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Cart line", line_id));
        }

        Ok(())
    }

    /// Deletes a cart and all its lines.
    ///
    /// Called only from the purchase finalizer, on the same transaction that
    /// inserts the purchase.
    pub async fn delete_cart(&self, conn: &mut SqliteConnection, cart_id: &str) -> DbResult<()> {
        debug!(cart_id = %cart_id, "Deleting cart");

        sqlx::query("DELETE FROM cart_lines WHERE cart_id = ?1")
            .bind(cart_id)
            .execute(&mut *conn)
            .await?;

        let result = sqlx::query("DELETE FROM carts WHERE id = ?1")
            .bind(cart_id)
            .execute(conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Cart", cart_id));
        }

        Ok(())
    }
}
