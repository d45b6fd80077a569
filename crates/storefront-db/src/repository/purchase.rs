//! # Purchase Repository
//!
//! Database operations for purchases and purchase lines.
//!
//! ## Purchase Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Purchase Lifecycle                                  │
//! │                                                                         │
//! │  1. FINALIZE (single transaction, driven by the operation layer)       │
//! │     └── insert_purchase()                                              │
//! │     └── insert_line() × N      (price snapshots from the cart)         │
//! │     └── CartRepository::delete_cart()                                  │
//! │     └── COMMIT                                                          │
//! │                                                                         │
//! │  2. READS                                                              │
//! │     └── get_by_id() / get_lines() / list_by_customer()                 │
//! │                                                                         │
//! │  There is no step 3. Purchases are never mutated after the commit.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! Line unit prices are copied from the catalog at finalization time and
//! stored on the line. Later catalog price changes never touch them.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use crate::repository::parse_decimal;
use storefront_core::{Purchase, PurchaseLine};

#[derive(Debug, FromRow)]
struct PurchaseRow {
    id: String,
    customer_id: String,
    account_id: String,
    purchase_date: DateTime<Utc>,
    discount_applied: bool,
    discount_amount: String,
}

impl PurchaseRow {
    fn into_purchase(self) -> DbResult<Purchase> {
        Ok(Purchase {
            discount_amount: parse_decimal("discount_amount", &self.discount_amount)?,
            id: self.id,
            customer_id: self.customer_id,
            account_id: self.account_id,
            purchase_date: self.purchase_date,
            discount_applied: self.discount_applied,
        })
    }
}

#[derive(Debug, FromRow)]
struct PurchaseLineRow {
    id: String,
    purchase_id: String,
    item_id: String,
    quantity: i64,
    unit_price: String,
    created_at: DateTime<Utc>,
}

impl PurchaseLineRow {
    fn into_line(self) -> DbResult<PurchaseLine> {
        Ok(PurchaseLine {
            unit_price: parse_decimal("unit_price", &self.unit_price)?,
            id: self.id,
            purchase_id: self.purchase_id,
            item_id: self.item_id,
            quantity: self.quantity,
            created_at: self.created_at,
        })
    }
}

/// Repository for purchase database operations.
#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

impl PurchaseRepository {
    /// Creates a new PurchaseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseRepository { pool }
    }

    /// Gets a purchase by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Purchase>> {
        let row: Option<PurchaseRow> = sqlx::query_as(
            r#"
            SELECT id, customer_id, account_id, purchase_date,
                   discount_applied, discount_amount
            FROM purchases
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(PurchaseRow::into_purchase).transpose()
    }

    /// Gets all lines for a purchase, in snapshot order.
    pub async fn get_lines(&self, purchase_id: &str) -> DbResult<Vec<PurchaseLine>> {
        let rows: Vec<PurchaseLineRow> = sqlx::query_as(
            r#"
            SELECT id, purchase_id, item_id, quantity, unit_price, created_at
            FROM purchase_lines
            WHERE purchase_id = ?1
            ORDER BY created_at, id
            "#,
        )
        .bind(purchase_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PurchaseLineRow::into_line).collect()
    }

    /// Lists a customer's purchases, most recent first.
    pub async fn list_by_customer(&self, customer_id: &str) -> DbResult<Vec<Purchase>> {
        let rows: Vec<PurchaseRow> = sqlx::query_as(
            r#"
            SELECT id, customer_id, account_id, purchase_date,
                   discount_applied, discount_amount
            FROM purchases
            WHERE customer_id = ?1
            ORDER BY purchase_date DESC, id
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PurchaseRow::into_purchase).collect()
    }

    /// Inserts a purchase row.
    ///
    /// Transactional: staged alongside its lines and the cart deletion so
    /// the whole finalization commits or rolls back as one.
    pub async fn insert_purchase(
        &self,
        conn: &mut SqliteConnection,
        purchase: &Purchase,
    ) -> DbResult<()> {
        debug!(id = %purchase.id, customer_id = %purchase.customer_id, "Inserting purchase");

        sqlx::query(
            r#"
            INSERT INTO purchases (
                id, customer_id, account_id, purchase_date,
                discount_applied, discount_amount
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&purchase.id)
        .bind(&purchase.customer_id)
        .bind(&purchase.account_id)
        .bind(purchase.purchase_date)
        .bind(purchase.discount_applied)
        .bind(purchase.discount_amount.to_string())
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Inserts a purchase line carrying its frozen price snapshot.
    pub async fn insert_line(
        &self,
        conn: &mut SqliteConnection,
        line: &PurchaseLine,
    ) -> DbResult<()> {
        debug!(purchase_id = %line.purchase_id, item_id = %line.item_id, "Inserting purchase line");

        sqlx::query(
            r#"
            INSERT INTO purchase_lines (
                id, purchase_id, item_id, quantity, unit_price, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&line.id)
        .bind(&line.purchase_id)
        .bind(&line.item_id)
        .bind(line.quantity)
        .bind(line.unit_price.to_string())
        .bind(line.created_at)
        .execute(conn)
        .await?;

        Ok(())
    }
}
