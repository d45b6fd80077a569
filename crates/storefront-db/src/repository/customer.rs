//! # Customer Repository
//!
//! Customer reads plus the single sanctioned write: the lifetime-spend
//! adjustment. Every other part of the workflow treats customers as
//! read-only snapshots.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::parse_decimal;
use storefront_core::Customer;

#[derive(Debug, FromRow)]
struct CustomerRow {
    id: String,
    account_id: String,
    date_joined: DateTime<Utc>,
    total_amount_spent: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CustomerRow {
    fn into_customer(self) -> DbResult<Customer> {
        Ok(Customer {
            total_amount_spent: parse_decimal("total_amount_spent", &self.total_amount_spent)?,
            id: self.id,
            account_id: self.account_id,
            date_joined: self.date_joined,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Gets a customer by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let row: Option<CustomerRow> = sqlx::query_as(
            r#"
            SELECT id, account_id, date_joined, total_amount_spent, created_at, updated_at
            FROM customers
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(CustomerRow::into_customer).transpose()
    }

    /// Gets the customer owned by an account, if one exists.
    ///
    /// Accounts map to at most one customer record.
    pub async fn get_by_account(&self, account_id: &str) -> DbResult<Option<Customer>> {
        let row: Option<CustomerRow> = sqlx::query_as(
            r#"
            SELECT id, account_id, date_joined, total_amount_spent, created_at, updated_at
            FROM customers
            WHERE account_id = ?1
            "#,
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(CustomerRow::into_customer).transpose()
    }

    /// Overwrites a customer's lifetime spend.
    ///
    /// Transactional: staged on the caller's unit of work. The guarded WHERE
    /// turns a vanished customer into NotFound instead of a silent no-op.
    pub async fn update_total_spent(
        &self,
        conn: &mut SqliteConnection,
        customer_id: &str,
        total_amount_spent: Decimal,
        updated_at: DateTime<Utc>,
    ) -> DbResult<()> {
        debug!(customer_id = %customer_id, total = %total_amount_spent, "Updating lifetime spend");

        let result = sqlx::query(
            r#"
            UPDATE customers SET
                total_amount_spent = ?2,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(customer_id)
        .bind(total_amount_spent.to_string())
        .bind(updated_at)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", customer_id));
        }

        Ok(())
    }

    /// Inserts a customer (bootstrap/test fixture path).
    pub async fn insert(&self, customer: &Customer) -> DbResult<()> {
        debug!(id = %customer.id, account_id = %customer.account_id, "Inserting customer");

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, account_id, date_joined, total_amount_spent, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.account_id)
        .bind(customer.date_joined)
        .bind(customer.total_amount_spent.to_string())
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
