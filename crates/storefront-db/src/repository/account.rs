//! # Account Repository
//!
//! Lookups across the identity boundary. Account lifecycle (registration,
//! credentials, sessions) is managed outside this core; the workflow only
//! resolves callers by id.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use storefront_core::Account;

#[derive(Debug, FromRow)]
struct AccountRow {
    id: String,
    email: String,
    created_at: DateTime<Utc>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Account {
            id: row.id,
            email: row.email,
            created_at: row.created_at,
        }
    }
}

/// Repository for account lookups.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    pool: SqlitePool,
}

impl AccountRepository {
    /// Creates a new AccountRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AccountRepository { pool }
    }

    /// Gets an account by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Account>> {
        let row: Option<AccountRow> = sqlx::query_as(
            r#"
            SELECT id, email, created_at
            FROM accounts
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Account::from))
    }

    /// Inserts an account (bootstrap/test fixture path).
    pub async fn insert(&self, account: &Account) -> DbResult<()> {
        debug!(id = %account.id, "Inserting account");

        sqlx::query(
            r#"
            INSERT INTO accounts (id, email, created_at)
            VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(&account.id)
        .bind(&account.email)
        .bind(account.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
