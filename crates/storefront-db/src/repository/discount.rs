//! # Discount Profile Repository
//!
//! Read access to promotional discount profiles. Profiles are
//! administratively managed elsewhere; the workflow resolves against the
//! active set and looks profiles up by name at purchase time.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use crate::repository::{parse_decimal, parse_decimal_opt};
use storefront_core::{DiscountProfile, DiscountType, ProfileStatus};

#[derive(Debug, FromRow)]
struct DiscountProfileRow {
    id: String,
    name: String,
    discount_type: DiscountType,
    minimum_months_as_member: Option<i64>,
    minimum_amount_spent: Option<String>,
    discount_percentage: String,
    status: ProfileStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DiscountProfileRow {
    fn into_profile(self) -> DbResult<DiscountProfile> {
        Ok(DiscountProfile {
            minimum_amount_spent: parse_decimal_opt(
                "minimum_amount_spent",
                self.minimum_amount_spent.as_deref(),
            )?,
            discount_percentage: parse_decimal("discount_percentage", &self.discount_percentage)?,
            id: self.id,
            name: self.name,
            discount_type: self.discount_type,
            minimum_months_as_member: self.minimum_months_as_member,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Repository for discount profile operations.
#[derive(Debug, Clone)]
pub struct DiscountProfileRepository {
    pool: SqlitePool,
}

impl DiscountProfileRepository {
    /// Creates a new DiscountProfileRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DiscountProfileRepository { pool }
    }

    /// Lists active profiles in creation order.
    ///
    /// Creation order is the documented tie-break for equal percentages, so
    /// the ordering here must stay deterministic.
    pub async fn list_active(&self) -> DbResult<Vec<DiscountProfile>> {
        let rows: Vec<DiscountProfileRow> = sqlx::query_as(
            r#"
            SELECT id, name, discount_type, minimum_months_as_member,
                   minimum_amount_spent, discount_percentage, status,
                   created_at, updated_at
            FROM discount_profiles
            WHERE status = 'active'
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(DiscountProfileRow::into_profile).collect()
    }

    /// Lists all profiles regardless of status (administrative read).
    pub async fn list_all(&self) -> DbResult<Vec<DiscountProfile>> {
        let rows: Vec<DiscountProfileRow> = sqlx::query_as(
            r#"
            SELECT id, name, discount_type, minimum_months_as_member,
                   minimum_amount_spent, discount_percentage, status,
                   created_at, updated_at
            FROM discount_profiles
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(DiscountProfileRow::into_profile).collect()
    }

    /// Gets a profile by its unique name.
    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<DiscountProfile>> {
        let row: Option<DiscountProfileRow> = sqlx::query_as(
            r#"
            SELECT id, name, discount_type, minimum_months_as_member,
                   minimum_amount_spent, discount_percentage, status,
                   created_at, updated_at
            FROM discount_profiles
            WHERE name = ?1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(DiscountProfileRow::into_profile).transpose()
    }

    /// Inserts a profile (bootstrap/test fixture path).
    pub async fn insert(&self, profile: &DiscountProfile) -> DbResult<()> {
        debug!(name = %profile.name, "Inserting discount profile");

        sqlx::query(
            r#"
            INSERT INTO discount_profiles (
                id, name, discount_type, minimum_months_as_member,
                minimum_amount_spent, discount_percentage, status,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&profile.id)
        .bind(&profile.name)
        .bind(profile.discount_type)
        .bind(profile.minimum_months_as_member)
        .bind(profile.minimum_amount_spent.map(|d| d.to_string()))
        .bind(profile.discount_percentage.to_string())
        .bind(profile.status)
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
