//! # Discount Commands
//!
//! Discount resolution over the active profile set.
//!
//! ## Read vs. Write
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  Discount Operations                                    │
//! │                                                                         │
//! │  list_applicable_discounts ──┐                                         │
//! │                              ├──► pure reads: resolve against active   │
//! │  get_best_applicable_discount┘    profiles, mutate nothing             │
//! │                                                                         │
//! │  apply_spend_adjustment ────────► explicit command: resolves the best  │
//! │                                   profile AND persists the spend       │
//! │                                   reduction on the customer            │
//! │                                                                         │
//! │  The mutation lives only in the command; previews stay side-effect     │
//! │  free.                                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use storefront_core::validation::validate_id;
use storefront_core::{applicable_profiles, best_applicable, discount, DiscountProfile};

use crate::error::{ErrorCode, ServiceError};
use crate::response::Response;
use crate::Storefront;

// =============================================================================
// Views
// =============================================================================

/// Result of an explicit spend adjustment: the profile that was applied and
/// the absolute amount subtracted from the customer's lifetime spend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendAdjustment {
    pub discount: DiscountProfile,
    pub discount_on_total_amount_spent: Decimal,
}

// =============================================================================
// Commands
// =============================================================================

impl Storefront {
    /// Lists every active discount profile the customer currently qualifies
    /// for, descending by percentage. Pure read.
    pub async fn list_applicable_discounts(
        &self,
        customer_id: &str,
    ) -> Response<Vec<DiscountProfile>> {
        self.list_applicable_discounts_inner(customer_id)
            .await
            .unwrap_or_else(Response::from_error)
    }

    async fn list_applicable_discounts_inner(
        &self,
        customer_id: &str,
    ) -> Result<Response<Vec<DiscountProfile>>, ServiceError> {
        debug!(customer_id = %customer_id, "list_applicable_discounts command");

        validate_id("customer id", customer_id)?;

        let customer = self.resolve_customer(customer_id).await?;
        let profiles = self.db.discounts().list_active().await?;

        let today = Utc::now().date_naive();
        let applicable = applicable_profiles(&customer, &profiles, today);

        Ok(Response::ok_with(
            "Applicable discounts retrieved successfully",
            applicable,
        ))
    }

    /// Returns the single best discount the customer qualifies for, or a
    /// successful empty response when nothing qualifies. Pure read.
    pub async fn get_best_applicable_discount(
        &self,
        customer_id: &str,
    ) -> Response<DiscountProfile> {
        self.get_best_applicable_discount_inner(customer_id)
            .await
            .unwrap_or_else(Response::from_error)
    }

    async fn get_best_applicable_discount_inner(
        &self,
        customer_id: &str,
    ) -> Result<Response<DiscountProfile>, ServiceError> {
        debug!(customer_id = %customer_id, "get_best_applicable_discount command");

        validate_id("customer id", customer_id)?;

        let customer = self.resolve_customer(customer_id).await?;
        let profiles = self.db.discounts().list_active().await?;

        let today = Utc::now().date_naive();
        Ok(match best_applicable(&customer, &profiles, today) {
            // "No discount" is a normal outcome, not an error
            Some(best) => Response::ok_with("Best applicable discount retrieved", best),
            None => Response::ok("No applicable discount"),
        })
    }

    /// Applies the customer's best discount to their lifetime spend:
    /// `total_amount_spent -= percentage/100 × total_amount_spent`.
    ///
    /// This is the explicit mutation counterpart of the preview queries.
    /// Unlike "no discount" on the reads, having nothing to apply here is a
    /// failure, since the caller asked for an adjustment.
    pub async fn apply_spend_adjustment(&self, customer_id: &str) -> Response<SpendAdjustment> {
        self.apply_spend_adjustment_inner(customer_id)
            .await
            .unwrap_or_else(Response::from_error)
    }

    async fn apply_spend_adjustment_inner(
        &self,
        customer_id: &str,
    ) -> Result<Response<SpendAdjustment>, ServiceError> {
        debug!(customer_id = %customer_id, "apply_spend_adjustment command");

        validate_id("customer id", customer_id)?;

        let _guard = self.locks.acquire(customer_id).await;

        // Resolved under the lock so the adjustment bases on current spend
        let customer = self.resolve_customer(customer_id).await?;
        let profiles = self.db.discounts().list_active().await?;

        let today = Utc::now().date_naive();
        let best = best_applicable(&customer, &profiles, today).ok_or_else(|| {
            ServiceError::new(ErrorCode::NotFound, "No applicable discount found")
        })?;

        let adjustment =
            discount::discount_amount(best.discount_percentage, customer.total_amount_spent);
        let new_total = customer.total_amount_spent - adjustment;

        let now = Utc::now();
        let mut tx = self.db.begin().await?;
        self.db
            .customers()
            .update_total_spent(&mut tx, &customer.id, new_total, now)
            .await?;
        tx.commit().await.map_err(storefront_db::DbError::from)?;

        info!(
            customer_id = %customer.id,
            profile = %best.name,
            adjustment = %adjustment,
            "Spend adjustment applied"
        );

        Ok(Response::ok_with(
            "Discount applied to account successfully",
            SpendAdjustment {
                discount: best,
                discount_on_total_amount_spent: adjustment,
            },
        ))
    }

    /// Lists all discount profiles regardless of status (administrative
    /// read).
    pub async fn list_discount_profiles(&self) -> Response<Vec<DiscountProfile>> {
        self.list_discount_profiles_inner()
            .await
            .unwrap_or_else(Response::from_error)
    }

    async fn list_discount_profiles_inner(
        &self,
    ) -> Result<Response<Vec<DiscountProfile>>, ServiceError> {
        debug!("list_discount_profiles command");

        let profiles = self.db.discounts().list_all().await?;
        Ok(Response::ok_with(
            "Discount profiles retrieved successfully",
            profiles,
        ))
    }
}
