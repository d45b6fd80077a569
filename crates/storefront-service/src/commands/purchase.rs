//! # Purchase Commands
//!
//! The purchase finalizer and purchase reads.
//!
//! ## Finalization Steps
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              create_purchase (single unit of work)                      │
//! │                                                                         │
//! │  1. Resolve account ──► 2. Resolve customer ──► lock customer          │
//! │                                                                         │
//! │  3. Load cart by id, scoped to the customer                            │
//! │                                                                         │
//! │  4. Snapshot lines: (item_id, quantity, CURRENT item price)            │
//! │     ── the irreversible pricing moment                                 │
//! │                                                                         │
//! │  5. original_amount = Σ price × quantity                               │
//! │                                                                         │
//! │  6. Discount requested? Named profile must exist AND be active;        │
//! │     otherwise no discount is applied and that is NOT an error          │
//! │                                                                         │
//! │  7. BEGIN ── insert purchase ── insert lines ── delete cart ── COMMIT  │
//! │                                                                         │
//! │  Any failure before COMMIT leaves the cart intact and no purchase      │
//! │  behind. Cancellation (dropping the future) rolls the transaction      │
//! │  back the same way.                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use storefront_core::validation::validate_id;
use storefront_core::{discount, Purchase, PurchaseLine};

use crate::error::ServiceError;
use crate::response::Response;
use crate::Storefront;

// =============================================================================
// Views
// =============================================================================

/// A purchase line as returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseLineView {
    pub item_id: String,
    pub quantity: i64,
    /// Unit price frozen at purchase time.
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

impl From<&PurchaseLine> for PurchaseLineView {
    fn from(line: &PurchaseLine) -> Self {
        PurchaseLineView {
            item_id: line.item_id.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            line_total: line.line_total(),
        }
    }
}

/// A purchase with its lines and derived amounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseView {
    pub purchase_id: String,
    pub customer_id: String,
    pub account_id: String,
    pub purchase_date: DateTime<Utc>,
    pub lines: Vec<PurchaseLineView>,
    pub discount_applied: bool,
    pub discount_amount: Decimal,
    pub original_amount: Decimal,
    pub purchase_amount: Decimal,
}

impl PurchaseView {
    fn build(purchase: Purchase, lines: &[PurchaseLine]) -> Self {
        let original_amount = Purchase::original_amount(lines);
        let purchase_amount = purchase.purchase_amount(lines);
        PurchaseView {
            purchase_id: purchase.id,
            customer_id: purchase.customer_id,
            account_id: purchase.account_id,
            purchase_date: purchase.purchase_date,
            lines: lines.iter().map(PurchaseLineView::from).collect(),
            discount_applied: purchase.discount_applied,
            discount_amount: purchase.discount_amount,
            original_amount,
            purchase_amount,
        }
    }
}

// =============================================================================
// Commands
// =============================================================================

impl Storefront {
    /// Converts a cart into an immutable purchase: snapshots prices,
    /// optionally applies one named discount, persists the purchase and
    /// deletes the cart, all in one transaction.
    pub async fn create_purchase(
        &self,
        cart_id: &str,
        account_id: &str,
        apply_discount: bool,
        discount_profile_name: Option<&str>,
    ) -> Response<PurchaseView> {
        self.create_purchase_inner(cart_id, account_id, apply_discount, discount_profile_name)
            .await
            .unwrap_or_else(Response::from_error)
    }

    async fn create_purchase_inner(
        &self,
        cart_id: &str,
        account_id: &str,
        apply_discount: bool,
        discount_profile_name: Option<&str>,
    ) -> Result<Response<PurchaseView>, ServiceError> {
        debug!(
            cart_id = %cart_id,
            apply_discount = %apply_discount,
            "create_purchase command"
        );

        validate_id("cart id", cart_id)?;

        let account = self.resolve_account(account_id).await?;
        let customer = self.resolve_customer_for_account(&account).await?;

        let _guard = self.locks.acquire(&customer.id).await;

        let cart = self
            .db
            .carts()
            .find_by_id(cart_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Cart", cart_id))?;
        if cart.customer_id != customer.id {
            return Err(ServiceError::forbidden(
                "You can't create a purchase from someone else's cart",
            ));
        }
        if cart.is_empty() {
            return Err(ServiceError::validation("Cart is empty"));
        }

        // The irreversible pricing moment: copy current catalog prices into
        // the purchase lines
        let details = self.db.carts().lines_with_items(&cart.id).await?;

        let now = Utc::now();
        let purchase_id = Uuid::new_v4().to_string();
        let lines: Vec<PurchaseLine> = details
            .iter()
            .map(|detail| PurchaseLine {
                id: Uuid::new_v4().to_string(),
                purchase_id: purchase_id.clone(),
                item_id: detail.line.item_id.clone(),
                quantity: detail.line.quantity,
                unit_price: detail.unit_price,
                created_at: now,
            })
            .collect();

        let original_amount = Purchase::original_amount(&lines);

        let mut purchase = Purchase {
            id: purchase_id.clone(),
            customer_id: customer.id.clone(),
            account_id: account.id.clone(),
            purchase_date: now,
            discount_applied: false,
            discount_amount: Decimal::ZERO,
        };

        if apply_discount {
            // A missing or inactive profile applies no discount; the
            // purchase still succeeds
            let profile = match discount_profile_name {
                Some(name) => self.db.discounts().get_by_name(name).await?,
                None => None,
            };
            match profile {
                Some(profile) if profile.is_active() => {
                    purchase.discount_amount =
                        discount::discount_amount(profile.discount_percentage, original_amount);
                    purchase.discount_applied = true;
                }
                _ => {
                    debug!(
                        profile = ?discount_profile_name,
                        "Requested discount profile missing or inactive; skipping"
                    );
                }
            }
        }

        let mut tx = self.db.begin().await?;
        self.db.purchases().insert_purchase(&mut tx, &purchase).await?;
        for line in &lines {
            self.db.purchases().insert_line(&mut tx, line).await?;
        }
        self.db.carts().delete_cart(&mut tx, &cart.id).await?;
        tx.commit().await.map_err(storefront_db::DbError::from)?;

        info!(
            purchase_id = %purchase.id,
            customer_id = %customer.id,
            cart_id = %cart.id,
            original_amount = %original_amount,
            discount_applied = %purchase.discount_applied,
            "Purchase created"
        );

        let view = PurchaseView::build(purchase, &lines);
        Ok(Response::ok_with("Purchase created successfully", view))
    }

    /// Returns a purchase by id with its lines, scoped to its owner.
    pub async fn get_purchase_by_id(
        &self,
        purchase_id: &str,
        account_id: &str,
    ) -> Response<PurchaseView> {
        self.get_purchase_by_id_inner(purchase_id, account_id)
            .await
            .unwrap_or_else(Response::from_error)
    }

    async fn get_purchase_by_id_inner(
        &self,
        purchase_id: &str,
        account_id: &str,
    ) -> Result<Response<PurchaseView>, ServiceError> {
        debug!(purchase_id = %purchase_id, "get_purchase_by_id command");

        validate_id("purchase id", purchase_id)?;

        let account = self.resolve_account(account_id).await?;

        let purchase = self
            .db
            .purchases()
            .get_by_id(purchase_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Purchase", purchase_id))?;
        if purchase.account_id != account.id {
            return Err(ServiceError::forbidden(
                "You can't view someone else's purchase",
            ));
        }

        let lines = self.db.purchases().get_lines(&purchase.id).await?;
        let view = PurchaseView::build(purchase, &lines);

        Ok(Response::ok_with("Purchase retrieved successfully", view))
    }

    /// Lists a customer's purchases, most recent first, with lines and
    /// derived amounts.
    pub async fn get_purchases_by_customer(
        &self,
        customer_id: &str,
        account_id: &str,
    ) -> Response<Vec<PurchaseView>> {
        self.get_purchases_by_customer_inner(customer_id, account_id)
            .await
            .unwrap_or_else(Response::from_error)
    }

    async fn get_purchases_by_customer_inner(
        &self,
        customer_id: &str,
        account_id: &str,
    ) -> Result<Response<Vec<PurchaseView>>, ServiceError> {
        debug!(customer_id = %customer_id, "get_purchases_by_customer command");

        validate_id("customer id", customer_id)?;

        let account = self.resolve_account(account_id).await?;
        let customer = self.resolve_customer(customer_id).await?;
        if !customer.is_owned_by(&account.id) {
            return Err(ServiceError::forbidden(
                "You can't view someone else's purchases",
            ));
        }

        let purchases = self.db.purchases().list_by_customer(&customer.id).await?;
        let mut views = Vec::with_capacity(purchases.len());
        for purchase in purchases {
            let lines = self.db.purchases().get_lines(&purchase.id).await?;
            views.push(PurchaseView::build(purchase, &lines));
        }

        Ok(Response::ok_with(
            "Purchases retrieved successfully",
            views,
        ))
    }
}
