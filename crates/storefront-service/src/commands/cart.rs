//! # Cart Commands
//!
//! Operations on the mutable pre-purchase basket.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Lifecycle                                       │
//! │                                                                         │
//! │  ┌──────────┐     ┌──────────┐     ┌──────────┐     ┌──────────┐       │
//! │  │   No     │────►│  Cart    │────►│  Cart    │────►│ Purchase │       │
//! │  │  Cart    │     │ (1 line) │     │ (n lines)│     │ (frozen) │       │
//! │  └──────────┘     └──────────┘     └──────────┘     └──────────┘       │
//! │       │                │                 │                              │
//! │  add_to_cart      add_to_cart       create_purchase                    │
//! │  (creates cart    remove_from_cart  (purchase.rs, deletes              │
//! │   lazily)         update_cart_line   the cart)                         │
//! │                                                                         │
//! │  All mutations are serialized per customer and committed on a single   │
//! │  transaction.                                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use storefront_core::cart::AuditStamp;
use storefront_core::validation::{validate_id, validate_quantity};
use storefront_core::{Cart, LineMerge};
use storefront_db::CartLineDetail;

use crate::error::ServiceError;
use crate::response::Response;
use crate::Storefront;

// =============================================================================
// Views
// =============================================================================

/// A cart line joined with item detail, as returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineView {
    pub line_id: String,
    pub item_id: String,
    pub description: String,
    /// Current catalog price. Not a snapshot: carts track the live price
    /// until finalization freezes it.
    pub unit_price: Decimal,
    pub quantity: i64,
    pub line_total: Decimal,
}

impl From<CartLineDetail> for CartLineView {
    fn from(detail: CartLineDetail) -> Self {
        let line_total = detail.unit_price * Decimal::from(detail.line.quantity);
        CartLineView {
            line_id: detail.line.id,
            item_id: detail.line.item_id,
            description: detail.description,
            unit_price: detail.unit_price,
            quantity: detail.line.quantity,
            line_total,
        }
    }
}

/// A cart projection: lines joined with item detail plus running totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub cart_id: String,
    pub customer_id: String,
    pub lines: Vec<CartLineView>,
    pub total_quantity: i64,
    pub subtotal: Decimal,
}

impl CartView {
    fn build(cart_id: String, customer_id: String, details: Vec<CartLineDetail>) -> Self {
        let lines: Vec<CartLineView> = details.into_iter().map(CartLineView::from).collect();
        let total_quantity = lines.iter().map(|l| l.quantity).sum();
        let subtotal = lines.iter().map(|l| l.line_total).sum();
        CartView {
            cart_id,
            customer_id,
            lines,
            total_quantity,
            subtotal,
        }
    }
}

// =============================================================================
// Commands
// =============================================================================

impl Storefront {
    /// Adds an item to a customer's cart, creating the cart lazily on first
    /// add and merging quantity when the item is already present.
    ///
    /// ## Behavior
    /// - Quantity is validated before anything is read or written
    /// - Ownership is enforced: only the owning account may add
    /// - Find-or-create + merge + persist run under the customer's lock on
    ///   one transaction, so concurrent adds can never produce two carts or
    ///   lose an increment
    pub async fn add_to_cart(
        &self,
        customer_id: &str,
        item_id: &str,
        quantity: i64,
        account_id: &str,
    ) -> Response<()> {
        self.add_to_cart_inner(customer_id, item_id, quantity, account_id)
            .await
            .unwrap_or_else(Response::from_error)
    }

    async fn add_to_cart_inner(
        &self,
        customer_id: &str,
        item_id: &str,
        quantity: i64,
        account_id: &str,
    ) -> Result<Response<()>, ServiceError> {
        debug!(customer_id = %customer_id, item_id = %item_id, quantity = %quantity, "add_to_cart command");

        validate_quantity(quantity)?;
        validate_id("customer id", customer_id)?;
        validate_id("item id", item_id)?;

        let account = self.resolve_account(account_id).await?;
        let customer = self.resolve_customer(customer_id).await?;
        if !customer.is_owned_by(&account.id) {
            return Err(ServiceError::forbidden(
                "You can't add items to someone else's cart",
            ));
        }

        let item = self
            .db
            .items()
            .get_by_id(item_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Item", item_id))?;
        if !item.is_active {
            return Err(ServiceError::validation("Item is not available"));
        }

        let _guard = self.locks.acquire(&customer.id).await;

        let now = Utc::now();
        let (mut cart, is_new) = match self.db.carts().find_by_customer(&customer.id).await? {
            Some(cart) => (cart, false),
            None => (Cart::new(customer.id.clone(), now), true),
        };

        let stamp = AuditStamp::new(account.email.clone(), now);
        let outcome = cart.merge_add(&item.id, quantity, &stamp)?;

        let mut tx = self.db.begin().await?;
        if is_new {
            self.db.carts().insert_cart(&mut tx, &cart).await?;
        }
        match &outcome {
            LineMerge::Appended { line } => {
                self.db.carts().insert_line(&mut tx, line).await?;
            }
            LineMerge::Incremented { line_id, quantity } => {
                self.db
                    .carts()
                    .update_line_quantity(&mut tx, line_id, *quantity, &stamp.by, stamp.at)
                    .await?;
            }
        }
        tx.commit().await.map_err(storefront_db::DbError::from)?;

        info!(
            cart_id = %cart.id,
            customer_id = %customer.id,
            item_id = %item.id,
            quantity = %quantity,
            "Item added to cart"
        );

        Ok(Response::ok("Item added to cart successfully"))
    }

    /// Removes an item's line from a customer's cart. The cart itself
    /// survives even when its last line is removed.
    pub async fn remove_from_cart(
        &self,
        customer_id: &str,
        item_id: &str,
        account_id: &str,
    ) -> Response<()> {
        self.remove_from_cart_inner(customer_id, item_id, account_id)
            .await
            .unwrap_or_else(Response::from_error)
    }

    async fn remove_from_cart_inner(
        &self,
        customer_id: &str,
        item_id: &str,
        account_id: &str,
    ) -> Result<Response<()>, ServiceError> {
        debug!(customer_id = %customer_id, item_id = %item_id, "remove_from_cart command");

        validate_id("customer id", customer_id)?;
        validate_id("item id", item_id)?;

        let account = self.resolve_account(account_id).await?;
        let customer = self.resolve_customer(customer_id).await?;
        if !customer.is_owned_by(&account.id) {
            return Err(ServiceError::forbidden(
                "You can't remove items from someone else's cart",
            ));
        }

        let _guard = self.locks.acquire(&customer.id).await;

        let mut cart = self
            .db
            .carts()
            .find_by_customer(&customer.id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Cart", &customer.id))?;

        let removed = cart.remove_line(item_id)?;

        let mut tx = self.db.begin().await?;
        self.db.carts().delete_line(&mut tx, &removed.id).await?;
        tx.commit().await.map_err(storefront_db::DbError::from)?;

        info!(
            cart_id = %cart.id,
            customer_id = %customer.id,
            item_id = %item_id,
            "Item removed from cart"
        );

        Ok(Response::ok("Item removed from cart successfully"))
    }

    /// Overwrites a cart line's quantity and stamps modification metadata.
    ///
    /// The line is addressed directly by id; the caller only needs to
    /// resolve to a valid account.
    pub async fn update_cart_line(
        &self,
        cart_line_id: &str,
        quantity: i64,
        account_id: &str,
    ) -> Response<()> {
        self.update_cart_line_inner(cart_line_id, quantity, account_id)
            .await
            .unwrap_or_else(Response::from_error)
    }

    async fn update_cart_line_inner(
        &self,
        cart_line_id: &str,
        quantity: i64,
        account_id: &str,
    ) -> Result<Response<()>, ServiceError> {
        debug!(cart_line_id = %cart_line_id, quantity = %quantity, "update_cart_line command");

        validate_quantity(quantity)?;
        validate_id("cart line id", cart_line_id)?;

        let account = self.resolve_account(account_id).await?;

        let line = self
            .db
            .carts()
            .get_line(cart_line_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Cart line", cart_line_id))?;

        // Serialize against other mutations of the same customer's cart
        let cart = self
            .db
            .carts()
            .find_by_id(&line.cart_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Cart", &line.cart_id))?;
        let _guard = self.locks.acquire(&cart.customer_id).await;

        let now = Utc::now();
        let mut tx = self.db.begin().await?;
        self.db
            .carts()
            .update_line_quantity(&mut tx, cart_line_id, quantity, &account.email, now)
            .await?;
        tx.commit().await.map_err(storefront_db::DbError::from)?;

        info!(cart_line_id = %cart_line_id, quantity = %quantity, "Cart line updated");

        Ok(Response::ok("Cart line updated successfully"))
    }

    /// Returns a customer's cart lines joined with item detail.
    pub async fn get_cart_by_customer(
        &self,
        customer_id: &str,
        account_id: &str,
    ) -> Response<CartView> {
        self.get_cart_by_customer_inner(customer_id, account_id)
            .await
            .unwrap_or_else(Response::from_error)
    }

    async fn get_cart_by_customer_inner(
        &self,
        customer_id: &str,
        account_id: &str,
    ) -> Result<Response<CartView>, ServiceError> {
        debug!(customer_id = %customer_id, "get_cart_by_customer command");

        validate_id("customer id", customer_id)?;

        let account = self.resolve_account(account_id).await?;
        let customer = self.resolve_customer(customer_id).await?;
        if !customer.is_owned_by(&account.id) {
            return Err(ServiceError::forbidden(
                "You can't view someone else's cart",
            ));
        }

        let cart = self
            .db
            .carts()
            .find_by_customer(&customer.id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Cart", &customer.id))?;

        let details = self.db.carts().lines_with_items(&cart.id).await?;
        let view = CartView::build(cart.id, cart.customer_id, details);

        Ok(Response::ok_with("Cart retrieved successfully", view))
    }

    /// Returns a cart by id, scoped to its owner. After finalization the
    /// cart is gone and this returns NotFound.
    pub async fn get_cart_by_id(&self, cart_id: &str, account_id: &str) -> Response<CartView> {
        self.get_cart_by_id_inner(cart_id, account_id)
            .await
            .unwrap_or_else(Response::from_error)
    }

    async fn get_cart_by_id_inner(
        &self,
        cart_id: &str,
        account_id: &str,
    ) -> Result<Response<CartView>, ServiceError> {
        debug!(cart_id = %cart_id, "get_cart_by_id command");

        validate_id("cart id", cart_id)?;

        let account = self.resolve_account(account_id).await?;

        let cart = self
            .db
            .carts()
            .find_by_id(cart_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Cart", cart_id))?;

        let customer = self.resolve_customer(&cart.customer_id).await?;
        if !customer.is_owned_by(&account.id) {
            return Err(ServiceError::forbidden(
                "You can't view someone else's cart",
            ));
        }

        let details = self.db.carts().lines_with_items(&cart.id).await?;
        let view = CartView::build(cart.id, cart.customer_id, details);

        Ok(Response::ok_with("Cart retrieved successfully", view))
    }
}
