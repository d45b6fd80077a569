//! # Cart Aggregate
//!
//! The mutable pre-purchase basket for one customer.
//!
//! ## Invariants
//! - One cart per customer (backed by a UNIQUE constraint in storage and a
//!   per-customer lock in the operation layer)
//! - Lines reference distinct items: adding an item that is already in the
//!   cart increments its quantity instead of appending a second line
//! - Quantity is always strictly positive and capped at MAX_LINE_QUANTITY
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Aggregate Operations                            │
//! │                                                                         │
//! │  Caller Action            Aggregate Rule           Persisted Effect     │
//! │  ─────────────            ──────────────           ─────────────────    │
//! │                                                                         │
//! │  Add item (new) ─────────► merge_add() ──────────► INSERT line         │
//! │                                                                         │
//! │  Add item (existing) ────► merge_add() ──────────► UPDATE quantity     │
//! │                                                                         │
//! │  Remove item ────────────► remove_line() ────────► DELETE line         │
//! │                                                                         │
//! │  Finalize purchase ──────► (purchase module) ────► DELETE whole cart   │
//! │                                                                         │
//! │  NOTE: The aggregate decides; the repository persists the decision.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY};

// =============================================================================
// Audit Stamp
// =============================================================================

/// Who performed a mutation, and when.
///
/// Assigned explicitly by each command handler; there is no interception
/// layer filling these in behind the scenes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditStamp {
    /// Author, recorded as the acting account's email.
    pub by: String,

    /// Instant of the mutation.
    pub at: DateTime<Utc>,
}

impl AuditStamp {
    /// Creates a stamp for the given author at the given instant.
    pub fn new(by: impl Into<String>, at: DateTime<Utc>) -> Self {
        AuditStamp { by: by.into(), at }
    }
}

// =============================================================================
// Cart Line
// =============================================================================

/// A line in a cart: one item, its quantity, and audit metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Cart this line belongs to.
    pub cart_id: String,

    /// Item the line refers to. Distinct per cart.
    pub item_id: String,

    /// Quantity in the cart. Always strictly positive.
    pub quantity: i64,

    /// Who first added the item.
    pub created_by: String,

    /// When the item was first added.
    pub created_at: DateTime<Utc>,

    /// Who last changed the quantity, if anyone.
    pub modified_by: Option<String>,

    /// When the quantity last changed.
    pub modified_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Cart
// =============================================================================

/// A customer's cart with its ordered lines.
///
/// Created lazily on first add; destroyed atomically when a purchase is
/// finalized from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Owning customer. One cart per customer.
    pub customer_id: String,

    /// When the cart was created.
    pub created_at: DateTime<Utc>,

    /// Lines in insertion order.
    pub lines: Vec<CartLine>,
}

/// Outcome of a merge-add, telling the repository what to persist.
#[derive(Debug, Clone)]
pub enum LineMerge {
    /// An existing line for the item had its quantity incremented.
    Incremented { line_id: String, quantity: i64 },

    /// A new line was appended to the cart (a copy of the appended line).
    Appended { line: CartLine },
}

impl Cart {
    /// Creates a new empty cart for a customer.
    pub fn new(customer_id: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Cart {
            id: Uuid::new_v4().to_string(),
            customer_id: customer_id.into(),
            created_at,
            lines: Vec::new(),
        }
    }

    /// Adds an item to the cart, merging with an existing line if present.
    ///
    /// ## Behavior
    /// - Item already in cart: increments that line's quantity and stamps
    ///   modification metadata
    /// - Item not in cart: appends a new line carrying creation metadata
    ///
    /// ## Errors
    /// - `QuantityTooLarge` if the merged quantity would exceed the cap
    /// - `CartTooLarge` if appending would exceed the line cap
    pub fn merge_add(
        &mut self,
        item_id: &str,
        quantity: i64,
        stamp: &AuditStamp,
    ) -> CoreResult<LineMerge> {
        if let Some(line) = self.lines.iter_mut().find(|l| l.item_id == item_id) {
            let merged = line.quantity + quantity;
            if merged > MAX_LINE_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: merged,
                    max: MAX_LINE_QUANTITY,
                });
            }
            line.quantity = merged;
            line.modified_by = Some(stamp.by.clone());
            line.modified_at = Some(stamp.at);
            return Ok(LineMerge::Incremented {
                line_id: line.id.clone(),
                quantity: merged,
            });
        }

        if self.lines.len() >= MAX_CART_LINES {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_LINES,
            });
        }

        let line = CartLine {
            id: Uuid::new_v4().to_string(),
            cart_id: self.id.clone(),
            item_id: item_id.to_string(),
            quantity,
            created_by: stamp.by.clone(),
            created_at: stamp.at,
            modified_by: None,
            modified_at: None,
        };
        self.lines.push(line.clone());
        Ok(LineMerge::Appended { line })
    }

    /// Removes the line for the given item, returning it.
    ///
    /// The cart itself persists even when its last line is removed.
    pub fn remove_line(&mut self, item_id: &str) -> CoreResult<CartLine> {
        let pos = self
            .lines
            .iter()
            .position(|l| l.item_id == item_id)
            .ok_or_else(|| CoreError::LineNotFound(item_id.to_string()))?;
        Ok(self.lines.remove(pos))
    }

    /// Returns the line with the given id, if present.
    pub fn line(&self, line_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.id == line_id)
    }

    /// Returns the line for the given item, if present.
    pub fn line_for_item(&self, item_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.item_id == item_id)
    }

    /// Returns the number of distinct lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Returns the total quantity across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Checks if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn stamp() -> AuditStamp {
        AuditStamp::new("shopper@example.com", Utc::now())
    }

    #[test]
    fn test_merge_add_appends_new_line() {
        let mut cart = Cart::new("customer-1", Utc::now());

        let outcome = cart.merge_add("item-1", 2, &stamp()).unwrap();

        assert!(matches!(outcome, LineMerge::Appended { .. }));
        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.total_quantity(), 2);
        assert_eq!(cart.lines[0].created_by, "shopper@example.com");
        assert!(cart.lines[0].modified_by.is_none());
    }

    #[test]
    fn test_merge_add_same_item_increments_quantity() {
        let mut cart = Cart::new("customer-1", Utc::now());

        cart.merge_add("item-1", 2, &stamp()).unwrap();
        let outcome = cart.merge_add("item-1", 2, &stamp()).unwrap();

        // One line for the item, never two
        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.total_quantity(), 4);
        assert!(matches!(
            outcome,
            LineMerge::Incremented { quantity: 4, .. }
        ));
        assert!(cart.lines[0].modified_by.is_some());
    }

    #[test]
    fn test_merge_add_rejects_quantity_over_cap() {
        let mut cart = Cart::new("customer-1", Utc::now());

        cart.merge_add("item-1", 900, &stamp()).unwrap();
        let err = cart.merge_add("item-1", 200, &stamp()).unwrap_err();

        assert!(matches!(err, CoreError::QuantityTooLarge { .. }));
        // Failed merge leaves the line untouched
        assert_eq!(cart.lines[0].quantity, 900);
    }

    #[test]
    fn test_merge_add_rejects_too_many_lines() {
        let mut cart = Cart::new("customer-1", Utc::now());
        for n in 0..MAX_CART_LINES {
            cart.merge_add(&format!("item-{n}"), 1, &stamp()).unwrap();
        }

        let err = cart.merge_add("item-overflow", 1, &stamp()).unwrap_err();
        assert!(matches!(err, CoreError::CartTooLarge { .. }));
    }

    #[test]
    fn test_remove_line() {
        let mut cart = Cart::new("customer-1", Utc::now());
        cart.merge_add("item-1", 2, &stamp()).unwrap();
        cart.merge_add("item-2", 1, &stamp()).unwrap();

        let removed = cart.remove_line("item-1").unwrap();

        assert_eq!(removed.item_id, "item-1");
        assert_eq!(cart.line_count(), 1);
        assert!(cart.line_for_item("item-1").is_none());
    }

    #[test]
    fn test_remove_missing_line_fails() {
        let mut cart = Cart::new("customer-1", Utc::now());
        let err = cart.remove_line("item-1").unwrap_err();
        assert!(matches!(err, CoreError::LineNotFound(_)));
    }

    #[test]
    fn test_empty_cart_survives_removal() {
        let mut cart = Cart::new("customer-1", Utc::now());
        cart.merge_add("item-1", 1, &stamp()).unwrap();
        cart.remove_line("item-1").unwrap();

        assert!(cart.is_empty());
        assert_eq!(cart.customer_id, "customer-1");
    }
}
