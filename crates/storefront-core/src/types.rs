//! # Domain Types
//!
//! Core domain types for the order-capture workflow.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Customer     │   │      Item       │   │ DiscountProfile │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  account_id     │   │  description    │   │  name (unique)  │       │
//! │  │  date_joined    │   │  price          │   │  discount_type  │       │
//! │  │  total_spent    │   │  stock_quantity │   │  percentage     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Purchase     │   │  PurchaseLine   │   │  ProfileStatus  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  item_id        │   │  Active         │       │
//! │  │  customer_id    │   │  quantity       │   │  Inactive       │       │
//! │  │  discount flags │   │  unit_price ❄   │   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘    ❄ = frozen snapshot      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The cart aggregate lives in [`crate::cart`]; everything here is either a
//! catalog read model or an immutable purchase record.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Account
// =============================================================================

/// An authenticated account, as seen through the identity boundary.
///
/// Identity management (credentials, sessions, password flows) lives outside
/// this core; the workflow only ever resolves an account by id to confirm the
/// caller exists and to stamp audit metadata with its email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Email address, used as the human-readable audit author.
    pub email: String,

    /// When the account was created. A customer's membership clock starts here.
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Customer
// =============================================================================

/// An account holder who can own a cart and make purchases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Owning account. Ownership checks compare this against the caller.
    pub account_id: String,

    /// Membership start, copied from the account's creation time when the
    /// customer record is provisioned.
    pub date_joined: DateTime<Utc>,

    /// Running lifetime spend. Only the spend-adjustment command writes this.
    pub total_amount_spent: Decimal,

    /// When the customer record was created.
    pub created_at: DateTime<Utc>,

    /// When the customer record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Checks whether the given account owns this customer record.
    #[inline]
    pub fn is_owned_by(&self, account_id: &str) -> bool {
        self.account_id == account_id
    }
}

// =============================================================================
// Item
// =============================================================================

/// A catalog product.
///
/// Items are read-only from the workflow's perspective; the price is read and
/// *copied* into purchase lines, never referenced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display description shown to customers.
    pub description: String,

    /// Current unit price.
    pub price: Decimal,

    /// Stock on hand. Informational only: this workflow never reserves or
    /// decrements stock.
    pub stock_quantity: i64,

    /// Whether the item is available (soft delete).
    pub is_active: bool,

    /// When the item was created.
    pub created_at: DateTime<Utc>,

    /// When the item was last updated.
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Discount Profile
// =============================================================================

/// How a discount profile qualifies a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// Qualifies on months since the customer joined.
    MembershipDuration,
    /// Qualifies on lifetime amount spent.
    AmountSpent,
}

/// Whether a profile participates in discount resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum ProfileStatus {
    Active,
    Inactive,
}

impl Default for ProfileStatus {
    fn default() -> Self {
        ProfileStatus::Active
    }
}

/// A promotional rule: a qualification threshold and a percentage reward.
///
/// Exactly one of the two minimum fields is meaningful, matching
/// [`DiscountProfile::discount_type`]. Profiles are administratively managed
/// elsewhere; the workflow only reads them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscountProfile {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Business identifier, unique, referenced by name at purchase time.
    pub name: String,

    /// Which qualification predicate applies.
    pub discount_type: DiscountType,

    /// Threshold for [`DiscountType::MembershipDuration`] profiles.
    pub minimum_months_as_member: Option<i64>,

    /// Threshold for [`DiscountType::AmountSpent`] profiles.
    pub minimum_amount_spent: Option<Decimal>,

    /// Reward, 0-100.
    pub discount_percentage: Decimal,

    /// Inactive profiles never qualify and are silently skipped at
    /// purchase time.
    pub status: ProfileStatus,

    /// When the profile was created. Also the stable tie-break order.
    pub created_at: DateTime<Utc>,

    /// When the profile was last updated.
    pub updated_at: DateTime<Utc>,
}

impl DiscountProfile {
    /// Checks if the profile participates in resolution.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == ProfileStatus::Active
    }
}

// =============================================================================
// Purchase
// =============================================================================

/// An immutable record of a finalized transaction.
///
/// Amounts derived from the lines are computed, never stored, so a purchase
/// can never disagree with its own lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Purchase {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Customer the purchase belongs to.
    pub customer_id: String,

    /// Account that finalized the purchase.
    pub account_id: String,

    /// When the cart was converted into this purchase.
    pub purchase_date: DateTime<Utc>,

    /// Whether a discount profile was applied.
    pub discount_applied: bool,

    /// Absolute discount subtracted from the original amount.
    pub discount_amount: Decimal,
}

impl Purchase {
    /// Sum of `unit_price × quantity` across the given lines.
    pub fn original_amount(lines: &[PurchaseLine]) -> Decimal {
        lines
            .iter()
            .map(|line| line.unit_price * Decimal::from(line.quantity))
            .sum()
    }

    /// Original amount minus the discount.
    pub fn purchase_amount(&self, lines: &[PurchaseLine]) -> Decimal {
        Self::original_amount(lines) - self.discount_amount
    }
}

// =============================================================================
// Purchase Line
// =============================================================================

/// A line item in a purchase.
/// Uses the snapshot pattern to freeze the item price at purchase time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseLine {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Purchase this line belongs to.
    pub purchase_id: String,

    /// Item that was bought.
    pub item_id: String,

    /// Quantity bought. Always strictly positive.
    pub quantity: i64,

    /// Unit price at time of purchase (frozen). Later catalog price changes
    /// never touch this.
    pub unit_price: Decimal,

    /// When the line was created (same instant as its purchase).
    pub created_at: DateTime<Utc>,
}

impl PurchaseLine {
    /// Line total: `unit_price × quantity`.
    #[inline]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn line(price: &str, qty: i64) -> PurchaseLine {
        PurchaseLine {
            id: "l".to_string(),
            purchase_id: "p".to_string(),
            item_id: "i".to_string(),
            quantity: qty,
            unit_price: Decimal::from_str(price).unwrap(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_original_amount_sums_lines() {
        let lines = vec![line("10.99", 2), line("19.99", 1)];
        assert_eq!(
            Purchase::original_amount(&lines),
            Decimal::from_str("41.97").unwrap()
        );
    }

    #[test]
    fn test_purchase_amount_subtracts_discount() {
        let lines = vec![line("10.99", 2), line("19.99", 1)];
        let purchase = Purchase {
            id: "p".to_string(),
            customer_id: "c".to_string(),
            account_id: "a".to_string(),
            purchase_date: Utc::now(),
            discount_applied: true,
            discount_amount: Decimal::from_str("8.394").unwrap(),
        };
        assert_eq!(
            purchase.purchase_amount(&lines),
            Decimal::from_str("33.576").unwrap()
        );
    }

    #[test]
    fn test_line_total() {
        assert_eq!(
            line("2.99", 3).line_total(),
            Decimal::from_str("8.97").unwrap()
        );
    }

    #[test]
    fn test_profile_status_default() {
        assert_eq!(ProfileStatus::default(), ProfileStatus::Active);
    }
}
