//! # Commands Module
//!
//! The exposed operations of the order-capture core.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs       ◄─── You are here (shared caller resolution)
//! ├── cart.rs      ◄─── AddToCart, RemoveFromCart, UpdateCartLine, reads
//! ├── catalog.rs   ◄─── Item listing and lookup
//! ├── discount.rs  ◄─── Applicable-discount queries, spend adjustment
//! └── purchase.rs  ◄─── CreatePurchase (finalizer), purchase reads
//! ```
//!
//! ## How Commands Work
//! Every command is a method on [`Storefront`] returning the uniform
//! [`Response`](crate::response::Response) envelope. Bodies are written as
//! `Result<Response<T>, ServiceError>` and flattened at the public boundary,
//! so no error ever escapes as a panic or a raw error type.
//!
//! Ordering inside a command is fixed:
//! 1. Validate input (nothing staged yet)
//! 2. Resolve the caller's account, then the customer, then ownership
//! 3. Acquire the per-customer lock (mutating commands only)
//! 4. Apply aggregate rules and stage writes on one transaction
//! 5. Commit exactly once, log, build the response

pub mod cart;
pub mod catalog;
pub mod discount;
pub mod purchase;

use storefront_core::{Account, Customer};

use crate::error::ServiceError;
use crate::Storefront;

impl Storefront {
    /// Resolves the calling account, failing NotFound when it is unknown.
    pub(crate) async fn resolve_account(&self, account_id: &str) -> Result<Account, ServiceError> {
        self.db
            .accounts()
            .get_by_id(account_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Account", account_id))
    }

    /// Resolves a customer by id, failing NotFound when absent.
    pub(crate) async fn resolve_customer(
        &self,
        customer_id: &str,
    ) -> Result<Customer, ServiceError> {
        self.db
            .customers()
            .get_by_id(customer_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Customer", customer_id))
    }

    /// Resolves the customer record owned by an account, failing NotFound
    /// when the account has none.
    pub(crate) async fn resolve_customer_for_account(
        &self,
        account: &Account,
    ) -> Result<Customer, ServiceError> {
        self.db
            .customers()
            .get_by_account(&account.id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Customer for account", &account.id))
    }
}
