//! # Per-Customer Lock Registry
//!
//! Serializes all mutating work for one customer.
//!
//! ## Why Per-Customer Locks?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │               Races the Lock Prevents                                   │
//! │                                                                         │
//! │  AddItem ║ AddItem   two concurrent find-or-create sequences would     │
//! │                      otherwise race to insert two carts for the same   │
//! │                      customer (the UNIQUE constraint is the backstop)  │
//! │                                                                         │
//! │  AddItem ║ AddItem   two merges on the same line would read the same   │
//! │  (same item)         quantity and lose one increment                   │
//! │                                                                         │
//! │  AddItem ║ Finalize  finalize could snapshot a cart mid-mutation, or   │
//! │                      delete it under a concurrent add                  │
//! │                                                                         │
//! │  Carts are exclusively owned by their customer, so per-customer        │
//! │  granularity gives full safety with zero cross-customer contention.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Thread Safety
//! The registry itself is guarded by a std `Mutex` (held only to clone an
//! `Arc`); the per-customer locks are `tokio::sync::Mutex` so holders can
//! await database calls while locked.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Registry of per-customer async locks.
///
/// Cheap to clone; clones share the same registry.
#[derive(Debug, Clone, Default)]
pub struct CustomerLocks {
    inner: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl CustomerLocks {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock for one customer, creating it on first use.
    ///
    /// The returned guard is owned, so it can be held across await points
    /// for the duration of the operation's unit of work.
    pub async fn acquire(&self, customer_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut registry = self.inner.lock().expect("Lock registry poisoned");
            registry
                .entry(customer_id.to_string())
                .or_default()
                .clone()
        };
        lock.lock_owned().await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_customer_is_serialized() {
        let locks = CustomerLocks::new();

        let guard = locks.acquire("customer-1").await;

        // A second acquire on the same customer must wait
        let locks2 = locks.clone();
        let pending = tokio::spawn(async move {
            let _guard = locks2.acquire("customer-1").await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!pending.is_finished());

        drop(guard);
        pending.await.unwrap();
    }

    #[tokio::test]
    async fn test_different_customers_do_not_contend() {
        let locks = CustomerLocks::new();

        let _guard_a = locks.acquire("customer-a").await;
        // Must not deadlock
        let _guard_b = locks.acquire("customer-b").await;
    }
}
