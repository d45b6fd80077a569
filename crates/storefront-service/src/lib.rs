//! # storefront-service: Exposed Operations for the Order-Capture Core
//!
//! This crate is the operation layer of the storefront backend: one method
//! per workflow operation, each returning the uniform response envelope.
//!
//! ## Operation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Operation Flow                                     │
//! │                                                                         │
//! │  Caller (HTTP layer, CLI, test)                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Storefront::add_to_cart(customer, item, qty, account)                 │
//! │       │                                                                 │
//! │       ├── validate input (before anything is staged)                   │
//! │       ├── resolve account ── ownership check                           │
//! │       ├── acquire per-customer lock                                    │
//! │       ├── apply cart aggregate rules (storefront-core)                 │
//! │       ├── stage writes on one transaction ── commit once               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Response { success, message, data }                                   │
//! │                                                                         │
//! │  Errors never escape: every failure is converted into the envelope     │
//! │  at this boundary. Unexpected failures are logged with context and     │
//! │  surfaced as a generic message.                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`commands`] - cart, discount, catalog and purchase operations
//! - [`response`] - the `{ success, message, data }` envelope
//! - [`error`] - `ServiceError` and the error-code taxonomy
//! - [`locks`] - per-customer serialization
//! - [`config`] - environment-driven configuration
//! - [`telemetry`] - tracing subscriber setup
//!
//! ## Usage
//!
//! ```rust,ignore
//! use storefront_service::{ServiceConfig, Storefront};
//!
//! storefront_service::telemetry::init();
//! let storefront = Storefront::connect(ServiceConfig::from_env()?).await?;
//!
//! let response = storefront
//!     .add_to_cart(&customer_id, &item_id, 2, &account_id)
//!     .await;
//! assert!(response.success);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod commands;
pub mod config;
pub mod error;
pub mod locks;
pub mod response;
pub mod telemetry;

// =============================================================================
// Re-exports
// =============================================================================

pub use commands::cart::{CartLineView, CartView};
pub use commands::discount::SpendAdjustment;
pub use commands::purchase::{PurchaseLineView, PurchaseView};
pub use config::{ConfigError, ServiceConfig};
pub use error::{ErrorCode, ServiceError};
pub use locks::CustomerLocks;
pub use response::Response;

use storefront_db::{Database, DbConfig};

// =============================================================================
// Storefront
// =============================================================================

/// The order-capture service: owns the database handle and the per-customer
/// lock registry. Cheap to clone; clones share both.
#[derive(Debug, Clone)]
pub struct Storefront {
    db: Database,
    locks: CustomerLocks,
}

impl Storefront {
    /// Wraps an already-connected database.
    pub fn new(db: Database) -> Self {
        Storefront {
            db,
            locks: CustomerLocks::new(),
        }
    }

    /// Connects using service configuration (creates the pool, runs
    /// migrations).
    pub async fn connect(config: ServiceConfig) -> Result<Self, ServiceError> {
        let db_config = DbConfig::new(&config.database_path)
            .max_connections(config.max_connections)
            .run_migrations(config.run_migrations);
        let db = Database::new(db_config).await?;
        Ok(Storefront::new(db))
    }

    /// Returns the underlying database handle.
    pub fn database(&self) -> &Database {
        &self.db
    }
}
