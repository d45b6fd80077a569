//! Tracing subscriber setup.
//!
//! Call [`init`] once at process startup. Filtering follows `RUST_LOG`
//! (e.g. `RUST_LOG=storefront_service=debug,sqlx=warn`), defaulting to
//! `info` when unset.

use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber.
///
/// Idempotent: a second call is a no-op, so tests can call it freely.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
