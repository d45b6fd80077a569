//! # Repository Module
//!
//! Repository implementations for database access.
//!
//! ## Organization
//! ```text
//! repository/
//! ├── mod.rs       ◄─── You are here (exports + row-boundary helpers)
//! ├── account.rs   ◄─── Identity boundary lookups
//! ├── customer.rs  ◄─── Customer reads + spend adjustment
//! ├── item.rs      ◄─── Catalog reads
//! ├── cart.rs      ◄─── Cart and cart line persistence
//! ├── discount.rs  ◄─── Discount profile reads
//! └── purchase.rs  ◄─── Purchase and purchase line persistence
//! ```
//!
//! ## Conventions
//! - Pool reads: `&self` methods borrow a pool connection per query
//! - Transactional writes: methods take `&mut SqliteConnection` so an
//!   operation can stage several writes on one transaction and commit once
//! - Monetary columns are TEXT; the row structs here convert them to
//!   `rust_decimal::Decimal` and reject corrupt values instead of guessing

pub mod account;
pub mod cart;
pub mod customer;
pub mod discount;
pub mod item;
pub mod purchase;

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::{DbError, DbResult};

/// Parses a TEXT money column into a Decimal.
///
/// A parse failure means the stored value is corrupt; surfaced as an
/// internal error rather than a silent zero.
pub(crate) fn parse_decimal(column: &str, raw: &str) -> DbResult<Decimal> {
    Decimal::from_str(raw)
        .map_err(|e| DbError::Internal(format!("invalid decimal in {column}: {e}")))
}

/// Parses an optional TEXT money column.
pub(crate) fn parse_decimal_opt(column: &str, raw: Option<&str>) -> DbResult<Option<Decimal>> {
    raw.map(|value| parse_decimal(column, value)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decimal() {
        assert_eq!(
            parse_decimal("price", "41.97").unwrap(),
            Decimal::from_str("41.97").unwrap()
        );
        assert!(parse_decimal("price", "not-a-number").is_err());
    }

    #[test]
    fn test_parse_decimal_opt() {
        assert_eq!(parse_decimal_opt("price", None).unwrap(), None);
        assert_eq!(
            parse_decimal_opt("price", Some("8.394")).unwrap(),
            Some(Decimal::from_str("8.394").unwrap())
        );
    }
}
