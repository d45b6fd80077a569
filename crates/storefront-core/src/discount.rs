//! # Discount Resolver
//!
//! Pure resolution of promotional discounts over a customer snapshot and a
//! set of discount profiles. Both the preview queries ("what am I eligible
//! for") and the purchase finalizer share this module, so the qualification
//! predicate and the ordering rule exist exactly once.
//!
//! ## Resolution Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Discount Resolution                                 │
//! │                                                                         │
//! │  profiles (active) ──► qualifies()? ──► sort by percentage desc ──►    │
//! │                            │                    │                       │
//! │     MembershipDuration: months ≥ min            │  stable sort:        │
//! │     AmountSpent:        spent ≥ min             │  ties keep supplied  │
//! │                                                 │  order               │
//! │                                                 ▼                       │
//! │                              full list ── applicable_profiles()        │
//! │                              head     ── best_applicable()             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Membership Arithmetic
//! Months as member are computed by calendar year/month subtraction only:
//! `(today.year − joined.year) × 12 + (today.month − joined.month)`.
//! The day of month is ignored, so joining on the 31st and on the 1st of the
//! same month count identically. Preserved for compatibility with historical
//! qualification results.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::types::{Customer, DiscountProfile, DiscountType};

// =============================================================================
// Membership Duration
// =============================================================================

/// Whole months between `joined` and `today`, by year/month subtraction.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use storefront_core::discount::membership_months;
///
/// let joined = NaiveDate::from_ymd_opt(2025, 11, 30).unwrap();
/// let today = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
/// assert_eq!(membership_months(joined, today), 3);
/// ```
pub fn membership_months(joined: NaiveDate, today: NaiveDate) -> i64 {
    (today.year() as i64 - joined.year() as i64) * 12
        + (today.month() as i64 - joined.month() as i64)
}

// =============================================================================
// Qualification
// =============================================================================

/// Checks whether a single profile qualifies for the given customer.
///
/// A profile with no threshold configured for its own type never qualifies.
pub fn qualifies(profile: &DiscountProfile, customer: &Customer, today: NaiveDate) -> bool {
    match profile.discount_type {
        DiscountType::MembershipDuration => {
            let months = membership_months(customer.date_joined.date_naive(), today);
            profile
                .minimum_months_as_member
                .map_or(false, |min| months >= min)
        }
        DiscountType::AmountSpent => profile
            .minimum_amount_spent
            .map_or(false, |min| customer.total_amount_spent >= min),
    }
}

// =============================================================================
// Selection
// =============================================================================

/// Returns every qualifying profile, descending by discount percentage.
///
/// The sort is stable: profiles with equal percentages keep the order they
/// were supplied in. No business rule resolves such ties, so the supplied
/// order is the documented tie-break.
pub fn applicable_profiles(
    customer: &Customer,
    profiles: &[DiscountProfile],
    today: NaiveDate,
) -> Vec<DiscountProfile> {
    let mut qualifying: Vec<DiscountProfile> = profiles
        .iter()
        .filter(|p| qualifies(p, customer, today))
        .cloned()
        .collect();
    qualifying.sort_by(|a, b| b.discount_percentage.cmp(&a.discount_percentage));
    qualifying
}

/// Returns the single best qualifying profile, or `None` when nothing
/// qualifies. "No discount" is a normal outcome, not an error.
pub fn best_applicable(
    customer: &Customer,
    profiles: &[DiscountProfile],
    today: NaiveDate,
) -> Option<DiscountProfile> {
    applicable_profiles(customer, profiles, today).into_iter().next()
}

// =============================================================================
// Amounts
// =============================================================================

/// Absolute discount for a percentage of an amount: `percentage/100 × amount`.
///
/// Exact decimal arithmetic; no rounding is applied here. 20% of 41.97 is
/// 8.394, and the purchase record keeps that exact value.
pub fn discount_amount(percentage: Decimal, amount: Decimal) -> Decimal {
    percentage / Decimal::from(100) * amount
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProfileStatus;
    use chrono::{TimeZone, Utc};
    use std::str::FromStr;

    fn customer(joined: NaiveDate, spent: &str) -> Customer {
        let joined_at = Utc
            .from_utc_datetime(&joined.and_hms_opt(9, 30, 0).unwrap());
        Customer {
            id: "customer-1".to_string(),
            account_id: "account-1".to_string(),
            date_joined: joined_at,
            total_amount_spent: Decimal::from_str(spent).unwrap(),
            created_at: joined_at,
            updated_at: joined_at,
        }
    }

    fn spend_profile(name: &str, min_spent: &str, percentage: &str) -> DiscountProfile {
        DiscountProfile {
            id: format!("profile-{name}"),
            name: name.to_string(),
            discount_type: DiscountType::AmountSpent,
            minimum_months_as_member: None,
            minimum_amount_spent: Some(Decimal::from_str(min_spent).unwrap()),
            discount_percentage: Decimal::from_str(percentage).unwrap(),
            status: ProfileStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn duration_profile(name: &str, min_months: i64, percentage: &str) -> DiscountProfile {
        DiscountProfile {
            id: format!("profile-{name}"),
            name: name.to_string(),
            discount_type: DiscountType::MembershipDuration,
            minimum_months_as_member: Some(min_months),
            minimum_amount_spent: None,
            discount_percentage: Decimal::from_str(percentage).unwrap(),
            status: ProfileStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_membership_months_by_calendar_subtraction() {
        assert_eq!(membership_months(date(2026, 5, 15), date(2026, 8, 7)), 3);
        assert_eq!(membership_months(date(2025, 8, 1), date(2026, 8, 31)), 12);
        // Year boundary
        assert_eq!(membership_months(date(2025, 11, 20), date(2026, 2, 3)), 3);
    }

    #[test]
    fn test_membership_months_ignores_day_of_month() {
        // Joining on the 31st and the 1st of the same month are identical
        assert_eq!(
            membership_months(date(2026, 5, 31), date(2026, 8, 1)),
            membership_months(date(2026, 5, 1), date(2026, 8, 31)),
        );
    }

    #[test]
    fn test_membership_duration_qualification_boundary() {
        let profile = duration_profile("LOYAL3", 3, "15");
        let today = date(2026, 8, 7);

        // Joined exactly 3 calendar months ago: qualifies
        let three_months = customer(date(2026, 5, 20), "0");
        assert!(qualifies(&profile, &three_months, today));

        // Joined 2 months ago: does not
        let two_months = customer(date(2026, 6, 20), "0");
        assert!(!qualifies(&profile, &two_months, today));
    }

    #[test]
    fn test_amount_spent_qualification() {
        let profile = spend_profile("BIG", "10", "20");
        let today = date(2026, 8, 7);

        assert!(qualifies(&profile, &customer(date(2026, 8, 1), "15"), today));
        assert!(qualifies(&profile, &customer(date(2026, 8, 1), "10"), today));
        assert!(!qualifies(&profile, &customer(date(2026, 8, 1), "9.99"), today));
    }

    #[test]
    fn test_profile_without_threshold_never_qualifies() {
        let mut profile = spend_profile("BROKEN", "10", "20");
        profile.minimum_amount_spent = None;

        let today = date(2026, 8, 7);
        assert!(!qualifies(&profile, &customer(date(2020, 1, 1), "1000"), today));
    }

    #[test]
    fn test_best_percentage_wins() {
        let customer = customer(date(2026, 8, 1), "15");
        let profiles = vec![
            spend_profile("C", "5", "10"),
            spend_profile("A", "10", "20"),
        ];

        let best = best_applicable(&customer, &profiles, date(2026, 8, 7)).unwrap();
        assert_eq!(best.name, "A");
        assert_eq!(best.discount_percentage, Decimal::from(20));
    }

    #[test]
    fn test_applicable_list_is_sorted_descending() {
        let customer = customer(date(2025, 1, 10), "50");
        let profiles = vec![
            spend_profile("TEN", "5", "10"),
            duration_profile("LOYAL", 12, "25"),
            spend_profile("FIVE", "1", "5"),
        ];

        let applicable = applicable_profiles(&customer, &profiles, date(2026, 8, 7));
        let names: Vec<&str> = applicable.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["LOYAL", "TEN", "FIVE"]);
    }

    #[test]
    fn test_equal_percentages_keep_supplied_order() {
        let customer = customer(date(2026, 8, 1), "100");
        let profiles = vec![
            spend_profile("FIRST", "10", "15"),
            spend_profile("SECOND", "20", "15"),
        ];

        let best = best_applicable(&customer, &profiles, date(2026, 8, 7)).unwrap();
        assert_eq!(best.name, "FIRST");
    }

    #[test]
    fn test_nothing_qualifies_is_none() {
        let customer = customer(date(2026, 7, 20), "1");
        let profiles = vec![
            spend_profile("BIG", "500", "30"),
            duration_profile("LOYAL", 24, "25"),
        ];

        assert!(best_applicable(&customer, &profiles, date(2026, 8, 7)).is_none());
        assert!(applicable_profiles(&customer, &profiles, date(2026, 8, 7)).is_empty());
    }

    #[test]
    fn test_discount_amount_exact_decimal() {
        let amount = Decimal::from_str("41.97").unwrap();
        let discount = discount_amount(Decimal::from(20), amount);
        assert_eq!(discount, Decimal::from_str("8.394").unwrap());
    }
}
