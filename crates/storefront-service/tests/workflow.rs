//! End-to-end workflow tests: cart mutations, discount resolution, and
//! purchase finalization against an in-memory database.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use storefront_core::{
    Account, Customer, DiscountProfile, DiscountType, Item, ProfileStatus,
};
use storefront_db::{Database, DbConfig};
use storefront_service::Storefront;

// =============================================================================
// Fixtures
// =============================================================================

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

async fn storefront() -> Storefront {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    Storefront::new(db)
}

async fn seed_account(db: &Database, email: &str) -> Account {
    let account = Account {
        id: Uuid::new_v4().to_string(),
        email: email.to_string(),
        created_at: Utc::now(),
    };
    db.accounts().insert(&account).await.unwrap();
    account
}

async fn seed_customer(db: &Database, account: &Account, spent: &str, months_ago: i64) -> Customer {
    let now = Utc::now();
    let customer = Customer {
        id: Uuid::new_v4().to_string(),
        account_id: account.id.clone(),
        date_joined: now - Duration::days(months_ago * 30 + 5),
        total_amount_spent: dec(spent),
        created_at: now,
        updated_at: now,
    };
    db.customers().insert(&customer).await.unwrap();
    customer
}

async fn seed_item(db: &Database, description: &str, price: &str) -> Item {
    let now = Utc::now();
    let item = Item {
        id: Uuid::new_v4().to_string(),
        description: description.to_string(),
        price: dec(price),
        stock_quantity: 50,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    db.items().insert(&item).await.unwrap();
    item
}

async fn seed_spend_profile(
    db: &Database,
    name: &str,
    min_spent: &str,
    percentage: &str,
    status: ProfileStatus,
) -> DiscountProfile {
    let now = Utc::now();
    let profile = DiscountProfile {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        discount_type: DiscountType::AmountSpent,
        minimum_months_as_member: None,
        minimum_amount_spent: Some(dec(min_spent)),
        discount_percentage: dec(percentage),
        status,
        created_at: now,
        updated_at: now,
    };
    db.discounts().insert(&profile).await.unwrap();
    profile
}

/// One customer with a cart containing item A (10.99 × 2) and item B
/// (19.99 × 1). Returns (storefront, account, customer, cart_id).
async fn cart_with_two_items() -> (Storefront, Account, Customer, String) {
    let storefront = storefront().await;
    let db = storefront.database();

    let account = seed_account(db, "shopper@example.com").await;
    let customer = seed_customer(db, &account, "41.97", 6).await;
    let item_a = seed_item(db, "Wireless mouse", "10.99").await;
    let item_b = seed_item(db, "Mechanical keyboard", "19.99").await;

    let resp = storefront
        .add_to_cart(&customer.id, &item_a.id, 2, &account.id)
        .await;
    assert!(resp.success, "{}", resp.message);
    let resp = storefront
        .add_to_cart(&customer.id, &item_b.id, 1, &account.id)
        .await;
    assert!(resp.success, "{}", resp.message);

    let cart = storefront
        .get_cart_by_customer(&customer.id, &account.id)
        .await
        .data
        .unwrap();

    (storefront, account, customer, cart.cart_id)
}

// =============================================================================
// Cart Aggregate
// =============================================================================

#[tokio::test]
async fn add_twice_merges_into_single_line() {
    let storefront = storefront().await;
    let db = storefront.database();

    let account = seed_account(db, "shopper@example.com").await;
    let customer = seed_customer(db, &account, "0", 1).await;
    let item = seed_item(db, "Wireless mouse", "10.99").await;

    for _ in 0..2 {
        let resp = storefront
            .add_to_cart(&customer.id, &item.id, 2, &account.id)
            .await;
        assert!(resp.success, "{}", resp.message);
    }

    let cart = storefront
        .get_cart_by_customer(&customer.id, &account.id)
        .await
        .data
        .unwrap();

    // Exactly one line for the item with the merged quantity, never two
    assert_eq!(cart.lines.len(), 1);
    assert_eq!(cart.lines[0].quantity, 4);
    assert_eq!(cart.subtotal, dec("43.96"));
}

#[tokio::test]
async fn concurrent_adds_serialize_per_customer() {
    let storefront = storefront().await;
    let db = storefront.database();

    let account = seed_account(db, "shopper@example.com").await;
    let customer = seed_customer(db, &account, "0", 1).await;
    let item = seed_item(db, "Wireless mouse", "10.99").await;

    let mut handles = Vec::new();
    for _ in 0..4 {
        let sf = storefront.clone();
        let (customer_id, item_id, account_id) =
            (customer.id.clone(), item.id.clone(), account.id.clone());
        handles.push(tokio::spawn(async move {
            sf.add_to_cart(&customer_id, &item_id, 1, &account_id).await
        }));
    }
    for handle in handles {
        let resp = handle.await.unwrap();
        assert!(resp.success, "{}", resp.message);
    }

    let cart = storefront
        .get_cart_by_customer(&customer.id, &account.id)
        .await
        .data
        .unwrap();

    // One cart, one line, no lost increments
    assert_eq!(cart.lines.len(), 1);
    assert_eq!(cart.lines[0].quantity, 4);
}

#[tokio::test]
async fn add_rejects_non_positive_quantity() {
    let storefront = storefront().await;
    let db = storefront.database();

    let account = seed_account(db, "shopper@example.com").await;
    let customer = seed_customer(db, &account, "0", 1).await;
    let item = seed_item(db, "Wireless mouse", "10.99").await;

    let resp = storefront
        .add_to_cart(&customer.id, &item.id, 0, &account.id)
        .await;
    assert!(!resp.success);
    assert_eq!(resp.message, "quantity must be positive");

    // Nothing was staged: no cart exists
    let resp = storefront
        .get_cart_by_customer(&customer.id, &account.id)
        .await;
    assert!(!resp.success);
}

#[tokio::test]
async fn add_unknown_item_is_not_found() {
    let storefront = storefront().await;
    let db = storefront.database();

    let account = seed_account(db, "shopper@example.com").await;
    let customer = seed_customer(db, &account, "0", 1).await;
    let missing = Uuid::new_v4().to_string();

    let resp = storefront
        .add_to_cart(&customer.id, &missing, 1, &account.id)
        .await;
    assert!(!resp.success);
    assert!(resp.message.starts_with("Item not found"));
}

#[tokio::test]
async fn remove_deletes_line_but_cart_survives() {
    let storefront = storefront().await;
    let db = storefront.database();

    let account = seed_account(db, "shopper@example.com").await;
    let customer = seed_customer(db, &account, "0", 1).await;
    let item = seed_item(db, "Wireless mouse", "10.99").await;

    storefront
        .add_to_cart(&customer.id, &item.id, 2, &account.id)
        .await;

    let resp = storefront
        .remove_from_cart(&customer.id, &item.id, &account.id)
        .await;
    assert!(resp.success, "{}", resp.message);

    // Empty cart still exists
    let cart = storefront
        .get_cart_by_customer(&customer.id, &account.id)
        .await
        .data
        .unwrap();
    assert!(cart.lines.is_empty());

    // Removing again reports the missing line
    let resp = storefront
        .remove_from_cart(&customer.id, &item.id, &account.id)
        .await;
    assert!(!resp.success);
    assert_eq!(resp.message, "Item not found in the cart");
}

#[tokio::test]
async fn update_cart_line_overwrites_quantity() {
    let storefront = storefront().await;
    let db = storefront.database();

    let account = seed_account(db, "shopper@example.com").await;
    let customer = seed_customer(db, &account, "0", 1).await;
    let item = seed_item(db, "Wireless mouse", "10.99").await;

    storefront
        .add_to_cart(&customer.id, &item.id, 2, &account.id)
        .await;
    let cart = storefront
        .get_cart_by_customer(&customer.id, &account.id)
        .await
        .data
        .unwrap();
    let line_id = cart.lines[0].line_id.clone();

    let resp = storefront.update_cart_line(&line_id, 7, &account.id).await;
    assert!(resp.success, "{}", resp.message);

    let cart = storefront
        .get_cart_by_customer(&customer.id, &account.id)
        .await
        .data
        .unwrap();
    assert_eq!(cart.lines[0].quantity, 7);

    // Zero quantity is rejected up front
    let resp = storefront.update_cart_line(&line_id, 0, &account.id).await;
    assert!(!resp.success);
    assert_eq!(resp.message, "quantity must be positive");
}

// =============================================================================
// Ownership
// =============================================================================

#[tokio::test]
async fn foreign_account_is_forbidden() {
    let (storefront, _account, customer, cart_id) = cart_with_two_items().await;
    let db = storefront.database();

    // A different account with its own customer record
    let intruder = seed_account(db, "intruder@example.com").await;
    seed_customer(db, &intruder, "0", 1).await;
    let item = seed_item(db, "Headphones", "5.00").await;

    let resp = storefront
        .add_to_cart(&customer.id, &item.id, 1, &intruder.id)
        .await;
    assert!(!resp.success);
    assert_eq!(resp.message, "You can't add items to someone else's cart");

    let resp = storefront
        .remove_from_cart(&customer.id, &item.id, &intruder.id)
        .await;
    assert!(!resp.success);
    assert_eq!(
        resp.message,
        "You can't remove items from someone else's cart"
    );

    let resp = storefront
        .create_purchase(&cart_id, &intruder.id, false, None)
        .await;
    assert!(!resp.success);
    assert_eq!(
        resp.message,
        "You can't create a purchase from someone else's cart"
    );

    // The owner's cart is untouched by any of the rejected calls
    let cart = storefront
        .get_cart_by_id(&cart_id, &_account.id)
        .await
        .data
        .unwrap();
    assert_eq!(cart.lines.len(), 2);
}

// =============================================================================
// Purchase Finalization
// =============================================================================

#[tokio::test]
async fn finalize_scenario_with_discount() {
    let (storefront, account, customer, cart_id) = cart_with_two_items().await;
    let db = storefront.database();

    seed_spend_profile(db, "DIS1", "10", "20", ProfileStatus::Active).await;

    let resp = storefront
        .create_purchase(&cart_id, &account.id, true, Some("DIS1"))
        .await;
    assert!(resp.success, "{}", resp.message);

    let purchase = resp.data.unwrap();
    assert_eq!(purchase.original_amount, dec("41.97"));
    assert_eq!(purchase.discount_amount, dec("8.394"));
    assert_eq!(purchase.purchase_amount, dec("33.576"));
    assert!(purchase.discount_applied);
    assert_eq!(purchase.lines.len(), 2);
    assert_eq!(purchase.customer_id, customer.id);

    // Cart is deleted atomically with the purchase insert
    let resp = storefront.get_cart_by_id(&cart_id, &account.id).await;
    assert!(!resp.success);
    assert!(resp.message.starts_with("Cart not found"));
}

#[tokio::test]
async fn price_snapshot_survives_catalog_change() {
    let storefront = storefront().await;
    let db = storefront.database();

    let account = seed_account(db, "shopper@example.com").await;
    let customer = seed_customer(db, &account, "0", 1).await;
    let item = seed_item(db, "Wireless mouse", "10.99").await;

    storefront
        .add_to_cart(&customer.id, &item.id, 2, &account.id)
        .await;
    let cart_id = storefront
        .get_cart_by_customer(&customer.id, &account.id)
        .await
        .data
        .unwrap()
        .cart_id;

    let purchase = storefront
        .create_purchase(&cart_id, &account.id, false, None)
        .await
        .data
        .unwrap();
    assert_eq!(purchase.original_amount, dec("21.98"));

    // Catalog price changes after the purchase
    db.items()
        .update_price(&item.id, dec("99.99"), Utc::now())
        .await
        .unwrap();

    let reread = storefront
        .get_purchase_by_id(&purchase.purchase_id, &account.id)
        .await
        .data
        .unwrap();
    assert_eq!(reread.lines[0].unit_price, dec("10.99"));
    assert_eq!(reread.original_amount, dec("21.98"));
}

#[tokio::test]
async fn inactive_discount_is_silently_skipped() {
    let (storefront, account, _customer, cart_id) = cart_with_two_items().await;
    let db = storefront.database();

    seed_spend_profile(db, "DIS-INACTIVE", "10", "20", ProfileStatus::Inactive).await;

    let resp = storefront
        .create_purchase(&cart_id, &account.id, true, Some("DIS-INACTIVE"))
        .await;
    assert!(resp.success, "{}", resp.message);

    let purchase = resp.data.unwrap();
    assert!(!purchase.discount_applied);
    assert_eq!(purchase.discount_amount, dec("0"));
    assert_eq!(purchase.purchase_amount, purchase.original_amount);
}

#[tokio::test]
async fn unknown_discount_profile_is_silently_skipped() {
    let (storefront, account, _customer, cart_id) = cart_with_two_items().await;

    let resp = storefront
        .create_purchase(&cart_id, &account.id, true, Some("NO-SUCH-PROFILE"))
        .await;
    assert!(resp.success, "{}", resp.message);

    let purchase = resp.data.unwrap();
    assert!(!purchase.discount_applied);
    assert_eq!(purchase.discount_amount, dec("0"));
}

#[tokio::test]
async fn finalize_empty_cart_is_rejected() {
    let storefront = storefront().await;
    let db = storefront.database();

    let account = seed_account(db, "shopper@example.com").await;
    let customer = seed_customer(db, &account, "0", 1).await;
    let item = seed_item(db, "Wireless mouse", "10.99").await;

    storefront
        .add_to_cart(&customer.id, &item.id, 1, &account.id)
        .await;
    let cart_id = storefront
        .get_cart_by_customer(&customer.id, &account.id)
        .await
        .data
        .unwrap()
        .cart_id;
    storefront
        .remove_from_cart(&customer.id, &item.id, &account.id)
        .await;

    let resp = storefront
        .create_purchase(&cart_id, &account.id, false, None)
        .await;
    assert!(!resp.success);
    assert_eq!(resp.message, "Cart is empty");

    // The rejected finalize left the cart alone
    let resp = storefront.get_cart_by_id(&cart_id, &account.id).await;
    assert!(resp.success, "{}", resp.message);
}

#[tokio::test]
async fn purchases_listed_by_customer() {
    let (storefront, account, customer, cart_id) = cart_with_two_items().await;

    storefront
        .create_purchase(&cart_id, &account.id, false, None)
        .await;

    let views = storefront
        .get_purchases_by_customer(&customer.id, &account.id)
        .await
        .data
        .unwrap();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].original_amount, dec("41.97"));

    // A foreign account may not list them
    let db = storefront.database();
    let intruder = seed_account(db, "intruder@example.com").await;
    let resp = storefront
        .get_purchases_by_customer(&customer.id, &intruder.id)
        .await;
    assert!(!resp.success);
    assert_eq!(resp.message, "You can't view someone else's purchases");
}

// =============================================================================
// Discount Queries
// =============================================================================

#[tokio::test]
async fn applicable_discounts_sorted_best_first() {
    let storefront = storefront().await;
    let db = storefront.database();

    let account = seed_account(db, "shopper@example.com").await;
    let customer = seed_customer(db, &account, "15", 1).await;

    seed_spend_profile(db, "SMALL", "5", "10", ProfileStatus::Active).await;
    seed_spend_profile(db, "BIG", "10", "20", ProfileStatus::Active).await;
    // Inactive profiles never qualify
    seed_spend_profile(db, "DEAD", "1", "50", ProfileStatus::Inactive).await;
    // Threshold above the customer's spend
    seed_spend_profile(db, "RICH", "1000", "40", ProfileStatus::Active).await;

    let applicable = storefront
        .list_applicable_discounts(&customer.id)
        .await
        .data
        .unwrap();
    let names: Vec<&str> = applicable.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["BIG", "SMALL"]);

    let best = storefront
        .get_best_applicable_discount(&customer.id)
        .await
        .data
        .unwrap();
    assert_eq!(best.name, "BIG");
}

#[tokio::test]
async fn no_qualifying_discount_is_success_without_data() {
    let storefront = storefront().await;
    let db = storefront.database();

    let account = seed_account(db, "shopper@example.com").await;
    let customer = seed_customer(db, &account, "1", 0).await;
    seed_spend_profile(db, "BIG", "1000", "20", ProfileStatus::Active).await;

    let resp = storefront.get_best_applicable_discount(&customer.id).await;
    assert!(resp.success);
    assert!(resp.data.is_none());
    assert_eq!(resp.message, "No applicable discount");
}

#[tokio::test]
async fn spend_adjustment_mutates_lifetime_spend() {
    let storefront = storefront().await;
    let db = storefront.database();

    let account = seed_account(db, "shopper@example.com").await;
    let customer = seed_customer(db, &account, "100", 1).await;
    seed_spend_profile(db, "TEN", "50", "10", ProfileStatus::Active).await;

    let resp = storefront.apply_spend_adjustment(&customer.id).await;
    assert!(resp.success, "{}", resp.message);

    let adjustment = resp.data.unwrap();
    assert_eq!(adjustment.discount.name, "TEN");
    assert_eq!(adjustment.discount_on_total_amount_spent, dec("10"));

    let reread = db.customers().get_by_id(&customer.id).await.unwrap().unwrap();
    assert_eq!(reread.total_amount_spent, dec("90"));

    // Preview queries stay pure: spend is unchanged by them
    storefront.list_applicable_discounts(&customer.id).await;
    storefront.get_best_applicable_discount(&customer.id).await;
    let reread = db.customers().get_by_id(&customer.id).await.unwrap().unwrap();
    assert_eq!(reread.total_amount_spent, dec("90"));
}

#[tokio::test]
async fn spend_adjustment_without_qualifying_profile_fails() {
    let storefront = storefront().await;
    let db = storefront.database();

    let account = seed_account(db, "shopper@example.com").await;
    let customer = seed_customer(db, &account, "1", 0).await;

    let resp = storefront.apply_spend_adjustment(&customer.id).await;
    assert!(!resp.success);
    assert_eq!(resp.message, "No applicable discount found");
}
