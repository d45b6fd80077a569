//! Repository integration tests against an in-memory database: row-boundary
//! decimal conversion, schema constraints, and unit-of-work atomicity.

use chrono::Utc;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use storefront_core::cart::AuditStamp;
use storefront_core::{
    Account, Cart, Customer, DiscountProfile, DiscountType, Item, ProfileStatus, Purchase,
    PurchaseLine,
};
use storefront_db::{Database, DbConfig, DbError};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

async fn database() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

async fn seed_customer(db: &Database, spent: &str) -> Customer {
    let now = Utc::now();
    let account = Account {
        id: Uuid::new_v4().to_string(),
        email: format!("{}@example.com", Uuid::new_v4()),
        created_at: now,
    };
    db.accounts().insert(&account).await.unwrap();

    let customer = Customer {
        id: Uuid::new_v4().to_string(),
        account_id: account.id.clone(),
        date_joined: now,
        total_amount_spent: dec(spent),
        created_at: now,
        updated_at: now,
    };
    db.customers().insert(&customer).await.unwrap();
    customer
}

async fn seed_item(db: &Database, price: &str) -> Item {
    let now = Utc::now();
    let item = Item {
        id: Uuid::new_v4().to_string(),
        description: "Test item".to_string(),
        price: dec(price),
        stock_quantity: 10,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    db.items().insert(&item).await.unwrap();
    item
}

#[tokio::test]
async fn decimal_columns_roundtrip_exactly() {
    let db = database().await;
    let customer = seed_customer(&db, "41.97").await;

    let reread = db.customers().get_by_id(&customer.id).await.unwrap().unwrap();
    assert_eq!(reread.total_amount_spent, dec("41.97"));

    let item = seed_item(&db, "10.99").await;
    let reread = db.items().get_by_id(&item.id).await.unwrap().unwrap();
    assert_eq!(reread.price, dec("10.99"));

    // Fractional discount amounts keep full precision
    let purchase = Purchase {
        id: Uuid::new_v4().to_string(),
        customer_id: customer.id.clone(),
        account_id: customer.account_id.clone(),
        purchase_date: Utc::now(),
        discount_applied: true,
        discount_amount: dec("8.394"),
    };
    let mut tx = db.begin().await.unwrap();
    db.purchases().insert_purchase(&mut tx, &purchase).await.unwrap();
    tx.commit().await.unwrap();

    let reread = db.purchases().get_by_id(&purchase.id).await.unwrap().unwrap();
    assert_eq!(reread.discount_amount, dec("8.394"));
    assert!(reread.discount_applied);
}

#[tokio::test]
async fn cart_persistence_and_line_merge_updates() {
    let db = database().await;
    let customer = seed_customer(&db, "0").await;
    let item = seed_item(&db, "10.99").await;

    let now = Utc::now();
    let mut cart = Cart::new(customer.id.clone(), now);
    let stamp = AuditStamp::new("shopper@example.com", now);
    cart.merge_add(&item.id, 2, &stamp).unwrap();

    let mut tx = db.begin().await.unwrap();
    db.carts().insert_cart(&mut tx, &cart).await.unwrap();
    db.carts().insert_line(&mut tx, &cart.lines[0]).await.unwrap();
    tx.commit().await.unwrap();

    let loaded = db.carts().find_by_customer(&customer.id).await.unwrap().unwrap();
    assert_eq!(loaded.id, cart.id);
    assert_eq!(loaded.lines.len(), 1);
    assert_eq!(loaded.lines[0].quantity, 2);
    assert_eq!(loaded.lines[0].created_by, "shopper@example.com");

    // Quantity update stamps modification metadata
    let mut tx = db.begin().await.unwrap();
    db.carts()
        .update_line_quantity(&mut tx, &loaded.lines[0].id, 5, "shopper@example.com", Utc::now())
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let loaded = db.carts().find_by_id(&cart.id).await.unwrap().unwrap();
    assert_eq!(loaded.lines[0].quantity, 5);
    assert!(loaded.lines[0].modified_at.is_some());
}

#[tokio::test]
async fn second_cart_for_same_customer_is_rejected() {
    let db = database().await;
    let customer = seed_customer(&db, "0").await;

    let first = Cart::new(customer.id.clone(), Utc::now());
    let mut tx = db.begin().await.unwrap();
    db.carts().insert_cart(&mut tx, &first).await.unwrap();
    tx.commit().await.unwrap();

    let duplicate = Cart::new(customer.id.clone(), Utc::now());
    let mut tx = db.begin().await.unwrap();
    let err = db.carts().insert_cart(&mut tx, &duplicate).await.unwrap_err();
    assert!(matches!(err, DbError::UniqueViolation { .. }));
}

#[tokio::test]
async fn dropped_transaction_rolls_back() {
    let db = database().await;
    let customer = seed_customer(&db, "0").await;

    let cart = Cart::new(customer.id.clone(), Utc::now());
    {
        let mut tx = db.begin().await.unwrap();
        db.carts().insert_cart(&mut tx, &cart).await.unwrap();
        // Dropped without commit: cancellation mid-operation
    }

    assert!(db.carts().find_by_id(&cart.id).await.unwrap().is_none());
}

#[tokio::test]
async fn finalize_writes_commit_as_one_unit() {
    let db = database().await;
    let customer = seed_customer(&db, "0").await;
    let item = seed_item(&db, "19.99").await;

    let now = Utc::now();
    let mut cart = Cart::new(customer.id.clone(), now);
    let stamp = AuditStamp::new("shopper@example.com", now);
    cart.merge_add(&item.id, 1, &stamp).unwrap();

    let mut tx = db.begin().await.unwrap();
    db.carts().insert_cart(&mut tx, &cart).await.unwrap();
    db.carts().insert_line(&mut tx, &cart.lines[0]).await.unwrap();
    tx.commit().await.unwrap();

    // Purchase insert + cart delete on one transaction
    let purchase = Purchase {
        id: Uuid::new_v4().to_string(),
        customer_id: customer.id.clone(),
        account_id: customer.account_id.clone(),
        purchase_date: now,
        discount_applied: false,
        discount_amount: Decimal::ZERO,
    };
    let line = PurchaseLine {
        id: Uuid::new_v4().to_string(),
        purchase_id: purchase.id.clone(),
        item_id: item.id.clone(),
        quantity: 1,
        unit_price: item.price,
        created_at: now,
    };

    let mut tx = db.begin().await.unwrap();
    db.purchases().insert_purchase(&mut tx, &purchase).await.unwrap();
    db.purchases().insert_line(&mut tx, &line).await.unwrap();
    db.carts().delete_cart(&mut tx, &cart.id).await.unwrap();
    tx.commit().await.unwrap();

    assert!(db.carts().find_by_id(&cart.id).await.unwrap().is_none());
    let lines = db.purchases().get_lines(&purchase.id).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].unit_price, dec("19.99"));
}

#[tokio::test]
async fn discount_profiles_filter_and_order() {
    let db = database().await;

    let mut created = Utc::now();
    for (name, status) in [
        ("FIRST", ProfileStatus::Active),
        ("SECOND", ProfileStatus::Active),
        ("HIDDEN", ProfileStatus::Inactive),
    ] {
        let profile = DiscountProfile {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            discount_type: DiscountType::AmountSpent,
            minimum_months_as_member: None,
            minimum_amount_spent: Some(dec("10")),
            discount_percentage: dec("15"),
            status,
            created_at: created,
            updated_at: created,
        };
        db.discounts().insert(&profile).await.unwrap();
        created += chrono::Duration::milliseconds(10);
    }

    let active = db.discounts().list_active().await.unwrap();
    let names: Vec<&str> = active.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["FIRST", "SECOND"]);

    let all = db.discounts().list_all().await.unwrap();
    assert_eq!(all.len(), 3);

    let by_name = db.discounts().get_by_name("HIDDEN").await.unwrap().unwrap();
    assert_eq!(by_name.status, ProfileStatus::Inactive);
    assert!(db.discounts().get_by_name("MISSING").await.unwrap().is_none());
}
