//! PostgreSQL store tests. Skipped unless `DATABASE_URL` points at a disposable database.
//!
//! Each test works on freshly created rows with unique usernames, so runs do not
//! depend on prior contents of the tables.

use chrono::NaiveDate;
use ecommerce_api::model::{NewAccount, NewCustomer, NewOrder, NewProduct};
use ecommerce_api::store::{connect, Deleted};
use ecommerce_api::{ensure_schema, AppError, DeletePolicy, PgStore, ServiceConfig, Store};
use rust_decimal::Decimal;
use std::time::{SystemTime, UNIX_EPOCH};

async fn store() -> Option<PgStore> {
    let url = std::env::var("DATABASE_URL").ok()?;
    if url.eq_ignore_ascii_case("memory") {
        return None;
    }
    let config = ServiceConfig {
        database_url: url,
        max_connections: 2,
        ..ServiceConfig::default()
    };
    let pool = connect(&config).await.ok()?;
    ensure_schema(&pool).await.ok()?;
    Some(PgStore::new(pool))
}

fn unique(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("{}-{}", prefix, nanos)
}

fn customer(name: &str) -> NewCustomer {
    NewCustomer {
        name: name.into(),
        email: Some(format!("{}@example.com", name.to_lowercase())),
        phone: Some("555-0100".into()),
    }
}

#[tokio::test]
async fn customer_crud_round() {
    let Some(store) = store().await else {
        eprintln!("DATABASE_URL missing; skipping postgres tests");
        return;
    };
    let created = store.create_customer(&customer("Ada")).await.unwrap();
    assert!(store.list_customers().await.unwrap().contains(&created));

    let updated = store
        .update_customer(created.id, &customer("Grace"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.name, "Grace");

    assert_eq!(
        store.delete_customer(created.id, DeletePolicy::Restrict).await.unwrap(),
        Deleted::Removed
    );
    assert_eq!(
        store.delete_customer(created.id, DeletePolicy::Restrict).await.unwrap(),
        Deleted::Missing
    );
    assert!(store.update_customer(created.id, &customer("Ada")).await.unwrap().is_none());
}

#[tokio::test]
async fn username_is_unique() {
    let Some(store) = store().await else {
        return;
    };
    let username = unique("user");
    let a = store.create_customer(&customer("Ada")).await.unwrap();
    let b = store.create_customer(&customer("Bob")).await.unwrap();
    store
        .create_account(&NewAccount {
            username: username.clone(),
            password: "pw".into(),
            customer_id: Some(a.id),
        })
        .await
        .unwrap();
    let err = store
        .create_account(&NewAccount {
            username,
            password: "pw".into(),
            customer_id: Some(b.id),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    store.delete_customer(a.id, DeletePolicy::Cascade).await.unwrap();
    store.delete_customer(b.id, DeletePolicy::Cascade).await.unwrap();
}

#[tokio::test]
async fn restrict_and_cascade() {
    let Some(store) = store().await else {
        return;
    };
    let c = store.create_customer(&customer("Ada")).await.unwrap();
    let product = store
        .create_product(&NewProduct {
            name: unique("lamp"),
            price: Decimal::new(1999, 2),
        })
        .await
        .unwrap();
    let order = store
        .create_order(&NewOrder {
            date: NaiveDate::from_ymd_opt(2024, 5, 4).unwrap(),
            customer_id: Some(c.id),
            product_ids: vec![product.id, product.id],
        })
        .await
        .unwrap();
    assert_eq!(store.products_for_order(order.id).await.unwrap(), vec![product]);

    let err = store.delete_customer(c.id, DeletePolicy::Restrict).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert!(store.get_customer(c.id).await.unwrap().is_some());

    assert_eq!(
        store.delete_customer(c.id, DeletePolicy::Cascade).await.unwrap(),
        Deleted::Removed
    );
    assert!(store.orders_for_customer(c.id).await.unwrap().is_empty());
    assert!(store.products_for_order(order.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn order_with_unknown_product_is_rolled_back() {
    let Some(store) = store().await else {
        return;
    };
    let c = store.create_customer(&customer("Ada")).await.unwrap();
    let err = store
        .create_order(&NewOrder {
            date: NaiveDate::from_ymd_opt(2024, 5, 4).unwrap(),
            customer_id: Some(c.id),
            product_ids: vec![i32::MAX],
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert!(store.orders_for_customer(c.id).await.unwrap().is_empty());
    store.delete_customer(c.id, DeletePolicy::Restrict).await.unwrap();
}

#[tokio::test]
async fn nullify_detaches_orders_and_account() {
    let Some(store) = store().await else {
        return;
    };
    let c = store.create_customer(&customer("Ada")).await.unwrap();
    let username = unique("detached");
    store
        .create_account(&NewAccount {
            username: username.clone(),
            password: "pw".into(),
            customer_id: Some(c.id),
        })
        .await
        .unwrap();
    let product = store
        .create_product(&NewProduct {
            name: unique("mug"),
            price: Decimal::new(4999, 3),
        })
        .await
        .unwrap();
    assert_eq!(product.price, Decimal::new(500, 2));
    let order = store
        .create_order(&NewOrder {
            date: NaiveDate::from_ymd_opt(2024, 5, 4).unwrap(),
            customer_id: Some(c.id),
            product_ids: vec![product.id],
        })
        .await
        .unwrap();

    assert_eq!(
        store.delete_customer(c.id, DeletePolicy::Nullify).await.unwrap(),
        Deleted::Removed
    );
    assert!(store.get_customer(c.id).await.unwrap().is_none());
    assert!(store.account_for_customer(c.id).await.unwrap().is_none());
    assert_eq!(store.products_for_order(order.id).await.unwrap(), vec![product]);

    let err = store
        .create_account(&NewAccount {
            username,
            password: "pw".into(),
            customer_id: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn nul_in_account_is_a_validation_error() {
    let Some(store) = store().await else {
        return;
    };
    let err = store
        .create_account(&NewAccount {
            username: "nul\u{0}user".into(),
            password: "pw".into(),
            customer_id: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}
