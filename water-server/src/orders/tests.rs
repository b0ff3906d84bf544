use super::*;
use crate::db::repository::{Page, address, product, test_support, user};
use shared::Money;
use shared::models::{AddressCreate, OrderItemInput, OrderStatus, PaymentMethod, ProductCreate};
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicUsize, Ordering};

struct Fixture {
    pool: SqlitePool,
    service: OrderService,
    user_id: i64,
    address_id: i64,
}

async fn fixture() -> Fixture {
    let pool = test_support::pool().await;
    let u = user::upsert_verified(&pool, "13800138000").await.unwrap();
    let addr = address::create(
        &pool,
        u.id,
        AddressCreate {
            name: "张三".into(),
            phone: "13800138000".into(),
            province: Some("浙江省".into()),
            city: Some("杭州市".into()),
            district: Some("西湖区".into()),
            detail: "文一西路 1 号".into(),
            is_default: true,
        },
    )
    .await
    .unwrap();
    Fixture {
        service: OrderService::new(pool.clone()),
        pool,
        user_id: u.id,
        address_id: addr.id,
    }
}

async fn add_product(pool: &SqlitePool, name: &str, cents: i64, stock: i64) -> i64 {
    product::create(
        pool,
        ProductCreate {
            name: name.into(),
            description: None,
            price: Money::from_cents(cents),
            image_url: Some(format!("http://localhost:8000/static/{name}.jpg")),
            stock,
            is_active: true,
        },
    )
    .await
    .unwrap()
    .id
}

async fn stock_of(pool: &SqlitePool, id: i64) -> i64 {
    product::find_by_id(pool, id).await.unwrap().unwrap().stock
}

async fn order_count(pool: &SqlitePool) -> (i64, i64) {
    let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(pool)
        .await
        .unwrap();
    let items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_items")
        .fetch_one(pool)
        .await
        .unwrap();
    (orders, items)
}

fn line(product_id: i64, quantity: i64) -> OrderItemInput {
    OrderItemInput {
        product_id,
        quantity,
        price: None,
    }
}

#[tokio::test]
async fn test_total_is_exact_sum_of_lines() {
    let f = fixture().await;
    let a = add_product(&f.pool, "a", 1999, 50).await;
    let b = add_product(&f.pool, "b", 333, 50).await;

    let detail = f
        .service
        .create_order(f.user_id, f.address_id, &[line(a, 3), line(b, 7)], Some("上午送"))
        .await
        .unwrap();

    assert_eq!(detail.order.total_amount, Money::from_cents(1999 * 3 + 333 * 7));
    let sum: Money = detail.items.iter().map(|i| i.subtotal()).sum();
    assert_eq!(sum, detail.order.total_amount);
    assert_eq!(detail.order.status, OrderStatus::Pending);
    assert!(detail.order.order_no.starts_with("WO"));
    assert_eq!(detail.order.remark.as_deref(), Some("上午送"));
    assert_eq!(detail.order.ship_name, "张三");
    assert_eq!(detail.items[0].product_name, "a");
    assert!(detail.items[0].product_image.is_some());

    assert_eq!(stock_of(&f.pool, a).await, 47);
    assert_eq!(stock_of(&f.pool, b).await, 43);
}

#[tokio::test]
async fn test_insufficient_stock_writes_nothing() {
    let f = fixture().await;
    let a = add_product(&f.pool, "a", 1000, 5).await;
    let b = add_product(&f.pool, "b", 1000, 2).await;

    let err = f
        .service
        .create_order(f.user_id, f.address_id, &[line(a, 5), line(b, 3)], None)
        .await
        .unwrap_err();
    match err {
        OrderError::InsufficientStock {
            product_id,
            name,
            requested,
            available,
        } => {
            assert_eq!(product_id, b);
            assert_eq!(name, "b");
            assert_eq!((requested, available), (3, 2));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert_eq!(stock_of(&f.pool, a).await, 5);
    assert_eq!(stock_of(&f.pool, b).await, 2);
    assert_eq!(order_count(&f.pool).await, (0, 0));
}

#[tokio::test]
async fn test_merged_lines_checked_against_stock() {
    let f = fixture().await;
    let a = add_product(&f.pool, "a", 1000, 5).await;

    let err = f
        .service
        .create_order(f.user_id, f.address_id, &[line(a, 3), line(a, 3)], None)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InsufficientStock { requested: 6, .. }));

    let detail = f
        .service
        .create_order(f.user_id, f.address_id, &[line(a, 2), line(a, 3)], None)
        .await
        .unwrap();
    assert_eq!(detail.items.len(), 1);
    assert_eq!(detail.items[0].quantity, 5);
    assert_eq!(stock_of(&f.pool, a).await, 0);
}

#[tokio::test]
async fn test_foreign_address_rejected() {
    let f = fixture().await;
    let a = add_product(&f.pool, "a", 1000, 5).await;
    let stranger = user::upsert_verified(&f.pool, "13900139000").await.unwrap();

    let err = f
        .service
        .create_order(stranger.id, f.address_id, &[line(a, 1)], None)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::AddressNotFound(_)));
    assert_eq!(stock_of(&f.pool, a).await, 5);
    assert_eq!(order_count(&f.pool).await, (0, 0));
}

#[tokio::test]
async fn test_missing_and_inactive_products() {
    let f = fixture().await;
    let a = add_product(&f.pool, "a", 1000, 5).await;

    let err = f
        .service
        .create_order(f.user_id, f.address_id, &[line(999, 1)], None)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::ProductNotFound(999)));

    product::toggle_active(&f.pool, a).await.unwrap();
    let err = f
        .service
        .create_order(f.user_id, f.address_id, &[line(a, 1)], None)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::ProductInactive { .. }));
    assert_eq!(stock_of(&f.pool, a).await, 5);
}

#[tokio::test]
async fn test_client_price_must_match_catalog() {
    let f = fixture().await;
    let a = add_product(&f.pool, "a", 1800, 5).await;

    let stale = OrderItemInput {
        product_id: a,
        quantity: 1,
        price: Some(Money::from_cents(1500)),
    };
    let err = f
        .service
        .create_order(f.user_id, f.address_id, &[stale], None)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::PriceMismatch { .. }));

    let fresh = OrderItemInput {
        product_id: a,
        quantity: 1,
        price: Some(Money::from_cents(1800)),
    };
    assert!(
        f.service
            .create_order(f.user_id, f.address_id, &[fresh], None)
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_price_snapshot_survives_catalog_change() {
    let f = fixture().await;
    let a = add_product(&f.pool, "a", 1800, 5).await;
    let detail = f
        .service
        .create_order(f.user_id, f.address_id, &[line(a, 2)], None)
        .await
        .unwrap();

    product::update(
        &f.pool,
        a,
        shared::models::ProductUpdate {
            price: Some(Money::from_cents(2500)),
            name: Some("新名字".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    address::delete(&f.pool, f.address_id, f.user_id).await.unwrap();

    let reloaded = f
        .service
        .get_order_by_id(detail.order.id, Some(f.user_id))
        .await
        .unwrap();
    assert_eq!(reloaded.items[0].price, Money::from_cents(1800));
    assert_eq!(reloaded.items[0].product_name, "a");
    assert_eq!(reloaded.order.total_amount, Money::from_cents(3600));
    assert_eq!(reloaded.order.address_id, None);
    assert_eq!(reloaded.order.address_snapshot().detail, "文一西路 1 号");
}

#[tokio::test]
async fn test_sold_out_then_next_order_fails() {
    let f = fixture().await;
    let p = add_product(&f.pool, "p", 1800, 10).await;

    f.service
        .create_order(f.user_id, f.address_id, &[line(p, 10)], None)
        .await
        .unwrap();
    assert_eq!(stock_of(&f.pool, p).await, 0);

    let err = f
        .service
        .create_order(f.user_id, f.address_id, &[line(p, 1)], None)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InsufficientStock { .. }));
    assert_eq!(stock_of(&f.pool, p).await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_orders_never_oversell() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("water.db").display());
    let pool = crate::db::DbService::connect(&url).await.unwrap().pool;

    let u = user::upsert_verified(&pool, "13800138000").await.unwrap();
    let addr = address::create(
        &pool,
        u.id,
        AddressCreate {
            name: "张三".into(),
            phone: "13800138000".into(),
            province: None,
            city: None,
            district: None,
            detail: "文一西路 1 号".into(),
            is_default: true,
        },
    )
    .await
    .unwrap();
    let service = OrderService::new(pool.clone());

    const STOCK: i64 = 10;
    const QTY: i64 = 3;
    const BUYERS: usize = 6;
    let p = add_product(&pool, "p", 1800, STOCK).await;

    let handles: Vec<_> = (0..BUYERS)
        .map(|_| {
            let service = service.clone();
            let (user_id, address_id) = (u.id, addr.id);
            tokio::spawn(async move {
                service
                    .create_order(user_id, address_id, &[line(p, QTY)], None)
                    .await
            })
        })
        .collect();

    let mut ok = 0;
    let mut sold_out = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => ok += 1,
            Err(OrderError::InsufficientStock { .. }) => sold_out += 1,
            Err(e) => panic!("unexpected error: {e:?}"),
        }
    }

    assert_eq!(ok, (STOCK / QTY) as usize);
    assert_eq!(sold_out, BUYERS - ok);
    assert_eq!(stock_of(&pool, p).await, STOCK % QTY);
    assert_eq!(order_count(&pool).await, (ok as i64, ok as i64));
}

fn fixed_order_no(_: chrono::DateTime<chrono::Utc>) -> String {
    "WO20240301000000000001".to_string()
}

static ROTATING_CALLS: AtomicUsize = AtomicUsize::new(0);

/// First two calls collide, later calls are unique
fn rotating_order_no(_: chrono::DateTime<chrono::Utc>) -> String {
    let n = ROTATING_CALLS.fetch_add(1, Ordering::SeqCst);
    if n < 2 {
        "WO20240301000000000002".to_string()
    } else {
        format!("WO20240302000000{n:06}")
    }
}

#[tokio::test]
async fn test_order_no_collision_is_retried() {
    let f = fixture().await;
    let service = OrderService::with_order_no_generator(f.pool.clone(), rotating_order_no);
    let p = add_product(&f.pool, "p", 1000, 10).await;

    let first = service
        .create_order(f.user_id, f.address_id, &[line(p, 1)], None)
        .await
        .unwrap();
    let second = service
        .create_order(f.user_id, f.address_id, &[line(p, 1)], None)
        .await
        .unwrap();

    assert_eq!(first.order.order_no, "WO20240301000000000002");
    assert_eq!(second.order.order_no, "WO20240302000000000002");
    assert_eq!(stock_of(&f.pool, p).await, 8);
    assert_eq!(order_count(&f.pool).await, (2, 2));
}

#[tokio::test]
async fn test_order_no_conflict_after_all_attempts() {
    let f = fixture().await;
    let service = OrderService::with_order_no_generator(f.pool.clone(), fixed_order_no);
    let p = add_product(&f.pool, "p", 1000, 10).await;

    service
        .create_order(f.user_id, f.address_id, &[line(p, 2)], None)
        .await
        .unwrap();
    let err = service
        .create_order(f.user_id, f.address_id, &[line(p, 3)], None)
        .await
        .unwrap_err();

    assert!(matches!(err, OrderError::OrderNumberConflict));
    assert_eq!(stock_of(&f.pool, p).await, 8);
    assert_eq!(order_count(&f.pool).await, (1, 1));
}

#[tokio::test]
async fn test_cancel_restores_stock_once() {
    let f = fixture().await;
    let a = add_product(&f.pool, "a", 1000, 10).await;
    let b = add_product(&f.pool, "b", 500, 10).await;
    let detail = f
        .service
        .create_order(f.user_id, f.address_id, &[line(a, 4), line(b, 1)], None)
        .await
        .unwrap();

    let cancelled = f
        .service
        .cancel_order(detail.order.id, f.user_id)
        .await
        .unwrap();
    assert_eq!(cancelled.order.status, OrderStatus::Cancelled);
    assert_eq!(stock_of(&f.pool, a).await, 10);
    assert_eq!(stock_of(&f.pool, b).await, 10);

    let err = f
        .service
        .cancel_order(detail.order.id, f.user_id)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OrderError::InvalidTransition {
            from: OrderStatus::Cancelled,
            ..
        }
    ));
    assert_eq!(stock_of(&f.pool, a).await, 10);
    assert_eq!(stock_of(&f.pool, b).await, 10);
}

#[tokio::test]
async fn test_cancel_paid_order_allowed_shipped_refused() {
    let f = fixture().await;
    let a = add_product(&f.pool, "a", 1000, 10).await;

    let paid = f
        .service
        .create_order(f.user_id, f.address_id, &[line(a, 2)], None)
        .await
        .unwrap();
    f.service
        .mark_paid(paid.order.id, f.user_id, Some("alipay"))
        .await
        .unwrap();
    let cancelled = f.service.cancel_order(paid.order.id, f.user_id).await.unwrap();
    assert_eq!(cancelled.order.status, OrderStatus::Cancelled);
    assert_eq!(stock_of(&f.pool, a).await, 10);

    let shipped = f
        .service
        .create_order(f.user_id, f.address_id, &[line(a, 2)], None)
        .await
        .unwrap();
    f.service.mark_paid(shipped.order.id, f.user_id, None).await.unwrap();
    f.service
        .advance_fulfilment(shipped.order.id, OrderStatus::Shipped)
        .await
        .unwrap();
    let err = f
        .service
        .cancel_order(shipped.order.id, f.user_id)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InvalidTransition { .. }));
    assert_eq!(stock_of(&f.pool, a).await, 8);
}

#[tokio::test]
async fn test_cancel_by_other_user_is_not_found() {
    let f = fixture().await;
    let a = add_product(&f.pool, "a", 1000, 10).await;
    let detail = f
        .service
        .create_order(f.user_id, f.address_id, &[line(a, 2)], None)
        .await
        .unwrap();
    let stranger = user::upsert_verified(&f.pool, "13900139000").await.unwrap();

    let err = f
        .service
        .cancel_order(detail.order.id, stranger.id)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::OrderNotFound(_)));
    assert!(matches!(
        f.service
            .get_order_by_id(detail.order.id, Some(stranger.id))
            .await,
        Err(OrderError::OrderNotFound(_))
    ));
    assert!(f.service.get_order_by_id(detail.order.id, None).await.is_ok());
    assert_eq!(stock_of(&f.pool, a).await, 8);
}

#[tokio::test]
async fn test_mark_paid_only_from_pending() {
    let f = fixture().await;
    let a = add_product(&f.pool, "a", 1000, 10).await;
    let detail = f
        .service
        .create_order(f.user_id, f.address_id, &[line(a, 1)], None)
        .await
        .unwrap();

    let err = f
        .service
        .mark_paid(detail.order.id, f.user_id, Some("paypal"))
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InvalidPaymentMethod(_)));

    let paid = f
        .service
        .mark_paid(detail.order.id, f.user_id, None)
        .await
        .unwrap();
    assert_eq!(paid.order.status, OrderStatus::Paid);
    assert_eq!(paid.order.payment_method, Some(PaymentMethod::Wechat));
    assert!(paid.order.payment_time.is_some());

    let err = f
        .service
        .mark_paid(detail.order.id, f.user_id, Some("balance"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OrderError::InvalidTransition {
            from: OrderStatus::Paid,
            ..
        }
    ));
}

#[tokio::test]
async fn test_fulfilment_sequence() {
    let f = fixture().await;
    let a = add_product(&f.pool, "a", 1000, 10).await;
    let detail = f
        .service
        .create_order(f.user_id, f.address_id, &[line(a, 1)], None)
        .await
        .unwrap();
    let id = detail.order.id;

    assert!(matches!(
        f.service.advance_fulfilment(id, OrderStatus::Shipped).await,
        Err(OrderError::InvalidTransition { .. })
    ));
    f.service.mark_paid(id, f.user_id, None).await.unwrap();
    assert!(matches!(
        f.service.advance_fulfilment(id, OrderStatus::Delivered).await,
        Err(OrderError::InvalidTransition { .. })
    ));

    let shipped = f.service.advance_fulfilment(id, OrderStatus::Shipped).await.unwrap();
    assert_eq!(shipped.order.status, OrderStatus::Shipped);
    let delivered = f
        .service
        .advance_fulfilment(id, OrderStatus::Delivered)
        .await
        .unwrap();
    assert_eq!(delivered.order.status, OrderStatus::Delivered);
    assert!(delivered.order.delivery_time.is_some());

    let shipped_list = f
        .service
        .list_orders(Some(OrderStatus::Delivered), Page::default())
        .await
        .unwrap();
    assert_eq!(shipped_list.len(), 1);
}

#[tokio::test]
async fn test_user_orders_newest_first() {
    let f = fixture().await;
    let a = add_product(&f.pool, "a", 1000, 10).await;
    let mut ids = Vec::new();
    for _ in 0..3 {
        let d = f
            .service
            .create_order(f.user_id, f.address_id, &[line(a, 1)], None)
            .await
            .unwrap();
        ids.push(d.order.id);
    }

    let orders = f
        .service
        .get_user_orders(f.user_id, Page::new(Some(0), Some(2)))
        .await
        .unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].order.id, ids[2]);
    assert_eq!(orders[1].order.id, ids[1]);

    let stranger = user::upsert_verified(&f.pool, "13900139000").await.unwrap();
    assert!(
        f.service
            .get_user_orders(stranger.id, Page::default())
            .await
            .unwrap()
            .is_empty()
    );
}
