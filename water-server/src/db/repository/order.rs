//! Order Repository
//!
//! Status changes are guarded in the UPDATE itself (`WHERE status = ...`),
//! callers inspect the returned flag instead of reading first.

use super::{Page, RepoResult};
use shared::Money;
use shared::models::{AddressSnapshot, Order, OrderDetail, OrderItem, OrderStatus, PaymentMethod};
use sqlx::{SqliteConnection, SqlitePool};

const ORDER_SELECT: &str = "SELECT id, order_no, user_id, address_id, total_cents, status, payment_method, payment_time, delivery_time, remark, ship_name, ship_phone, ship_province, ship_city, ship_district, ship_detail, created_at, updated_at FROM orders";

const ITEM_SELECT: &str = "SELECT oi.id, oi.order_id, oi.product_id, oi.product_name, p.image_url AS product_image, oi.quantity, oi.price_cents, oi.created_at FROM order_items oi LEFT JOIN products p ON p.id = oi.product_id";

/// Order header to insert
#[derive(Debug, Clone)]
pub struct NewOrder<'a> {
    pub order_no: &'a str,
    pub user_id: i64,
    pub address_id: i64,
    pub total_amount: Money,
    pub remark: Option<&'a str>,
    pub ship: &'a AddressSnapshot,
    pub created_at: i64,
}

/// Order line to insert
#[derive(Debug, Clone)]
pub struct NewOrderItem<'a> {
    pub product_id: i64,
    pub product_name: &'a str,
    pub quantity: i64,
    pub price: Money,
}

/// Insert the order header, returns the new id
///
/// An `order_no` collision surfaces as [`super::RepoError::Duplicate`].
pub async fn insert(conn: &mut SqliteConnection, order: &NewOrder<'_>) -> RepoResult<i64> {
    let id = sqlx::query(
        "INSERT INTO orders (order_no, user_id, address_id, total_cents, status, remark, ship_name, ship_phone, ship_province, ship_city, ship_district, ship_detail, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, 'pending', ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)",
    )
    .bind(order.order_no)
    .bind(order.user_id)
    .bind(order.address_id)
    .bind(order.total_amount)
    .bind(order.remark)
    .bind(&order.ship.name)
    .bind(&order.ship.phone)
    .bind(&order.ship.province)
    .bind(&order.ship.city)
    .bind(&order.ship.district)
    .bind(&order.ship.detail)
    .bind(order.created_at)
    .execute(conn)
    .await?
    .last_insert_rowid();
    Ok(id)
}

pub async fn insert_item(
    conn: &mut SqliteConnection,
    order_id: i64,
    item: &NewOrderItem<'_>,
    created_at: i64,
) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO order_items (order_id, product_id, product_name, quantity, price_cents, created_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(order_id)
    .bind(item.product_id)
    .bind(item.product_name)
    .bind(item.quantity)
    .bind(item.price)
    .bind(created_at)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> RepoResult<Option<Order>> {
    let sql = format!("{ORDER_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Order>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

pub async fn find_items(conn: &mut SqliteConnection, order_id: i64) -> RepoResult<Vec<OrderItem>> {
    let sql = format!("{ITEM_SELECT} WHERE oi.order_id = ? ORDER BY oi.id");
    let rows = sqlx::query_as::<_, OrderItem>(&sql)
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(rows)
}

/// 订单及其明细
pub async fn find_detail(conn: &mut SqliteConnection, id: i64) -> RepoResult<Option<OrderDetail>> {
    let Some(order) = find_by_id(&mut *conn, id).await? else {
        return Ok(None);
    };
    let items = find_items(conn, id).await?;
    Ok(Some(OrderDetail { order, items }))
}

async fn attach_items(
    conn: &mut SqliteConnection,
    orders: Vec<Order>,
) -> RepoResult<Vec<OrderDetail>> {
    let mut details = Vec::with_capacity(orders.len());
    for order in orders {
        let items = find_items(&mut *conn, order.id).await?;
        details.push(OrderDetail { order, items });
    }
    Ok(details)
}

/// 用户订单 (最新在前)
pub async fn list_by_user(
    pool: &SqlitePool,
    user_id: i64,
    page: Page,
) -> RepoResult<Vec<OrderDetail>> {
    let mut conn = pool.acquire().await?;
    let sql = format!("{ORDER_SELECT} WHERE user_id = ? ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?");
    let orders = sqlx::query_as::<_, Order>(&sql)
        .bind(user_id)
        .bind(page.limit)
        .bind(page.skip)
        .fetch_all(&mut *conn)
        .await?;
    attach_items(&mut conn, orders).await
}

/// 后台订单列表，可按状态过滤
pub async fn list_all(
    pool: &SqlitePool,
    status: Option<OrderStatus>,
    page: Page,
) -> RepoResult<Vec<OrderDetail>> {
    let mut conn = pool.acquire().await?;
    let orders = match status {
        Some(status) => {
            let sql = format!("{ORDER_SELECT} WHERE status = ? ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?");
            sqlx::query_as::<_, Order>(&sql)
                .bind(status)
                .bind(page.limit)
                .bind(page.skip)
                .fetch_all(&mut *conn)
                .await?
        }
        None => {
            let sql = format!("{ORDER_SELECT} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?");
            sqlx::query_as::<_, Order>(&sql)
                .bind(page.limit)
                .bind(page.skip)
                .fetch_all(&mut *conn)
                .await?
        }
    };
    attach_items(&mut conn, orders).await
}

/// 取消订单：仅 pending / paid 生效
pub async fn mark_cancelled(conn: &mut SqliteConnection, id: i64, now: i64) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE orders SET status = 'cancelled', updated_at = ? WHERE id = ? AND status IN ('pending', 'paid')",
    )
    .bind(now)
    .bind(id)
    .execute(conn)
    .await?;
    Ok(rows.rows_affected() == 1)
}

/// 模拟支付：仅 pending 生效
pub async fn mark_paid(
    conn: &mut SqliteConnection,
    id: i64,
    method: PaymentMethod,
    now: i64,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE orders SET status = 'paid', payment_method = ?1, payment_time = ?2, updated_at = ?2 WHERE id = ?3 AND status = 'pending'",
    )
    .bind(method)
    .bind(now)
    .bind(id)
    .execute(conn)
    .await?;
    Ok(rows.rows_affected() == 1)
}

/// 履约推进 `from -> to`；到达 delivered 时记录送达时间
pub async fn advance_status(
    conn: &mut SqliteConnection,
    id: i64,
    from: OrderStatus,
    to: OrderStatus,
    now: i64,
) -> RepoResult<bool> {
    let delivered = to == OrderStatus::Delivered;
    let rows = sqlx::query(
        "UPDATE orders SET status = ?1, delivery_time = CASE WHEN ?2 THEN ?3 ELSE delivery_time END, updated_at = ?3 WHERE id = ?4 AND status = ?5",
    )
    .bind(to)
    .bind(delivered)
    .bind(now)
    .bind(id)
    .bind(from)
    .execute(conn)
    .await?;
    Ok(rows.rows_affected() == 1)
}
