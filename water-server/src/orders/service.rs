//! OrderService - 订单生命周期
//!
//! ```text
//! create_order(user, address, items)
//!     ├─ 1. Validate lines, merge duplicate products
//!     ├─ 2. Begin transaction
//!     ├─ 3. Address ownership check
//!     ├─ 4. Product checks (exists, active, price, stock)
//!     ├─ 5. Conditional stock decrement per line
//!     ├─ 6. Insert header (order_no retried on collision) + items
//!     └─ 7. Commit
//! ```
//!
//! Every step runs inside one transaction; any failure drops it and SQLite
//! rolls back everything written so far.

use chrono::{DateTime, Utc};
use shared::Money;
use shared::models::{
    AddressSnapshot, OrderDetail, OrderItemInput, OrderStatus, PaymentMethod,
};
use shared::util::generate_order_no;
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};

use super::error::{OrderError, OrderResult};
use crate::db::repository::order::{NewOrder, NewOrderItem};
use crate::db::repository::{Page, RepoError, address, order, product};

/// Attempts at a fresh order number before giving up
pub const ORDER_NO_ATTEMPTS: usize = 3;

/// A merged, validated order line
#[derive(Debug, Clone, PartialEq, Eq)]
struct Line {
    product_id: i64,
    quantity: i64,
    client_price: Option<Money>,
}

/// Sum quantities of repeated products, keeping first-seen order
fn merge_lines(items: &[OrderItemInput]) -> OrderResult<Vec<Line>> {
    if items.is_empty() {
        return Err(OrderError::Empty);
    }
    let mut lines: Vec<Line> = Vec::with_capacity(items.len());
    for item in items {
        if item.quantity < 1 {
            return Err(OrderError::InvalidQuantity(item.product_id));
        }
        match lines.iter_mut().find(|l| l.product_id == item.product_id) {
            Some(line) => {
                line.quantity = line
                    .quantity
                    .checked_add(item.quantity)
                    .ok_or(OrderError::InvalidQuantity(item.product_id))?;
                if line.client_price.is_none() {
                    line.client_price = item.price;
                }
            }
            None => lines.push(Line {
                product_id: item.product_id,
                quantity: item.quantity,
                client_price: item.price,
            }),
        }
    }
    Ok(lines)
}

/// Order number source, swapped out in tests to force collisions
pub type OrderNoGenerator = fn(DateTime<Utc>) -> String;

/// Order lifecycle over the relational store
#[derive(Debug, Clone)]
pub struct OrderService {
    pool: SqlitePool,
    order_no: OrderNoGenerator,
}

impl OrderService {
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_order_no_generator(pool, generate_order_no)
    }

    pub fn with_order_no_generator(pool: SqlitePool, order_no: OrderNoGenerator) -> Self {
        Self { pool, order_no }
    }

    /// 写事务：BEGIN IMMEDIATE 先拿写锁，并发写者由 busy_timeout 排队
    async fn begin_write(&self) -> OrderResult<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    /// 创建订单
    pub async fn create_order(
        &self,
        user_id: i64,
        address_id: i64,
        items: &[OrderItemInput],
        remark: Option<&str>,
    ) -> OrderResult<OrderDetail> {
        let lines = merge_lines(items)?;
        let mut tx = self.begin_write().await?;

        let address = address::find_owned_in(&mut tx, address_id, user_id)
            .await?
            .ok_or(OrderError::AddressNotFound(address_id))?;
        let ship = AddressSnapshot::from(&address);

        let mut priced = Vec::with_capacity(lines.len());
        for line in &lines {
            let p = product::find_by_id_in(&mut tx, line.product_id)
                .await?
                .ok_or(OrderError::ProductNotFound(line.product_id))?;
            if !p.is_active {
                return Err(OrderError::ProductInactive {
                    product_id: p.id,
                    name: p.name,
                });
            }
            if let Some(client_price) = line.client_price
                && client_price != p.price
            {
                return Err(OrderError::PriceMismatch {
                    product_id: p.id,
                    name: p.name,
                });
            }
            if line.quantity > p.stock {
                return Err(OrderError::InsufficientStock {
                    product_id: p.id,
                    name: p.name,
                    requested: line.quantity,
                    available: p.stock,
                });
            }
            priced.push((line.quantity, p));
        }

        let total: Money = priced.iter().map(|(qty, p)| p.price.times(*qty)).sum();

        for (qty, p) in &priced {
            if !product::decrement_stock(&mut tx, p.id, *qty).await? {
                return Err(OrderError::InsufficientStock {
                    product_id: p.id,
                    name: p.name.clone(),
                    requested: *qty,
                    available: current_stock(&mut tx, p.id).await?,
                });
            }
        }

        let now = Utc::now();
        let created_at = now.timestamp_millis();
        let mut order_id = None;
        for attempt in 1..=ORDER_NO_ATTEMPTS {
            let order_no = (self.order_no)(now);
            let header = NewOrder {
                order_no: &order_no,
                user_id,
                address_id,
                total_amount: total,
                remark,
                ship: &ship,
                created_at,
            };
            match order::insert(&mut tx, &header).await {
                Ok(id) => {
                    order_id = Some(id);
                    break;
                }
                Err(RepoError::Duplicate(_)) => {
                    tracing::warn!(order_no = %order_no, attempt, "Order number collision, regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }
        let order_id = order_id.ok_or(OrderError::OrderNumberConflict)?;

        for (qty, p) in &priced {
            let item = NewOrderItem {
                product_id: p.id,
                product_name: &p.name,
                quantity: *qty,
                price: p.price,
            };
            order::insert_item(&mut tx, order_id, &item, created_at).await?;
        }

        let detail = order::find_detail(&mut tx, order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))?;
        tx.commit().await?;

        tracing::info!(
            order_id,
            order_no = %detail.order.order_no,
            user_id,
            total = %detail.order.total_amount,
            "Order created"
        );
        Ok(detail)
    }

    /// 用户订单列表 (最新在前)
    pub async fn get_user_orders(&self, user_id: i64, page: Page) -> OrderResult<Vec<OrderDetail>> {
        Ok(order::list_by_user(&self.pool, user_id, page).await?)
    }

    /// 按 ID 查询；传入 `user_id` 时校验归属
    pub async fn get_order_by_id(
        &self,
        order_id: i64,
        user_id: Option<i64>,
    ) -> OrderResult<OrderDetail> {
        let mut conn = self.pool.acquire().await?;
        load_owned(&mut conn, order_id, user_id).await
    }

    /// 取消订单并归还库存
    pub async fn cancel_order(&self, order_id: i64, user_id: i64) -> OrderResult<OrderDetail> {
        let mut tx = self.begin_write().await?;
        let detail = load_owned(&mut tx, order_id, Some(user_id)).await?;
        let from = detail.order.status;
        if !from.can_cancel() {
            return Err(OrderError::InvalidTransition {
                order_id,
                from,
                action: "取消",
            });
        }

        let now = shared::util::now_millis();
        if !order::mark_cancelled(&mut tx, order_id, now).await? {
            return Err(OrderError::InvalidTransition {
                order_id,
                from: reload_status(&mut tx, order_id).await?,
                action: "取消",
            });
        }
        for item in &detail.items {
            product::restore_stock(&mut tx, item.product_id, item.quantity).await?;
        }

        let detail = load_owned(&mut tx, order_id, Some(user_id)).await?;
        tx.commit().await?;

        tracing::info!(order_id, order_no = %detail.order.order_no, from = %from, "Order cancelled");
        Ok(detail)
    }

    /// 模拟支付：pending -> paid
    pub async fn mark_paid(
        &self,
        order_id: i64,
        user_id: i64,
        payment_method: Option<&str>,
    ) -> OrderResult<OrderDetail> {
        let method = match payment_method {
            Some(raw) => raw
                .parse::<PaymentMethod>()
                .map_err(|e| OrderError::InvalidPaymentMethod(e.0))?,
            None => PaymentMethod::default(),
        };

        let mut tx = self.begin_write().await?;
        let detail = load_owned(&mut tx, order_id, Some(user_id)).await?;
        let from = detail.order.status;
        if !from.can_pay() {
            return Err(OrderError::InvalidTransition {
                order_id,
                from,
                action: "支付",
            });
        }

        let now = shared::util::now_millis();
        if !order::mark_paid(&mut tx, order_id, method, now).await? {
            return Err(OrderError::InvalidTransition {
                order_id,
                from: reload_status(&mut tx, order_id).await?,
                action: "支付",
            });
        }

        let detail = load_owned(&mut tx, order_id, Some(user_id)).await?;
        tx.commit().await?;

        tracing::info!(order_id, method = method.as_str(), "Order paid (simulated)");
        Ok(detail)
    }

    /// 后台履约：paid -> shipped -> delivered
    pub async fn advance_fulfilment(
        &self,
        order_id: i64,
        target: OrderStatus,
    ) -> OrderResult<OrderDetail> {
        let action = match target {
            OrderStatus::Delivered => "确认送达",
            _ => "发货",
        };
        let mut tx = self.begin_write().await?;
        let detail = load_owned(&mut tx, order_id, None).await?;
        let from = detail.order.status;
        if from.next_fulfilment() != Some(target) {
            return Err(OrderError::InvalidTransition {
                order_id,
                from,
                action,
            });
        }

        let now = shared::util::now_millis();
        if !order::advance_status(&mut tx, order_id, from, target, now).await? {
            return Err(OrderError::InvalidTransition {
                order_id,
                from: reload_status(&mut tx, order_id).await?,
                action,
            });
        }

        let detail = load_owned(&mut tx, order_id, None).await?;
        tx.commit().await?;

        tracing::info!(order_id, from = %from, to = %target, "Order fulfilment advanced");
        Ok(detail)
    }

    /// 后台订单列表
    pub async fn list_orders(
        &self,
        status: Option<OrderStatus>,
        page: Page,
    ) -> OrderResult<Vec<OrderDetail>> {
        Ok(order::list_all(&self.pool, status, page).await?)
    }
}

/// Load an order, hiding orders owned by someone else
async fn load_owned(
    conn: &mut SqliteConnection,
    order_id: i64,
    user_id: Option<i64>,
) -> OrderResult<OrderDetail> {
    match order::find_detail(conn, order_id).await? {
        Some(detail) if user_id.is_none_or(|uid| uid == detail.order.user_id) => Ok(detail),
        _ => Err(OrderError::OrderNotFound(order_id)),
    }
}

async fn reload_status(conn: &mut SqliteConnection, order_id: i64) -> OrderResult<OrderStatus> {
    order::find_by_id(conn, order_id)
        .await?
        .map(|o| o.status)
        .ok_or(OrderError::OrderNotFound(order_id))
}

async fn current_stock(conn: &mut SqliteConnection, product_id: i64) -> OrderResult<i64> {
    Ok(product::find_by_id_in(conn, product_id)
        .await?
        .map(|p| p.stock)
        .unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(product_id: i64, quantity: i64) -> OrderItemInput {
        OrderItemInput {
            product_id,
            quantity,
            price: None,
        }
    }

    #[test]
    fn test_merge_lines_sums_duplicates() {
        let lines = merge_lines(&[input(2, 1), input(1, 3), input(2, 4)]).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!((lines[0].product_id, lines[0].quantity), (2, 5));
        assert_eq!((lines[1].product_id, lines[1].quantity), (1, 3));
    }

    #[test]
    fn test_merge_lines_rejects_bad_input() {
        assert!(matches!(merge_lines(&[]), Err(OrderError::Empty)));
        assert!(matches!(
            merge_lines(&[input(1, 1), input(7, 0)]),
            Err(OrderError::InvalidQuantity(7))
        ));
    }

    #[test]
    fn test_merge_lines_quantity_overflow() {
        assert!(matches!(
            merge_lines(&[input(3, i64::MAX), input(3, 1)]),
            Err(OrderError::InvalidQuantity(3))
        ));
    }
}
