//! Order API Handlers

use axum::extract::State;
use serde::Deserialize;
use shared::models::{OrderCreate, OrderDetail, OrderStatus, OrderView};

use crate::api::PageQuery;
use crate::auth::{CurrentAdmin, CurrentUser, VerifiedUser};
use crate::core::AppState;
use crate::db::repository::Page;
use crate::utils::validation::{MAX_NOTE_LEN, validate_optional_text};
use crate::utils::{ApiResponse, AppError, AppJson, AppPath, AppQuery, AppResult};

/// `?status=&skip=&limit=`
#[derive(Debug, Default, Deserialize)]
pub struct AdminOrderQuery {
    pub status: Option<String>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

fn views(details: &[OrderDetail]) -> Vec<OrderView> {
    details.iter().map(OrderView::from).collect()
}

/// POST /api/orders
pub async fn create(
    State(state): State<AppState>,
    current: VerifiedUser,
    AppJson(payload): AppJson<OrderCreate>,
) -> AppResult<ApiResponse<OrderView>> {
    let remark = payload
        .remark
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string);
    validate_optional_text(&remark, "remark", MAX_NOTE_LEN)?;

    let detail = state
        .orders
        .create_order(
            current.id,
            payload.address_id,
            &payload.items,
            remark.as_deref(),
        )
        .await?;
    Ok(ApiResponse::success_with_message(
        "订单创建成功",
        OrderView::from(&detail),
    ))
}

/// GET /api/orders
pub async fn list_mine(
    State(state): State<AppState>,
    current: CurrentUser,
    AppQuery(query): AppQuery<PageQuery>,
) -> AppResult<ApiResponse<Vec<OrderView>>> {
    let details = state.orders.get_user_orders(current.id, query.page()).await?;
    Ok(ApiResponse::success_with_message("获取成功", views(&details)))
}

/// GET /api/orders/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    current: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> AppResult<ApiResponse<OrderView>> {
    let detail = state.orders.get_order_by_id(id, Some(current.id)).await?;
    Ok(ApiResponse::success_with_message(
        "获取成功",
        OrderView::from(&detail),
    ))
}

/// PUT /api/orders/{id}/cancel
pub async fn cancel(
    State(state): State<AppState>,
    current: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> AppResult<ApiResponse<OrderView>> {
    let detail = state.orders.cancel_order(id, current.id).await?;
    Ok(ApiResponse::success_with_message(
        "订单已取消",
        OrderView::from(&detail),
    ))
}

/// GET /api/orders/admin/all
pub async fn list_all(
    State(state): State<AppState>,
    _admin: CurrentAdmin,
    AppQuery(query): AppQuery<AdminOrderQuery>,
) -> AppResult<ApiResponse<Vec<OrderView>>> {
    let status = match query.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(raw.parse::<OrderStatus>().map_err(|e| {
            AppError::validation(e.to_string()).with_detail("status", raw)
        })?),
    };
    let details = state
        .orders
        .list_orders(status, Page::new(query.skip, query.limit))
        .await?;
    Ok(ApiResponse::success_with_message("获取成功", views(&details)))
}

/// PUT /api/orders/admin/{id}/ship
pub async fn ship(
    State(state): State<AppState>,
    admin: CurrentAdmin,
    AppPath(id): AppPath<i64>,
) -> AppResult<ApiResponse<OrderView>> {
    let detail = state
        .orders
        .advance_fulfilment(id, OrderStatus::Shipped)
        .await?;
    tracing::info!(order_id = id, admin = %admin.admin.username, "Order shipped");
    Ok(ApiResponse::success_with_message(
        "操作成功",
        OrderView::from(&detail),
    ))
}

/// PUT /api/orders/admin/{id}/deliver
pub async fn deliver(
    State(state): State<AppState>,
    admin: CurrentAdmin,
    AppPath(id): AppPath<i64>,
) -> AppResult<ApiResponse<OrderView>> {
    let detail = state
        .orders
        .advance_fulfilment(id, OrderStatus::Delivered)
        .await?;
    tracing::info!(order_id = id, admin = %admin.admin.username, "Order delivered");
    Ok(ApiResponse::success_with_message(
        "操作成功",
        OrderView::from(&detail),
    ))
}
