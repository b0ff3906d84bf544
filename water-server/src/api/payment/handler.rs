use axum::extract::State;
use shared::models::{OrderView, PaymentRequest};

use crate::auth::CurrentUser;
use crate::core::AppState;
use crate::utils::{ApiResponse, AppJson, AppResult};

/// POST /api/payment/pay
pub async fn pay(
    State(state): State<AppState>,
    current: CurrentUser,
    AppJson(req): AppJson<PaymentRequest>,
) -> AppResult<ApiResponse<OrderView>> {
    let method = req
        .payment_method
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty());
    let detail = state
        .orders
        .mark_paid(req.order_id, current.id, method)
        .await?;
    Ok(ApiResponse::success_with_message(
        "支付成功",
        OrderView::from(&detail),
    ))
}
