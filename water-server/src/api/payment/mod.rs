//! 模拟支付
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/payment/pay | POST | 支付待付款订单 (不对接真实渠道) |

mod handler;

use axum::{Router, routing::post};

use crate::core::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/payment", routes())
}

fn routes() -> Router<AppState> {
    Router::new().route("/pay", post(handler::pay))
}
