//! 订单
//!
//! | 路径 | 方法 | 说明 | 认证 |
//! |------|------|------|------|
//! | /api/orders | POST | 创建订单 | 已验证手机号的用户 |
//! | /api/orders | GET | 我的订单 | 用户 |
//! | /api/orders/{id} | GET | 订单详情 | 用户 |
//! | /api/orders/{id}/cancel | PUT | 取消订单 | 用户 |
//! | /api/orders/admin/all | GET | 全部订单 (?status=) | 管理员 |
//! | /api/orders/admin/{id}/ship | PUT | 发货 | 管理员 |
//! | /api/orders/admin/{id}/deliver | PUT | 确认送达 | 管理员 |

mod handler;

use axum::{
    Router,
    routing::{get, put},
};

use crate::core::AppState;

pub use handler::AdminOrderQuery;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handler::list_mine).post(handler::create))
        .route("/admin/all", get(handler::list_all))
        .route("/admin/{id}/ship", put(handler::ship))
        .route("/admin/{id}/deliver", put(handler::deliver))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/cancel", put(handler::cancel))
}
