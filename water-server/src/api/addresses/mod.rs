//! 收货地址
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/addresses | GET | 地址列表 (默认在前) |
//! | /api/addresses | POST | 新增地址 |
//! | /api/addresses/{id} | GET | 地址详情 |
//! | /api/addresses/{id} | PUT | 更新地址 |
//! | /api/addresses/{id} | DELETE | 删除地址 |
//!
//! 所有接口只操作当前用户自己的地址。

mod handler;

use axum::{Router, routing::get};

use crate::core::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/addresses", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
}
