//! 商品目录
//!
//! | 路径 | 方法 | 说明 | 认证 |
//! |------|------|------|------|
//! | /api/products | GET | 上架商品列表 | 无 |
//! | /api/products/{id} | GET | 商品详情 | 无 |
//! | /api/products/admin/all | GET | 全部商品 | 管理员 |
//! | /api/products | POST | 创建商品 | 管理员 |
//! | /api/products/{id} | PUT | 更新商品 | 管理员 |
//! | /api/products/{id} | DELETE | 删除商品 | 管理员 |
//! | /api/products/{id}/toggle | PATCH | 上架/下架 | 管理员 |
//! | /api/products/{id}/stock | PATCH | 设置库存 | 管理员 |

mod handler;

use axum::{
    Router,
    routing::{get, patch},
};

use crate::core::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/products", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/admin/all", get(handler::list_all))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
        .route("/{id}/toggle", patch(handler::toggle))
        .route("/{id}/stock", patch(handler::set_stock))
}
