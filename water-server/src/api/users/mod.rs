//! 当前用户资料
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/users/me | GET | 获取资料 |
//! | /api/users/me | PUT | 更新资料 (更换手机号需重新验证) |

mod handler;

use axum::{Router, routing::get};

use crate::core::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/users", routes())
}

fn routes() -> Router<AppState> {
    Router::new().route("/me", get(handler::me).put(handler::update_me))
}
