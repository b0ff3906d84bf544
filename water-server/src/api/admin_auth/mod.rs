//! 管理员认证
//!
//! | 路径 | 方法 | 说明 | 认证 |
//! |------|------|------|------|
//! | /api/admin-auth/login | POST | 用户名密码登录 | 无 |
//! | /api/admin-auth/change-password | POST | 修改密码 | 管理员 |
//! | /api/admin-auth/me | GET | 当前管理员 | 管理员 |

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::AppState;

pub use handler::AdminLoginResponse;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/admin-auth", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(handler::login))
        .route("/change-password", post(handler::change_password))
        .route("/me", get(handler::me))
}
