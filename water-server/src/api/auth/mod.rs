//! 短信验证码登录
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/auth/send-code | POST | 发送验证码 |
//! | /api/auth/phone-login | POST | 验证码登录 |

mod handler;

use axum::{Router, routing::post};

use crate::core::AppState;

pub use handler::{LoginResponse, PhoneLogin, SendCodeRequest};

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/auth", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/send-code", post(handler::send_code))
        .route("/phone-login", post(handler::phone_login))
}
