//! API 路由模块
//!
//! - [`health`] - 健康检查
//! - [`auth`] - 短信验证码登录
//! - [`admin_auth`] - 管理员登录与改密
//! - [`users`] - 当前用户资料
//! - [`products`] - 商品目录与后台管理
//! - [`addresses`] - 收货地址
//! - [`orders`] - 订单与后台履约
//! - [`payment`] - 模拟支付
//! - [`upload`] - 图片上传

pub mod addresses;
pub mod admin_auth;
pub mod auth;
pub mod health;
pub mod orders;
pub mod payment;
pub mod products;
pub mod upload;
pub mod users;

use axum::Router;
use serde::Deserialize;

use crate::core::AppState;
use crate::db::repository::Page;

/// `?skip=&limit=` query shared by list endpoints
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl PageQuery {
    pub fn page(&self) -> Page {
        Page::new(self.skip, self.limit)
    }
}

/// Build a router with all routes registered (no middleware, no state)
pub fn build_router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(admin_auth::router())
        .merge(users::router())
        .merge(products::router())
        .merge(addresses::router())
        .merge(orders::router())
        .merge(payment::router())
        .merge(upload::router())
}
