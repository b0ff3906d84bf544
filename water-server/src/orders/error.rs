use crate::db::repository::RepoError;
use shared::error::{AppError, ErrorCode};
use shared::models::OrderStatus;
use thiserror::Error;

/// Order lifecycle errors
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("订单商品不能为空")]
    Empty,

    #[error("商品 {0} 的数量必须大于 0")]
    InvalidQuantity(i64),

    #[error("收货地址不存在")]
    AddressNotFound(i64),

    #[error("商品 {0} 不存在")]
    ProductNotFound(i64),

    #[error("商品 {name} 已下架")]
    ProductInactive { product_id: i64, name: String },

    #[error("商品 {name} 库存不足")]
    InsufficientStock {
        product_id: i64,
        name: String,
        requested: i64,
        available: i64,
    },

    #[error("商品 {name} 价格已变动，请刷新后重试")]
    PriceMismatch { product_id: i64, name: String },

    #[error("订单不存在")]
    OrderNotFound(i64),

    #[error("订单状态为 {from}，无法{action}")]
    InvalidTransition {
        order_id: i64,
        from: OrderStatus,
        action: &'static str,
    },

    #[error("不支持的支付方式: {0}")]
    InvalidPaymentMethod(String),

    #[error("订单号生成冲突，请重试")]
    OrderNumberConflict,

    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<sqlx::Error> for OrderError {
    fn from(err: sqlx::Error) -> Self {
        OrderError::Repo(err.into())
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        let message = err.to_string();
        match err {
            OrderError::Empty => AppError::with_message(ErrorCode::OrderEmpty, message),
            OrderError::InvalidQuantity(product_id) => {
                AppError::validation(message).with_detail("product_id", product_id)
            }
            OrderError::AddressNotFound(id) => {
                AppError::with_message(ErrorCode::AddressNotFound, message).with_detail("address_id", id)
            }
            OrderError::ProductNotFound(id) => {
                AppError::with_message(ErrorCode::ProductNotFound, message).with_detail("product_id", id)
            }
            OrderError::ProductInactive { product_id, .. } => {
                AppError::with_message(ErrorCode::ProductInactive, message)
                    .with_detail("product_id", product_id)
            }
            OrderError::InsufficientStock {
                product_id,
                requested,
                available,
                ..
            } => AppError::with_message(ErrorCode::ProductOutOfStock, message)
                .with_detail("product_id", product_id)
                .with_detail("requested", requested)
                .with_detail("available", available),
            OrderError::PriceMismatch { product_id, .. } => {
                AppError::with_message(ErrorCode::OrderPriceMismatch, message)
                    .with_detail("product_id", product_id)
            }
            OrderError::OrderNotFound(id) => {
                AppError::with_message(ErrorCode::OrderNotFound, message).with_detail("order_id", id)
            }
            OrderError::InvalidTransition { order_id, from, .. } => {
                AppError::with_message(ErrorCode::OrderInvalidTransition, message)
                    .with_detail("order_id", order_id)
                    .with_detail("status", from.as_str())
            }
            OrderError::InvalidPaymentMethod(_) => {
                AppError::with_message(ErrorCode::PaymentInvalidMethod, message)
            }
            OrderError::OrderNumberConflict => {
                AppError::with_message(ErrorCode::OrderNumberConflict, message)
            }
            OrderError::Repo(e) => e.into(),
        }
    }
}

pub type OrderResult<T> = Result<T, OrderError>;
