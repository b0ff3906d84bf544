//! Input validation helpers
//!
//! Centralized text length constants and validation functions.
//! SQLite TEXT has no built-in length enforcement.

use shared::Money;
use shared::error::{AppError, ErrorCode};
use shared::money::MAX_PRICE;

// ── Text length limits ──────────────────────────────────────────────

/// Entity names: product, recipient, nickname
pub const MAX_NAME_LEN: usize = 200;

/// Notes, descriptions, order remark
pub const MAX_NOTE_LEN: usize = 500;

/// Passwords (before hashing)
pub const MAX_PASSWORD_LEN: usize = 128;

/// URLs / image paths
pub const MAX_URL_LEN: usize = 2048;

/// Addresses (province / city / district / detail)
pub const MAX_ADDRESS_LEN: usize = 500;

/// Mainland mobile numbers
pub const PHONE_LEN: usize = 11;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        )));
    }
    Ok(())
}

/// 11 位数字手机号
pub fn validate_phone(phone: &str) -> Result<(), AppError> {
    if phone.len() != PHONE_LEN || !phone.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::validation("手机号格式不正确").with_detail("phone", phone));
    }
    Ok(())
}

/// 价格：0 ~ MAX_PRICE
pub fn validate_price(price: Money) -> Result<(), AppError> {
    if price.is_negative() || price.amount() > MAX_PRICE {
        return Err(AppError::with_message(
            ErrorCode::ProductInvalidPrice,
            format!("price must be between 0 and {MAX_PRICE}"),
        ));
    }
    Ok(())
}

pub fn validate_stock(stock: i64) -> Result<(), AppError> {
    if stock < 0 {
        return Err(AppError::validation("stock must not be negative"));
    }
    Ok(())
}
