//! Unified error system for the water-ordering service
//!
//! - [`ErrorCode`]: Standardized error codes for all error types
//! - [`ErrorCategory`]: Classification of errors by domain
//! - [`AppError`]: Rich error type with codes, messages, and details
//! - [`ApiResponse`]: Uniform `{code, data, msg, requestId}` envelope
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode, ApiResponse};
//!
//! let err = AppError::with_message(ErrorCode::ProductOutOfStock, "库存不足")
//!     .with_detail("product_id", 3);
//!
//! let response = ApiResponse::error(&err);
//! assert_eq!(response.code, "6003");
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{ApiResponse, AppError, AppResult, SUCCESS_MESSAGE};
