//! Shared types for the water-ordering service
//!
//! Error codes and the response envelope, entity models and their views,
//! the fixed-point [`Money`] type and small utilities.

pub mod error;
pub mod models;
pub mod money;
pub mod util;

// Re-exports
pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use money::Money;
