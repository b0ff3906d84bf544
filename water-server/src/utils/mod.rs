//! 工具模块 - 通用工具函数和类型
//!
//! - [`AppError`] / [`ApiResponse`] - 错误与响应信封 (from shared::error)
//! - [`AppJson`] / [`AppQuery`] / [`AppPath`] - 请求提取器
//! - 日志、输入校验

pub mod extract;
pub mod logger;
pub mod validation;

pub use extract::{AppJson, AppPath, AppQuery};
pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
