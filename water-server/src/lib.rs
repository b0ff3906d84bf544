//! Water Server - 网上订水后端
//!
//! # 模块结构
//!
//! ```text
//! water-server/src/
//! ├── core/          # 配置、状态、服务器、后台任务
//! ├── auth/          # JWT、验证码、管理员密码
//! ├── db/            # SQLite 连接与 repository
//! ├── orders/        # 订单生命周期 (库存、快照、状态流转)
//! ├── api/           # HTTP 路由和处理器
//! └── utils/         # 提取器、日志、输入校验
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod orders;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentAdmin, CurrentUser, JwtService};
pub use core::{AppState, Config, Server};
pub use orders::{OrderError, OrderService};
pub use utils::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

pub use core::server::{build_app, build_router};
pub use utils::logger::init_logger;

// Security logging macro - 输出到 `security` target
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}
