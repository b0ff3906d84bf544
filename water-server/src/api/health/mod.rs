//! 健康检查路由
//!
//! | 路径 | 方法 | 说明 | 认证 |
//! |------|------|------|------|
//! | / | GET | 服务信息 | 无 |
//! | /health | GET | 健康检查 (含数据库) | 无 |

use axum::{Router, extract::State, routing::get};
use serde::Serialize;

use crate::core::AppState;
use crate::utils::{ApiResponse, AppResult};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
}

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    message: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// ok | degraded
    status: &'static str,
    database: &'static str,
}

async fn root() -> AppResult<ApiResponse<ServiceInfo>> {
    Ok(ApiResponse::success(ServiceInfo {
        message: "网上订水 API 服务运行中",
        version: env!("CARGO_PKG_VERSION"),
    }))
}

async fn health(State(state): State<AppState>) -> AppResult<ApiResponse<HealthResponse>> {
    let database = match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => "ok",
        Err(e) => {
            tracing::warn!(error = %e, "Health check: database unreachable");
            "unavailable"
        }
    };
    Ok(ApiResponse::success(HealthResponse {
        status: if database == "ok" { "ok" } else { "degraded" },
        database,
    }))
}
