//! Server Implementation
//!
//! HTTP 服务器组装、启动和优雅关闭

use axum::Router;
use axum::extract::Request;
use http::HeaderValue;
use tower::Layer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::core::{AppState, Config, Result};
use shared::error::{AppError, ErrorCode};

/// CORS 策略：包含 `*` 时全部放行，否则仅允许列出的来源
fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn fallback() -> AppError {
    AppError::with_message(ErrorCode::NotFound, "接口不存在")
}

/// Build the router with every route, middleware and state
pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();
    api::build_router()
        .nest_service("/static", ServeDir::new(&config.upload_dir))
        .fallback(fallback)
        .layer(cors_layer(&config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Router wrapped so `/api/orders/` and `/api/orders` hit the same route
///
/// Used by both the HTTP server and the integration tests.
pub fn build_app(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(build_router(state))
}

/// HTTP Server
pub struct Server {
    config: Config,
    state: Option<AppState>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Create server with existing state
    pub fn with_state(config: Config, state: AppState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    pub async fn run(self) -> Result<()> {
        let state = match self.state {
            Some(s) => s,
            None => AppState::initialize(self.config.clone()).await?,
        };

        std::fs::create_dir_all(&self.config.upload_dir)?;
        let tasks = state.start_background_tasks();

        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(env = %self.config.environment, "Water server listening on {}", addr);

        let app = build_app(state);
        let shutdown = async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down...");
        };
        axum::serve(
            listener,
            axum::ServiceExt::<Request>::into_make_service(app),
        )
        .with_graceful_shutdown(shutdown)
        .await?;

        tasks.shutdown().await;
        Ok(())
    }
}
