//! 图片上传
//!
//! | 路径 | 方法 | 说明 | 认证 |
//! |------|------|------|------|
//! | /api/upload/image | POST | 上传商品图片 (multipart `file`) | 管理员 |
//!
//! 文件保存在 `UPLOAD_DIR`，经 `/static` 对外提供。

mod handler;

use axum::{Router, extract::DefaultBodyLimit, routing::post};

use crate::core::AppState;

pub use handler::{MAX_FILE_SIZE, SUPPORTED_FORMATS, UploadResponse};

/// multipart 编码开销预留
const BODY_LIMIT: usize = MAX_FILE_SIZE + 1024 * 1024;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/upload", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/image", post(handler::upload_image))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
}
