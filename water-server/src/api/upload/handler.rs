//! Image Upload Handler
//!
//! PNG / JPEG / WebP are decoded, re-encoded as JPEG and stored under the
//! SHA-256 of the encoded bytes, so identical uploads share one file.

use axum::extract::{Multipart, State};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::Cursor;
use std::path::Path;

use crate::auth::CurrentAdmin;
use crate::core::AppState;
use crate::utils::{ApiResponse, AppError, AppResult, ErrorCode};

/// Maximum file size (5MB)
pub const MAX_FILE_SIZE: usize = 5 * 1024 * 1024;

/// Supported image formats
pub const SUPPORTED_FORMATS: &[&str] = &["png", "jpg", "jpeg", "webp"];

const JPEG_QUALITY: u8 = 85;

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
    pub filename: String,
    pub size: usize,
}

fn calculate_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
}

/// 大小与扩展名校验
fn validate_upload(data: &[u8], filename: &str) -> Result<(), AppError> {
    if data.is_empty() {
        return Err(AppError::new(ErrorCode::EmptyFile));
    }
    if data.len() > MAX_FILE_SIZE {
        return Err(AppError::with_message(
            ErrorCode::FileTooLarge,
            format!("文件过大，最大 {}MB", MAX_FILE_SIZE / 1024 / 1024),
        )
        .with_detail("size", data.len()));
    }

    match extension_of(filename) {
        Some(ext) if SUPPORTED_FORMATS.contains(&ext.as_str()) => Ok(()),
        other => Err(AppError::with_message(
            ErrorCode::UnsupportedFileFormat,
            format!("不支持的文件格式，仅支持 {}", SUPPORTED_FORMATS.join(", ")),
        )
        .with_detail("extension", other.unwrap_or_default())),
    }
}

/// Decode and re-encode as JPEG
fn reencode_jpeg(data: &[u8]) -> Result<Vec<u8>, AppError> {
    let img = image::load_from_memory(data).map_err(|e| {
        AppError::with_message(ErrorCode::InvalidImageFile, "无法识别的图片文件")
            .with_detail("reason", e.to_string())
    })?;

    let mut buffer = Vec::new();
    let encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(Cursor::new(&mut buffer), JPEG_QUALITY);
    img.to_rgb8()
        .write_with_encoder(encoder)
        .map_err(|e| AppError::internal(format!("Failed to encode image: {e}")))?;
    Ok(buffer)
}

/// Write `<hash>.jpg`; an existing file with the same name is reused
async fn store(upload_dir: &Path, data: &[u8]) -> Result<String, AppError> {
    let filename = format!("{}.jpg", calculate_hash(data));
    let path = upload_dir.join(&filename);

    let storage_err = |e: std::io::Error| {
        tracing::error!(path = %path.display(), error = %e, "Failed to store upload");
        AppError::new(ErrorCode::FileStorageFailed)
    };

    if tokio::fs::try_exists(&path).await.map_err(storage_err)? {
        tracing::info!(file = %filename, "Duplicate image, reusing stored file");
        return Ok(filename);
    }
    tokio::fs::create_dir_all(upload_dir)
        .await
        .map_err(storage_err)?;
    tokio::fs::write(&path, data).await.map_err(storage_err)?;
    Ok(filename)
}

/// POST /api/upload/image
pub async fn upload_image(
    State(state): State<AppState>,
    admin: CurrentAdmin,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<UploadResponse>> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or_default().to_string();
            let data = field.bytes().await?.to_vec();
            upload = Some((filename, data));
            break;
        }
    }

    let (original_name, data) = upload.ok_or_else(|| AppError::new(ErrorCode::NoFileProvided))?;
    validate_upload(&data, &original_name)?;

    let encoded = tokio::task::spawn_blocking(move || reencode_jpeg(&data))
        .await
        .map_err(|e| AppError::internal(format!("Image task failed: {e}")))??;

    let filename = store(&state.config.upload_dir, &encoded).await?;
    tracing::info!(
        admin = %admin.admin.username,
        original_name = %original_name,
        file = %filename,
        size = encoded.len(),
        "Image uploaded"
    );

    Ok(ApiResponse::success_with_message(
        "上传成功",
        UploadResponse {
            url: state.config.public_file_url(&filename),
            size: encoded.len(),
            filename,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(4, 4, image::Rgb([0, 120, 255]));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn test_validate_upload() {
        assert!(validate_upload(b"x", "a.PNG").is_ok());
        assert_eq!(
            validate_upload(b"", "a.png").unwrap_err().code,
            ErrorCode::EmptyFile
        );
        assert_eq!(
            validate_upload(b"x", "a.gif").unwrap_err().code,
            ErrorCode::UnsupportedFileFormat
        );
        assert_eq!(
            validate_upload(b"x", "noext").unwrap_err().code,
            ErrorCode::UnsupportedFileFormat
        );
        let big = vec![0u8; MAX_FILE_SIZE + 1];
        assert_eq!(
            validate_upload(&big, "a.jpg").unwrap_err().code,
            ErrorCode::FileTooLarge
        );
    }

    #[test]
    fn test_reencode_rejects_garbage() {
        assert_eq!(
            reencode_jpeg(b"not an image").unwrap_err().code,
            ErrorCode::InvalidImageFile
        );
        let jpeg = reencode_jpeg(&png_bytes()).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }

    #[tokio::test]
    async fn test_store_is_content_addressed() {
        let dir = tempfile::tempdir().unwrap();
        let jpeg = reencode_jpeg(&png_bytes()).unwrap();

        let first = store(dir.path(), &jpeg).await.unwrap();
        let second = store(dir.path(), &jpeg).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64 + ".jpg".len());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
