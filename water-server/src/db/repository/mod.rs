//! Repository Module
//!
//! Free functions over `&SqlitePool`. Functions that must join a caller's
//! transaction take `&mut SqliteConnection` instead (pass `&mut *tx`).

pub mod address;
pub mod admin_user;
pub mod order;
pub mod product;
pub mod user;

use shared::error::{AppError, ErrorCode};
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error()
            && db_err.is_unique_violation()
        {
            return RepoError::Duplicate(db_err.message().to_string());
        }
        RepoError::Database(err.to_string())
    }
}

impl From<shared::money::MoneyError> for RepoError {
    fn from(err: shared::money::MoneyError) -> Self {
        RepoError::Validation(err.to_string())
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => AppError::with_message(ErrorCode::NotFound, msg),
            RepoError::Duplicate(msg) => AppError::with_message(ErrorCode::AlreadyExists, msg),
            RepoError::Validation(msg) => AppError::validation(msg),
            RepoError::Database(msg) => {
                tracing::error!(target: "database", error = %msg, "Database error occurred");
                AppError::new(ErrorCode::DatabaseError)
            }
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Offset/limit pair, limit clamped to `1..=MAX_PAGE_SIZE`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: i64,
    pub limit: i64,
}

pub const MAX_PAGE_SIZE: i64 = 100;

impl Page {
    pub fn new(skip: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            skip: skip.unwrap_or(0).max(0),
            limit: limit.unwrap_or(MAX_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_clamp() {
        assert_eq!(Page::new(None, None), Page { skip: 0, limit: 100 });
        assert_eq!(Page::new(Some(-5), Some(0)), Page { skip: 0, limit: 1 });
        assert_eq!(Page::new(Some(20), Some(500)), Page { skip: 20, limit: 100 });
    }

    #[test]
    fn test_repo_error_to_app_error() {
        let err: AppError = RepoError::Database("disk I/O".into()).into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(!err.message.contains("disk"));

        let err: AppError = RepoError::Duplicate("phone".into()).into();
        assert_eq!(err.code, ErrorCode::AlreadyExists);
    }
}
