//! 短信验证码存储
//!
//! 以手机号为键保存 `{code, expires_at, attempts}`。验证成功、过期或错误次数
//! 超限时删除条目。[`MemoryCodeStore`] 为进程内实现，过期条目由后台任务定期清理。

use async_trait::async_trait;
use dashmap::DashMap;
use std::time::{Duration, Instant};
use thiserror::Error;

use shared::error::{AppError, ErrorCode};

/// 验证码位数
pub const CODE_LENGTH: u32 = 6;

/// 单个验证码允许的最大错误次数
pub const MAX_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodeError {
    #[error("验证码不存在或已过期")]
    NotFound,

    #[error("验证码已过期")]
    Expired,

    #[error("验证码错误，还可尝试 {remaining} 次")]
    Mismatch { remaining: u32 },

    #[error("验证码错误次数过多，请重新获取")]
    TooManyAttempts,
}

impl From<CodeError> for AppError {
    fn from(err: CodeError) -> Self {
        let code = match err {
            CodeError::TooManyAttempts => ErrorCode::TooManyAttempts,
            _ => ErrorCode::VerificationCodeInvalid,
        };
        AppError::with_message(code, err.to_string())
    }
}

/// Keyed verification code store
#[async_trait]
pub trait VerificationCodeStore: Send + Sync {
    /// Issue a code for `phone`; an unexpired code is returned unchanged
    async fn issue(&self, phone: &str, ttl: Duration) -> String;

    /// Check and consume the code
    async fn verify(&self, phone: &str, code: &str) -> Result<(), CodeError>;

    /// Drop expired entries, returns how many were removed
    async fn purge_expired(&self) -> usize;
}

#[derive(Debug, Clone)]
struct CodeEntry {
    code: String,
    expires_at: Instant,
    attempts: u32,
}

impl CodeEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-process store backed by `DashMap`
#[derive(Debug, Default)]
pub struct MemoryCodeStore {
    entries: DashMap<String, CodeEntry>,
}

impl MemoryCodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl VerificationCodeStore for MemoryCodeStore {
    async fn issue(&self, phone: &str, ttl: Duration) -> String {
        let now = Instant::now();
        let mut entry = self
            .entries
            .entry(phone.to_string())
            .or_insert_with(|| CodeEntry {
                code: shared::util::generate_numeric_code(CODE_LENGTH),
                expires_at: now + ttl,
                attempts: 0,
            });
        if entry.is_expired(now) {
            *entry = CodeEntry {
                code: shared::util::generate_numeric_code(CODE_LENGTH),
                expires_at: now + ttl,
                attempts: 0,
            };
        }
        entry.code.clone()
    }

    async fn verify(&self, phone: &str, code: &str) -> Result<(), CodeError> {
        let now = Instant::now();
        let outcome = {
            let Some(mut entry) = self.entries.get_mut(phone) else {
                return Err(CodeError::NotFound);
            };
            if entry.is_expired(now) {
                Err(CodeError::Expired)
            } else if entry.code == code {
                Ok(())
            } else {
                entry.attempts += 1;
                if entry.attempts >= MAX_ATTEMPTS {
                    Err(CodeError::TooManyAttempts)
                } else {
                    Err(CodeError::Mismatch {
                        remaining: MAX_ATTEMPTS - entry.attempts,
                    })
                }
            }
        };

        if !matches!(outcome, Err(CodeError::Mismatch { .. })) {
            self.entries.remove(phone);
        }
        outcome
    }

    async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before.saturating_sub(self.entries.len())
    }
}
