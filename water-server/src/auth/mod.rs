//! 认证授权模块
//!
//! - [`JwtService`] - JWT 令牌服务
//! - [`CurrentUser`] / [`VerifiedUser`] / [`CurrentAdmin`] - 请求提取器
//! - [`VerificationCodeStore`] - 短信验证码存储
//! - 管理员密码哈希

pub mod extractor;
pub mod jwt;
pub mod password;
pub mod verification;

pub use extractor::{CurrentAdmin, CurrentUser, VerifiedUser};
pub use jwt::{Claims, JwtConfig, JwtError, JwtService, TokenKind};
pub use password::{MIN_PASSWORD_LEN, hash_password, verify_password};
pub use verification::{CodeError, MemoryCodeStore, VerificationCodeStore};
