//! JWT Extractors
//!
//! - [`CurrentUser`] - 有效的用户令牌且账户启用
//! - [`VerifiedUser`] - 在 `CurrentUser` 基础上要求手机号已验证
//! - [`CurrentAdmin`] - 有效的管理员令牌

use axum::{extract::FromRequestParts, http::request::Parts};
use shared::error::{AppError, ErrorCode};
use shared::models::{AdminUser, User};

use crate::auth::{Claims, JwtError, JwtService, TokenKind};
use crate::core::AppState;
use crate::db::repository::{admin_user, user};
use crate::security_log;

/// Authenticated consumer
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub user: User,
}

/// Authenticated consumer whose phone number has been verified
#[derive(Debug, Clone)]
pub struct VerifiedUser {
    pub id: i64,
    pub user: User,
}

/// Authenticated back-office account
#[derive(Debug, Clone)]
pub struct CurrentAdmin {
    pub id: i64,
    pub admin: AdminUser,
}

/// Validate the bearer token, returning its claims
fn bearer_claims(parts: &Parts, state: &AppState) -> Result<Claims, AppError> {
    let auth_header = parts
        .headers
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) => JwtService::extract_from_header(header)
            .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
        None => {
            security_log!("WARN", "auth_missing", uri = format!("{:?}", parts.uri));
            return Err(AppError::unauthorized());
        }
    };

    state.jwt.validate_token(token).map_err(|e| {
        security_log!(
            "WARN",
            "auth_failed",
            error = format!("{}", e),
            uri = format!("{:?}", parts.uri)
        );
        match e {
            JwtError::ExpiredToken => AppError::token_expired(),
            _ => AppError::invalid_token("Invalid token"),
        }
    })
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(current) = parts.extensions.get::<CurrentUser>() {
            return Ok(current.clone());
        }

        let claims = bearer_claims(parts, state)?;
        if claims.kind != TokenKind::User {
            security_log!("WARN", "user_token_required", name = claims.name.clone());
            return Err(AppError::permission_denied("需要用户登录"));
        }
        let id = claims
            .subject_id()
            .map_err(|e| AppError::invalid_token(e.to_string()))?;

        let user = user::find_by_id(&state.pool, id)
            .await?
            .ok_or_else(|| AppError::invalid_token("User no longer exists"))?;
        if !user.is_active {
            security_log!("WARN", "account_disabled", user_id = id);
            return Err(AppError::new(ErrorCode::AccountDisabled));
        }

        let current = CurrentUser { id, user };
        parts.extensions.insert(current.clone());
        Ok(current)
    }
}

impl FromRequestParts<AppState> for VerifiedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser { id, user } = CurrentUser::from_request_parts(parts, state).await?;
        if !user.phone_verified {
            return Err(AppError::new(ErrorCode::PhoneNotVerified));
        }
        Ok(VerifiedUser { id, user })
    }
}

impl FromRequestParts<AppState> for CurrentAdmin {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claims = bearer_claims(parts, state)?;
        if claims.kind != TokenKind::Admin {
            security_log!(
                "WARN",
                "admin_required",
                name = claims.name.clone(),
                uri = format!("{:?}", parts.uri)
            );
            return Err(AppError::new(ErrorCode::AdminRequired));
        }
        let id = claims
            .subject_id()
            .map_err(|e| AppError::invalid_token(e.to_string()))?;

        let admin = admin_user::find_by_id(&state.pool, id)
            .await?
            .ok_or_else(|| AppError::invalid_token("Admin no longer exists"))?;
        Ok(CurrentAdmin { id, admin })
    }
}
