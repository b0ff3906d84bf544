//! Phone login handlers

use axum::extract::State;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use shared::models::UserView;

use crate::auth::TokenKind;
use crate::core::AppState;
use crate::db::repository::user;
use crate::security_log;
use crate::utils::validation::validate_phone;
use crate::utils::{ApiResponse, AppError, AppJson, AppResult};

#[derive(Debug, Deserialize)]
pub struct SendCodeRequest {
    pub phone: String,
}

#[derive(Debug, Deserialize)]
pub struct PhoneLogin {
    pub phone: String,
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserView,
}

/// 发送验证码 (开发环境直接返回验证码)
pub async fn send_code(
    State(state): State<AppState>,
    AppJson(req): AppJson<SendCodeRequest>,
) -> AppResult<ApiResponse<Value>> {
    let phone = req.phone.trim();
    validate_phone(phone)?;

    let code = state.codes.issue(phone, state.code_ttl()).await;

    if state.config.is_development() {
        tracing::info!(phone = %phone, code = %code, "Verification code issued (development)");
        Ok(ApiResponse::success(json!({ "verifyCode": code })))
    } else {
        tracing::info!(phone = %phone, "Verification code issued");
        Ok(ApiResponse::success(json!({ "sent": true })))
    }
}

/// 手机号验证码登录，用户不存在时自动注册
pub async fn phone_login(
    State(state): State<AppState>,
    AppJson(req): AppJson<PhoneLogin>,
) -> AppResult<ApiResponse<LoginResponse>> {
    let phone = req.phone.trim();
    validate_phone(phone)?;

    if let Err(e) = state.codes.verify(phone, req.code.trim()).await {
        security_log!("WARN", "code_rejected", phone = phone.to_string(), reason = e.to_string());
        return Err(e.into());
    }

    let user = user::upsert_verified(&state.pool, phone).await?;
    if !user.is_active {
        security_log!("WARN", "login_disabled_account", user_id = user.id);
        return Err(AppError::new(shared::error::ErrorCode::AccountDisabled));
    }

    let access_token = state
        .jwt
        .generate_token(user.id, TokenKind::User, phone)
        .map_err(|e| AppError::internal(e.to_string()))?;

    tracing::info!(user_id = user.id, "User logged in");
    Ok(ApiResponse::success(LoginResponse {
        access_token,
        token_type: "bearer".to_string(),
        expires_in: state.jwt.expires_in_seconds(),
        user: UserView::from(&user),
    }))
}
