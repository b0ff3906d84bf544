//! Admin auth handlers

use axum::extract::State;
use serde::{Deserialize, Serialize};
use shared::models::{AdminLogin, AdminUserView, ChangePassword};

use crate::auth::{CurrentAdmin, MIN_PASSWORD_LEN, TokenKind, hash_password, verify_password};
use crate::core::AppState;
use crate::db::repository::admin_user;
use crate::security_log;
use crate::utils::validation::MAX_PASSWORD_LEN;
use crate::utils::{ApiResponse, AppError, AppJson, AppResult, ErrorCode};

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminLoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: AdminUserView,
}

/// 管理员登录
pub async fn login(
    State(state): State<AppState>,
    AppJson(req): AppJson<AdminLogin>,
) -> AppResult<ApiResponse<AdminLoginResponse>> {
    let username = req.username.trim();
    let admin = admin_user::find_by_username(&state.pool, username).await?;

    let Some(admin) = admin.filter(|a| verify_password(&req.password, &a.password_hash)) else {
        security_log!("WARN", "admin_login_failed", username = username.to_string());
        return Err(AppError::with_message(
            ErrorCode::InvalidCredentials,
            "用户名或密码错误",
        ));
    };

    let access_token = state
        .jwt
        .generate_token(admin.id, TokenKind::Admin, &admin.username)
        .map_err(|e| AppError::internal(e.to_string()))?;

    security_log!("INFO", "admin_login", admin_id = admin.id);
    Ok(ApiResponse::success(AdminLoginResponse {
        access_token,
        token_type: "bearer".to_string(),
        expires_in: state.jwt.expires_in_seconds(),
        user: AdminUserView::from(&admin),
    }))
}

/// 修改密码
pub async fn change_password(
    State(state): State<AppState>,
    current: CurrentAdmin,
    AppJson(req): AppJson<ChangePassword>,
) -> AppResult<ApiResponse<()>> {
    if !verify_password(&req.old_password, &current.admin.password_hash) {
        security_log!("WARN", "admin_password_mismatch", admin_id = current.id);
        return Err(AppError::with_message(
            ErrorCode::InvalidCredentials,
            "原密码错误",
        ));
    }
    if req.new_password.len() < MIN_PASSWORD_LEN || req.new_password.len() > MAX_PASSWORD_LEN {
        return Err(AppError::with_message(
            ErrorCode::PasswordTooShort,
            format!("新密码长度需为 {MIN_PASSWORD_LEN}-{MAX_PASSWORD_LEN} 位"),
        ));
    }

    let hash = hash_password(&req.new_password).map_err(|e| AppError::internal(e.to_string()))?;
    admin_user::update_password(&state.pool, current.id, &hash).await?;

    security_log!("INFO", "admin_password_changed", admin_id = current.id);
    Ok(ApiResponse::success_with_message("密码修改成功", ()))
}

/// 当前管理员信息
pub async fn me(current: CurrentAdmin) -> AppResult<ApiResponse<AdminUserView>> {
    Ok(ApiResponse::success(AdminUserView::from(&current.admin)))
}
