//! User profile handlers

use axum::extract::State;
use shared::models::{UserUpdate, UserView};

use crate::auth::CurrentUser;
use crate::core::AppState;
use crate::db::repository::user;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_URL_LEN, validate_optional_text, validate_phone,
};
use crate::utils::{ApiResponse, AppError, AppJson, AppResult, ErrorCode};

pub async fn me(current: CurrentUser) -> AppResult<ApiResponse<UserView>> {
    Ok(ApiResponse::success_with_message(
        "获取成功",
        UserView::from(&current.user),
    ))
}

pub async fn update_me(
    State(state): State<AppState>,
    current: CurrentUser,
    AppJson(mut payload): AppJson<UserUpdate>,
) -> AppResult<ApiResponse<UserView>> {
    validate_optional_text(&payload.nickname, "nickname", MAX_NAME_LEN)?;
    validate_optional_text(&payload.avatar_url, "avatar_url", MAX_URL_LEN)?;
    if let Some(phone) = payload.phone.as_mut() {
        *phone = phone.trim().to_string();
        validate_phone(phone)?;
        if let Some(owner) = user::find_by_phone(&state.pool, phone).await?
            && owner.id != current.id
        {
            return Err(AppError::with_message(
                ErrorCode::AlreadyExists,
                "手机号已被使用",
            ));
        }
    }

    let updated = user::update_profile(&state.pool, current.id, payload).await?;
    if current.user.phone_verified && !updated.phone_verified {
        tracing::info!(user_id = current.id, "Phone changed, verification reset");
    }
    Ok(ApiResponse::success_with_message(
        "更新成功",
        UserView::from(&updated),
    ))
}
