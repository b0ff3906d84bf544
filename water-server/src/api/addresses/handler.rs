//! Address API Handlers

use axum::extract::State;
use shared::models::{AddressCreate, AddressUpdate, AddressView};

use crate::auth::CurrentUser;
use crate::core::AppState;
use crate::db::repository::address;
use crate::utils::validation::{
    MAX_ADDRESS_LEN, MAX_NAME_LEN, validate_optional_text, validate_phone, validate_required_text,
};
use crate::utils::{ApiResponse, AppError, AppJson, AppPath, AppResult, ErrorCode};

fn address_not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::AddressNotFound, "地址不存在").with_detail("address_id", id)
}

fn trim_opt(value: &mut Option<String>) {
    if let Some(v) = value.as_mut() {
        *v = v.trim().to_string();
    }
}

fn validate_locality(
    province: &Option<String>,
    city: &Option<String>,
    district: &Option<String>,
) -> Result<(), AppError> {
    validate_optional_text(province, "province", MAX_ADDRESS_LEN)?;
    validate_optional_text(city, "city", MAX_ADDRESS_LEN)?;
    validate_optional_text(district, "district", MAX_ADDRESS_LEN)?;
    Ok(())
}

pub async fn list(
    State(state): State<AppState>,
    current: CurrentUser,
) -> AppResult<ApiResponse<Vec<AddressView>>> {
    let addresses = address::list_by_user(&state.pool, current.id).await?;
    Ok(ApiResponse::success_with_message(
        "获取成功",
        addresses.iter().map(AddressView::from).collect(),
    ))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    current: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> AppResult<ApiResponse<AddressView>> {
    let a = address::find_owned(&state.pool, id, current.id)
        .await?
        .ok_or_else(|| address_not_found(id))?;
    Ok(ApiResponse::success_with_message(
        "获取成功",
        AddressView::from(&a),
    ))
}

pub async fn create(
    State(state): State<AppState>,
    current: CurrentUser,
    AppJson(mut payload): AppJson<AddressCreate>,
) -> AppResult<ApiResponse<AddressView>> {
    payload.name = payload.name.trim().to_string();
    payload.phone = payload.phone.trim().to_string();
    payload.detail = payload.detail.trim().to_string();

    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_phone(&payload.phone)?;
    validate_required_text(&payload.detail, "detail", MAX_ADDRESS_LEN)?;
    validate_locality(&payload.province, &payload.city, &payload.district)?;

    let a = address::create(&state.pool, current.id, payload).await?;
    tracing::info!(user_id = current.id, address_id = a.id, is_default = a.is_default, "Address created");
    Ok(ApiResponse::success_with_message(
        "创建成功",
        AddressView::from(&a),
    ))
}

pub async fn update(
    State(state): State<AppState>,
    current: CurrentUser,
    AppPath(id): AppPath<i64>,
    AppJson(mut payload): AppJson<AddressUpdate>,
) -> AppResult<ApiResponse<AddressView>> {
    trim_opt(&mut payload.name);
    trim_opt(&mut payload.phone);
    trim_opt(&mut payload.detail);

    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    if let Some(phone) = &payload.phone {
        validate_phone(phone)?;
    }
    if let Some(detail) = &payload.detail {
        validate_required_text(detail, "detail", MAX_ADDRESS_LEN)?;
    }
    validate_locality(&payload.province, &payload.city, &payload.district)?;

    if address::find_owned(&state.pool, id, current.id).await?.is_none() {
        return Err(address_not_found(id));
    }
    let a = address::update(&state.pool, id, current.id, payload).await?;
    Ok(ApiResponse::success_with_message(
        "更新成功",
        AddressView::from(&a),
    ))
}

pub async fn delete(
    State(state): State<AppState>,
    current: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> AppResult<ApiResponse<()>> {
    if !address::delete(&state.pool, id, current.id).await? {
        return Err(address_not_found(id));
    }
    tracing::info!(user_id = current.id, address_id = id, "Address deleted");
    Ok(ApiResponse::success_with_message("删除成功", ()))
}
