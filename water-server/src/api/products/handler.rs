//! Product API Handlers

use axum::extract::State;
use shared::models::{ProductCreate, ProductUpdate, ProductView, StockUpdate};

use crate::api::PageQuery;
use crate::auth::CurrentAdmin;
use crate::core::AppState;
use crate::db::repository::product;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, MAX_URL_LEN, validate_optional_text, validate_price,
    validate_required_text, validate_stock,
};
use crate::utils::{ApiResponse, AppError, AppJson, AppPath, AppQuery, AppResult, ErrorCode};

fn product_not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::ProductNotFound, "商品不存在").with_detail("product_id", id)
}

fn validate_create(payload: &ProductCreate) -> Result<(), AppError> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;
    validate_optional_text(&payload.image_url, "image_url", MAX_URL_LEN)?;
    validate_price(payload.price)?;
    validate_stock(payload.stock)?;
    Ok(())
}

fn validate_update(payload: &ProductUpdate) -> Result<(), AppError> {
    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;
    validate_optional_text(&payload.image_url, "image_url", MAX_URL_LEN)?;
    if let Some(price) = payload.price {
        validate_price(price)?;
    }
    if let Some(stock) = payload.stock {
        validate_stock(stock)?;
    }
    Ok(())
}

/// GET /api/products - 上架商品
pub async fn list(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<PageQuery>,
) -> AppResult<ApiResponse<Vec<ProductView>>> {
    let products = product::find_active(&state.pool, query.page()).await?;
    Ok(ApiResponse::success_with_message(
        "获取成功",
        products.iter().map(ProductView::from).collect(),
    ))
}

/// GET /api/products/{id} - 下架商品对外不可见
pub async fn get_by_id(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> AppResult<ApiResponse<ProductView>> {
    let p = product::find_by_id(&state.pool, id)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| product_not_found(id))?;
    Ok(ApiResponse::success_with_message(
        "获取成功",
        ProductView::from(&p),
    ))
}

/// GET /api/products/admin/all - 含下架商品
pub async fn list_all(
    State(state): State<AppState>,
    _admin: CurrentAdmin,
    AppQuery(query): AppQuery<PageQuery>,
) -> AppResult<ApiResponse<Vec<ProductView>>> {
    let products = product::find_all(&state.pool, query.page()).await?;
    Ok(ApiResponse::success_with_message(
        "获取成功",
        products.iter().map(ProductView::from).collect(),
    ))
}

pub async fn create(
    State(state): State<AppState>,
    admin: CurrentAdmin,
    AppJson(mut payload): AppJson<ProductCreate>,
) -> AppResult<ApiResponse<ProductView>> {
    payload.name = payload.name.trim().to_string();
    validate_create(&payload)?;

    let p = product::create(&state.pool, payload).await?;
    tracing::info!(product_id = p.id, admin = %admin.admin.username, "Product created");
    Ok(ApiResponse::success_with_message(
        "创建成功",
        ProductView::from(&p),
    ))
}

pub async fn update(
    State(state): State<AppState>,
    admin: CurrentAdmin,
    AppPath(id): AppPath<i64>,
    AppJson(mut payload): AppJson<ProductUpdate>,
) -> AppResult<ApiResponse<ProductView>> {
    if let Some(name) = payload.name.as_mut() {
        *name = name.trim().to_string();
    }
    validate_update(&payload)?;

    if product::find_by_id(&state.pool, id).await?.is_none() {
        return Err(product_not_found(id));
    }
    let p = product::update(&state.pool, id, payload).await?;
    tracing::info!(product_id = id, admin = %admin.admin.username, "Product updated");
    Ok(ApiResponse::success_with_message(
        "更新成功",
        ProductView::from(&p),
    ))
}

/// 已被订单引用的商品不能删除，只能下架
pub async fn delete(
    State(state): State<AppState>,
    admin: CurrentAdmin,
    AppPath(id): AppPath<i64>,
) -> AppResult<ApiResponse<()>> {
    if product::find_by_id(&state.pool, id).await?.is_none() {
        return Err(product_not_found(id));
    }
    if product::is_referenced(&state.pool, id).await? {
        return Err(AppError::with_message(
            ErrorCode::ProductHasOrders,
            "商品已有订单，无法删除，请改为下架",
        )
        .with_detail("product_id", id));
    }

    if !product::delete(&state.pool, id).await? {
        return Err(product_not_found(id));
    }
    tracing::info!(product_id = id, admin = %admin.admin.username, "Product deleted");
    Ok(ApiResponse::success_with_message("删除成功", ()))
}

/// PATCH /api/products/{id}/toggle
pub async fn toggle(
    State(state): State<AppState>,
    _admin: CurrentAdmin,
    AppPath(id): AppPath<i64>,
) -> AppResult<ApiResponse<ProductView>> {
    if product::find_by_id(&state.pool, id).await?.is_none() {
        return Err(product_not_found(id));
    }
    let p = product::toggle_active(&state.pool, id).await?;
    tracing::info!(product_id = id, is_active = p.is_active, "Product toggled");
    Ok(ApiResponse::success_with_message(
        "操作成功",
        ProductView::from(&p),
    ))
}

/// PATCH /api/products/{id}/stock
pub async fn set_stock(
    State(state): State<AppState>,
    _admin: CurrentAdmin,
    AppPath(id): AppPath<i64>,
    AppJson(payload): AppJson<StockUpdate>,
) -> AppResult<ApiResponse<ProductView>> {
    validate_stock(payload.stock)?;
    if product::find_by_id(&state.pool, id).await?.is_none() {
        return Err(product_not_found(id));
    }
    let p = product::set_stock(&state.pool, id, payload.stock).await?;
    tracing::info!(product_id = id, stock = p.stock, "Product stock set");
    Ok(ApiResponse::success_with_message(
        "更新成功",
        ProductView::from(&p),
    ))
}
