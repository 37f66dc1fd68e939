use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use tracing::{debug, info};

use crate::{
    api::{app_state::AppState, dto::product_dto::*},
    error::AppError,
    models::UpdateProductRequest,
    security::auth::AdminPrincipal,
};

pub const PRODUCT_NOT_FOUND: &str = "Product not found";

/// 管理端响应不允许缓存
const NO_CACHE: [(header::HeaderName, &str); 3] = [
    (header::CACHE_CONTROL, "no-cache, no-store, must-revalidate"),
    (header::PRAGMA, "no-cache"),
    (header::EXPIRES, "0"),
];

pub async fn list_products(
    State(state): State<AppState>,
    AdminPrincipal(principal): AdminPrincipal,
) -> Result<impl IntoResponse, AppError> {
    debug!(subject = ?principal.subject, "Listing products");

    let products = state.products.list();
    let response = ProductListResponse {
        total: products.len(),
        products,
        message: "Products retrieved successfully".to_string(),
    };

    Ok((NO_CACHE, Json(response)))
}

pub async fn get_product(
    State(state): State<AppState>,
    _principal: AdminPrincipal,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let product = state
        .products
        .get(&id)
        .ok_or_else(|| AppError::NotFound(PRODUCT_NOT_FOUND.to_string()))?;

    Ok((
        NO_CACHE,
        Json(ProductResponse {
            product,
            message: "Product retrieved successfully".to_string(),
        }),
    ))
}

pub async fn create_product(
    State(state): State<AppState>,
    _principal: AdminPrincipal,
    Json(payload): Json<CreateProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    let request = payload.into_request()?;
    let product = state.products.create(request);
    info!(product_id = %product.id, "Product created");

    Ok((
        StatusCode::CREATED,
        Json(ProductResponse {
            product,
            message: "Product created successfully".to_string(),
        }),
    ))
}

pub async fn update_product(
    State(state): State<AppState>,
    _principal: AdminPrincipal,
    Path(id): Path<String>,
    Json(update): Json<UpdateProductRequest>,
) -> Result<impl IntoResponse, AppError> {
    if update.price.is_some_and(|p| p <= 0) {
        return Err(AppError::validation("Price must be a positive number"));
    }

    let product = state
        .products
        .update(&id, update)
        .ok_or_else(|| AppError::NotFound(PRODUCT_NOT_FOUND.to_string()))?;

    Ok(Json(ProductResponse {
        product,
        message: "Product updated successfully".to_string(),
    }))
}

pub async fn delete_product(
    State(state): State<AppState>,
    _principal: AdminPrincipal,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state
        .products
        .delete(&id)
        .ok_or_else(|| AppError::NotFound(PRODUCT_NOT_FOUND.to_string()))?;
    info!(product_id = %id, "Product deleted");

    Ok(Json(DeleteProductResponse {
        message: "Product deleted successfully".to_string(),
        id,
    }))
}
