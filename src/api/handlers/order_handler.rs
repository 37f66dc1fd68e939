use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{debug, info};

use crate::{
    api::{app_state::AppState, dto::MessageResponse},
    error::AppError,
    models::{CreateOrderRequest, OrderFilter, UpdateOrderRequest},
    security::auth::AdminPrincipal,
};

pub const ORDER_NOT_FOUND: &str = "Order not found";
pub const NO_VALID_UPDATES: &str = "No valid updates provided";

pub async fn list_orders(
    State(state): State<AppState>,
    _principal: AdminPrincipal,
    Query(filter): Query<OrderFilter>,
) -> Result<impl IntoResponse, AppError> {
    let orders = state.orders.list(&filter);
    debug!(count = orders.len(), status = ?filter.status, "Admin fetched orders");
    Ok(Json(orders))
}

pub async fn create_order(
    State(state): State<AppState>,
    _principal: AdminPrincipal,
    Json(request): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, AppError> {
    if request.items.is_empty() {
        return Err(AppError::validation("Order must contain at least one item"));
    }

    let order = state.orders.create(request);
    info!(order_number = %order.order_number, "Order created");
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn get_order(
    State(state): State<AppState>,
    _principal: AdminPrincipal,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let order = state
        .orders
        .get(&id)
        .ok_or_else(|| AppError::NotFound(ORDER_NOT_FOUND.to_string()))?;
    Ok(Json(order))
}

pub async fn update_order(
    State(state): State<AppState>,
    _principal: AdminPrincipal,
    Path(id): Path<String>,
    Json(update): Json<UpdateOrderRequest>,
) -> Result<impl IntoResponse, AppError> {
    if update.is_empty() {
        return Err(AppError::validation(NO_VALID_UPDATES));
    }

    let status = update.status;
    let order = state
        .orders
        .update(&id, update)
        .ok_or_else(|| AppError::NotFound(ORDER_NOT_FOUND.to_string()))?;

    if let Some(status) = status {
        info!(
            order_number = %order.order_number,
            status = status.as_str(),
            email = %order.customer.email,
            "Order status changed"
        );
    }

    Ok(Json(order))
}

pub async fn delete_order(
    State(state): State<AppState>,
    _principal: AdminPrincipal,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state
        .orders
        .delete(&id)
        .ok_or_else(|| AppError::NotFound(ORDER_NOT_FOUND.to_string()))?;
    Ok(Json(MessageResponse::new("Order deleted successfully")))
}
