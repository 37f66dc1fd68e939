//! Order Routes
//!
//! 订单管理路由。

use axum::{Router, handler::Handler, routing::get};

use crate::api::app_state::AppState;
use crate::api::handlers::order_handler::*;

/// 创建订单路由器
pub fn create_order_router(state: &AppState) -> Router<AppState> {
    let guard = &state.guard;
    let policies = &state.config.security.routes;

    let read = guard.layer("orders_read", policies.orders_read);
    let write = guard.layer("orders_write", policies.orders_write);

    Router::new()
        .route(
            "/admin/orders",
            get(list_orders.layer(read.clone())).post(create_order.layer(write.clone())),
        )
        .route(
            "/admin/orders/:id",
            get(get_order.layer(read))
                .patch(update_order.layer(write.clone()))
                .delete(delete_order.layer(write)),
        )
}
