//! Product Routes
//!
//! 商品管理、批量操作、导入导出路由。每个处理器按路由策略单独加安全层。

use axum::{
    Router,
    handler::Handler,
    routing::{get, post},
};

use crate::api::app_state::AppState;
use crate::api::handlers::{bulk_handler::*, product_handler::*};

/// 创建商品路由器
pub fn create_product_router(state: &AppState) -> Router<AppState> {
    let guard = &state.guard;
    let policies = &state.config.security.routes;

    let read = guard.layer("products_read", policies.products_read);
    let write = guard.layer("products_write", policies.products_write);
    let delete = guard.layer("products_delete", policies.products_delete);

    Router::new()
        .route(
            "/admin/products",
            get(list_products.layer(read.clone())).post(create_product.layer(write.clone())),
        )
        .route(
            "/admin/products/bulk",
            post(bulk_operation.layer(guard.layer("bulk", policies.bulk))),
        )
        .route(
            "/admin/products/import",
            post(import_products.layer(guard.layer("import", policies.import))),
        )
        .route(
            "/admin/products/export",
            get(export_products.layer(guard.layer("export", policies.export))),
        )
        .route(
            "/admin/products/:id",
            get(get_product.layer(read))
                .put(update_product.layer(write))
                .delete(delete_product.layer(delete)),
        )
}
