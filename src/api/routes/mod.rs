//! Routes 模块
//!
//! 定义 API 路由。

pub mod admin_routes;
pub mod order_routes;
pub mod product_routes;
