//! Handlers 模块
//!
//! HTTP 请求处理程序。

pub mod admin_handler;
pub mod bulk_handler;
pub mod order_handler;
pub mod product_handler;

pub use admin_handler::*;
pub use bulk_handler::*;
pub use order_handler::*;
pub use product_handler::*;
