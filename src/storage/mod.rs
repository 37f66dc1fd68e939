//! 存储模块
//!
//! 商品与订单的进程内存储。

pub mod order_store;
pub mod product_store;

pub use order_store::OrderStore;
pub use product_store::ProductStore;
