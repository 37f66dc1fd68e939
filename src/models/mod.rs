//! 核心数据模型模块
//!
//! 定义后台管理的商品与订单结构。

pub mod order;
pub mod product;

pub use order::*;
pub use product::*;
