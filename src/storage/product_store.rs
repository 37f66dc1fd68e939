use chrono::Utc;
use parking_lot::RwLock;
use std::sync::Arc;

use crate::models::{CreateProductRequest, Product, ProductStatus, ProductType, UpdateProductRequest};

/// 进程内商品库
///
/// 按插入顺序保存商品，克隆后共享同一份数据。
#[derive(Debug, Clone, Default)]
pub struct ProductStore {
    products: Arc<RwLock<Vec<Product>>>,
}

impl ProductStore {
    /// 创建空商品库
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建带演示数据的商品库
    pub fn seeded() -> Self {
        let store = Self::new();
        for product in demo_products() {
            store.insert(product);
        }
        store
    }

    /// 列出全部商品
    pub fn list(&self) -> Vec<Product> {
        self.products.read().clone()
    }

    /// 按 ID 列表筛选，保持库内顺序
    pub fn list_by_ids(&self, ids: &[String]) -> Vec<Product> {
        self.products
            .read()
            .iter()
            .filter(|p| ids.iter().any(|id| id == &p.id))
            .cloned()
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<Product> {
        self.products.read().iter().find(|p| p.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.products.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.read().is_empty()
    }

    /// 追加已构造的商品
    pub fn insert(&self, product: Product) -> Product {
        self.products.write().push(product.clone());
        product
    }

    /// 根据请求创建商品
    pub fn create(&self, request: CreateProductRequest) -> Product {
        self.insert(Product::from_request(request))
    }

    /// 合并更新，商品不存在时返回 None
    pub fn update(&self, id: &str, update: UpdateProductRequest) -> Option<Product> {
        self.modify(id, |product| product.apply_update(update))
    }

    /// 在写锁内修改单个商品并刷新更新时间
    pub fn modify<F>(&self, id: &str, f: F) -> Option<Product>
    where
        F: FnOnce(&mut Product),
    {
        let mut products = self.products.write();
        let product = products.iter_mut().find(|p| p.id == id)?;
        f(product);
        product.updated_at = Utc::now();
        Some(product.clone())
    }

    /// 设置归档标记
    pub fn set_archived(&self, id: &str, archived: bool) -> Option<Product> {
        self.modify(id, |product| product.archived = archived)
    }

    /// 删除商品，返回被删除的记录
    pub fn delete(&self, id: &str) -> Option<Product> {
        let mut products = self.products.write();
        let index = products.iter().position(|p| p.id == id)?;
        Some(products.remove(index))
    }
}

fn demo_products() -> Vec<Product> {
    let now = Utc::now();
    let demo = |id: &str,
                title: &str,
                description: &str,
                price: i64,
                product_type: ProductType,
                grade: Option<&str>,
                category: &str,
                sku: &str,
                quantity: i64| Product {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        price,
        product_type,
        condition_grade: grade.map(str::to_string),
        category: Some(category.to_string()),
        sku: Some(sku.to_string()),
        inventory_quantity: Some(quantity),
        status: ProductStatus::Active,
        archived: false,
        created_at: now,
        updated_at: now,
    };

    vec![
        demo(
            "1",
            "Eco Trail Runner",
            "Sustainable running shoes made from recycled materials",
            17900,
            ProductType::New,
            None,
            "Running Shoes",
            "ECO-TR-001",
            25,
        ),
        demo(
            "2",
            "Urban Sneaker",
            "City-ready sneakers with organic cotton lining",
            13900,
            ProductType::New,
            None,
            "Casual Shoes",
            "URB-SN-002",
            18,
        ),
        demo(
            "3",
            "Refurbished Hiking Boot",
            "Premium hiking boot expertly restored",
            8900,
            ProductType::Refurbished,
            Some("excellent"),
            "Hiking Boots",
            "REF-HB-003",
            8,
        ),
    ]
}
