use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{CreateProductRequest, Product, ProductStatus, ProductType};

pub const MISSING_REQUIRED_FIELDS: &str = "Missing required fields";

/// 创建商品请求体
///
/// 字段全部可选，由 [`CreateProductPayload::into_request`] 统一校验。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateProductPayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub product_type: Option<ProductType>,
    pub condition_grade: Option<String>,
    pub category: Option<String>,
    pub sku: Option<String>,
    pub inventory_quantity: Option<i64>,
    pub status: Option<ProductStatus>,
}

impl CreateProductPayload {
    pub fn into_request(self) -> Result<CreateProductRequest> {
        let title = self.title.filter(|t| !t.trim().is_empty());
        let description = self.description.filter(|d| !d.trim().is_empty());
        let price = self.price.filter(|p| *p > 0);

        match (title, description, price, self.product_type) {
            (Some(title), Some(description), Some(price), Some(product_type)) => {
                Ok(CreateProductRequest {
                    title,
                    description,
                    price,
                    product_type,
                    condition_grade: self.condition_grade,
                    category: self.category,
                    sku: self.sku,
                    inventory_quantity: self.inventory_quantity,
                    status: self.status,
                })
            }
            _ => Err(AppError::validation(MISSING_REQUIRED_FIELDS)),
        }
    }
}

/// 商品列表响应
#[derive(Debug, Serialize, Deserialize)]
pub struct ProductListResponse {
    pub products: Vec<Product>,
    pub total: usize,
    pub message: String,
}

/// 单个商品响应
#[derive(Debug, Serialize, Deserialize)]
pub struct ProductResponse {
    pub product: Product,
    pub message: String,
}

/// 删除商品响应
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteProductResponse {
    pub message: String,
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_rejected() {
        let payload: CreateProductPayload =
            serde_json::from_str(r#"{"title":"Runner","price":0,"product_type":"new"}"#).unwrap();
        let err = payload.into_request().unwrap_err();
        assert!(matches!(err, AppError::Validation { ref message, .. } if message == MISSING_REQUIRED_FIELDS));
    }

    #[test]
    fn test_complete_payload_accepted() {
        let payload: CreateProductPayload = serde_json::from_str(
            r#"{"title":"Runner","description":"Light","price":9900,"product_type":"refurbished","condition_grade":"good"}"#,
        )
        .unwrap();
        let request = payload.into_request().unwrap();
        assert_eq!(request.product_type, ProductType::Refurbished);
        assert_eq!(request.condition_grade.as_deref(), Some("good"));
    }
}
