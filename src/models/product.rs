use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 商品类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    /// 全新
    New,
    /// 翻新
    Refurbished,
}

impl ProductType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::New => "new",
            ProductType::Refurbished => "refurbished",
        }
    }
}

impl FromStr for ProductType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(ProductType::New),
            "refurbished" => Ok(ProductType::Refurbished),
            _ => Err(()),
        }
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 翻新商品成色等级
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConditionGrade {
    Excellent,
    VeryGood,
    Good,
    Fair,
}

impl ConditionGrade {
    pub const ALL: [ConditionGrade; 4] = [
        ConditionGrade::Excellent,
        ConditionGrade::VeryGood,
        ConditionGrade::Good,
        ConditionGrade::Fair,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionGrade::Excellent => "excellent",
            ConditionGrade::VeryGood => "very_good",
            ConditionGrade::Good => "good",
            ConditionGrade::Fair => "fair",
        }
    }
}

impl FromStr for ConditionGrade {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConditionGrade::ALL
            .into_iter()
            .find(|grade| grade.as_str() == s)
            .ok_or(())
    }
}

/// 上架状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    #[default]
    Active,
    Draft,
}

impl FromStr for ProductStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ProductStatus::Active),
            "draft" => Ok(ProductStatus::Draft),
            _ => Err(()),
        }
    }
}

/// 商品实体
///
/// 价格以最小货币单位（CHF 分）保存。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: String,
    pub title: String,
    pub description: String,
    /// 价格（分）
    pub price: i64,
    pub product_type: ProductType,
    /// 成色等级，仅对翻新商品校验
    #[serde(default)]
    pub condition_grade: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub inventory_quantity: Option<i64>,
    #[serde(default)]
    pub status: ProductStatus,
    #[serde(default)]
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// 根据创建请求生成新商品
    pub fn from_request(request: CreateProductRequest) -> Self {
        let now = Utc::now();
        Self {
            id: format!("prod_{}", Uuid::new_v4().simple()),
            title: request.title,
            description: request.description,
            price: request.price,
            product_type: request.product_type,
            condition_grade: request.condition_grade,
            category: request.category,
            sku: request.sku,
            inventory_quantity: request.inventory_quantity,
            status: request.status.unwrap_or_default(),
            archived: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// 合并部分更新
    pub fn apply_update(&mut self, update: UpdateProductRequest) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(price) = update.price {
            self.price = price;
        }
        if let Some(product_type) = update.product_type {
            self.product_type = product_type;
        }
        if let Some(grade) = update.condition_grade {
            self.condition_grade = Some(grade);
        }
        if let Some(category) = update.category {
            self.category = Some(category);
        }
        if let Some(sku) = update.sku {
            self.sku = Some(sku);
        }
        if let Some(quantity) = update.inventory_quantity {
            self.inventory_quantity = Some(quantity);
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        self.updated_at = Utc::now();
    }
}

/// 创建商品请求
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateProductRequest {
    pub title: String,
    pub description: String,
    /// 价格（分）
    pub price: i64,
    pub product_type: ProductType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_grade: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory_quantity: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ProductStatus>,
}

/// 更新商品请求
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateProductRequest {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_grade_parsing() {
        assert_eq!("very_good".parse::<ConditionGrade>(), Ok(ConditionGrade::VeryGood));
        assert!("mint".parse::<ConditionGrade>().is_err());
        assert!("Excellent".parse::<ConditionGrade>().is_err());
    }

    #[test]
    fn test_apply_update_merges_fields() {
        let mut product = Product::from_request(CreateProductRequest {
            title: "Runner".into(),
            description: "Light".into(),
            price: 9900,
            product_type: ProductType::New,
            condition_grade: None,
            category: None,
            sku: None,
            inventory_quantity: None,
            status: None,
        });
        assert!(product.id.starts_with("prod_"));
        assert_eq!(product.status, ProductStatus::Active);

        product.apply_update(UpdateProductRequest {
            price: Some(12900),
            category: Some("Running Shoes".into()),
            ..Default::default()
        });
        assert_eq!(product.price, 12900);
        assert_eq!(product.title, "Runner");
        assert_eq!(product.category.as_deref(), Some("Running Shoes"));
    }
}
