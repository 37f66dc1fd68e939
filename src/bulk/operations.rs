//! Bulk delete/update/archive over a list of product ids.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{Product, ProductType};
use crate::observability::AppMetrics;
use crate::storage::ProductStore;

pub const MAX_BULK_ITEMS: usize = 100;
pub const INVALID_BULK_REQUEST: &str = "Invalid bulk operation request";
pub const TOO_MANY_ITEMS: &str = "Maximum 100 products can be processed in a single bulk operation";
pub const PRODUCT_NOT_FOUND: &str = "Product not found";
pub const UPDATE_DATA_REQUIRED: &str = "Update data required for update operation";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BulkAction {
    Delete,
    Update,
    Archive,
    Unarchive,
}

impl BulkAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            BulkAction::Delete => "delete",
            BulkAction::Update => "update",
            BulkAction::Archive => "archive",
            BulkAction::Unarchive => "unarchive",
        }
    }

    fn past_tense(&self) -> &'static str {
        match self {
            BulkAction::Delete => "deleted",
            BulkAction::Update => "updated",
            BulkAction::Archive => "archived",
            BulkAction::Unarchive => "unarchived",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentType {
    Percentage,
    Fixed,
}

/// `Percentage` scales the price by `value` percent; `Fixed` adds `value` in currency units.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PriceAdjustment {
    #[serde(rename = "type")]
    pub kind: AdjustmentType,
    pub value: f64,
}

impl PriceAdjustment {
    /// Applies the adjustment to a price in cents.
    pub fn apply(&self, cents: i64) -> i64 {
        let price = cents as f64;
        match self.kind {
            AdjustmentType::Percentage => (price * (1.0 + self.value / 100.0)).round() as i64,
            AdjustmentType::Fixed => (price + self.value * 100.0).round() as i64,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkUpdateData {
    #[serde(default)]
    pub product_type: Option<ProductType>,
    #[serde(default)]
    pub condition_grade: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub price_adjustment: Option<PriceAdjustment>,
}

impl BulkUpdateData {
    fn apply(&self, product: &mut Product) {
        if let Some(product_type) = self.product_type {
            product.product_type = product_type;
        }
        if let Some(grade) = self.condition_grade.as_ref().filter(|g| !g.is_empty()) {
            product.condition_grade = Some(grade.clone());
        }
        if let Some(category) = self.category.as_ref().filter(|c| !c.is_empty()) {
            product.category = Some(category.clone());
        }
        if let Some(adjustment) = &self.price_adjustment {
            product.price = adjustment.apply(product.price);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOperationRequest {
    pub action: BulkAction,
    pub product_ids: Vec<String>,
    #[serde(default)]
    pub update_data: Option<BulkUpdateData>,
}

impl BulkOperationRequest {
    pub fn validate(&self) -> Result<()> {
        if self.product_ids.is_empty() {
            return Err(AppError::validation(INVALID_BULK_REQUEST));
        }
        if self.product_ids.len() > MAX_BULK_ITEMS {
            return Err(AppError::validation(TOO_MANY_ITEMS));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BulkItemResult {
    pub product_id: String,
    pub status: ItemStatus,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BulkItemError {
    pub product_id: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BulkOperationResult {
    pub success: bool,
    pub total_processed: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub errors: Vec<BulkItemError>,
    pub results: Vec<BulkItemResult>,
}

impl BulkOperationResult {
    fn new(total: usize) -> Self {
        Self {
            success: true,
            total_processed: total,
            success_count: 0,
            failure_count: 0,
            errors: Vec::new(),
            results: Vec::with_capacity(total),
        }
    }

    fn push(&mut self, product_id: &str, outcome: std::result::Result<String, String>) {
        match outcome {
            Ok(message) => {
                self.success_count += 1;
                self.results.push(BulkItemResult {
                    product_id: product_id.to_string(),
                    status: ItemStatus::Success,
                    message,
                });
            }
            Err(message) => {
                self.failure_count += 1;
                self.errors.push(BulkItemError {
                    product_id: product_id.to_string(),
                    message: message.clone(),
                });
                self.results.push(BulkItemResult {
                    product_id: product_id.to_string(),
                    status: ItemStatus::Error,
                    message,
                });
            }
        }
    }
}

/// Applies `request` to each id in order. One item's failure never stops the rest.
pub fn run_bulk_operation(
    store: &ProductStore,
    request: &BulkOperationRequest,
    metrics: Option<&AppMetrics>,
) -> Result<BulkOperationResult> {
    request.validate()?;

    let action = request.action;
    let mut result = BulkOperationResult::new(request.product_ids.len());

    for id in &request.product_ids {
        let outcome = match action {
            BulkAction::Delete => store.delete(id).map(|_| ()),
            BulkAction::Archive => store.set_archived(id, true).map(|_| ()),
            BulkAction::Unarchive => store.set_archived(id, false).map(|_| ()),
            BulkAction::Update => match &request.update_data {
                None if store.get(id).is_some() => {
                    result.push(id, Err(UPDATE_DATA_REQUIRED.to_string()));
                    continue;
                }
                None => None,
                Some(data) => store.modify(id, |product| data.apply(product)).map(|_| ()),
            },
        };

        let outcome = outcome
            .map(|_| format!("Product {} successfully", action.past_tense()))
            .ok_or_else(|| PRODUCT_NOT_FOUND.to_string());
        result.push(id, outcome);
    }

    result.success = result.failure_count == 0;

    if let Some(metrics) = metrics {
        metrics.record_bulk_items(action.as_str(), result.success_count, result.failure_count);
    }
    tracing::info!(
        action = action.as_str(),
        succeeded = result.success_count,
        failed = result.failure_count,
        "bulk operation finished"
    );

    Ok(result)
}
