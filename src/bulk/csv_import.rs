//! CSV product import with per-row validation and partial success.
//!
//! Each data row is validated on its own. Valid rows are handed to a
//! [`ProductCreator`]; invalid rows and failed submissions are collected as
//! row errors and never abort the batch.

use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::bulk::upstream::ProductCreator;
use crate::error::{AppError, Result};
use crate::models::{ConditionGrade, CreateProductRequest, Product, ProductStatus, ProductType};
use crate::observability::AppMetrics;

pub const INVALID_CSV_FORMAT: &str = "Invalid CSV format";

pub const TITLE_REQUIRED: &str = "Title is required and must be a non-empty string";
pub const DESCRIPTION_REQUIRED: &str = "Description is required and must be a non-empty string";
pub const PRICE_INVALID: &str = "Price must be a positive number";
pub const PRODUCT_TYPE_INVALID: &str = "Product type must be either \"new\" or \"refurbished\"";
pub const CONDITION_GRADE_INVALID: &str =
    "Condition grade must be one of: excellent, very_good, good, fair";
pub const INVENTORY_INVALID: &str = "Inventory quantity must be a non-negative integer";
pub const STATUS_INVALID: &str = "Status must be either \"active\" or \"draft\"";

/// Header aliases applied after normalization.
const HEADER_ALIASES: [(&str, &str); 2] = [("price_(chf)", "price"), ("type", "product_type")];

/// One per-row problem. `row` counts the header as row 1.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ImportError {
    pub row: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

impl ImportError {
    fn field(row: usize, field: &str, message: &str) -> Self {
        Self {
            row,
            field: Some(field.to_string()),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub success: bool,
    pub total_rows: usize,
    pub successful_rows: usize,
    pub failed_rows: usize,
    pub errors: Vec<ImportError>,
    pub created_products: Vec<Product>,
}

impl ImportResult {
    fn new(total_rows: usize) -> Self {
        Self {
            success: true,
            total_rows,
            successful_rows: 0,
            failed_rows: 0,
            errors: Vec::new(),
            created_products: Vec::new(),
        }
    }

    /// Partial success still counts as success.
    fn finish(mut self) -> Self {
        self.success = self.errors.is_empty()
            || (self.successful_rows > 0 && self.failed_rows < self.total_rows);
        self
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// A parsed data row keyed by normalized header.
pub type CsvRow = HashMap<String, String>;

/// `" Price (CHF) "` -> `price_(chf)` -> `price`
pub fn normalize_header(header: &str) -> String {
    let normalized = header
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");

    HEADER_ALIASES
        .iter()
        .find(|(alias, _)| *alias == normalized)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(normalized)
}

/// Parses CSV text into rows. Blank lines are skipped; ragged rows reject the file.
pub fn parse_rows(text: &str) -> Result<Vec<CsvRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(invalid_format)?
        .iter()
        .map(normalize_header)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(invalid_format)?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        let row = headers
            .iter()
            .cloned()
            .zip(record.iter().map(str::to_string))
            .collect();
        rows.push(row);
    }

    Ok(rows)
}

fn invalid_format(e: csv::Error) -> AppError {
    AppError::validation_with_details(INVALID_CSV_FORMAT, e.to_string())
}

fn non_empty<'a>(row: &'a CsvRow, key: &str) -> Option<&'a str> {
    row.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// Validates one row, returning every problem found.
pub fn validate_row(
    row: &CsvRow,
    row_number: usize,
) -> std::result::Result<CreateProductRequest, Vec<ImportError>> {
    let mut errors = Vec::new();

    let title = non_empty(row, "title");
    if title.is_none() {
        errors.push(ImportError::field(row_number, "title", TITLE_REQUIRED));
    }

    let description = non_empty(row, "description");
    if description.is_none() {
        errors.push(ImportError::field(row_number, "description", DESCRIPTION_REQUIRED));
    }

    let price = non_empty(row, "price")
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|p| p.is_finite() && *p > 0.0);
    if price.is_none() {
        errors.push(ImportError::field(row_number, "price", PRICE_INVALID));
    }

    let product_type = non_empty(row, "product_type").and_then(|v| v.parse::<ProductType>().ok());
    if product_type.is_none() {
        errors.push(ImportError::field(row_number, "product_type", PRODUCT_TYPE_INVALID));
    }

    let condition_grade = non_empty(row, "condition_grade");
    if product_type == Some(ProductType::Refurbished) {
        if let Some(grade) = condition_grade {
            if grade.parse::<ConditionGrade>().is_err() {
                errors.push(ImportError::field(
                    row_number,
                    "condition_grade",
                    CONDITION_GRADE_INVALID,
                ));
            }
        }
    }

    let inventory_quantity = match non_empty(row, "inventory_quantity") {
        None => None,
        Some(raw) => match raw.parse::<i64>() {
            Ok(quantity) if quantity >= 0 => Some(quantity),
            _ => {
                errors.push(ImportError::field(
                    row_number,
                    "inventory_quantity",
                    INVENTORY_INVALID,
                ));
                None
            }
        },
    };

    let status = match non_empty(row, "status") {
        None => None,
        Some(raw) => match raw.to_lowercase().parse::<ProductStatus>() {
            Ok(status) => Some(status),
            Err(()) => {
                errors.push(ImportError::field(row_number, "status", STATUS_INVALID));
                None
            }
        },
    };

    match (title, description, price, product_type) {
        (Some(title), Some(description), Some(price), Some(product_type)) if errors.is_empty() => {
            Ok(CreateProductRequest {
                title: title.to_string(),
                description: description.to_string(),
                price: (price * 100.0).round() as i64,
                product_type,
                condition_grade: condition_grade.map(str::to_string),
                category: non_empty(row, "category").map(str::to_string),
                sku: non_empty(row, "sku").map(str::to_string),
                inventory_quantity,
                status,
            })
        }
        _ => Err(errors),
    }
}

/// Runs imports against a [`ProductCreator`].
#[derive(Clone)]
pub struct CsvImporter {
    creator: Arc<dyn ProductCreator>,
    concurrency: usize,
    metrics: Option<Arc<AppMetrics>>,
}

impl CsvImporter {
    /// Submits one row at a time.
    pub fn new(creator: Arc<dyn ProductCreator>) -> Self {
        Self {
            creator,
            concurrency: 1,
            metrics: None,
        }
    }

    /// Allows up to `concurrency` submissions in flight. Results keep row order.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<AppMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Parses, validates and submits `text`. Only a malformed file is an error.
    pub async fn import(&self, text: &str, token: &str) -> Result<ImportResult> {
        let rows = parse_rows(text)?;
        let mut result = ImportResult::new(rows.len());

        let outcomes: Vec<std::result::Result<Product, Vec<ImportError>>> =
            stream::iter(rows.into_iter().enumerate().map(|(index, row)| {
                let creator = Arc::clone(&self.creator);
                let token = token.to_string();
                async move {
                    let row_number = index + 2;
                    let request = validate_row(&row, row_number)?;
                    creator
                        .create_product(request, &token)
                        .await
                        .map_err(|e| {
                            tracing::warn!(row = row_number, error = %e, "import row submission failed");
                            vec![ImportError {
                                row: row_number,
                                field: None,
                                message: format!("Failed to create product: {}", submission_message(&e)),
                            }]
                        })
                }
            }))
            .buffered(self.concurrency)
            .collect()
            .await;

        for outcome in outcomes {
            match outcome {
                Ok(product) => {
                    result.successful_rows += 1;
                    result.created_products.push(product);
                }
                Err(errors) => {
                    result.failed_rows += 1;
                    result.errors.extend(errors);
                }
            }
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_import_rows(result.successful_rows, result.failed_rows);
        }

        tracing::info!(
            total = result.total_rows,
            succeeded = result.successful_rows,
            failed = result.failed_rows,
            creator = self.creator.creator_type(),
            "CSV import finished"
        );

        Ok(result.finish())
    }
}

fn submission_message(error: &AppError) -> String {
    match error {
        AppError::Upstream(message) | AppError::Internal(message) => message.clone(),
        other => other.to_string(),
    }
}
