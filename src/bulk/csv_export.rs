//! Product export to CSV or JSON.

use chrono::{DateTime, NaiveDate, Utc};
use csv::{QuoteStyle, WriterBuilder};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::Product;

pub const NO_PRODUCTS_TO_EXPORT: &str = "No products found to export";

/// One exported row. Field names are the CSV header.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ExportRecord {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Price")]
    pub price: String,
    #[serde(rename = "Product Type")]
    pub product_type: String,
    #[serde(rename = "Condition Grade")]
    pub condition_grade: String,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "SKU")]
    pub sku: String,
    #[serde(rename = "Inventory Quantity")]
    pub inventory_quantity: i64,
    #[serde(rename = "Created At")]
    pub created_at: String,
    #[serde(rename = "Updated At")]
    pub updated_at: String,
}

impl From<&Product> for ExportRecord {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            title: product.title.clone(),
            description: product.description.clone(),
            price: format_price(product.price),
            product_type: product.product_type.as_str().to_string(),
            condition_grade: product.condition_grade.clone().unwrap_or_default(),
            category: product.category.clone().unwrap_or_default(),
            sku: product.sku.clone().unwrap_or_default(),
            inventory_quantity: product.inventory_quantity.unwrap_or(0),
            created_at: product.created_at.to_rfc3339(),
            updated_at: product.updated_at.to_rfc3339(),
        }
    }
}

/// JSON export body.
#[derive(Debug, Serialize)]
pub struct JsonExport {
    pub products: Vec<ExportRecord>,
    pub count: usize,
    pub exported_at: DateTime<Utc>,
}

/// Requested export format, `csv` unless `json` is asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("json") => ExportFormat::Json,
            _ => ExportFormat::Csv,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

/// Cents to a two-decimal currency string.
pub fn format_price(cents: i64) -> String {
    format!("{:.2}", cents as f64 / 100.0)
}

/// Splits the `ids` query value. A missing or blank value selects everything.
pub fn parse_id_filter(raw: Option<&str>) -> Vec<String> {
    raw.map(|ids| {
        ids.split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// Applies the id filter, rejecting an empty result.
pub fn select_products(products: Vec<Product>, ids: &[String]) -> Result<Vec<Product>> {
    let selected: Vec<Product> = if ids.is_empty() {
        products
    } else {
        products
            .into_iter()
            .filter(|p| ids.contains(&p.id))
            .collect()
    };

    if selected.is_empty() {
        return Err(AppError::NotFound(NO_PRODUCTS_TO_EXPORT.to_string()));
    }
    Ok(selected)
}

/// `products-export-YYYY-MM-DD.<ext>`
pub fn export_filename(date: NaiveDate, format: ExportFormat) -> String {
    format!(
        "products-export-{}.{}",
        date.format("%Y-%m-%d"),
        format.extension()
    )
}

/// Serializes products as CSV with a header row and every field quoted.
pub fn to_csv(products: &[Product]) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(Vec::new());

    for product in products {
        writer.serialize(ExportRecord::from(product))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("flushing CSV export failed: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| AppError::Internal(e.to_string()))
}

pub fn to_json(products: &[Product], now: DateTime<Utc>) -> JsonExport {
    let records: Vec<ExportRecord> = products.iter().map(ExportRecord::from).collect();
    JsonExport {
        count: records.len(),
        products: records,
        exported_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ProductStore;

    #[test]
    fn test_csv_quotes_every_field() {
        let products = ProductStore::seeded().list_by_ids(&["1".to_string()]);
        let csv = to_csv(&products).unwrap();
        let mut lines = csv.lines();

        assert_eq!(
            lines.next().unwrap(),
            "\"ID\",\"Title\",\"Description\",\"Price\",\"Product Type\",\"Condition Grade\",\
             \"Category\",\"SKU\",\"Inventory Quantity\",\"Created At\",\"Updated At\""
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with(
            "\"1\",\"Eco Trail Runner\",\"Sustainable running shoes made from recycled materials\",\
             \"179.00\",\"new\",\"\",\"Running Shoes\",\"ECO-TR-001\",\"25\","
        ));
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_select_products() {
        let products = ProductStore::seeded().list();
        assert_eq!(select_products(products.clone(), &[]).unwrap().len(), 3);

        let ids = parse_id_filter(Some("2, 3,"));
        assert_eq!(ids, ["2", "3"]);
        assert_eq!(select_products(products.clone(), &ids).unwrap().len(), 2);

        let err = select_products(products, &["nope".to_string()]).unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref m) if m == NO_PRODUCTS_TO_EXPORT));
    }

    #[test]
    fn test_filename_and_price() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 9).unwrap();
        assert_eq!(
            export_filename(date, ExportFormat::Csv),
            "products-export-2024-02-09.csv"
        );
        assert_eq!(
            export_filename(date, ExportFormat::parse(Some("json"))),
            "products-export-2024-02-09.json"
        );
        assert_eq!(format_price(8900), "89.00");
        assert_eq!(format_price(1999), "19.99");
        assert_eq!(format_price(5), "0.05");
    }
}
