//! Bulk product workflows
//!
//! - CSV/JSON export
//! - CSV import with per-row validation
//! - Bulk actions over product ids
//! - Submission targets for imported rows

pub mod csv_export;
pub mod csv_import;
pub mod operations;
pub mod upstream;

pub use csv_export::{ExportFormat, ExportRecord, JsonExport};
pub use csv_import::{CsvImporter, ImportError, ImportResult};
pub use operations::{BulkAction, BulkOperationRequest, BulkOperationResult, run_bulk_operation};
pub use upstream::{CommerceClient, ProductCreator, create_product_creator};
