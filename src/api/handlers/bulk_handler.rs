use axum::{
    Json,
    body::Bytes,
    extract::{FromRequest, Multipart, Query, Request, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tracing::info;

use crate::{
    api::{app_state::AppState, dto::ExportQuery},
    bulk::{
        csv_export::{self, ExportFormat},
        csv_import::INVALID_CSV_FORMAT,
        operations::{BulkOperationRequest, INVALID_BULK_REQUEST, run_bulk_operation},
    },
    error::AppError,
    security::auth::AdminPrincipal,
};

/// 单个导入文件的大小上限
pub const MAX_IMPORT_BYTES: usize = 5 * 1024 * 1024;

pub const NO_FILE_PROVIDED: &str = "No file provided";
pub const ONLY_CSV_ALLOWED: &str = "Only CSV files are allowed";
pub const FILE_TOO_LARGE: &str = "File size must be less than 5MB";

/// 部分失败时返回 207
fn multi_status(has_failures: bool) -> StatusCode {
    if has_failures {
        StatusCode::MULTI_STATUS
    } else {
        StatusCode::OK
    }
}

pub async fn bulk_operation(
    State(state): State<AppState>,
    _principal: AdminPrincipal,
    Json(body): Json<serde_json::Value>,
) -> Result<impl IntoResponse, AppError> {
    let request: BulkOperationRequest = serde_json::from_value(body)
        .map_err(|e| AppError::validation_with_details(INVALID_BULK_REQUEST, e.to_string()))?;

    let result = run_bulk_operation(&state.products, &request, Some(&state.metrics))?;
    Ok((multi_status(result.failure_count > 0), Json(result)))
}

pub async fn import_products(
    State(state): State<AppState>,
    AdminPrincipal(principal): AdminPrincipal,
    request: Request,
) -> Result<impl IntoResponse, AppError> {
    let bytes = read_upload(request, &state).await?;
    let text = String::from_utf8(bytes.to_vec())
        .map_err(|e| AppError::validation_with_details(INVALID_CSV_FORMAT, e.to_string()))?;

    let result = state.importer().import(&text, &principal.token).await?;
    Ok((multi_status(result.has_errors()), Json(result)))
}

/// 读取上传内容：multipart 的 `file` 字段，或 `text/csv` 原始请求体
async fn read_upload(request: Request, state: &AppState) -> Result<Bytes, AppError> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.starts_with("multipart/form-data") {
        let mut multipart = Multipart::from_request(request, state)
            .await
            .map_err(|e| AppError::validation_with_details(NO_FILE_PROVIDED, e.body_text()))?;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::validation_with_details(NO_FILE_PROVIDED, e.body_text()))?
        {
            if field.name() != Some("file") {
                continue;
            }
            let is_csv = field
                .file_name()
                .is_some_and(|name| name.to_ascii_lowercase().ends_with(".csv"));
            if !is_csv {
                return Err(AppError::validation(ONLY_CSV_ALLOWED));
            }
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::validation_with_details(FILE_TOO_LARGE, e.body_text()))?;
            if bytes.len() > MAX_IMPORT_BYTES {
                return Err(AppError::validation(FILE_TOO_LARGE));
            }
            return Ok(bytes);
        }
        return Err(AppError::validation(NO_FILE_PROVIDED));
    }

    if content_type.starts_with("text/csv") || content_type.starts_with("text/plain") {
        let bytes = axum::body::to_bytes(request.into_body(), MAX_IMPORT_BYTES)
            .await
            .map_err(|_| AppError::validation(FILE_TOO_LARGE))?;
        if bytes.is_empty() {
            return Err(AppError::validation(NO_FILE_PROVIDED));
        }
        return Ok(bytes);
    }

    Err(AppError::validation(NO_FILE_PROVIDED))
}

pub async fn export_products(
    State(state): State<AppState>,
    _principal: AdminPrincipal,
    Query(query): Query<ExportQuery>,
) -> Result<Response, AppError> {
    let format = ExportFormat::parse(query.format.as_deref());
    let ids = csv_export::parse_id_filter(query.ids.as_deref());
    let products = csv_export::select_products(state.products.list(), &ids)?;

    let now = Utc::now();
    let disposition = format!(
        "attachment; filename=\"{}\"",
        csv_export::export_filename(now.date_naive(), format)
    );
    info!(count = products.len(), format = format.extension(), "Exporting products");

    let response = match format {
        ExportFormat::Json => (
            [(header::CONTENT_DISPOSITION, disposition)],
            Json(csv_export::to_json(&products, now)),
        )
            .into_response(),
        ExportFormat::Csv => (
            [
                (header::CONTENT_TYPE, "text/csv".to_string()),
                (header::CONTENT_DISPOSITION, disposition),
                (
                    header::CACHE_CONTROL,
                    "no-cache, no-store, must-revalidate".to_string(),
                ),
            ],
            csv_export::to_csv(&products)?,
        )
            .into_response(),
    };

    Ok(response)
}
