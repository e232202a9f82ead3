//! REST API handlers for analysis, uploads, and operational endpoints.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use cac_cache::UploadCache;
use cac_core::config::UploadConfig;
use cac_core::{CacError, ParsedTable, RawRow};
use cac_reporting::{analyze_cac, analyze_raw, AnalysisReport, CacAnalysis, CacAnalysisRequest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Shared application state for REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<UploadCache>,
    pub upload: UploadConfig,
    pub start_time: Instant,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

fn reject(status: StatusCode, error: &str, message: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            message: message.into(),
        }),
    )
}

/// Input-format errors are the client's fault; anything else is ours.
fn reject_cac_error(err: &CacError) -> (StatusCode, Json<ErrorResponse>) {
    if err.is_input_error() {
        metrics::counter!("api.validation_errors").increment(1);
        reject(StatusCode::BAD_REQUEST, "invalid_input", err.to_string())
    } else {
        metrics::counter!("api.errors").increment(1);
        reject(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "Internal processing error",
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default, alias = "marketingData")]
    pub marketing: Vec<RawRow>,
    #[serde(default, alias = "revenueData")]
    pub revenue: Vec<RawRow>,
}

/// POST /v1/analyze: Channel, time-series, and opportunity analysis.
pub async fn handle_analyze(Json(request): Json<AnalyzeRequest>) -> ApiResult<AnalysisReport> {
    metrics::counter!("api.analyze.requests").increment(1);
    if request.marketing.is_empty() {
        warn!("Analyze request without marketing rows");
        return Err(reject_cac_error(&CacError::EmptyFile(
            "marketing data has no rows".to_string(),
        )));
    }

    let report = analyze_raw(&request.marketing, &request.revenue);
    Ok(Json(report))
}

/// POST /v1/analyze-cac: Multi-methodology CAC analysis.
pub async fn handle_analyze_cac(Json(request): Json<CacAnalysisRequest>) -> ApiResult<CacAnalysis> {
    metrics::counter!("api.analyze_cac.requests").increment(1);
    if request.marketing_data.is_empty() {
        warn!("CAC analysis request without marketing rows");
        return Err(reject_cac_error(&CacError::EmptyFile(
            "marketingData has no rows".to_string(),
        )));
    }

    Ok(Json(analyze_cac(&request)))
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub filename: String,
    pub cached: bool,
    #[serde(flatten)]
    pub table: ParsedTable,
}

/// POST /v1/upload: Decode an uploaded CSV/JSON file into raw rows.
pub async fn handle_upload(State(state): State<AppState>, mut multipart: Multipart) -> ApiResult<UploadResponse> {
    metrics::counter!("api.upload.requests").increment(1);

    let field = loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some("file") => break field,
            Ok(Some(_)) => continue,
            Ok(None) => {
                return Err(reject(
                    StatusCode::BAD_REQUEST,
                    "invalid_input",
                    "multipart body has no 'file' field",
                ))
            }
            Err(e) => return Err(reject(StatusCode::BAD_REQUEST, "invalid_input", e.body_text())),
        }
    };

    let filename = field.file_name().unwrap_or("upload").to_string();
    let bytes = field
        .bytes()
        .await
        .map_err(|e| reject(StatusCode::BAD_REQUEST, "invalid_input", e.body_text()))?;
    if bytes.len() > state.upload.max_file_bytes {
        return Err(reject(
            StatusCode::PAYLOAD_TOO_LARGE,
            "file_too_large",
            format!("{filename} exceeds {} bytes", state.upload.max_file_bytes),
        ));
    }

    if let Some(table) = state.cache.get(&filename, bytes.len()) {
        metrics::counter!("api.upload.cache_hits").increment(1);
        info!(filename = %filename, "Upload served from cache");
        return Ok(Json(UploadResponse {
            filename,
            cached: true,
            table: (*table).clone(),
        }));
    }

    let table = cac_ingest::parse_upload(&filename, &bytes).map_err(|e| {
        if !e.is_input_error() {
            error!(error = %e, filename = %filename, "Upload processing failed");
        }
        reject_cac_error(&e)
    })?;
    let table = Arc::new(table);
    state.cache.put(&filename, bytes.len(), table.clone());

    Ok(Json(UploadResponse {
        filename,
        cached: false,
        table: (*table).clone(),
    }))
}

/// GET /health: Health check endpoint.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        cached_uploads: state.cache.len(),
    })
}

/// GET /live: Liveness probe.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub cached_uploads: usize,
}
