//! # Route Handlers
//!
//! Thin wrappers that run the analytics pipeline on a blocking thread and
//! shape its output for HTTP clients.

use axum::extract::{Multipart, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};
use trial_analytics::queries::summary_statistics;
use trial_analytics::{AnalyticsEngine, AnalyticsReport};
use trial_domain::{SummaryStatistics, TrialAnalytics};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Tag reported by the default summary endpoint.
pub const DEFAULT_DATA_SOURCE: &str = "default_file";

/// Multipart field carrying the CSV payload.
const FILE_FIELD: &str = "file";

/// Metadata about a processed upload
#[derive(Debug, Serialize)]
pub struct FileInfo {
    pub filename: String,
    pub total_records: usize,
    pub status: &'static str,
}

/// Summary statistics for an uploaded file
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    #[serde(flatten)]
    pub summary: SummaryStatistics,
    pub file_info: FileInfo,
}

/// Summary statistics for the configured data file
#[derive(Debug, Serialize)]
pub struct DefaultSummaryResponse {
    #[serde(flatten)]
    pub summary: SummaryStatistics,
    pub data_source: &'static str,
    pub total_records: usize,
}

/// Whether a client-supplied filename carries a `.csv` extension.
pub fn is_csv(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("csv"))
}

/// Reduce a client-supplied filename to a safe basename.
///
/// Directory components are stripped, whitespace becomes `_` and anything
/// outside `[A-Za-z0-9._-]` is removed.
pub fn secure_filename(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let cleaned: String = base
        .chars()
        .filter_map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                Some(c)
            } else if c.is_whitespace() {
                Some('_')
            } else {
                None
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').trim_matches('_');

    if cleaned.is_empty() {
        "upload.csv".to_owned()
    } else {
        cleaned.to_owned()
    }
}

async fn run_blocking<T, F>(task: F) -> ApiResult<T>
where
    F: FnOnce() -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
}

/// Stage an upload in a scoped temporary file and summarize it.
///
/// The staged file is removed when this function returns, on every path.
fn summarize_staged(upload_dir: &Path, filename: String, bytes: &[u8]) -> ApiResult<UploadResponse> {
    let staging_failed = |e: std::io::Error| ApiError::Internal(format!("Upload failed: {e}"));

    let mut staged = tempfile::Builder::new()
        .prefix("trial-upload-")
        .suffix(".csv")
        .tempfile_in(upload_dir)
        .map_err(staging_failed)?;
    staged.write_all(bytes).map_err(staging_failed)?;
    staged.flush().map_err(staging_failed)?;
    debug!(path = %staged.path().display(), "Staged upload");

    let result = trial_analytics::load_path(staged.path())
        .and_then(|ds| Ok((summary_statistics(&ds)?, ds.len())));

    match result {
        Ok((summary, total_records)) => {
            info!(%filename, total_records, "Processed uploaded file");
            Ok(UploadResponse {
                summary,
                file_info: FileInfo {
                    filename,
                    total_records,
                    status: "success",
                },
            })
        }
        Err(source) => Err(ApiError::Processing { filename, source }),
    }
}

/// `POST /api/upload`: summarize a CSV sent as multipart field `file`.
pub async fn upload_csv(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(FILE_FIELD) {
            let filename = field.file_name().unwrap_or_default().to_owned();
            let bytes = field.bytes().await?;
            upload = Some((filename, bytes));
            break;
        }
    }

    let (raw_name, bytes) = upload.ok_or(ApiError::NoFile)?;
    if raw_name.is_empty() {
        return Err(ApiError::NoFileSelected);
    }
    if !is_csv(&raw_name) {
        return Err(ApiError::InvalidFileType);
    }

    let filename = secure_filename(&raw_name);
    info!(%filename, bytes = bytes.len(), "Processing uploaded file");

    let upload_dir = state.config.upload_dir.clone();
    let response = run_blocking(move || summarize_staged(&upload_dir, filename, &bytes)).await?;
    Ok(Json(response))
}

/// `GET /api/summary`: summary statistics for the configured data file.
pub async fn default_summary(State(state): State<AppState>) -> ApiResult<Json<DefaultSummaryResponse>> {
    info!("Generating summary statistics from default data file");
    let engine = AnalyticsEngine::new(&state.config.data_file);

    let (summary, total_records) = run_blocking(move || {
        let ds = engine.load()?;
        Ok((summary_statistics(&ds)?, ds.len()))
    })
    .await?;

    Ok(Json(DefaultSummaryResponse {
        summary,
        data_source: DEFAULT_DATA_SOURCE,
        total_records,
    }))
}

/// `GET /api/analytics`: every analysis section for the configured data file.
pub async fn all_analytics(State(state): State<AppState>) -> ApiResult<Json<TrialAnalytics>> {
    let engine = AnalyticsEngine::new(&state.config.data_file);
    let analytics = run_blocking(move || engine.all_analytics().map_err(ApiError::from)).await?;
    Ok(Json(analytics))
}

/// `GET /api/report`: Markdown report for the configured data file.
pub async fn markdown_report(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let engine = AnalyticsEngine::new(&state.config.data_file);
    let report: AnalyticsReport = run_blocking(move || engine.generate_report().map_err(ApiError::from)).await?;
    Ok((
        [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
        report.to_markdown(),
    ))
}

/// Fallback for unknown routes
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
