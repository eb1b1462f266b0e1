//! # API Error Types
//!
//! Maps upload validation and analytics failures onto HTTP responses.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use trial_analytics::AnalyticsError;

/// API-level errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Endpoint not found")]
    NotFound,

    #[error("No file uploaded")]
    NoFile,

    #[error("No file selected")]
    NoFileSelected,

    #[error("Invalid file type. Only CSV files are allowed.")]
    InvalidFileType,

    #[error("Invalid upload: {0}")]
    Multipart(#[from] MultipartError),

    /// An uploaded file could not be analyzed
    #[error("Error processing CSV file: {source}")]
    Processing {
        filename: String,
        #[source]
        source: AnalyticsError,
    },

    /// The default data source could not be analyzed
    #[error("{0}")]
    Analytics(#[from] AnalyticsError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::NoFile | Self::NoFileSelected | Self::InvalidFileType | Self::Processing { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::Multipart(e) => e.status(),
            Self::Analytics(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::NoFile => "NO_FILE",
            Self::NoFileSelected => "NO_FILE_SELECTED",
            Self::InvalidFileType => "INVALID_FILE_TYPE",
            Self::Multipart(_) => "INVALID_UPLOAD",
            Self::Processing { .. } => "PROCESSING_ERROR",
            Self::Analytics(_) => "ANALYTICS_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.error_code(), "Request failed");
        } else {
            tracing::warn!(error = %self, code = self.error_code(), "Request rejected");
        }

        let mut body = serde_json::json!({
            "error": {
                "message": self.to_string(),
                "code": self.error_code(),
            }
        });
        if let Self::Processing { filename, .. } = &self {
            body["file_info"] = serde_json::json!({
                "filename": filename,
                "status": "error",
            });
        }

        (status, axum::Json(body)).into_response()
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::NoFile.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::InvalidFileType.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Analytics(AnalyticsError::EmptySource).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        let processing = ApiError::Processing {
            filename: "x.csv".into(),
            source: AnalyticsError::EmptySource,
        };
        assert_eq!(processing.status_code(), StatusCode::BAD_REQUEST);
        assert!(processing.to_string().starts_with("Error processing CSV file"));
    }
}
