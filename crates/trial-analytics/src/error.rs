//! Analytics error types.

use thiserror::Error;
use trial_domain::Column;

/// Analytics errors.
#[derive(Error, Debug)]
pub enum AnalyticsError {
    /// The source could not be opened or read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The source is not parseable as comma-separated rows
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    /// The source has no header row
    #[error("source contains no header row")]
    EmptySource,

    /// A column required downstream is absent from the header or was dropped
    /// during cleaning
    #[error("required column '{column}' is missing after cleaning")]
    SchemaInvalid { column: Column },

    /// Data conversion error
    #[error("Data conversion error: {0}")]
    Conversion(String),
}

impl AnalyticsError {
    /// Whether the failure came from reading or parsing the source itself.
    pub const fn is_source_unreadable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Csv(_) | Self::EmptySource)
    }
}

/// Result type for analytics operations.
pub type Result<T> = std::result::Result<T, AnalyticsError>;
