use thiserror::Error;

use halyard_store::StoreError;

/// Errors raised by the ingestion pipelines.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The domain's `data_processing_status` gate is closed.
    #[error("data processing is disabled for this domain")]
    ProcessingDisabled,

    /// The CSV source could not be read or parsed.
    #[error("CSV error: {0}")]
    Csv(String),

    /// The workbook source could not be read or parsed.
    #[error("workbook error: {0}")]
    Sheet(String),

    /// Persistence-level failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A stored settings document did not deserialize.
    #[error("malformed document in '{collection}': {source}")]
    Malformed {
        collection: &'static str,
        source: serde_json::Error,
    },

    /// Both the sync step and the guard release failed.
    #[error("multiple failures: {0:?}")]
    Combined(Vec<String>),
}

impl From<csv::Error> for IngestError {
    fn from(e: csv::Error) -> Self {
        Self::Csv(e.to_string())
    }
}
