use thiserror::Error;

use halyard_store::StoreError;

use crate::smtp::TransportError;

/// Errors returned by the email workflow engine.
///
/// Workflow operations deliberately return these only for failures that
/// happen *before* a delivery attempt (settings retrieval, reading the
/// queue). Everything after the attempt is represented in
/// [`SendOutcome`](crate::SendOutcome) so batch processing can aggregate
/// failures without short-circuiting.
#[derive(Debug, Error)]
pub enum MailError {
    /// SMTP-level failure.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Persistence-level failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A stored document did not deserialize into its expected shape.
    #[error("malformed document in '{collection}': {source}")]
    Malformed {
        collection: &'static str,
        source: serde_json::Error,
    },
}
