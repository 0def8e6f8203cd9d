//! The shared gate/guard/process/release shape of every sync pipeline.

use std::sync::Arc;

use tracing::warn;

use halyard_common::report::{ErrorReporter, ErrorSummary};
use halyard_store::StoreError;

use crate::{IngestError, SyncReport};

/// Fold the processing outcome and the guard release together.
///
/// The persisted `data_processing_now` flag must be cleared on every exit
/// path, so the release has already been attempted by the time this runs;
/// what remains is deciding what the caller sees and what gets reported:
///
/// - both succeeded: the report passes through
/// - only the release failed: the sync worked but the flag is stuck, which
///   is a store error the caller must hear about
/// - only the sync failed: the failure passes through
/// - both failed: the errors are collected together, since either alone
///   would mask the other
pub(crate) async fn conclude(
    reporter: &Arc<dyn ErrorReporter>,
    what: &str,
    outcome: Result<SyncReport, IngestError>,
    release: Result<(), StoreError>,
) -> Result<SyncReport, IngestError> {
    match (outcome, release) {
        (Ok(report), Ok(())) => Ok(report),
        (Ok(_), Err(release_err)) => {
            report(
                reporter,
                ErrorSummary::new(format!("{what} succeeded but the processing flag is stuck"))
                    .detail(release_err.to_string()),
            )
            .await;
            Err(release_err.into())
        }
        (Err(sync_err), Ok(())) => {
            report(
                reporter,
                ErrorSummary::new(format!("{what} failed")).detail(sync_err.to_string()),
            )
            .await;
            Err(sync_err)
        }
        (Err(sync_err), Err(release_err)) => {
            let details = vec![sync_err.to_string(), release_err.to_string()];
            report(
                reporter,
                ErrorSummary::new(format!(
                    "{what} failed and the processing flag is stuck"
                ))
                .details(&details),
            )
            .await;
            Err(IngestError::Combined(details))
        }
    }
}

/// Fire-and-forget publication to the error reporter.
pub(crate) async fn report(reporter: &Arc<dyn ErrorReporter>, summary: ErrorSummary) {
    if let Err(e) = reporter.report(&summary).await {
        warn!(error = %e, headline = %summary.headline, "error summary could not be reported");
    }
}
