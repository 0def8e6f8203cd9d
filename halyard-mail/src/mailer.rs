//! The email workflow engine.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use halyard_common::report::{ErrorReporter, ErrorSummary};
use halyard_store::{DocumentStore, RecordId, StoreError, collections, singleton};

use crate::{
    error::MailError,
    outcome::{Disposition, DrainReport, SendOutcome},
    record::EmailRecord,
    settings::{EmailSettings, TransporterOptions},
    transport::MailTransport,
};

/// Orchestrates send attempts against the queue and archive collections.
///
/// Holds its collaborators behind trait objects so tests can substitute
/// an in-memory store, a scripted transport, and a capturing reporter.
#[derive(Debug, Clone)]
pub struct Mailer {
    store: Arc<dyn DocumentStore>,
    transport: Arc<dyn MailTransport>,
    reporter: Arc<dyn ErrorReporter>,
}

impl Mailer {
    #[must_use]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        transport: Arc<dyn MailTransport>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        Self {
            store,
            transport,
            reporter,
        }
    }

    // ----- settings accessors

    /// The singleton email settings document.
    pub async fn settings(&self) -> Result<EmailSettings, MailError> {
        let (_, doc) = singleton::load(self.store.as_ref(), collections::EMAIL_SETTINGS).await?;
        serde_json::from_value(doc).map_err(|source| MailError::Malformed {
            collection: collections::EMAIL_SETTINGS,
            source,
        })
    }

    pub async fn transporter_options(&self) -> Result<TransporterOptions, MailError> {
        Ok(self.settings().await?.transporter_options)
    }

    pub async fn smtp_processing_status(&self) -> Result<bool, MailError> {
        Ok(self.settings().await?.smtp_processing_status)
    }

    pub async fn queue_processing_status(&self) -> Result<bool, MailError> {
        Ok(self.settings().await?.queue_processing_status)
    }

    pub async fn whitelisted_domains(&self) -> Result<Vec<String>, MailError> {
        Ok(self.settings().await?.whitelisted_domains)
    }

    /// Replace the settings document wholesale.
    pub async fn replace_settings(&self, settings: &EmailSettings) -> Result<(), MailError> {
        singleton::replace(self.store.as_ref(), collections::EMAIL_SETTINGS, settings).await?;
        Ok(())
    }

    /// Merge the named top-level fields of `patch` into the settings
    /// document, leaving all other fields as they are.
    pub async fn update_setting(&self, patch: Value) -> Result<(), MailError> {
        singleton::update(self.store.as_ref(), collections::EMAIL_SETTINGS, patch).await?;
        Ok(())
    }

    // ----- queue and archive pass-throughs

    /// Every record currently in the queue, oldest first.
    pub async fn queue_records(&self) -> Result<Vec<EmailRecord>, MailError> {
        self.records(collections::EMAIL_QUEUE).await
    }

    /// Every record in the archive, oldest first.
    pub async fn archive_records(&self) -> Result<Vec<EmailRecord>, MailError> {
        self.records(collections::EMAIL_ARCHIVE).await
    }

    /// Place a record in the queue, stamping `queued_time` and assigning
    /// a fresh queue identity.
    pub async fn enqueue(&self, mut email: EmailRecord) -> Result<EmailRecord, StoreError> {
        email.queued_time = Some(Utc::now());
        email.id = None;
        let id = self
            .store
            .insert_one(collections::EMAIL_QUEUE, serde_json::to_value(&email)?)
            .await?;
        email.id = Some(id);
        Ok(email)
    }

    /// Place a record in the archive, stamping `archived_time`.
    pub async fn archive(&self, mut email: EmailRecord) -> Result<EmailRecord, StoreError> {
        email.archived_time = Some(Utc::now());
        email.id = None;
        let id = self
            .store
            .insert_one(collections::EMAIL_ARCHIVE, serde_json::to_value(&email)?)
            .await?;
        email.id = Some(id);
        Ok(email)
    }

    /// Remove a record from the queue.
    ///
    /// `None` (the record never was in the queue) and an id that is
    /// already gone are both successes: the post-condition — the record
    /// is not in the queue — holds either way.
    pub async fn delete_queued(&self, id: Option<&RecordId>) -> Result<(), StoreError> {
        self.delete_from(collections::EMAIL_QUEUE, id).await
    }

    /// Remove a record from the archive. Same no-op semantics as
    /// [`delete_queued`](Self::delete_queued).
    pub async fn delete_archived(&self, id: Option<&RecordId>) -> Result<(), StoreError> {
        self.delete_from(collections::EMAIL_ARCHIVE, id).await
    }

    /// Overwrite a queued record in place.
    pub async fn replace_queued(
        &self,
        id: &RecordId,
        email: &EmailRecord,
    ) -> Result<(), StoreError> {
        self.store
            .overwrite(collections::EMAIL_QUEUE, id, serde_json::to_value(email)?)
            .await
    }

    /// Overwrite an archived record in place.
    pub async fn replace_archived(
        &self,
        id: &RecordId,
        email: &EmailRecord,
    ) -> Result<(), StoreError> {
        self.store
            .overwrite(collections::EMAIL_ARCHIVE, id, serde_json::to_value(email)?)
            .await
    }

    // ----- the workflow itself

    /// Attempt delivery of one email and reconcile the queue and archive
    /// with the result.
    ///
    /// Only settings retrieval can fail this function. Everything after
    /// the delivery attempt is folded into the returned [`SendOutcome`],
    /// with anything reportable already published to the error reporter.
    pub async fn send(&self, mut email: EmailRecord) -> Result<SendOutcome, MailError> {
        email.received_time = Some(Utc::now());
        let options = self.transporter_options().await?;

        match self.transport.send(&options, &email).await {
            Ok(message_id) => Ok(self.reconcile_delivered(email, message_id).await),
            Err(transport_error) if email.from_queue() => {
                // Already queued; never insert a second queue entry
                self.report(
                    ErrorSummary::new("queued email failed to send and remains queued")
                        .detail(transport_error.to_string()),
                )
                .await;

                Ok(SendOutcome {
                    email,
                    disposition: Disposition::StillQueued,
                    message_id: None,
                    transport_error: Some(transport_error.to_string()),
                    store_errors: Vec::new(),
                })
            }
            Err(transport_error) => match self.enqueue(email.clone()).await {
                Ok(queued) => {
                    info!(
                        subject = %queued.subject,
                        error = %transport_error,
                        "send failed, email queued for redelivery"
                    );
                    self.report(
                        ErrorSummary::new("email failed to send and was queued for redelivery")
                            .detail(transport_error.to_string()),
                    )
                    .await;

                    Ok(SendOutcome {
                        email: queued,
                        disposition: Disposition::Queued,
                        message_id: None,
                        transport_error: Some(transport_error.to_string()),
                        store_errors: Vec::new(),
                    })
                }
                Err(store_error) => {
                    // Neither delivered nor persisted; this outcome is the
                    // only remaining copy of the email
                    self.report(
                        ErrorSummary::new("email failed to send and could not be queued")
                            .emergency()
                            .detail(transport_error.to_string())
                            .detail(store_error.to_string()),
                    )
                    .await;

                    Ok(SendOutcome {
                        email,
                        disposition: Disposition::Emergency,
                        message_id: None,
                        transport_error: Some(transport_error.to_string()),
                        store_errors: vec![store_error.to_string()],
                    })
                }
            },
        }
    }

    /// Drain the queue: attempt every queued record concurrently and
    /// aggregate the outcomes as they arrive.
    pub async fn process_queue(&self) -> Result<DrainReport, MailError> {
        let queued = self.queue_records().await?;

        let mut report = DrainReport {
            in_queue: queued.len(),
            ..DrainReport::default()
        };
        if queued.is_empty() {
            debug!("email queue is empty, nothing to drain");
            return Ok(report);
        }

        let mut attempts: JoinSet<SendOutcome> = JoinSet::new();
        for email in queued {
            let mailer = self.clone();
            attempts.spawn(async move {
                let fallback = email.clone();
                match mailer.send(email).await {
                    Ok(outcome) => outcome,
                    // Settings retrieval failed for this attempt; the
                    // record is untouched and still queued
                    Err(e) => SendOutcome {
                        email: fallback,
                        disposition: Disposition::StillQueued,
                        message_id: None,
                        transport_error: None,
                        store_errors: vec![e.to_string()],
                    },
                }
            });
        }

        // The batch completes when every attempt has reported back, in
        // whatever order they finish
        while let Some(joined) = attempts.join_next().await {
            match joined {
                Ok(outcome) => {
                    if outcome.delivered() {
                        report.sent += 1;
                    }
                    if outcome.is_err() {
                        report.failures.push(outcome);
                    }
                }
                Err(e) => {
                    warn!(error = %e, "send attempt task failed to complete");
                }
            }
        }

        info!(
            in_queue = report.in_queue,
            sent = report.sent,
            failed = report.failures.len(),
            "email queue drained"
        );
        Ok(report)
    }

    /// Probe SMTP connectivity with the current transporter options.
    pub async fn verify_smtp(&self) -> Result<(), MailError> {
        let options = self.transporter_options().await?;
        match self.transport.verify(&options).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.report(
                    ErrorSummary::new("SMTP connectivity probe failed").detail(e.to_string()),
                )
                .await;
                Err(e.into())
            }
        }
    }

    // ----- internals

    /// After the relay accepted the message: concurrently remove it from
    /// the queue and insert it into the archive, then fold both results
    /// into the outcome.
    async fn reconcile_delivered(&self, email: EmailRecord, message_id: String) -> SendOutcome {
        let (dequeued, archived) = tokio::join!(
            self.delete_queued(email.id.as_ref()),
            self.archive(email.clone()),
        );

        let mut store_errors = Vec::new();
        if let Err(e) = dequeued {
            store_errors.push(e.to_string());
        }
        let email = match archived {
            Ok(archived) => archived,
            Err(e) => {
                store_errors.push(e.to_string());
                email
            }
        };

        if !store_errors.is_empty() {
            // Delivery succeeded; the collections are what is now wrong.
            // Partial completion here can leave the record in neither or
            // both collections until someone reconciles by hand.
            self.report(
                ErrorSummary::new("email delivered but queue/archive bookkeeping failed")
                    .details(&store_errors),
            )
            .await;
        }

        SendOutcome {
            email,
            disposition: Disposition::Delivered,
            message_id: Some(message_id),
            transport_error: None,
            store_errors,
        }
    }

    async fn records(&self, collection: &'static str) -> Result<Vec<EmailRecord>, MailError> {
        self.store
            .read_all(collection)
            .await?
            .into_iter()
            .map(|doc| {
                serde_json::from_value(doc).map_err(|source| MailError::Malformed {
                    collection,
                    source,
                })
            })
            .collect()
    }

    async fn delete_from(
        &self,
        collection: &'static str,
        id: Option<&RecordId>,
    ) -> Result<(), StoreError> {
        let Some(id) = id else {
            return Ok(());
        };

        match self.store.delete(collection, id).await {
            Ok(()) | Err(StoreError::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Fire-and-forget publication to the error reporter.
    async fn report(&self, summary: ErrorSummary) {
        if let Err(e) = self.reporter.report(&summary).await {
            warn!(error = %e, headline = %summary.headline, "error summary could not be reported");
        }
    }
}
