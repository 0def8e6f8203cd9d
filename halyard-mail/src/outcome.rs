use serde::Serialize;

use crate::record::EmailRecord;

/// Where an email ended up after a send attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// The relay accepted the message; it was archived.
    Delivered,
    /// Delivery failed; the message was placed in the queue.
    Queued,
    /// Delivery failed for a message that was already queued; it stays
    /// where it is.
    StillQueued,
    /// Delivery failed *and* the message could not be queued. It exists
    /// only in this outcome and is at risk of being lost.
    Emergency,
}

/// The result of a single send attempt.
///
/// A send resolves to an outcome rather than an error for everything past
/// settings retrieval, so a batch drain can aggregate failures without
/// stopping at the first one. Error details are carried as strings; the
/// typed originals have already been reported and logged by the time an
/// outcome is constructed.
#[derive(Debug, Clone, Serialize)]
pub struct SendOutcome {
    /// The record as it stands after the attempt (timestamps restamped,
    /// queue identity assigned if it was queued).
    pub email: EmailRecord,

    pub disposition: Disposition,

    /// Message ID the relay accepted, when delivery succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,

    /// SMTP-level failure description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transport_error: Option<String>,

    /// Persistence failures hit while reconciling the queue and archive.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub store_errors: Vec<String>,
}

impl SendOutcome {
    /// Whether the relay accepted the message.
    #[must_use]
    pub const fn delivered(&self) -> bool {
        matches!(self.disposition, Disposition::Delivered)
    }

    /// Whether anything at all went wrong during the attempt.
    #[must_use]
    pub fn is_err(&self) -> bool {
        self.transport_error.is_some() || !self.store_errors.is_empty()
    }
}

/// Aggregate result of draining the email queue.
#[derive(Debug, Default, Serialize)]
pub struct DrainReport {
    /// How many records the queue held when the drain started.
    pub in_queue: usize,

    /// How many records the relay accepted during this drain. Records
    /// whose archive bookkeeping failed after acceptance still count:
    /// the mail was delivered, and the store failure is surfaced in
    /// `failures` instead.
    pub sent: usize,

    /// Every outcome that carried an error, in completion order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<SendOutcome>,
}

impl DrainReport {
    /// Whether any record in the batch failed in any way.
    #[must_use]
    pub fn is_err(&self) -> bool {
        !self.failures.is_empty()
    }
}
