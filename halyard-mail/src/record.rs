use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use halyard_store::RecordId;

/// An email attachment.
///
/// Content is stored base64-encoded so the record serializes to a compact
/// JSON document and the bytes can be spliced into a MIME part without
/// re-encoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Filename presented in the MIME headers.
    pub filename: String,
    /// MIME content type (e.g. `application/pdf`).
    pub content_type: String,
    /// Base64-encoded attachment bytes.
    pub content: String,
}

impl Attachment {
    /// Create an attachment from raw bytes.
    #[must_use]
    pub fn from_bytes(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        bytes: &[u8],
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            content: BASE64.encode(bytes),
        }
    }

    /// Decode the attachment bytes.
    ///
    /// # Errors
    /// Returns an error if the stored content is not valid base64.
    pub fn bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        BASE64.decode(&self.content)
    }
}

/// A single email as persisted in the queue and archive collections.
///
/// The identifier is present only once the record has been persisted.
/// The three timestamps track the record's path through the workflow:
/// `received_time` is stamped when a send is first attempted,
/// `queued_time` when the record enters the queue, and `archived_time`
/// when it enters the archive. An archived record always carries
/// `received_time` and `archived_time`; a queued record always carries
/// `queued_time` and never `archived_time`.
///
/// Callers may attach arbitrary extra fields; they ride along in
/// `extra` and survive the queue/archive round trip untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmailRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,

    #[serde(default)]
    pub from: String,

    #[serde(default)]
    pub to: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cc: Vec<String>,

    #[serde(default)]
    pub subject: String,

    #[serde(default)]
    pub body: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_time: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queued_time: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_time: Option<DateTime<Utc>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EmailRecord {
    /// Create a record with the usual fields filled in.
    #[must_use]
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: vec![to.into()],
            subject: subject.into(),
            body: body.into(),
            ..Self::default()
        }
    }

    /// Add a recipient.
    #[must_use]
    pub fn and_to(mut self, recipient: impl Into<String>) -> Self {
        self.to.push(recipient.into());
        self
    }

    /// Add a carbon-copy recipient.
    #[must_use]
    pub fn and_cc(mut self, recipient: impl Into<String>) -> Self {
        self.cc.push(recipient.into());
        self
    }

    /// Attach a file.
    #[must_use]
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Every envelope recipient (To then Cc) in order.
    pub fn recipients(&self) -> impl Iterator<Item = &str> {
        self.to
            .iter()
            .chain(self.cc.iter())
            .map(String::as_str)
    }

    /// Whether this record came out of the queue collection.
    #[must_use]
    pub const fn from_queue(&self) -> bool {
        self.queued_time.is_some()
    }
}
