use async_trait::async_trait;

use crate::{record::EmailRecord, settings::TransporterOptions, smtp::TransportError};

/// Transport seam between the workflow engine and the SMTP relay.
///
/// The engine constructs nothing network-facing itself; it hands the
/// current transporter options and a record to this trait. Production
/// wiring uses [`SmtpRelay`](crate::SmtpRelay); tests substitute a mock
/// with scripted failures.
#[async_trait]
pub trait MailTransport: Send + Sync + std::fmt::Debug {
    /// Probe connectivity to the relay: connect, greet, and hang up.
    async fn verify(&self, options: &TransporterOptions) -> Result<(), TransportError>;

    /// Deliver a single message, returning the Message-ID the relay
    /// accepted.
    async fn send(
        &self,
        options: &TransporterOptions,
        email: &EmailRecord,
    ) -> Result<String, TransportError>;
}
