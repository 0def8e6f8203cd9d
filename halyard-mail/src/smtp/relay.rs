use async_trait::async_trait;
use tracing::debug;

use crate::{record::EmailRecord, settings::TransporterOptions, transport::MailTransport};

use super::{error::Result, message, session::Session};

/// [`MailTransport`] implementation speaking SMTP to the configured relay.
///
/// Stateless apart from the EHLO name; a fresh connection is opened per
/// operation, matching how the transporter options can change between
/// sends.
#[derive(Debug, Clone)]
pub struct SmtpRelay {
    hello_name: String,
}

impl SmtpRelay {
    /// Create a relay transport announcing `hello_name` in EHLO.
    #[must_use]
    pub fn new(hello_name: impl Into<String>) -> Self {
        Self {
            hello_name: hello_name.into(),
        }
    }
}

#[async_trait]
impl MailTransport for SmtpRelay {
    async fn verify(&self, options: &TransporterOptions) -> Result<()> {
        let mut session = Session::open(options).await?;
        session.ehlo(&self.hello_name).await?;
        session.quit().await?;

        debug!(host = %options.host, port = options.port, "SMTP connectivity verified");
        Ok(())
    }

    async fn send(&self, options: &TransporterOptions, email: &EmailRecord) -> Result<String> {
        let mut session = Session::open(options).await?;
        session.ehlo(&self.hello_name).await?;

        session.mail_from(&email.from).await?;
        for recipient in email.recipients() {
            session.rcpt_to(recipient).await?;
        }

        session.data().await?;

        let message_id = format!("<{}@{}>", ulid::Ulid::new(), self.hello_name);
        session
            .payload(&message::format_message(email, &message_id))
            .await?;

        // The relay has accepted the message at this point; a failed QUIT
        // must not turn a delivered mail into a transport error
        if let Err(e) = session.quit().await {
            debug!(error = %e, "QUIT after accepted delivery failed");
        }

        debug!(
            host = %options.host,
            message_id = %message_id,
            "message accepted by relay"
        );
        Ok(message_id)
    }
}
