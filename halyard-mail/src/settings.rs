use serde::{Deserialize, Serialize};

use halyard_store::RecordId;

/// SMTP relay connection options.
///
/// Kept in the settings document rather than the service configuration so
/// the relay can be repointed at runtime without a restart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransporterOptions {
    pub host: String,
    pub port: u16,
    /// Connect with implicit TLS (typically port 465). When false, the
    /// connection is plain TCP.
    #[serde(default)]
    pub secure: bool,
}

/// The singleton email settings document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,

    /// Gate for individual sends: when false, the send API is closed.
    #[serde(default)]
    pub smtp_processing_status: bool,

    /// Gate for the periodic queue drain.
    #[serde(default)]
    pub queue_processing_status: bool,

    pub transporter_options: TransporterOptions,

    /// Origins allowed to call the email API.
    #[serde(default)]
    pub whitelisted_domains: Vec<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn settings_document_round_trips() {
        let doc = json!({
            "smtp_processing_status": true,
            "queue_processing_status": true,
            "transporter_options": { "host": "relay.example.org", "port": 25 },
            "whitelisted_domains": ["https://intranet.example.org"],
        });

        let settings: EmailSettings = serde_json::from_value(doc).expect("deserialize");
        assert!(settings.smtp_processing_status);
        assert_eq!(settings.transporter_options.host, "relay.example.org");
        assert_eq!(settings.transporter_options.port, 25);
        // secure defaults off
        assert!(!settings.transporter_options.secure);
    }
}
