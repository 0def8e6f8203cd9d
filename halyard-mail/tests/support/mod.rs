//! Shared fixtures for the workflow integration tests.
#![allow(dead_code)] // Not every fixture is used by every test binary

pub mod mock_server;

use std::{
    collections::HashSet,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use serde_json::json;

use halyard_mail::{EmailRecord, MailTransport, TransportError, TransporterOptions};
use halyard_store::{DocumentStore, collections};

/// Scripted transport for exercising the workflow without a network.
///
/// By default every send succeeds. Individual subjects (or everything)
/// can be made to fail with a permanent SMTP rejection, and delivered
/// records are captured for assertions.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    fail_subjects: Arc<Mutex<HashSet<String>>>,
    fail_all: Arc<AtomicBool>,
    fail_verify: Arc<AtomicBool>,
    sent: Arc<Mutex<Vec<EmailRecord>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sends of emails with this subject fail.
    pub fn fail_subject(&self, subject: impl Into<String>) {
        self.fail_subjects
            .lock()
            .expect("MockTransport mutex poisoned")
            .insert(subject.into());
    }

    /// Make every send fail.
    pub fn fail_all(&self) {
        self.fail_all.store(true, Ordering::SeqCst);
    }

    /// Make connectivity verification fail.
    pub fn fail_verify(&self) {
        self.fail_verify.store(true, Ordering::SeqCst);
    }

    /// Every record delivered so far.
    pub fn sent(&self) -> Vec<EmailRecord> {
        self.sent
            .lock()
            .expect("MockTransport mutex poisoned")
            .clone()
    }
}

#[async_trait]
impl MailTransport for MockTransport {
    async fn verify(&self, _options: &TransporterOptions) -> Result<(), TransportError> {
        if self.fail_verify.load(Ordering::SeqCst) {
            return Err(TransportError::ConnectionClosed);
        }
        Ok(())
    }

    async fn send(
        &self,
        _options: &TransporterOptions,
        email: &EmailRecord,
    ) -> Result<String, TransportError> {
        let should_fail = self.fail_all.load(Ordering::SeqCst)
            || self
                .fail_subjects
                .lock()
                .expect("MockTransport mutex poisoned")
                .contains(&email.subject);

        if should_fail {
            return Err(TransportError::Smtp {
                code: 550,
                message: "mailbox unavailable".to_string(),
            });
        }

        self.sent
            .lock()
            .expect("MockTransport mutex poisoned")
            .push(email.clone());
        Ok(format!("<{}@mock.test>", ulid::Ulid::new()))
    }
}

/// Insert a permissive email settings singleton, as provisioning would.
pub async fn provision_email_settings(store: &dyn DocumentStore) {
    store
        .insert_one(
            collections::EMAIL_SETTINGS,
            json!({
                "smtp_processing_status": true,
                "queue_processing_status": true,
                "transporter_options": { "host": "relay.test", "port": 25, "secure": false },
                "whitelisted_domains": ["https://intranet.example.org"],
            }),
        )
        .await
        .expect("provision email settings");
}
