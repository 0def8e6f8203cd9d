//! Operational error reporting.
//!
//! Workflows publish a short summary of anything that went wrong to an
//! external notification channel. Reporting is strictly fire-and-forget:
//! a failure to report is logged and never influences the outcome of the
//! operation that produced the summary.

use std::{
    fmt,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tracing::debug;

/// Error raised by a reporting channel.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("channel error: {0}")]
    Channel(String),
}

/// A summary of an operational error.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ErrorSummary {
    /// One-line description of what failed.
    pub headline: String,

    /// Set when data is at risk of being lost (e.g. an email failed to
    /// send *and* failed to queue).
    pub emergency: bool,

    /// Underlying error strings, most significant first.
    pub details: Vec<String>,
}

impl ErrorSummary {
    /// Create a non-emergency summary.
    #[must_use]
    pub fn new(headline: impl Into<String>) -> Self {
        Self {
            headline: headline.into(),
            emergency: false,
            details: Vec::new(),
        }
    }

    /// Mark this summary as an emergency.
    #[must_use]
    pub const fn emergency(mut self) -> Self {
        self.emergency = true;
        self
    }

    /// Append a detail line.
    #[must_use]
    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.details.push(detail.into());
        self
    }

    /// Append one detail line per error in `errors`.
    #[must_use]
    pub fn details<E: fmt::Display>(mut self, errors: impl IntoIterator<Item = E>) -> Self {
        self.details
            .extend(errors.into_iter().map(|e| e.to_string()));
        self
    }
}

/// Channel that publishes error summaries.
#[async_trait]
pub trait ErrorReporter: Send + Sync + fmt::Debug {
    /// Publish a summary.
    ///
    /// Implementations should make a best effort and return quickly;
    /// callers do not retry.
    async fn report(&self, summary: &ErrorSummary) -> Result<(), ReportError>;
}

/// Reporter that POSTs summaries to a webhook as JSON.
#[derive(Debug, Clone)]
pub struct WebhookReporter {
    client: reqwest::Client,
    url: String,
    app_name: String,
}

impl WebhookReporter {
    /// Create a reporter posting to `url`, tagging each summary with
    /// `app_name`.
    #[must_use]
    pub fn new(url: impl Into<String>, app_name: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            app_name: app_name.into(),
        }
    }

    fn status_line(&self, summary: &ErrorSummary) -> String {
        let stamp = Utc::now().format("%a, %m/%d, %-I:%M %p");
        let kind = if summary.emergency {
            "Emergency Error"
        } else {
            "Standard Error"
        };
        format!("{stamp} - {} {kind}: {}", self.app_name, summary.headline)
    }
}

#[async_trait]
impl ErrorReporter for WebhookReporter {
    async fn report(&self, summary: &ErrorSummary) -> Result<(), ReportError> {
        let payload = serde_json::json!({
            "text": self.status_line(summary),
            "emergency": summary.emergency,
            "details": summary.details,
        });

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ReportError::Channel(e.to_string()))?;

        response
            .error_for_status()
            .map_err(|e| ReportError::Channel(e.to_string()))?;

        Ok(())
    }
}

/// Reporter that drops summaries after logging them.
///
/// Used when no webhook is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReporter;

#[async_trait]
impl ErrorReporter for NoopReporter {
    async fn report(&self, summary: &ErrorSummary) -> Result<(), ReportError> {
        debug!(
            headline = %summary.headline,
            emergency = summary.emergency,
            "error summary dropped (no reporting channel configured)"
        );
        Ok(())
    }
}

/// Reporter that captures summaries in memory, for test assertions.
#[derive(Debug, Clone, Default)]
pub struct MemoryReporter {
    summaries: Arc<Mutex<Vec<ErrorSummary>>>,
}

impl MemoryReporter {
    /// Create a new empty capture reporter
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All summaries reported so far
    ///
    /// # Panics
    /// Panics if the capture mutex is poisoned
    #[must_use]
    pub fn summaries(&self) -> Vec<ErrorSummary> {
        self.summaries
            .lock()
            .expect("MemoryReporter mutex poisoned")
            .clone()
    }

    /// Number of summaries reported so far
    ///
    /// # Panics
    /// Panics if the capture mutex is poisoned
    #[must_use]
    pub fn count(&self) -> usize {
        self.summaries
            .lock()
            .expect("MemoryReporter mutex poisoned")
            .len()
    }
}

#[async_trait]
impl ErrorReporter for MemoryReporter {
    async fn report(&self, summary: &ErrorSummary) -> Result<(), ReportError> {
        self.summaries
            .lock()
            .expect("MemoryReporter mutex poisoned")
            .push(summary.clone());
        Ok(())
    }
}
