//! The HR positions sync domain.

mod workbook;

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;
use tracing::info;

use halyard_common::report::ErrorReporter;
use halyard_store::{DocumentStore, collections, singleton};

use crate::{
    IngestError, SyncReport,
    pipeline::conclude,
    settings::{ExcelOptions, PositionsSettings},
};

pub use workbook::records_from_rows;

/// Synchronizes the HR position roster into the document store.
#[derive(Debug, Clone)]
pub struct PositionsService {
    store: Arc<dyn DocumentStore>,
    reporter: Arc<dyn ErrorReporter>,
    guard: Arc<Mutex<()>>,
}

impl PositionsService {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, reporter: Arc<dyn ErrorReporter>) -> Self {
        Self {
            store,
            reporter,
            guard: Arc::new(Mutex::new(())),
        }
    }

    // ----- settings accessors

    /// The singleton positions settings document.
    pub async fn settings(&self) -> Result<PositionsSettings, IngestError> {
        let (_, doc) =
            singleton::load(self.store.as_ref(), collections::POSITIONS_SETTINGS).await?;
        serde_json::from_value(doc).map_err(|source| IngestError::Malformed {
            collection: collections::POSITIONS_SETTINGS,
            source,
        })
    }

    pub async fn data_processing_status(&self) -> Result<bool, IngestError> {
        Ok(self.settings().await?.data_processing_status)
    }

    pub async fn data_processing_now(&self) -> Result<bool, IngestError> {
        Ok(self.settings().await?.data_processing_now)
    }

    pub async fn whitelisted_domains(&self) -> Result<Vec<String>, IngestError> {
        Ok(self.settings().await?.whitelisted_domains)
    }

    /// Replace the settings document wholesale.
    pub async fn replace_settings(&self, settings: &PositionsSettings) -> Result<(), IngestError> {
        singleton::replace(self.store.as_ref(), collections::POSITIONS_SETTINGS, settings).await?;
        Ok(())
    }

    /// Merge the named top-level fields of `patch` into the settings
    /// document.
    pub async fn update_setting(&self, patch: Value) -> Result<(), IngestError> {
        singleton::update(self.store.as_ref(), collections::POSITIONS_SETTINGS, patch).await?;
        Ok(())
    }

    // ----- data access

    /// Extract the roster records from the configured workbook without
    /// touching the store.
    pub async fn load_positions(&self) -> Result<Vec<Value>, IngestError> {
        let options = self.settings().await?.excel_options;
        parse_positions(&options).await
    }

    /// Every synchronized position record currently in the store.
    pub async fn positions(&self) -> Result<Vec<Value>, IngestError> {
        Ok(self.store.read_all(collections::POSITIONS).await?)
    }

    // ----- sync pipeline

    /// Replace `positions` with the current roster.
    pub async fn sync_positions(&self) -> Result<SyncReport, IngestError> {
        let _exclusive = self.guard.lock().await;

        let settings = self.settings().await?;
        if !settings.data_processing_status {
            return Err(IngestError::ProcessingDisabled);
        }

        self.set_processing_now(true).await?;
        let outcome = self.refresh_positions(&settings.excel_options).await;
        let release = self.set_processing_now(false).await;

        conclude(&self.reporter, "positions sync", outcome, release).await
    }

    // ----- internals

    async fn refresh_positions(&self, options: &ExcelOptions) -> Result<SyncReport, IngestError> {
        let records = parse_positions(options).await?;
        let record_count = records.len();

        self.store.delete_all(collections::POSITIONS).await?;
        self.store
            .insert_many(collections::POSITIONS, records)
            .await?;

        info!(records = record_count, "positions replaced");
        Ok(SyncReport {
            records: record_count,
        })
    }

    /// Mirror the in-process guard state to the settings document.
    async fn set_processing_now(&self, value: bool) -> Result<(), halyard_store::StoreError> {
        singleton::update(
            self.store.as_ref(),
            collections::POSITIONS_SETTINGS,
            serde_json::json!({ "data_processing_now": value }),
        )
        .await
    }
}

/// Run the blocking workbook parse off the async runtime.
async fn parse_positions(options: &ExcelOptions) -> Result<Vec<Value>, IngestError> {
    let path = options.workbook_file.clone();
    let worksheet = options.positions_worksheet.clone();
    let rows = tokio::task::spawn_blocking(move || {
        workbook::read_worksheet_rows(&path, &worksheet)
    })
    .await
    .map_err(|e| IngestError::Sheet(format!("parse task failed: {e}")))??;

    Ok(records_from_rows(&rows))
}
