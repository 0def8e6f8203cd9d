//! The Active Directory sync domain.

mod users;

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;
use tracing::info;

use halyard_common::report::ErrorReporter;
use halyard_store::{DocumentStore, collections, singleton};

use crate::{
    IngestError, SyncReport,
    pipeline::conclude,
    settings::{CsvOptions, DirectorySettings},
};

pub use users::{AdUser, group_by_division_department};

/// Synchronizes the Active Directory export into the document store.
///
/// The in-process guard is the actual mutual exclusion for this domain;
/// the persisted `data_processing_now` flag only mirrors it so operators
/// can see a run in flight.
#[derive(Debug, Clone)]
pub struct DirectoryService {
    store: Arc<dyn DocumentStore>,
    reporter: Arc<dyn ErrorReporter>,
    guard: Arc<Mutex<()>>,
}

impl DirectoryService {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, reporter: Arc<dyn ErrorReporter>) -> Self {
        Self {
            store,
            reporter,
            guard: Arc::new(Mutex::new(())),
        }
    }

    // ----- settings accessors

    /// The singleton directory settings document.
    pub async fn settings(&self) -> Result<DirectorySettings, IngestError> {
        let (_, doc) =
            singleton::load(self.store.as_ref(), collections::DIRECTORY_SETTINGS).await?;
        serde_json::from_value(doc).map_err(|source| IngestError::Malformed {
            collection: collections::DIRECTORY_SETTINGS,
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
    pub async fn replace_settings(&self, settings: &DirectorySettings) -> Result<(), IngestError> {
        singleton::replace(self.store.as_ref(), collections::DIRECTORY_SETTINGS, settings).await?;
        Ok(())
    }

    /// Merge the named top-level fields of `patch` into the settings
    /// document.
    pub async fn update_setting(&self, patch: Value) -> Result<(), IngestError> {
        singleton::update(self.store.as_ref(), collections::DIRECTORY_SETTINGS, patch).await?;
        Ok(())
    }

    // ----- data access

    /// Parse and normalize the configured export without touching the
    /// store.
    pub async fn load_users(&self) -> Result<Vec<AdUser>, IngestError> {
        let options = self.settings().await?.csv_options;
        parse_users(&options).await
    }

    /// Every synchronized user currently in the store.
    pub async fn users(&self) -> Result<Vec<AdUser>, IngestError> {
        self.store
            .read_all(collections::DIRECTORY_USERS)
            .await?
            .into_iter()
            .map(|doc| {
                serde_json::from_value(doc).map_err(|source| IngestError::Malformed {
                    collection: collections::DIRECTORY_USERS,
                    source,
                })
            })
            .collect()
    }

    // ----- sync pipelines

    /// Replace `directory_users` with the current export.
    pub async fn sync_users(&self) -> Result<SyncReport, IngestError> {
        let _exclusive = self.guard.lock().await;

        let settings = self.settings().await?;
        if !settings.data_processing_status {
            return Err(IngestError::ProcessingDisabled);
        }

        self.set_processing_now(true).await?;
        let outcome = self.refresh_users(&settings.csv_options).await;
        let release = self.set_processing_now(false).await;

        conclude(&self.reporter, "directory users sync", outcome, release).await
    }

    /// Replace the grouped view with a regrouping of the current export.
    pub async fn sync_users_by_division_department(&self) -> Result<SyncReport, IngestError> {
        let _exclusive = self.guard.lock().await;

        let settings = self.settings().await?;
        if !settings.data_processing_status {
            return Err(IngestError::ProcessingDisabled);
        }

        self.set_processing_now(true).await?;
        let outcome = self.refresh_grouped(&settings.csv_options).await;
        let release = self.set_processing_now(false).await;

        conclude(
            &self.reporter,
            "directory users grouping sync",
            outcome,
            release,
        )
        .await
    }

    // ----- internals

    async fn refresh_users(&self, options: &CsvOptions) -> Result<SyncReport, IngestError> {
        let users = parse_users(options).await?;

        let documents = users
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| IngestError::Malformed {
                collection: collections::DIRECTORY_USERS,
                source,
            })?;

        self.store.delete_all(collections::DIRECTORY_USERS).await?;
        self.store
            .insert_many(collections::DIRECTORY_USERS, documents)
            .await?;

        info!(records = users.len(), "directory users replaced");
        Ok(SyncReport {
            records: users.len(),
        })
    }

    async fn refresh_grouped(&self, options: &CsvOptions) -> Result<SyncReport, IngestError> {
        let users = parse_users(options).await?;
        let grouped = group_by_division_department(&users);
        let record_count = grouped.values().map(|depts| depts.len()).sum();

        let document =
            serde_json::to_value(&grouped).map_err(|source| IngestError::Malformed {
                collection: collections::DIRECTORY_USERS_GROUPED,
                source,
            })?;

        self.store
            .delete_all(collections::DIRECTORY_USERS_GROUPED)
            .await?;
        self.store
            .insert_one(collections::DIRECTORY_USERS_GROUPED, document)
            .await?;

        info!(
            divisions = grouped.len(),
            departments = record_count,
            "grouped directory users replaced"
        );
        Ok(SyncReport {
            records: record_count,
        })
    }

    /// Mirror the in-process guard state to the settings document.
    async fn set_processing_now(&self, value: bool) -> Result<(), halyard_store::StoreError> {
        singleton::update(
            self.store.as_ref(),
            collections::DIRECTORY_SETTINGS,
            serde_json::json!({ "data_processing_now": value }),
        )
        .await
    }
}

/// Run the blocking CSV parse off the async runtime.
async fn parse_users(options: &CsvOptions) -> Result<Vec<AdUser>, IngestError> {
    let path = options.users_file.clone();
    tokio::task::spawn_blocking(move || users::parse_users_csv(&path))
        .await
        .map_err(|e| IngestError::Csv(format!("parse task failed: {e}")))?
}
