use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use halyard_store::RecordId;

/// Location of the Active Directory users export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvOptions {
    pub users_file: PathBuf,
}

/// Location of the HR positions workbook and the worksheet inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcelOptions {
    pub workbook_file: PathBuf,
    pub positions_worksheet: String,
}

/// Singleton settings document for the directory-sync domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectorySettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,

    /// Gate: may this domain be processed at all.
    #[serde(default)]
    pub data_processing_status: bool,

    /// Advisory mirror of the in-process guard, kept for observability.
    #[serde(default)]
    pub data_processing_now: bool,

    pub csv_options: CsvOptions,

    /// Origins allowed to call the directory API.
    #[serde(default)]
    pub whitelisted_domains: Vec<String>,
}

/// Singleton settings document for the positions-sync domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionsSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,

    #[serde(default)]
    pub data_processing_status: bool,

    #[serde(default)]
    pub data_processing_now: bool,

    pub excel_options: ExcelOptions,

    #[serde(default)]
    pub whitelisted_domains: Vec<String>,
}
