//! Names of the collections halyard persists.
//!
//! Centralized so the workflow crates and any operational tooling agree on
//! the on-disk layout.

/// Emails awaiting redelivery after a failed send.
pub const EMAIL_QUEUE: &str = "email_queue";

/// Emails that were accepted by the SMTP relay.
pub const EMAIL_ARCHIVE: &str = "email_archive";

/// Singleton email settings document.
pub const EMAIL_SETTINGS: &str = "email_settings";

/// Normalized Active Directory user records.
pub const DIRECTORY_USERS: &str = "directory_users";

/// Directory users regrouped by division and department (single document).
pub const DIRECTORY_USERS_GROUPED: &str = "directory_users_by_division_department";

/// Singleton directory-sync settings document.
pub const DIRECTORY_SETTINGS: &str = "directory_settings";

/// HR position roster records.
pub const POSITIONS: &str = "positions";

/// Singleton positions-sync settings document.
pub const POSITIONS_SETTINGS: &str = "positions_settings";
