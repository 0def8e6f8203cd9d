//! Document store backends for the halyard integration service
//!
//! Every persisted piece of halyard state (email queue, email archive,
//! settings singletons, synchronized directory data) lives in a named
//! collection of JSON documents behind the [`DocumentStore`] trait. The
//! workflow crates only ever talk to that trait, which is what lets the
//! tests run against [`MemoryStore`] while deployments use [`FileStore`].

pub mod backends;
pub mod collections;
pub mod document;
pub mod error;
pub mod singleton;
pub mod r#trait;
pub mod types;

pub use backends::{FileStore, MemoryStore, TestStore};
pub use document::merge_fields;
pub use error::{Result, StoreError};
pub use r#trait::DocumentStore;
pub use types::RecordId;
