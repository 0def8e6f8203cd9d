//! Backend implementations for the document store
//!
//! - `memory`: in-memory storage for tests and transient deployments
//! - `file`: one JSON file per document, for durable deployments
//! - `test`: wrapper with failure injection and assertion helpers

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use test::TestStore;
