//! GoBarber Storage Layer
//!
//! Key-value persistence that survives process restarts.
//! The session layer is the only writer of its reserved keys.

mod database;
mod error;
mod memory;
mod migrations;
mod store;

pub use database::Database;
pub use error::StorageError;
pub use memory::MemoryStore;
pub use store::PersistentStore;

pub type Result<T> = std::result::Result<T, StorageError>;
