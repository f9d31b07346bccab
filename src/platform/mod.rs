//! Platform abstraction layer
//!
//! Handles browser/native differences for key-value storage
//! (LocalStorage/SessionStorage on web, in-memory elsewhere).

pub mod storage;

pub use storage::{KeyValueStore, MemoryStorage, StorageError};

#[cfg(target_arch = "wasm32")]
pub use storage::{BrowserStorage, StorageScope};
