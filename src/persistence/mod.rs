//! Durable key-value persistence
//!
//! Features:
//! - `KeyValueStore` seam (in-memory and one-file-per-key implementations)
//! - Versionless JSON record shapes shared with the web client
//! - Atomic file replacement (tmp → rename)
//!
//! Failures here are never fatal for the reward core: callers log and keep
//! the in-memory state authoritative.

pub mod records;
pub mod store;

pub use records::{HIGHSCORES_KEY, SETTINGS_KEY, USER_KEY, UserRecord};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError, load_json, save_json};
