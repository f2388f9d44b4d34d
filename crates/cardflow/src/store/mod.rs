//! # Persisted State
//!
//! Three small values survive restarts, each stored as JSON under its own key:
//!
//! | Key                  | Value                                        |
//! |----------------------|----------------------------------------------|
//! | `settings`           | [`crate::settings::DisplaySettings`] record  |
//! | `recent-directories` | array of ≤ 10 directory paths, newest first  |
//! | `last-directory`     | the directory to resume on startup           |
//!
//! ## Failure Policy
//!
//! Persistence never takes the engine down:
//! - **Reads**: absent or malformed values degrade to defaults. Malformed data
//!   is logged at `warn` and otherwise ignored.
//! - **Writes**: failures are logged at `warn`. The in-memory state stays
//!   authoritative and the next successful write catches the disk up.
//!
//! ## Implementations
//!
//! - [`fs_backend::FsStateBackend`]: one `<key>.json` file per key, atomic
//!   tmp-and-rename writes.
//! - [`mem_backend::MemStateBackend`]: for testing without filesystem I/O.

use log::warn;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub mod backend;
pub mod fs_backend;
pub mod mem_backend;

pub use backend::StateBackend;

pub const SETTINGS_KEY: &str = "settings";
pub const RECENT_DIRECTORIES_KEY: &str = "recent-directories";
pub const LAST_DIRECTORY_KEY: &str = "last-directory";

/// Loads the raw JSON stored under `key`, if any.
/// I/O errors are logged and treated as absence.
pub fn load_raw<B: StateBackend + ?Sized>(backend: &B, key: &str) -> Option<String> {
    match backend.load(key) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Failed to read persisted '{}': {}", key, e);
            None
        }
    }
}

/// Loads and parses the value under `key`. Malformed data yields `None`.
pub fn load_json<T, B>(backend: &B, key: &str) -> Option<T>
where
    T: DeserializeOwned,
    B: StateBackend + ?Sized,
{
    let raw = load_raw(backend, key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring malformed persisted '{}': {}", key, e);
            None
        }
    }
}

/// Serializes and stores `value`. Returns whether the write landed.
pub fn save_json<T, B>(backend: &B, key: &str, value: &T) -> bool
where
    T: Serialize + ?Sized,
    B: StateBackend + ?Sized,
{
    let result = serde_json::to_string(value)
        .map_err(crate::error::CardError::from)
        .and_then(|json| backend.save(key, &json));
    match result {
        Ok(()) => true,
        Err(e) => {
            warn!("Failed to persist '{}': {}", key, e);
            false
        }
    }
}

pub fn load_last_directory<B: StateBackend + ?Sized>(backend: &B) -> Option<String> {
    load_json::<String, B>(backend, LAST_DIRECTORY_KEY).filter(|dir| !dir.trim().is_empty())
}

pub fn save_last_directory<B: StateBackend + ?Sized>(backend: &B, dir: &str) -> bool {
    save_json(backend, LAST_DIRECTORY_KEY, dir)
}
