use crate::error::Result;

/// Abstract interface for raw persisted-state I/O.
///
/// This trait handles the "how" of storage (filesystem vs memory), while the
/// settings store and recent-directory history handle the "what" (schema
/// merge, LRU rules, fallbacks).
pub trait StateBackend {
    /// Read the raw value stored under `key`.
    /// Returns Ok(None) if nothing was ever stored.
    /// Returns Err only on actual I/O errors (permissions, disk failure).
    fn load(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`.
    /// MUST be atomic (e.g. write to tmp then rename) to avoid partial writes.
    fn save(&self, key: &str, value: &str) -> Result<()>;

    /// Remove the value stored under `key`. Absent keys are not an error.
    fn remove(&self, key: &str) -> Result<()>;
}
