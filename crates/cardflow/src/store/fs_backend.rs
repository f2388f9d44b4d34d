use super::backend::StateBackend;
use crate::error::{CardError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Stores each key as `<root>/<key>.json`.
pub struct FsStateBackend {
    root: PathBuf,
}

impl FsStateBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).map_err(CardError::Io)?;
        }
        Ok(())
    }
}

impl StateBackend for FsStateBackend {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path).map_err(CardError::Io)?;
        Ok(Some(content))
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        self.ensure_dir()?;

        let target = self.key_path(key);

        // Atomic write
        let tmp = self.root.join(format!(".{}-{}.tmp", key, Uuid::new_v4()));
        fs::write(&tmp, value).map_err(CardError::Io)?;
        fs::rename(&tmp, target).map_err(CardError::Io)?;

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.key_path(key);
        if path.exists() {
            fs::remove_file(path).map_err(CardError::Io)?;
        }
        Ok(())
    }
}
