//! # Configuration
//!
//! Engine tuning is read once at startup with [`confique`]. This is separate
//! from the user-facing [`DisplaySettings`](crate::settings::DisplaySettings),
//! which are edited at runtime and persisted through the state backend.
//!
//! ## Sources
//!
//! Resolved in priority order:
//! 1. **Environment variables**: `CARDFLOW_STATE_DIR`, `CARDFLOW_SCAN_BATCH_SIZE`, etc.
//! 2. **Config file**: an optional `cardflow.toml`, passed by the host.
//! 3. **Compiled defaults**: via `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `state_dir` | OS config dir | Where settings and history are persisted |
//! | `scan_batch_size` | `200` | Cards per scan batch |
//! | `column_gap` | `16` | Gap between columns, in pixels |
//! | `featured_tag_limit` | `8` | Tags shown before the disclosure |
//! | `min_tag_count` | `2` | Minimum usage for a featured tag |
//! | `recent_limit` | `10` | Length of the recent-directory history |

use crate::error::{CardError, Result};
use confique::Config;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "cardflow.toml";

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Directory holding persisted state. Defaults to the OS config directory.
    #[config(env = "CARDFLOW_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    #[config(env = "CARDFLOW_SCAN_BATCH_SIZE", default = 200)]
    pub scan_batch_size: usize,

    #[config(env = "CARDFLOW_COLUMN_GAP", default = 16)]
    pub column_gap: u32,

    #[config(env = "CARDFLOW_FEATURED_TAG_LIMIT", default = 8)]
    pub featured_tag_limit: usize,

    #[config(env = "CARDFLOW_MIN_TAG_COUNT", default = 2)]
    pub min_tag_count: usize,

    #[config(env = "CARDFLOW_RECENT_LIMIT", default = 10)]
    pub recent_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            state_dir: None,
            scan_batch_size: crate::service::SCAN_BATCH_SIZE,
            column_gap: crate::layout::DEFAULT_GAP,
            featured_tag_limit: crate::tags::FEATURED_TAG_LIMIT,
            min_tag_count: crate::tags::MIN_TAG_COUNT,
            recent_limit: crate::recent::RECENT_LIMIT,
        }
    }
}

impl EngineConfig {
    /// Loads from the environment, then `file` if given and present.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = EngineConfig::builder().env();
        if let Some(path) = file {
            builder = builder.file(path);
        }
        Ok(builder.load()?)
    }

    /// The configured state directory, or the OS default.
    pub fn state_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.state_dir {
            return Ok(dir.clone());
        }
        ProjectDirs::from("", "", "cardflow")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .ok_or_else(|| CardError::Store("Could not determine a state directory".to_string()))
    }

    pub fn with_state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.state_dir = Some(dir.into());
        self
    }
}
