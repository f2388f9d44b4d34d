//! Recent-directory history.
//!
//! A bounded most-recently-used list: opening a directory moves it to the
//! front, duplicates never exist, and the oldest entry falls off once the list
//! exceeds the limit. Every mutation is persisted immediately.
//!
//! Persisted lists are sanitized on load (blank entries dropped, duplicates
//! collapsed keeping the first, length capped), so a hand-edited or legacy
//! file cannot break these rules.

use crate::store::{self, StateBackend, RECENT_DIRECTORIES_KEY};
use log::debug;

pub const RECENT_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentDirectories {
    dirs: Vec<String>,
    limit: usize,
}

impl Default for RecentDirectories {
    fn default() -> Self {
        Self::with_limit(RECENT_LIMIT)
    }
}

impl RecentDirectories {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            dirs: Vec::new(),
            limit: limit.max(1),
        }
    }

    pub fn load<B: StateBackend + ?Sized>(backend: &B, limit: usize) -> Self {
        let mut recent = Self::with_limit(limit);
        let stored: Vec<String> =
            store::load_json(backend, RECENT_DIRECTORIES_KEY).unwrap_or_default();
        for dir in stored {
            if dir.trim().is_empty() || recent.dirs.contains(&dir) {
                continue;
            }
            recent.dirs.push(dir);
        }
        recent.dirs.truncate(recent.limit);
        recent
    }

    /// Moves `dir` to the front, evicting the oldest entry on overflow.
    pub fn open<B: StateBackend + ?Sized>(&mut self, backend: &B, dir: &str) {
        self.touch(dir);
        self.persist(backend);
    }

    pub fn clear<B: StateBackend + ?Sized>(&mut self, backend: &B) {
        self.dirs.clear();
        self.persist(backend);
    }

    fn touch(&mut self, dir: &str) {
        self.dirs.retain(|d| d != dir);
        self.dirs.insert(0, dir.to_string());
        if self.dirs.len() > self.limit {
            let evicted = self.dirs.split_off(self.limit);
            debug!("Evicted from recent directories: {:?}", evicted);
        }
    }

    fn persist<B: StateBackend + ?Sized>(&self, backend: &B) {
        store::save_json(backend, RECENT_DIRECTORIES_KEY, &self.dirs);
    }

    pub fn entries(&self) -> &[String] {
        &self.dirs
    }

    pub fn latest(&self) -> Option<&str> {
        self.dirs.first().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }
}
