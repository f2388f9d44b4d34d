//! # Scan Synchronization
//!
//! Directory scans run outside the engine (a worker thread, an async task, a
//! native service) and report back as a stream of [`ScanEvent`]s. The engine
//! itself is single-threaded; the only hazard is ordering: a slow scan of the
//! previous directory can deliver batches after the user has moved on.
//!
//! ## Generations
//!
//! Every scan request carries a [`Generation`], a counter bumped each time a
//! scan starts. Events are applied only when their generation is the one the
//! tracker is currently waiting for. Anything else is stale and dropped
//! silently. This makes the outcome last-requested-wins rather than
//! last-arriving-wins.
//!
//! ## States
//!
//! ```text
//!            open / reload / depth change
//!   Idle ─────────────────────────────────▶ Scanning(dir, gen)
//!   Ready(dir) ───────────────────────────▶ Scanning(dir', gen+1)
//!   Scanning(dir, gen) ── Complete(gen) ──▶ Ready(dir)
//!   Scanning(dir, gen) ── Failed(gen) ────▶ Ready(dir)   (index left empty)
//! ```
//!
//! There is no terminal state and no cancellation. A scan that never reports
//! back leaves the tracker in `Scanning` until the next request supersedes it.

use crate::model::CardMeta;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Generation(pub u64);

impl Generation {
    fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What the host must scan, and the tag to attach to every event it reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub dir: String,
    pub depth: u32,
    pub generation: Generation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    Batch {
        generation: Generation,
        cards: Vec<CardMeta>,
    },
    Complete {
        generation: Generation,
        total: usize,
        duration_ms: u64,
    },
    Failed {
        generation: Generation,
        error: String,
    },
}

impl ScanEvent {
    pub fn generation(&self) -> Generation {
        match self {
            ScanEvent::Batch { generation, .. }
            | ScanEvent::Complete { generation, .. }
            | ScanEvent::Failed { generation, .. } => *generation,
        }
    }
}

/// How the engine dealt with one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Absorbed(usize),
    Completed { total: usize },
    Failed(String),
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ScanState {
    #[default]
    Idle,
    Scanning {
        dir: String,
        generation: Generation,
    },
    Ready {
        dir: String,
    },
}

#[derive(Debug, Clone, Default)]
pub struct ScanTracker {
    state: ScanState,
    last: Generation,
}

impl ScanTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enters `Scanning` for `dir` under a fresh generation.
    pub fn begin(&mut self, dir: &str, depth: u32) -> ScanRequest {
        self.last = self.last.next();
        self.state = ScanState::Scanning {
            dir: dir.to_string(),
            generation: self.last,
        };
        ScanRequest {
            dir: dir.to_string(),
            depth,
            generation: self.last,
        }
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        matches!(&self.state, ScanState::Scanning { generation: g, .. } if *g == generation)
    }

    /// Moves `Scanning(gen)` to `Ready`. Returns false for any other generation.
    pub fn finish(&mut self, generation: Generation) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        if let ScanState::Scanning { dir, .. } = std::mem::take(&mut self.state) {
            self.state = ScanState::Ready { dir };
        }
        true
    }

    pub fn state(&self) -> &ScanState {
        &self.state
    }

    pub fn is_scanning(&self) -> bool {
        matches!(self.state, ScanState::Scanning { .. })
    }

    pub fn current_dir(&self) -> Option<&str> {
        match &self.state {
            ScanState::Idle => None,
            ScanState::Scanning { dir, .. } | ScanState::Ready { dir } => Some(dir),
        }
    }

    pub fn last_generation(&self) -> Generation {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generations_increase_monotonically() {
        let mut tracker = ScanTracker::new();
        let a = tracker.begin("/a", 5).generation;
        let b = tracker.begin("/b", 5).generation;
        let c = tracker.begin("/b", 5).generation;
        assert!(a < b && b < c);
    }

    #[test]
    fn test_only_latest_generation_is_current() {
        let mut tracker = ScanTracker::new();
        let old = tracker.begin("/a", 5).generation;
        let new = tracker.begin("/b", 5).generation;
        assert!(!tracker.is_current(old));
        assert!(tracker.is_current(new));
        assert_eq!(tracker.current_dir(), Some("/b"));
    }

    #[test]
    fn test_finish_moves_to_ready() {
        let mut tracker = ScanTracker::new();
        let generation = tracker.begin("/a", 2).generation;
        assert!(tracker.is_scanning());
        assert!(tracker.finish(generation));
        assert_eq!(
            tracker.state(),
            &ScanState::Ready {
                dir: "/a".to_string()
            }
        );
        assert!(!tracker.is_current(generation));
    }

    #[test]
    fn test_stale_finish_is_ignored() {
        let mut tracker = ScanTracker::new();
        let old = tracker.begin("/a", 5).generation;
        tracker.begin("/b", 5);
        assert!(!tracker.finish(old));
        assert!(tracker.is_scanning());
    }

    #[test]
    fn test_idle_has_no_directory() {
        let tracker = ScanTracker::new();
        assert_eq!(tracker.current_dir(), None);
        assert!(!tracker.is_scanning());
    }

    #[test]
    fn test_request_carries_depth() {
        let mut tracker = ScanTracker::new();
        let request = tracker.begin("/a", 0);
        assert_eq!(request.depth, 0);
        assert_eq!(request.dir, "/a");
    }
}
