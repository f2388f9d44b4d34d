//! # Cardflow Architecture
//!
//! Cardflow is the **state engine of a card viewer** over a directory of
//! markdown documents. It is a library that happens to have a CLI client, not
//! the other way around: the same engine could sit behind a desktop shell, a
//! web view or a test harness.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Client (cardflow-cli, or any UI)                           │
//! │  - Runs scans, renders views, handles terminal/window I/O   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Engine (engine.rs)                                         │
//! │  - Owns index, query, selection, settings, history          │
//! │  - Memoized derived views, change notification              │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Pure state (index, query, tags, layout, scan, selection)   │
//! │  - No I/O whatsoever                                        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Collaborators (service/, store/)                           │
//! │  - CardService: scan, read, write, create, delete documents │
//! │  - StateBackend: persisted settings and history             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Data Flow
//!
//! Opening a directory clears the index and yields a [`scan::ScanRequest`].
//! The host runs the scan and feeds [`scan::ScanEvent`]s back; batches tagged
//! with an outdated generation are dropped. Each absorbed batch bumps the
//! index revision, which invalidates the visible list, which invalidates the
//! column layout.
//!
//! ## Key Principle: No I/O Assumptions in the Engine
//!
//! The engine never writes to stdout/stderr, never spawns threads and never
//! touches the filesystem directly. Logging goes through the [`log`] facade;
//! the host decides where it ends up.
//!
//! ## Module Overview
//!
//! - [`engine`]: The facade, entry point for all operations
//! - [`index`]: Path-keyed card map with a revision counter
//! - [`query`]: Search, tag filter and sort pipeline
//! - [`tags`]: Tag counts, featured and extra tiers
//! - [`layout`]: Column count and round-robin distribution
//! - [`scan`]: Generation-tagged scan protocol
//! - [`selection`]: Selected card, edit draft, word count
//! - [`settings`]: Display settings with forward-compatible loading
//! - [`recent`]: Recent-directory history
//! - [`store`]: Persisted state backends
//! - [`service`]: Document access (filesystem and in-memory)
//! - [`config`]: Engine configuration
//! - [`error`]: Error types

pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod layout;
pub mod memo;
pub mod model;
pub mod query;
pub mod recent;
pub mod scan;
pub mod selection;
pub mod service;
pub mod settings;
pub mod store;
pub mod tags;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

pub use engine::{CardEngine, Change};
pub use error::{CardError, Result};
pub use model::CardMeta;
