//! # CLI Layer
//!
//! This module is **one possible UI client** for cardflow, not the application itself.
//!
//! The CLI layer is the **only** place that:
//! - Knows about terminal I/O (stdout, stderr)
//! - Installs a logger
//! - Runs scans on a worker thread
//! - Formats output for human consumption
//!
//! ## Sessions
//!
//! Each invocation is a fresh engine. State that must outlive a command lives
//! in the state directory: settings, recent directories and the last opened
//! directory. Commands that read cards (`list`, `tags`, `show`, `new`, `rm`)
//! rescan the last directory first.
//!
//! ## Structure
//!
//! - `setup`: Argument parsing via clap
//! - `commands`: Engine wiring and per-command handlers
//! - `print`: Output formatting (columns, colors, widths)

mod commands;
mod print;
pub mod setup;

pub use commands::run;
