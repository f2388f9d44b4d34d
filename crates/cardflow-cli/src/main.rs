//! # Cardflow CLI
//!
//! A terminal client for the cardflow engine. The binary is intentionally thin:
//! the CLI lives in `src/cli/`, while this file only invokes `cli::run()` and
//! handles process termination.
//!
//! ## Layering
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (crates/cardflow-cli/src/cli/)                   │
//! │  - clap argument parsing (setup.rs)                         │
//! │  - Engine wiring + dispatch (commands.rs)                   │
//! │  - Terminal rendering (print.rs)                            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Engine (crates/cardflow/src/engine.rs)                     │
//! │  - Index, query, layout, selection, settings, history       │
//! │  - Returns structured values, never prints                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The terminal has no viewport, so `list --width` stands in for the window
//! width when dealing cards into columns.
//!
//! ## Testing Approach
//!
//! - **Engine**: unit and integration tests in `crates/cardflow`.
//! - **CLI parsing**: `try_parse_from` tests in `setup.rs`.
//! - **Rendering**: string-returning `format_*` functions tested in `print.rs`.
//! - **End to end**: `tests/cli_e2e.rs` drives the binary with `assert_cmd`.

mod cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
