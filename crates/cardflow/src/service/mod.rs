//! # Card Service
//!
//! The engine never touches documents directly. Everything that reads or
//! writes the filesystem goes through [`CardService`], which the host provides.
//!
//! ## Contract
//!
//! - `scan`: reports the cards under a directory as zero or more
//!   [`ScanEvent::Batch`]es followed by exactly one terminal event
//!   ([`ScanEvent::Complete`] or [`ScanEvent::Failed`]), all tagged with the
//!   request's generation. Depth `0` is the directory itself; depth
//!   [`crate::settings::SCAN_DEPTH_UNLIMITED`] recurses without limit.
//! - `read_content`: the body of a document, front matter removed.
//!   [`CardError::NotFound`] if the document vanished.
//! - `write_content`: replaces the body, keeps the front matter, and returns the
//!   re-derived metadata.
//! - `create_document`: creates `<dir>/<filename>.md` from a template.
//!   [`CardError::AlreadyExists`] on collision; there is no automatic rename.
//! - `delete_document`: [`CardError::NotFound`] if already gone. Callers treat
//!   that as success.
//!
//! ## Implementations
//!
//! - [`fs::FsCardService`]: real filesystem, with a threaded scan helper.
//! - [`memory::MemCardService`]: in-memory documents for tests.
//!
//! [`CardError::NotFound`]: crate::error::CardError::NotFound
//! [`CardError::AlreadyExists`]: crate::error::CardError::AlreadyExists

use crate::error::Result;
use crate::model::CardMeta;
use crate::scan::{ScanEvent, ScanRequest};

pub mod frontmatter;
pub mod fs;
pub mod memory;

pub const SCAN_BATCH_SIZE: usize = 200;
pub const CARD_EXTENSION: &str = "md";

pub trait CardService {
    /// Scan `request.dir`, reporting through `emit`. Never returns an error:
    /// failures are reported as [`ScanEvent::Failed`].
    fn scan(&self, request: &ScanRequest, emit: &mut dyn FnMut(ScanEvent));

    fn read_content(&self, path: &str) -> Result<String>;

    fn write_content(&self, path: &str, content: &str) -> Result<CardMeta>;

    fn create_document(&self, dir: &str, filename: &str) -> Result<CardMeta>;

    fn delete_document(&self, path: &str) -> Result<()>;
}

/// Normalizes a user-typed file name to `<name>.md`.
pub fn card_file_name(filename: &str) -> Option<String> {
    let name = filename.trim();
    if name.is_empty() || name.contains('/') || name.contains('\\') || name.starts_with('.') {
        return None;
    }
    let suffix = format!(".{}", CARD_EXTENSION);
    if name.ends_with(&suffix) {
        Some(name.to_string())
    } else {
        Some(format!("{}{}", name, suffix))
    }
}
