use super::frontmatter::{self, FileFacts};
use super::{card_file_name, CardService, CARD_EXTENSION, SCAN_BATCH_SIZE};
use crate::error::{CardError, Result};
use crate::model::CardMeta;
use crate::scan::{Generation, ScanEvent, ScanRequest};
use crate::settings::SCAN_DEPTH_UNLIMITED;
use log::{debug, info, warn};
use std::fs;
use std::io;
use std::path::Path;
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use uuid::Uuid;

fn io_error(path: &Path, e: io::Error) -> CardError {
    if e.kind() == io::ErrorKind::NotFound {
        CardError::NotFound(path.to_string_lossy().to_string())
    } else {
        CardError::Io(e)
    }
}

/// Reads a document from disk and derives its metadata.
pub fn parse_card(path: &Path) -> Result<CardMeta> {
    let meta = fs::metadata(path).map_err(|e| io_error(path, e))?;
    let content = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    let facts = FileFacts {
        size: meta.len(),
        created: meta.created().ok().map(frontmatter::iso_timestamp),
        modified: meta.modified().ok().map(frontmatter::iso_timestamp),
    };
    Ok(frontmatter::derive_card(path, &content, &facts))
}

fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let tmp = dir.join(format!(".card-{}.tmp", Uuid::new_v4()));
    fs::write(&tmp, content).map_err(CardError::Io)?;
    fs::rename(&tmp, path).map_err(CardError::Io)?;
    Ok(())
}

#[derive(Debug, Default)]
struct ScanStats {
    total: usize,
    files_checked: usize,
    skipped: usize,
    parse_failures: usize,
}

struct Walk<'a> {
    generation: Generation,
    max_depth: Option<u32>,
    batch_size: usize,
    batch: Vec<CardMeta>,
    stats: ScanStats,
    emit: &'a mut dyn FnMut(ScanEvent),
}

impl Walk<'_> {
    fn visit(&mut self, dir: &Path, depth: u32) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Skipping unreadable directory {:?}: {}", dir, e);
                return;
            }
        };
        for entry in entries.flatten() {
            let name = entry.file_name();
            if name.to_string_lossy().starts_with('.') {
                continue;
            }
            let path = entry.path();
            let linked = entry.file_type().map_or(false, |t| t.is_symlink());
            if linked && path.is_dir() {
                debug!("Skipping symlinked directory {:?}", path);
                continue;
            }
            if path.is_dir() {
                if self.max_depth.map_or(true, |max| depth < max) {
                    self.visit(&path, depth + 1);
                }
                continue;
            }
            self.stats.files_checked += 1;
            if path.extension().and_then(|e| e.to_str()) != Some(CARD_EXTENSION) {
                self.stats.skipped += 1;
                continue;
            }
            match parse_card(&path) {
                Ok(card) => {
                    self.batch.push(card);
                    self.stats.total += 1;
                }
                Err(e) => {
                    self.stats.parse_failures += 1;
                    debug!("Failed to parse {:?}: {}", path, e);
                }
            }
            if self.batch.len() >= self.batch_size {
                self.flush();
            }
        }
    }

    fn flush(&mut self) {
        if self.batch.is_empty() {
            return;
        }
        let cards = std::mem::take(&mut self.batch);
        (self.emit)(ScanEvent::Batch {
            generation: self.generation,
            cards,
        });
    }
}

/// Card service backed by the real filesystem. Only `.md` files become cards;
/// hidden files and directories are skipped.
#[derive(Debug, Clone)]
pub struct FsCardService {
    batch_size: usize,
}

impl Default for FsCardService {
    fn default() -> Self {
        Self::new()
    }
}

impl FsCardService {
    pub fn new() -> Self {
        Self {
            batch_size: SCAN_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Runs the scan on a worker thread, sending events to `sender`.
    /// A dropped receiver just discards the remaining events.
    pub fn spawn_scan(&self, request: ScanRequest, sender: Sender<ScanEvent>) -> JoinHandle<()> {
        let service = self.clone();
        thread::spawn(move || {
            service.scan(&request, &mut |event| {
                let _ = sender.send(event);
            });
        })
    }
}

impl CardService for FsCardService {
    fn scan(&self, request: &ScanRequest, emit: &mut dyn FnMut(ScanEvent)) {
        let root = Path::new(&request.dir);
        info!(
            "Starting scan of {} with depth {} ({})",
            request.dir, request.depth, request.generation
        );
        let started = Instant::now();

        if let Err(e) = fs::read_dir(root) {
            emit(ScanEvent::Failed {
                generation: request.generation,
                error: io_error(root, e).to_string(),
            });
            return;
        }

        let max_depth = (request.depth < SCAN_DEPTH_UNLIMITED).then_some(request.depth);
        let mut walk = Walk {
            generation: request.generation,
            max_depth,
            batch_size: self.batch_size,
            batch: Vec::with_capacity(self.batch_size),
            stats: ScanStats::default(),
            emit,
        };
        walk.visit(root, 0);
        walk.flush();

        let duration_ms = started.elapsed().as_millis() as u64;
        debug!(
            "Files checked: {}, skipped: {}, parse failures: {}",
            walk.stats.files_checked, walk.stats.skipped, walk.stats.parse_failures
        );
        info!(
            "Scan complete. Total cards: {}, duration: {}ms",
            walk.stats.total, duration_ms
        );
        (walk.emit)(ScanEvent::Complete {
            generation: request.generation,
            total: walk.stats.total,
            duration_ms,
        });
    }

    fn read_content(&self, path: &str) -> Result<String> {
        let path = Path::new(path);
        let content = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
        Ok(frontmatter::body(&content).to_string())
    }

    fn write_content(&self, path: &str, content: &str) -> Result<CardMeta> {
        let path = Path::new(path);
        let original = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
        write_atomic(path, &frontmatter::with_front_matter(&original, content))?;
        parse_card(path)
    }

    fn create_document(&self, dir: &str, filename: &str) -> Result<CardMeta> {
        let name = card_file_name(filename)
            .ok_or_else(|| CardError::Service(format!("Invalid file name: {:?}", filename)))?;
        let path = Path::new(dir).join(&name);
        if path.exists() {
            return Err(CardError::AlreadyExists(path.to_string_lossy().to_string()));
        }
        let title = name.trim_end_matches(&format!(".{}", CARD_EXTENSION));
        fs::write(&path, frontmatter::template(title)).map_err(CardError::Io)?;
        parse_card(&path)
    }

    fn delete_document(&self, path: &str) -> Result<()> {
        let path = Path::new(path);
        fs::remove_file(path).map_err(|e| io_error(path, e))
    }
}
