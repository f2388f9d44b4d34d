//! In-memory card service for tests and embedding.
//!
//! Documents are stored as `path -> content`. A directory exists once it has
//! been registered with [`MemCardService::with_directory`] or holds a document.
//! Scans are synchronous and honor depth and hidden-entry rules the same way
//! the filesystem service does.

use super::frontmatter::{self, FileFacts};
use super::{card_file_name, CardService, CARD_EXTENSION, SCAN_BATCH_SIZE};
use crate::error::{CardError, Result};
use crate::model::CardMeta;
use crate::scan::{ScanEvent, ScanRequest};
use crate::settings::SCAN_DEPTH_UNLIMITED;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

#[derive(Debug)]
pub struct MemCardService {
    documents: RefCell<BTreeMap<String, String>>,
    directories: RefCell<BTreeSet<String>>,
    batch_size: usize,
    scans: Cell<usize>,
    simulate_write_error: Cell<bool>,
}

impl Default for MemCardService {
    fn default() -> Self {
        Self::new()
    }
}

fn parent_dir(path: &str) -> Option<&str> {
    path.rfind('/').map(|i| &path[..i.max(1)])
}

impl MemCardService {
    pub fn new() -> Self {
        Self {
            documents: RefCell::new(BTreeMap::new()),
            directories: RefCell::new(BTreeSet::new()),
            batch_size: SCAN_BATCH_SIZE,
            scans: Cell::new(0),
            simulate_write_error: Cell::new(false),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_directory(self, dir: &str) -> Self {
        self.directories.borrow_mut().insert(dir.to_string());
        self
    }

    pub fn with_document(self, path: &str, content: &str) -> Self {
        self.insert(path, content);
        self
    }

    pub fn insert(&self, path: &str, content: &str) {
        if let Some(dir) = parent_dir(path) {
            self.directories.borrow_mut().insert(dir.to_string());
        }
        self.documents
            .borrow_mut()
            .insert(path.to_string(), content.to_string());
    }

    pub fn raw(&self, path: &str) -> Option<String> {
        self.documents.borrow().get(path).cloned()
    }

    pub fn document_count(&self) -> usize {
        self.documents.borrow().len()
    }

    /// Number of scans served so far.
    pub fn scan_count(&self) -> usize {
        self.scans.get()
    }

    pub fn set_simulate_write_error(&self, fail: bool) {
        self.simulate_write_error.set(fail);
    }

    fn derive(&self, path: &str, content: &str) -> CardMeta {
        let facts = FileFacts {
            size: content.len() as u64,
            ..Default::default()
        };
        frontmatter::derive_card(Path::new(path), content, &facts)
    }

    fn check_writable(&self) -> Result<()> {
        if self.simulate_write_error.get() {
            return Err(CardError::Service("Simulated write error".to_string()));
        }
        Ok(())
    }

    fn within_scan(relative: &str, depth: u32) -> bool {
        let parts: Vec<&str> = relative.split('/').collect();
        if parts.iter().any(|p| p.starts_with('.')) {
            return false;
        }
        let nesting = (parts.len() - 1) as u32;
        depth >= SCAN_DEPTH_UNLIMITED || nesting <= depth
    }
}

impl CardService for MemCardService {
    fn scan(&self, request: &ScanRequest, emit: &mut dyn FnMut(ScanEvent)) {
        self.scans.set(self.scans.get() + 1);
        let dir = request.dir.trim_end_matches('/');
        if !self.directories.borrow().contains(dir) {
            emit(ScanEvent::Failed {
                generation: request.generation,
                error: CardError::NotFound(request.dir.clone()).to_string(),
            });
            return;
        }

        let prefix = format!("{}/", dir);
        let suffix = format!(".{}", CARD_EXTENSION);
        let cards: Vec<CardMeta> = self
            .documents
            .borrow()
            .iter()
            .filter_map(|(path, content)| {
                let relative = path.strip_prefix(&prefix)?;
                (relative.ends_with(&suffix) && Self::within_scan(relative, request.depth))
                    .then(|| self.derive(path, content))
            })
            .collect();

        let total = cards.len();
        for chunk in cards.chunks(self.batch_size) {
            emit(ScanEvent::Batch {
                generation: request.generation,
                cards: chunk.to_vec(),
            });
        }
        emit(ScanEvent::Complete {
            generation: request.generation,
            total,
            duration_ms: 0,
        });
    }

    fn read_content(&self, path: &str) -> Result<String> {
        self.documents
            .borrow()
            .get(path)
            .map(|content| frontmatter::body(content).to_string())
            .ok_or_else(|| CardError::NotFound(path.to_string()))
    }

    fn write_content(&self, path: &str, content: &str) -> Result<CardMeta> {
        self.check_writable()?;
        let original = self
            .raw(path)
            .ok_or_else(|| CardError::NotFound(path.to_string()))?;
        let updated = frontmatter::with_front_matter(&original, content);
        self.insert(path, &updated);
        Ok(self.derive(path, &updated))
    }

    fn create_document(&self, dir: &str, filename: &str) -> Result<CardMeta> {
        self.check_writable()?;
        let name = card_file_name(filename)
            .ok_or_else(|| CardError::Service(format!("Invalid file name: {:?}", filename)))?;
        let path = format!("{}/{}", dir.trim_end_matches('/'), name);
        if self.documents.borrow().contains_key(&path) {
            return Err(CardError::AlreadyExists(path));
        }
        let title = name.trim_end_matches(&format!(".{}", CARD_EXTENSION));
        let content = frontmatter::template(title);
        self.insert(&path, &content);
        Ok(self.derive(&path, &content))
    }

    fn delete_document(&self, path: &str) -> Result<()> {
        self.check_writable()?;
        self.documents
            .borrow_mut()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| CardError::NotFound(path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::Generation;

    fn request(dir: &str, depth: u32) -> ScanRequest {
        ScanRequest {
            dir: dir.to_string(),
            depth,
            generation: Generation(1),
        }
    }

    fn collect(service: &MemCardService, request: &ScanRequest) -> Vec<ScanEvent> {
        let mut events = Vec::new();
        service.scan(request, &mut |e| events.push(e));
        events
    }

    fn scanned_paths(events: &[ScanEvent]) -> Vec<String> {
        events
            .iter()
            .flat_map(|e| match e {
                ScanEvent::Batch { cards, .. } => cards.iter().map(|c| c.path.clone()).collect(),
                _ => Vec::new(),
            })
            .collect()
    }

    fn sample() -> MemCardService {
        MemCardService::new()
            .with_document("/notes/a.md", "alpha")
            .with_document("/notes/readme.txt", "not a card")
            .with_document("/notes/.hidden.md", "hidden")
            .with_document("/notes/sub/b.md", "beta")
            .with_document("/notes/sub/deep/c.md", "gamma")
            .with_document("/notes/.git/d.md", "ignored")
    }

    #[test]
    fn test_depth_limits_nesting() {
        let service = sample();
        assert_eq!(
            scanned_paths(&collect(&service, &request("/notes", 0))),
            vec!["/notes/a.md"]
        );
        assert_eq!(
            scanned_paths(&collect(&service, &request("/notes", 1))).len(),
            2
        );
        assert_eq!(
            scanned_paths(&collect(&service, &request("/notes", SCAN_DEPTH_UNLIMITED))).len(),
            3
        );
    }

    #[test]
    fn test_batches_then_complete() {
        let service = sample().with_batch_size(2);
        let events = collect(&service, &request("/notes", SCAN_DEPTH_UNLIMITED));
        assert_eq!(events.len(), 3);
        assert!(matches!(
            events.last(),
            Some(ScanEvent::Complete { total: 3, .. })
        ));
        assert_eq!(service.scan_count(), 1);
    }

    #[test]
    fn test_unknown_directory_fails() {
        let events = collect(&MemCardService::new(), &request("/missing", 5));
        assert!(matches!(events.as_slice(), [ScanEvent::Failed { .. }]));
    }

    #[test]
    fn test_empty_registered_directory_completes() {
        let service = MemCardService::new().with_directory("/empty");
        let events = collect(&service, &request("/empty", 5));
        assert!(matches!(
            events.as_slice(),
            [ScanEvent::Complete { total: 0, .. }]
        ));
    }

    #[test]
    fn test_create_collides() {
        let service = MemCardService::new().with_directory("/n");
        let card = service.create_document("/n", "idea").unwrap();
        assert_eq!(card.path, "/n/idea.md");
        assert_eq!(card.title, "idea");
        assert!(matches!(
            service.create_document("/n", "idea.md"),
            Err(CardError::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_write_keeps_front_matter() {
        let service = MemCardService::new().with_document("/n/a.md", "---\ntitle: Keep\n---\nold");
        let card = service.write_content("/n/a.md", "new #tag").unwrap();
        assert_eq!(card.title, "Keep");
        assert_eq!(card.tags, vec!["tag"]);
        assert_eq!(service.read_content("/n/a.md").unwrap(), "new #tag");
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let service = MemCardService::new();
        assert!(service.delete_document("/n/a.md").unwrap_err().is_not_found());
    }

    #[test]
    fn test_simulated_write_error() {
        let service = MemCardService::new().with_document("/n/a.md", "x");
        service.set_simulate_write_error(true);
        assert!(service.write_content("/n/a.md", "y").is_err());
        assert_eq!(service.raw("/n/a.md").as_deref(), Some("x"));
    }
}
