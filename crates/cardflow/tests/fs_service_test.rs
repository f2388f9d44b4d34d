use cardflow::scan::{Generation, ScanEvent, ScanRequest};
use cardflow::service::fs::FsCardService;
use cardflow::service::CardService;
use cardflow::CardError;
use std::fs;
use std::path::Path;
use std::sync::mpsc;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn notebook() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(
        root,
        "a.md",
        "---\ntitle: \"Trip\"\ntags: [travel]\ncreated: 2024-03-01T09:00:00Z\n---\nKyoto #japan",
    );
    write(root, "notes.txt", "not a card");
    write(root, ".hidden.md", "hidden");
    write(root, ".git/x.md", "ignored");
    write(root, "sub/b.md", "plain body");
    write(root, "sub/deep/c.md", "deeper");
    dir
}

fn request(dir: &Path, depth: u32) -> ScanRequest {
    ScanRequest {
        dir: dir.to_string_lossy().to_string(),
        depth,
        generation: Generation(7),
    }
}

fn scan(service: &FsCardService, request: &ScanRequest) -> Vec<ScanEvent> {
    let mut events = Vec::new();
    service.scan(request, &mut |e| events.push(e));
    events
}

fn titles(events: &[ScanEvent]) -> Vec<String> {
    let mut titles: Vec<String> = events
        .iter()
        .flat_map(|e| match e {
            ScanEvent::Batch { cards, .. } => cards.iter().map(|c| c.title.clone()).collect(),
            _ => Vec::new(),
        })
        .collect();
    titles.sort();
    titles
}

#[test]
fn test_depth_zero_stays_in_root() {
    let dir = notebook();
    let events = scan(&FsCardService::new(), &request(dir.path(), 0));
    assert_eq!(titles(&events), vec!["Trip"]);
}

#[test]
fn test_depth_one_includes_children() {
    let dir = notebook();
    let events = scan(&FsCardService::new(), &request(dir.path(), 1));
    assert_eq!(titles(&events), vec!["Trip", "b"]);
}

#[test]
fn test_unlimited_depth_skips_hidden_and_foreign_files() {
    let dir = notebook();
    let events = scan(&FsCardService::new(), &request(dir.path(), 5));
    assert_eq!(titles(&events), vec!["Trip", "b", "c"]);
    assert!(matches!(
        events.last(),
        Some(ScanEvent::Complete {
            total: 3,
            generation: Generation(7),
            ..
        })
    ));
}

#[cfg(unix)]
#[test]
fn test_symlinked_directories_are_not_followed() {
    let dir = notebook();
    std::os::unix::fs::symlink(dir.path(), dir.path().join("sub/loop")).unwrap();
    let events = scan(&FsCardService::new(), &request(dir.path(), 5));
    assert_eq!(titles(&events), vec!["Trip", "b", "c"]);
}

#[test]
fn test_front_matter_is_parsed() {
    let dir = notebook();
    let events = scan(&FsCardService::new(), &request(dir.path(), 0));
    let ScanEvent::Batch { cards, .. } = &events[0] else {
        panic!("expected a batch, got {:?}", events[0]);
    };
    let card = &cards[0];
    assert_eq!(card.tags, vec!["japan", "travel"]);
    assert_eq!(card.created.as_deref(), Some("2024-03-01T09:00:00Z"));
    assert_eq!(card.preview, "Kyoto #japan");
    assert!(card.updated.is_some());
    assert!(card.size > 0);
}

#[test]
fn test_batches_respect_batch_size() {
    let dir = notebook();
    let service = FsCardService::new().with_batch_size(2);
    let events = scan(&service, &request(dir.path(), 5));
    let sizes: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            ScanEvent::Batch { cards, .. } => Some(cards.len()),
            _ => None,
        })
        .collect();
    assert_eq!(sizes, vec![2, 1]);
    assert!(events.iter().all(|e| e.generation() == Generation(7)));
}

#[test]
fn test_missing_root_fails() {
    let dir = TempDir::new().unwrap();
    let events = scan(&FsCardService::new(), &request(&dir.path().join("gone"), 5));
    assert!(matches!(events.as_slice(), [ScanEvent::Failed { .. }]));
}

#[test]
fn test_spawn_scan_sends_over_channel() {
    let dir = notebook();
    let (tx, rx) = mpsc::channel();
    let handle = FsCardService::new().spawn_scan(request(dir.path(), 5), tx);
    handle.join().unwrap();

    let events: Vec<ScanEvent> = rx.iter().collect();
    assert_eq!(titles(&events), vec!["Trip", "b", "c"]);
    assert!(matches!(events.last(), Some(ScanEvent::Complete { .. })));
}

#[test]
fn test_document_lifecycle() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().to_string_lossy().to_string();
    let service = FsCardService::new();

    let card = service.create_document(&root, "todo").unwrap();
    assert!(card.path.ends_with("todo.md"));
    assert_eq!(card.title, "todo");
    assert!(dir.path().join("todo.md").exists());

    let err = service.create_document(&root, "todo.md").unwrap_err();
    assert!(matches!(err, CardError::AlreadyExists(_)));

    let updated = service.write_content(&card.path, "buy milk #errand").unwrap();
    assert_eq!(updated.title, "todo");
    assert_eq!(updated.tags, vec!["errand"]);
    assert_eq!(service.read_content(&card.path).unwrap(), "buy milk #errand");
    let on_disk = fs::read_to_string(dir.path().join("todo.md")).unwrap();
    assert!(on_disk.starts_with("---\ntitle: \"todo\""));

    service.delete_document(&card.path).unwrap();
    assert!(service.delete_document(&card.path).unwrap_err().is_not_found());
    assert!(service.read_content(&card.path).unwrap_err().is_not_found());
}

#[test]
fn test_invalid_file_name_is_rejected() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().to_string_lossy().to_string();
    assert!(FsCardService::new().create_document(&root, "a/b").is_err());
}
