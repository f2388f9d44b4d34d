use crate::config::EngineConfig;
use crate::engine::CardEngine;
use crate::model::CardMeta;
use crate::service::memory::MemCardService;
use crate::store::mem_backend::MemStateBackend;

pub type MemEngine = CardEngine<MemCardService, MemStateBackend>;

/// A small notebook: three cards under `/notes`, one nested, with overlapping tags.
pub fn sample_service() -> MemCardService {
    MemCardService::new()
        .with_document(
            "/notes/rust.md",
            "---\ntitle: Rust ownership\ntags: [rust, lang]\ncreated: 2024-01-02T08:00:00Z\n---\nBorrowing rules.",
        )
        .with_document(
            "/notes/go.md",
            "---\ntitle: Go channels\ntags: [go, lang]\ncreated: 2024-01-01T08:00:00Z\n---\nSelect statements.",
        )
        .with_document(
            "/notes/journal/day1.md",
            "---\ntitle: Day one\ncreated: 2024-01-03T08:00:00Z\n---\nStarted #journal",
        )
}

/// An engine over [`sample_service`] with `/notes` fully scanned.
pub fn scanned_engine() -> MemEngine {
    let (mut engine, _) = CardEngine::init(
        sample_service(),
        MemStateBackend::new(),
        EngineConfig::default(),
    );
    let request = engine.open_directory("/notes");
    engine.run_scan(&request);
    engine
}

/// Cards with the given titles, pathed under `/t`.
pub fn cards(titles: &[&str]) -> Vec<CardMeta> {
    titles
        .iter()
        .map(|t| CardMeta::new(format!("/t/{}.md", t.to_lowercase()), *t))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_engine_is_ready() {
        let mut engine = scanned_engine();
        assert_eq!(engine.index().len(), 3);
        assert!(!engine.is_scanning());
        assert_eq!(engine.tag_summary().featured[0].tag, "lang");
    }

    #[test]
    fn test_card_fixtures_use_lowercase_paths() {
        assert_eq!(cards(&["Alpha"])[0].path, "/t/alpha.md");
    }
}
