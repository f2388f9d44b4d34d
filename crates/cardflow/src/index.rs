//! # Card Index
//!
//! The live map `path → CardMeta` for the currently open directory. It is the
//! single source of truth for "what documents exist"; every derived view
//! (visible cards, tag counts, columns) is recomputed from it.
//!
//! All operations are total. Upserts are last-write-wins by `path`, so applying
//! the same scan batch twice leaves the index unchanged.
//!
//! Every mutation bumps [`CardIndex::revision`]. Derived views use the revision
//! as a cheap memoization key instead of hashing the whole map.
//!
//! Selection lives next to the index in [`crate::engine::CardEngine`], which is
//! what guarantees that removing the selected card clears the selection in the
//! same step.

use crate::model::CardMeta;
use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
pub struct CardIndex {
    cards: HashMap<String, CardMeta>,
    revision: u64,
}

impl CardIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upserts each card by path. Input order does not matter.
    pub fn add_or_replace<I>(&mut self, cards: I)
    where
        I: IntoIterator<Item = CardMeta>,
    {
        for card in cards {
            self.cards.insert(card.path.clone(), card);
        }
        self.revision += 1;
    }

    pub fn update(&mut self, card: CardMeta) {
        self.add_or_replace([card]);
    }

    /// Removes the card if present. Returns whether anything was removed.
    pub fn remove(&mut self, path: &str) -> bool {
        let removed = self.cards.remove(path).is_some();
        if removed {
            self.revision += 1;
        }
        removed
    }

    pub fn clear(&mut self) {
        self.cards.clear();
        self.revision += 1;
    }

    pub fn get(&self, path: &str) -> Option<&CardMeta> {
        self.cards.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.cards.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> impl Iterator<Item = &CardMeta> {
        self.cards.values()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(path: &str, title: &str) -> CardMeta {
        CardMeta::new(path, title)
    }

    #[test]
    fn test_upsert_replaces_by_path() {
        let mut index = CardIndex::new();
        index.add_or_replace(vec![card("/a.md", "First"), card("/b.md", "B")]);
        index.update(card("/a.md", "Second"));

        assert_eq!(index.len(), 2);
        assert_eq!(index.get("/a.md").unwrap().title, "Second");
    }

    #[test]
    fn test_duplicate_paths_in_one_batch_keep_the_last() {
        let mut index = CardIndex::new();
        index.add_or_replace(vec![card("/a.md", "One"), card("/a.md", "Two")]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("/a.md").unwrap().title, "Two");
    }

    #[test]
    fn test_applying_a_batch_twice_is_idempotent() {
        let batch = vec![card("/a.md", "A"), card("/b.md", "B"), card("/c.md", "C")];

        let mut once = CardIndex::new();
        once.add_or_replace(batch.clone());

        let mut twice = CardIndex::new();
        twice.add_or_replace(batch.clone());
        twice.add_or_replace(batch);

        let mut a: Vec<_> = once.cards().cloned().collect();
        let mut b: Vec<_> = twice.cards().cloned().collect();
        a.sort_by(|x, y| x.path.cmp(&y.path));
        b.sort_by(|x, y| x.path.cmp(&y.path));
        assert_eq!(a, b);
    }

    #[test]
    fn test_remove_absent_is_a_noop() {
        let mut index = CardIndex::new();
        index.update(card("/a.md", "A"));
        let revision = index.revision();

        assert!(!index.remove("/missing.md"));
        assert_eq!(index.len(), 1);
        assert_eq!(index.revision(), revision);
    }

    #[test]
    fn test_mixed_sequence_keeps_one_entry_per_live_path() {
        let mut index = CardIndex::new();
        index.add_or_replace(vec![card("/a.md", "A"), card("/b.md", "B")]);
        index.remove("/a.md");
        index.update(card("/c.md", "C"));
        index.update(card("/a.md", "A2"));
        index.remove("/b.md");

        let mut paths: Vec<_> = index.cards().map(|c| c.path.as_str()).collect();
        paths.sort();
        assert_eq!(paths, vec!["/a.md", "/c.md"]);
        assert_eq!(index.get("/a.md").unwrap().title, "A2");
    }

    #[test]
    fn test_every_mutation_bumps_revision() {
        let mut index = CardIndex::new();
        let r0 = index.revision();
        index.update(card("/a.md", "A"));
        let r1 = index.revision();
        index.remove("/a.md");
        let r2 = index.revision();
        index.clear();
        let r3 = index.revision();
        assert!(r0 < r1 && r1 < r2 && r2 < r3);
    }
}
