//! # Filter/Sort Pipeline
//!
//! Turns an index snapshot plus a [`CardQuery`] into the ordered list of
//! visible cards. The pipeline is a pure function: same index revision and
//! same query always produce the same sequence, which is what lets the engine
//! memoize it on that exact pair.
//!
//! ## Matching
//!
//! - **Search text**: case-insensitive substring over title, preview and tags.
//!   Blank queries match everything. There is no ranking.
//! - **Tags**: AND logic. A card must carry every selected tag; an empty
//!   selection passes everything.
//!
//! ## Ordering
//!
//! Stable sort on the chosen [`SortKey`]; [`SortOrder::Desc`] reverses the key
//! comparison only. Ties always fall back to `path` ascending, so two runs over
//! the same data never disagree.

use crate::index::CardIndex;
use crate::model::{CardMeta, SortKey, SortOrder};
use std::cmp::Ordering;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CardQuery {
    pub search: String,
    /// Selected tags, in selection order. Multiple tags means AND.
    pub tags: Vec<String>,
    pub sort_key: SortKey,
    pub sort_order: SortOrder,
}

impl CardQuery {
    pub fn is_filtering(&self) -> bool {
        !self.search.trim().is_empty() || !self.tags.is_empty()
    }

    /// Adds the tag to the selection, or removes it if already selected.
    pub fn toggle_tag(&mut self, tag: &str) {
        if let Some(pos) = self.tags.iter().position(|t| t == tag) {
            self.tags.remove(pos);
        } else {
            self.tags.push(tag.to_string());
        }
    }

    pub fn matches(&self, card: &CardMeta) -> bool {
        matches_search(card, &self.search) && matches_tags(card, &self.tags)
    }
}

fn matches_search(card: &CardMeta, search: &str) -> bool {
    let needle = search.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    card.title.to_lowercase().contains(&needle)
        || card.preview.to_lowercase().contains(&needle)
        || card.tags.iter().any(|t| t.to_lowercase().contains(&needle))
}

fn matches_tags(card: &CardMeta, tags: &[String]) -> bool {
    tags.iter().all(|t| card.has_tag(t))
}

/// Filters and sorts the index into the visible card sequence.
pub fn visible_cards(index: &CardIndex, query: &CardQuery) -> Vec<CardMeta> {
    let mut cards: Vec<CardMeta> = index
        .cards()
        .filter(|card| query.matches(card))
        .cloned()
        .collect();
    sort_cards(&mut cards, query.sort_key, query.sort_order);
    cards
}

pub fn sort_cards(cards: &mut [CardMeta], key: SortKey, order: SortOrder) {
    cards.sort_by(|a, b| {
        let by_key = compare_by_key(a, b, key);
        let by_key = match order {
            SortOrder::Asc => by_key,
            SortOrder::Desc => by_key.reverse(),
        };
        by_key.then_with(|| a.path.cmp(&b.path))
    });
}

fn compare_by_key(a: &CardMeta, b: &CardMeta, key: SortKey) -> Ordering {
    match key {
        SortKey::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        SortKey::Size => a.size.cmp(&b.size),
        SortKey::Created => compare_timestamps(
            a.created.as_deref(),
            b.created.as_deref(),
            a.created_at(),
            b.created_at(),
        ),
        SortKey::Updated => compare_timestamps(
            a.updated.as_deref(),
            b.updated.as_deref(),
            a.updated_at(),
            b.updated_at(),
        ),
    }
}

// Missing sorts first. Parsed instants win over raw strings when both parse.
fn compare_timestamps<T: Ord>(
    raw_a: Option<&str>,
    raw_b: Option<&str>,
    parsed_a: Option<T>,
    parsed_b: Option<T>,
) -> Ordering {
    match (raw_a, raw_b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(ra), Some(rb)) => match (parsed_a, parsed_b) {
            (Some(pa), Some(pb)) => pa.cmp(&pb),
            _ => ra.cmp(rb),
        },
    }
}
