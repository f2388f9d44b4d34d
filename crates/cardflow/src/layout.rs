//! # Column Layout
//!
//! Splits the visible card sequence into columns for a masonry-style grid.
//!
//! The column count comes from the viewport: `max(1, width / (card_width + gap))`.
//! Cards are dealt round-robin: position `i` goes to column `i % columns`.
//! Adding or removing a card only shifts the cards after the change point.

use crate::model::CardMeta;

pub const DEFAULT_GAP: u32 = 16;

pub fn column_count(viewport_width: u32, card_width: u32, gap: u32) -> usize {
    let slot = card_width.saturating_add(gap);
    if slot == 0 {
        return 1;
    }
    ((viewport_width / slot) as usize).max(1)
}

/// Deals `items` round-robin into `columns` buckets. Always returns
/// `max(columns, 1)` buckets, some possibly empty.
pub fn distribute<T: Clone>(items: &[T], columns: usize) -> Vec<Vec<T>> {
    let columns = columns.max(1);
    let mut buckets: Vec<Vec<T>> = vec![Vec::new(); columns];
    for (i, item) in items.iter().enumerate() {
        buckets[i % columns].push(item.clone());
    }
    buckets
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    pub columns: Vec<Vec<CardMeta>>,
}

impl ColumnLayout {
    pub fn compute(cards: &[CardMeta], viewport_width: u32, card_width: u32, gap: u32) -> Self {
        let count = column_count(viewport_width, card_width, gap);
        Self {
            columns: distribute(cards, count),
        }
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_sizes(&self) -> Vec<usize> {
        self.columns.iter().map(Vec::len).collect()
    }

    /// Column holding the card with this path, if any.
    pub fn column_of(&self, path: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|col| col.iter().any(|c| c.path == path))
    }
}
