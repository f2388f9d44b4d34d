//! Tag aggregation for the tag-filter bar.
//!
//! Counts run over the whole index, never the filtered view, so the bar does
//! not shrink as the user narrows the selection.
//!
//! The bar has two tiers:
//! - **Featured**: the top [`FEATURED_TAG_LIMIT`] tags whose count reaches
//!   [`MIN_TAG_COUNT`]. Always shown.
//! - **Extra**: every other tag, including single-use ones. Shown only once the
//!   user expands the "more tags" disclosure, after the featured tags.

use crate::index::CardIndex;
use serde::Serialize;
use std::collections::HashMap;

pub const FEATURED_TAG_LIMIT: usize = 8;
pub const MIN_TAG_COUNT: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagSummary {
    pub featured: Vec<TagCount>,
    pub extra: Vec<TagCount>,
}

impl TagSummary {
    /// Tags to render given the disclosure state.
    pub fn displayed(&self, expanded: bool) -> Vec<&TagCount> {
        let mut tags: Vec<&TagCount> = self.featured.iter().collect();
        if expanded {
            tags.extend(self.extra.iter());
        }
        tags
    }

    pub fn has_extra(&self) -> bool {
        !self.extra.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.featured.is_empty() && self.extra.is_empty()
    }
}

/// Count cards per tag, sorted by count descending then tag name.
pub fn count_tags(index: &CardIndex) -> Vec<TagCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for card in index.cards() {
        for tag in &card.tags {
            *counts.entry(tag.as_str()).or_insert(0) += 1;
        }
    }

    let mut sorted: Vec<TagCount> = counts
        .into_iter()
        .map(|(tag, count)| TagCount {
            tag: tag.to_string(),
            count,
        })
        .collect();
    sorted.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
    sorted
}

pub fn summarize(index: &CardIndex, featured_limit: usize, min_count: usize) -> TagSummary {
    let mut summary = TagSummary::default();
    for entry in count_tags(index) {
        if summary.featured.len() < featured_limit && entry.count >= min_count {
            summary.featured.push(entry);
        } else {
            summary.extra.push(entry);
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CardMeta;

    fn index_with_tag_counts(counts: &[(&str, usize)]) -> CardIndex {
        let mut index = CardIndex::new();
        let mut n = 0;
        for (tag, count) in counts {
            for _ in 0..*count {
                n += 1;
                index.update(CardMeta::new(format!("/{}.md", n), "c").with_tags([*tag]));
            }
        }
        index
    }

    #[test]
    fn test_counts_whole_index_descending() {
        let index = index_with_tag_counts(&[("a", 1), ("b", 3), ("c", 2)]);
        let counts = count_tags(&index);
        let names: Vec<_> = counts.iter().map(|t| t.tag.as_str()).collect();
        assert_eq!(names, vec!["b", "c", "a"]);
        assert_eq!(counts[0].count, 3);
    }

    #[test]
    fn test_equal_counts_order_by_name() {
        let index = index_with_tag_counts(&[("zeta", 2), ("alpha", 2)]);
        let names: Vec<_> = count_tags(&index).into_iter().map(|t| t.tag).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_single_use_tags_only_appear_when_expanded() {
        let index = index_with_tag_counts(&[("common", 4), ("rare", 1)]);
        let summary = summarize(&index, FEATURED_TAG_LIMIT, MIN_TAG_COUNT);

        let collapsed: Vec<_> = summary.displayed(false).iter().map(|t| t.tag.clone()).collect();
        assert_eq!(collapsed, vec!["common"]);

        let expanded: Vec<_> = summary.displayed(true).iter().map(|t| t.tag.clone()).collect();
        assert_eq!(expanded, vec!["common", "rare"]);
        assert!(summary.has_extra());
    }

    #[test]
    fn test_featured_is_capped() {
        let owned: Vec<(String, usize)> = (0..10).map(|i| (format!("t{}", i), 10 - i)).collect();
        let borrowed: Vec<(&str, usize)> = owned.iter().map(|(t, c)| (t.as_str(), *c)).collect();
        let index = index_with_tag_counts(&borrowed);
        let summary = summarize(&index, FEATURED_TAG_LIMIT, MIN_TAG_COUNT);

        assert_eq!(summary.featured.len(), 8);
        // t8 (count 2) and t9 (count 1) spill over
        let extra: Vec<_> = summary.extra.iter().map(|t| t.tag.as_str()).collect();
        assert_eq!(extra, vec!["t8", "t9"]);
    }

    #[test]
    fn test_empty_index_has_no_tags() {
        let summary = summarize(&CardIndex::new(), FEATURED_TAG_LIMIT, MIN_TAG_COUNT);
        assert!(summary.is_empty());
        assert!(summary.displayed(true).is_empty());
    }
}
