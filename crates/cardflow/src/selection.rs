//! Selection and edit state for the detail pane.
//!
//! Derived UI state, never persisted. At most one card is open at a time.
//! Content is loaded lazily per selection by the engine and stored here; the
//! edit draft and its word count live alongside it.
//!
//! Readers must go through [`Selection::selected_in`], which treats a
//! selection whose path is no longer indexed as empty.

use crate::index::CardIndex;
use crate::model::CardMeta;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    path: Option<String>,
    content: Option<String>,
    draft: String,
    editing: bool,
    word_count: usize,
}

impl Selection {
    pub fn select(&mut self, path: &str) {
        *self = Selection {
            path: Some(path.to_string()),
            ..Default::default()
        };
    }

    pub fn clear(&mut self) {
        *self = Selection::default();
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn is(&self, path: &str) -> bool {
        self.path.as_deref() == Some(path)
    }

    /// The selected card, if it is still in the index.
    pub fn selected_in<'a>(&self, index: &'a CardIndex) -> Option<&'a CardMeta> {
        self.path.as_deref().and_then(|p| index.get(p))
    }

    pub fn set_content(&mut self, content: String) {
        self.word_count = word_count(&content);
        self.draft = content.clone();
        self.content = Some(content);
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn begin_edit(&mut self) -> bool {
        if self.path.is_none() || self.content.is_none() {
            return false;
        }
        self.editing = true;
        true
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
        self.word_count = word_count(&self.draft);
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Drops the draft and returns to the loaded content.
    pub fn cancel_edit(&mut self) {
        self.editing = false;
        let content = self.content.clone().unwrap_or_default();
        self.set_draft(content);
    }

    /// Marks the draft as the saved content and leaves edit mode.
    pub fn commit_edit(&mut self) {
        self.editing = false;
        self.content = Some(self.draft.clone());
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }
}

/// Counts whitespace-separated words, with each CJK ideograph counted as a word
/// on its own since those scripts do not separate words with spaces.
pub fn word_count(text: &str) -> usize {
    let mut count = 0;
    let mut in_word = false;
    for ch in text.chars() {
        if is_cjk(ch) {
            count += 1;
            in_word = false;
        } else if ch.is_whitespace() {
            in_word = false;
        } else if !in_word {
            count += 1;
            in_word = true;
        }
    }
    count
}

fn is_cjk(ch: char) -> bool {
    matches!(ch,
        '\u{4E00}'..='\u{9FFF}'
        | '\u{3400}'..='\u{4DBF}'
        | '\u{F900}'..='\u{FAFF}'
        | '\u{3040}'..='\u{30FF}'
        | '\u{AC00}'..='\u{D7AF}')
}
