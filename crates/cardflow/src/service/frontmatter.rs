//! Card metadata derivation from markdown documents.
//!
//! A document may open with a YAML front matter block:
//!
//! ```text
//! ---
//! title: "Trip notes"
//! tags: [travel, japan]
//! created: 2024-03-01T09:00:00Z
//! ---
//! Body text with #inline tags.
//! ```
//!
//! Front matter fields win over filesystem-derived values. Inline `#tags`
//! found in the first 500 characters of the body are merged into the front
//! matter tags; the result is sorted and deduplicated so rendering order is
//! stable. A block that is not valid YAML contributes no fields; the text after
//! the closing fence is still the body.

use crate::model::CardMeta;
use chrono::{DateTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_yaml::Value;
use std::path::Path;
use std::time::SystemTime;

pub const PREVIEW_CHARS: usize = 200;
const INLINE_TAG_SCAN_CHARS: usize = 500;

static INLINE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\s)#([\w-]+)").expect("inline tag pattern is valid"));

/// Splits `content` into its raw front matter block (without fences) and body.
pub fn split_front_matter(content: &str) -> (Option<&str>, &str) {
    let trimmed = content.trim_start();
    let Some(after_open) = trimmed.strip_prefix("---") else {
        return (None, content);
    };
    match after_open.find("\n---") {
        Some(end) => {
            let yaml = &after_open[..end];
            let rest = &after_open[end + 4..];
            // drop the remainder of the closing fence line
            let body = match rest.find('\n') {
                Some(nl) if rest[..nl].trim().is_empty() => &rest[nl + 1..],
                None if rest.trim().is_empty() => "",
                _ => rest,
            };
            (Some(yaml), body.trim_start_matches('\n'))
        }
        None => (None, content),
    }
}

/// The document body with any front matter removed.
pub fn body(content: &str) -> &str {
    split_front_matter(content).1
}

fn parse_yaml(raw: Option<&str>) -> Option<Value> {
    let raw = raw?;
    match serde_yaml::from_str::<Value>(raw) {
        Ok(value @ Value::Mapping(_)) => Some(value),
        Ok(_) => None,
        Err(e) => {
            log::debug!("Ignoring invalid front matter: {}", e);
            None
        }
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn front_matter_tags(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Sequence(items)) => items.iter().filter_map(scalar_string).collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

pub fn extract_inline_tags(text: &str) -> Vec<String> {
    INLINE_TAG
        .captures_iter(text)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

pub fn iso_timestamp(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn field<'a>(yaml: &'a Option<Value>, name: &str) -> Option<&'a Value> {
    yaml.as_ref().and_then(|y| y.get(name))
}

/// Filesystem facts about a document, gathered by the caller.
#[derive(Debug, Clone, Default)]
pub struct FileFacts {
    pub size: u64,
    pub created: Option<String>,
    pub modified: Option<String>,
}

/// Derives card metadata from a document's content. Pure; no I/O.
pub fn derive_card(path: &Path, content: &str, facts: &FileFacts) -> CardMeta {
    let (raw_yaml, body) = split_front_matter(content);
    let yaml = parse_yaml(raw_yaml);

    let title = field(&yaml, "title")
        .and_then(scalar_string)
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default()
        });

    let mut tags = front_matter_tags(field(&yaml, "tags"));
    let head: String = body.chars().take(INLINE_TAG_SCAN_CHARS).collect();
    tags.extend(extract_inline_tags(&head));
    tags.sort_unstable();
    tags.dedup();

    let created = field(&yaml, "created")
        .and_then(scalar_string)
        .or_else(|| facts.created.clone());
    let updated = field(&yaml, "updated")
        .and_then(scalar_string)
        .or_else(|| facts.modified.clone());

    let preview: String = body.chars().take(PREVIEW_CHARS).collect();

    CardMeta {
        path: path.to_string_lossy().to_string(),
        title,
        tags,
        preview: preview.trim().to_string(),
        size: facts.size,
        created,
        updated,
    }
}

/// Initial content for a freshly created document.
pub fn template(title: &str) -> String {
    format!("---\ntitle: \"{}\"\ntags: []\n---\n", title.replace('"', "\\\""))
}

/// Re-attaches the front matter block of `original` to a new body.
pub fn with_front_matter(original: &str, new_body: &str) -> String {
    match split_front_matter(original).0 {
        Some(yaml) => format!("---{}\n---\n{}", yaml, new_body),
        None => new_body.to_string(),
    }
}
