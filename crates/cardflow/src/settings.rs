//! # Display Settings
//!
//! One process-wide [`DisplaySettings`] record, persisted as JSON under the
//! `settings` key.
//!
//! ## Forward-Compatible Loading
//!
//! Persisted records may come from an older build (fewer fields), a newer one
//! (unknown fields), or a hand edit (wrong types, out-of-range numbers).
//! Loading never fails:
//!
//! 1. Start from [`DisplaySettings::default`].
//! 2. Overlay each persisted field individually. A field whose value does not
//!    deserialize is skipped, so one bad field cannot reset the others.
//!    Unknown fields are dropped.
//! 3. Clamp every slider into its allowed range.
//!
//! Anything that is not a JSON object at all yields the defaults.
//!
//! ## Patching
//!
//! Updates are partial: a [`SettingsPatch`] names only the fields it changes.
//! The patch is shallow-merged onto the current record and the full merged
//! record is written back immediately.
//!
//! | Field           | Default | Range            |
//! |-----------------|---------|------------------|
//! | `cardWidth`     | 280     | 200..=480        |
//! | `titleFontSize` | 14      | 12..=24          |
//! | `bodyFontSize`  | 12      | 10..=20          |
//! | `titleLines`    | 2       | 1..=5            |
//! | `previewLines`  | 4       | 1..=10           |
//! | `scanDepth`     | 5       | 0..=5 (5 = all)  |
//! | `detailWidth`   | 560     | 320..=1200       |
//! | `timezone`      | `UTC+8` | see [`Timezone`] |
//! | `language`      | `zh`    | `en`, `zh`       |

use crate::store::{self, StateBackend, SETTINGS_KEY};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Scan depth value meaning "recurse without limit".
pub const SCAN_DEPTH_UNLIMITED: u32 = 5;

pub const CARD_WIDTH_RANGE: RangeInclusive<u32> = 200..=480;
pub const TITLE_FONT_RANGE: RangeInclusive<u32> = 12..=24;
pub const BODY_FONT_RANGE: RangeInclusive<u32> = 10..=20;
pub const TITLE_LINES_RANGE: RangeInclusive<u32> = 1..=5;
pub const PREVIEW_LINES_RANGE: RangeInclusive<u32> = 1..=10;
pub const SCAN_DEPTH_RANGE: RangeInclusive<u32> = 0..=SCAN_DEPTH_UNLIMITED;
pub const DETAIL_WIDTH_RANGE: RangeInclusive<u32> = 320..=1200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Timezone {
    #[serde(rename = "UTC")]
    Utc,
    #[default]
    #[serde(rename = "UTC+8")]
    Shanghai,
    #[serde(rename = "UTC+9")]
    Tokyo,
    #[serde(rename = "UTC-5")]
    NewYork,
}

impl Timezone {
    /// The IANA zone each setting stands for. `UTC-5` is New York time and
    /// follows daylight saving, so summer instants render at UTC-4.
    pub fn zone(self) -> Tz {
        match self {
            Timezone::Utc => chrono_tz::UTC,
            Timezone::Shanghai => chrono_tz::Asia::Shanghai,
            Timezone::Tokyo => chrono_tz::Asia::Tokyo,
            Timezone::NewYork => chrono_tz::America::New_York,
        }
    }

    /// Renders an instant as `YYYY/MM/DD HH:MM` in this zone.
    pub fn format(self, instant: DateTime<Utc>) -> String {
        instant
            .with_timezone(&self.zone())
            .format("%Y/%m/%d %H:%M")
            .to_string()
    }

    /// Formats a card timestamp string. Unparseable input renders as-is;
    /// absent input renders empty.
    pub fn format_timestamp(self, raw: Option<&str>) -> String {
        match raw {
            None => String::new(),
            Some(raw) => crate::model::parse_timestamp(raw)
                .map(|t| self.format(t))
                .unwrap_or_else(|| raw.to_string()),
        }
    }
}

impl fmt::Display for Timezone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Timezone::Utc => "UTC",
            Timezone::Shanghai => "UTC+8",
            Timezone::Tokyo => "UTC+9",
            Timezone::NewYork => "UTC-5",
        };
        f.write_str(s)
    }
}

impl FromStr for Timezone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UTC" | "UTC+0" => Ok(Timezone::Utc),
            "UTC+8" => Ok(Timezone::Shanghai),
            "UTC+9" => Ok(Timezone::Tokyo),
            "UTC-5" => Ok(Timezone::NewYork),
            other => Err(format!("Unknown timezone: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    #[default]
    Zh,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Language::En => "en",
            Language::Zh => "zh",
        })
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "zh" => Ok(Language::Zh),
            other => Err(format!("Unknown language: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DisplaySettings {
    pub card_width: u32,
    pub title_font_size: u32,
    pub body_font_size: u32,
    pub title_lines: u32,
    pub preview_lines: u32,
    pub scan_depth: u32,
    pub timezone: Timezone,
    pub language: Language,
    pub detail_width: u32,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            card_width: 280,
            title_font_size: 14,
            body_font_size: 12,
            title_lines: 2,
            preview_lines: 4,
            scan_depth: SCAN_DEPTH_UNLIMITED,
            timezone: Timezone::default(),
            language: Language::default(),
            detail_width: 560,
        }
    }
}

fn clamp(value: u32, range: &RangeInclusive<u32>) -> u32 {
    value.clamp(*range.start(), *range.end())
}

impl DisplaySettings {
    pub fn clamped(self) -> Self {
        Self {
            card_width: clamp(self.card_width, &CARD_WIDTH_RANGE),
            title_font_size: clamp(self.title_font_size, &TITLE_FONT_RANGE),
            body_font_size: clamp(self.body_font_size, &BODY_FONT_RANGE),
            title_lines: clamp(self.title_lines, &TITLE_LINES_RANGE),
            preview_lines: clamp(self.preview_lines, &PREVIEW_LINES_RANGE),
            scan_depth: clamp(self.scan_depth, &SCAN_DEPTH_RANGE),
            detail_width: clamp(self.detail_width, &DETAIL_WIDTH_RANGE),
            ..self
        }
    }

    pub fn is_unlimited_depth(&self) -> bool {
        self.scan_depth >= SCAN_DEPTH_UNLIMITED
    }

    /// Field-by-field merge of a persisted JSON value onto the defaults.
    pub fn from_persisted(value: Value) -> Self {
        let defaults = Self::default();
        let Value::Object(stored) = value else {
            warn!("Persisted settings are not an object, using defaults");
            return defaults;
        };
        let mut merged = match serde_json::to_value(defaults) {
            Ok(Value::Object(map)) => map,
            _ => return defaults,
        };

        for (key, field) in stored {
            if !merged.contains_key(&key) {
                debug!("Dropping unknown settings field '{}'", key);
                continue;
            }
            let mut candidate = merged.clone();
            candidate.insert(key.clone(), field);
            match serde_json::from_value::<DisplaySettings>(Value::Object(candidate.clone())) {
                Ok(_) => merged = candidate,
                Err(e) => warn!("Ignoring malformed settings field '{}': {}", key, e),
            }
        }

        serde_json::from_value::<DisplaySettings>(Value::Object(merged))
            .map(DisplaySettings::clamped)
            .unwrap_or(defaults)
    }

    /// Shallow merge: fields present in the patch win.
    pub fn merged(self, patch: &SettingsPatch) -> Self {
        Self {
            card_width: patch.card_width.unwrap_or(self.card_width),
            title_font_size: patch.title_font_size.unwrap_or(self.title_font_size),
            body_font_size: patch.body_font_size.unwrap_or(self.body_font_size),
            title_lines: patch.title_lines.unwrap_or(self.title_lines),
            preview_lines: patch.preview_lines.unwrap_or(self.preview_lines),
            scan_depth: patch.scan_depth.unwrap_or(self.scan_depth),
            timezone: patch.timezone.unwrap_or(self.timezone),
            language: patch.language.unwrap_or(self.language),
            detail_width: patch.detail_width.unwrap_or(self.detail_width),
        }
        .clamped()
    }
}

/// A partial settings record. `None` leaves the current value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_font_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_font_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_lines: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_lines: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_depth: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<Timezone>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail_width: Option<u32>,
}

impl SettingsPatch {
    pub fn touches_scan_depth(&self) -> bool {
        self.scan_depth.is_some()
    }

    /// Builds a single-field patch from a `key value` pair as typed by a user.
    /// Keys accept both `camelCase` and `snake_case`.
    pub fn from_key_value(key: &str, value: &str) -> Result<Self, String> {
        let mut patch = SettingsPatch::default();
        let number = || {
            value
                .trim()
                .parse::<u32>()
                .map_err(|_| format!("Expected a number for '{}', got '{}'", key, value))
        };
        match key {
            "cardWidth" | "card_width" => patch.card_width = Some(number()?),
            "titleFontSize" | "title_font_size" => patch.title_font_size = Some(number()?),
            "bodyFontSize" | "body_font_size" => patch.body_font_size = Some(number()?),
            "titleLines" | "title_lines" => patch.title_lines = Some(number()?),
            "previewLines" | "preview_lines" => patch.preview_lines = Some(number()?),
            "scanDepth" | "scan_depth" => patch.scan_depth = Some(number()?),
            "detailWidth" | "detail_width" => patch.detail_width = Some(number()?),
            "timezone" => patch.timezone = Some(value.parse()?),
            "language" => patch.language = Some(value.parse()?),
            other => return Err(format!("Unknown setting: {}", other)),
        }
        Ok(patch)
    }
}

/// Owns the current settings and keeps the persisted copy in step.
#[derive(Debug, Clone, Default)]
pub struct SettingsStore {
    current: DisplaySettings,
}

impl SettingsStore {
    /// Never fails: absent or malformed data falls back to defaults.
    pub fn load<B: StateBackend + ?Sized>(backend: &B) -> Self {
        let current = match store::load_raw(backend, SETTINGS_KEY) {
            None => DisplaySettings::default(),
            Some(raw) => match serde_json::from_str::<Value>(&raw) {
                Ok(value) => DisplaySettings::from_persisted(value),
                Err(e) => {
                    warn!("Ignoring malformed persisted settings: {}", e);
                    DisplaySettings::default()
                }
            },
        };
        Self { current }
    }

    pub fn current(&self) -> &DisplaySettings {
        &self.current
    }

    pub fn patch<B: StateBackend + ?Sized>(
        &mut self,
        backend: &B,
        patch: &SettingsPatch,
    ) -> DisplaySettings {
        self.current = self.current.merged(patch);
        store::save_json(backend, SETTINGS_KEY, &self.current);
        self.current
    }

    pub fn reset<B: StateBackend + ?Sized>(&mut self, backend: &B) -> DisplaySettings {
        self.current = DisplaySettings::default();
        store::save_json(backend, SETTINGS_KEY, &self.current);
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mem_backend::MemStateBackend;
    use serde_json::json;

    fn load_from(raw: &str) -> DisplaySettings {
        let backend = MemStateBackend::new().with_raw(SETTINGS_KEY, raw);
        *SettingsStore::load(&backend).current()
    }

    #[test]
    fn test_absent_record_loads_defaults() {
        let store = SettingsStore::load(&MemStateBackend::new());
        assert_eq!(*store.current(), DisplaySettings::default());
    }

    #[test]
    fn test_missing_scan_depth_takes_default_and_nothing_else_changes() {
        let loaded = load_from(
            r#"{"cardWidth":320,"titleFontSize":16,"bodyFontSize":13,"titleLines":3,
                "previewLines":6,"timezone":"UTC+9","language":"en","detailWidth":700}"#,
        );
        assert_eq!(loaded.scan_depth, SCAN_DEPTH_UNLIMITED);
        assert_eq!(loaded.card_width, 320);
        assert_eq!(loaded.title_font_size, 16);
        assert_eq!(loaded.body_font_size, 13);
        assert_eq!(loaded.title_lines, 3);
        assert_eq!(loaded.preview_lines, 6);
        assert_eq!(loaded.timezone, Timezone::Tokyo);
        assert_eq!(loaded.language, Language::En);
        assert_eq!(loaded.detail_width, 700);
    }

    #[test]
    fn test_legacy_five_field_record_loads() {
        let loaded = load_from(
            r#"{"cardWidth":300,"titleFontSize":14,"bodyFontSize":12,"titleLines":2,"previewLines":4}"#,
        );
        assert_eq!(loaded.card_width, 300);
        assert_eq!(loaded.timezone, Timezone::Shanghai);
        assert_eq!(loaded.detail_width, 560);
    }

    #[test]
    fn test_malformed_json_loads_defaults() {
        assert_eq!(load_from("{{{"), DisplaySettings::default());
        assert_eq!(load_from("[1,2,3]"), DisplaySettings::default());
    }

    #[test]
    fn test_one_bad_field_does_not_reset_the_rest() {
        let loaded = load_from(r#"{"cardWidth":"wide","previewLines":7,"timezone":"Mars"}"#);
        assert_eq!(loaded.card_width, 280);
        assert_eq!(loaded.preview_lines, 7);
        assert_eq!(loaded.timezone, Timezone::Shanghai);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let loaded = load_from(r#"{"cardWidth":5000,"titleLines":0,"scanDepth":99}"#);
        assert_eq!(loaded.card_width, 480);
        assert_eq!(loaded.title_lines, 1);
        assert_eq!(loaded.scan_depth, SCAN_DEPTH_UNLIMITED);
    }

    #[test]
    fn test_unknown_fields_are_dropped() {
        let loaded = DisplaySettings::from_persisted(json!({"columnCount": 4, "bodyFontSize": 15}));
        assert_eq!(loaded.body_font_size, 15);
    }

    #[test]
    fn test_patch_merges_and_persists_full_record() {
        let backend = MemStateBackend::new();
        let mut store = SettingsStore::load(&backend);
        let patch = SettingsPatch {
            title_font_size: Some(18),
            ..Default::default()
        };
        let updated = store.patch(&backend, &patch);

        assert_eq!(updated.title_font_size, 18);
        assert_eq!(updated.card_width, 280);

        let raw: Value = serde_json::from_str(&backend.raw(SETTINGS_KEY).unwrap()).unwrap();
        assert_eq!(raw["titleFontSize"], 18);
        assert_eq!(raw["cardWidth"], 280);
        assert_eq!(raw["timezone"], "UTC+8");

        assert_eq!(*SettingsStore::load(&backend).current(), updated);
    }

    #[test]
    fn test_patch_survives_write_failure_in_memory() {
        let backend = MemStateBackend::new();
        backend.set_simulate_write_error(true);
        let mut store = SettingsStore::load(&backend);
        let updated = store.patch(
            &backend,
            &SettingsPatch {
                language: Some(Language::En),
                ..Default::default()
            },
        );
        assert_eq!(updated.language, Language::En);
        assert_eq!(store.current().language, Language::En);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let backend = MemStateBackend::new();
        let mut store = SettingsStore::load(&backend);
        store.patch(
            &backend,
            &SettingsPatch {
                card_width: Some(400),
                ..Default::default()
            },
        );
        assert_eq!(store.reset(&backend), DisplaySettings::default());
    }

    #[test]
    fn test_patch_from_key_value() {
        let patch = SettingsPatch::from_key_value("scan_depth", "2").unwrap();
        assert!(patch.touches_scan_depth());
        let patch = SettingsPatch::from_key_value("timezone", "utc-5").unwrap();
        assert_eq!(patch.timezone, Some(Timezone::NewYork));
        assert!(SettingsPatch::from_key_value("cardWidth", "wide").is_err());
        assert!(SettingsPatch::from_key_value("fontFamily", "serif").is_err());
    }

    #[test]
    fn test_timezone_formatting() {
        let instant = DateTime::parse_from_rfc3339("2024-01-01T20:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(Timezone::Utc.format(instant), "2024/01/01 20:30");
        assert_eq!(Timezone::Shanghai.format(instant), "2024/01/02 04:30");
        assert_eq!(Timezone::NewYork.format(instant), "2024/01/01 15:30");
        assert_eq!(Timezone::Tokyo.format_timestamp(None), "");
        assert_eq!(Timezone::Tokyo.format_timestamp(Some("someday")), "someday");
    }

    #[test]
    fn test_new_york_follows_daylight_saving() {
        let summer = Timezone::NewYork.format_timestamp(Some("2024-07-01T12:00:00Z"));
        assert_eq!(summer, "2024/07/01 08:00");
        let winter = Timezone::NewYork.format_timestamp(Some("2024-12-01T12:00:00Z"));
        assert_eq!(winter, "2024/12/01 07:00");
    }
}
