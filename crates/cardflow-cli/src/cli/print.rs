use cardflow::layout::ColumnLayout;
use cardflow::model::CardMeta;
use cardflow::settings::{DisplaySettings, Timezone};
use cardflow::tags::TagSummary;
use chrono::{DateTime, Utc};
use colored::Colorize;
use timeago::Formatter;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const TITLE_WIDTH: usize = 40;
const TIME_WIDTH: usize = 14;

pub(super) fn truncate_to_width(s: &str, max_width: usize) -> String {
    let mut result = String::new();
    let mut current_width = 0;

    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > max_width.saturating_sub(1) {
            result.push('…');
            return result;
        }
        result.push(c);
        current_width += char_width;
    }

    result
}

fn pad_to_width(s: &str, width: usize) -> String {
    let padding = width.saturating_sub(s.width());
    format!("{}{}", s, " ".repeat(padding))
}

fn format_time_ago(timestamp: DateTime<Utc>) -> String {
    let duration = Utc::now().signed_duration_since(timestamp);
    let formatter = Formatter::new();
    formatter.convert(duration.to_std().unwrap_or_default())
}

fn card_row(card: &CardMeta) -> String {
    let title = pad_to_width(&truncate_to_width(&card.title, TITLE_WIDTH), TITLE_WIDTH);
    let time = card
        .updated_at()
        .map(format_time_ago)
        .unwrap_or_default();
    let time = format!("{:>width$}", time, width = TIME_WIDTH);
    let tags: Vec<String> = card.tags.iter().map(|t| format!("#{}", t)).collect();
    format!("  {} {}  {}", title, time.dimmed(), tags.join(" ").cyan())
}

pub(super) fn format_columns(layout: &ColumnLayout) -> String {
    let total: usize = layout.column_sizes().iter().sum();
    if total == 0 {
        return "No cards found.\n".to_string();
    }

    let mut out = String::new();
    for (i, column) in layout.columns.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&format!(
            "{}\n",
            format!("Column {} ({})", i + 1, column.len()).bold()
        ));
        for card in column {
            out.push_str(&card_row(card));
            out.push('\n');
        }
    }
    out
}

pub(super) fn format_tags(summary: &TagSummary, expanded: bool) -> String {
    if summary.is_empty() {
        return "No tags.\n".to_string();
    }
    let mut out = String::new();
    for entry in summary.displayed(expanded) {
        out.push_str(&format!(
            "{} {}\n",
            format!("#{}", entry.tag).cyan(),
            format!("({})", entry.count).dimmed()
        ));
    }
    if !expanded && summary.has_extra() {
        out.push_str(&format!(
            "{}\n",
            format!("… {} more (use --all)", summary.extra.len()).dimmed()
        ));
    }
    out
}

pub(super) fn format_card(
    card: &CardMeta,
    content: &str,
    word_count: usize,
    timezone: Timezone,
) -> String {
    let mut out = format!("{}\n", card.title.bold());
    out.push_str(&format!("{}\n", card.path.dimmed()));
    if !card.tags.is_empty() {
        let tags: Vec<String> = card.tags.iter().map(|t| format!("#{}", t)).collect();
        out.push_str(&format!("{}\n", tags.join(" ").cyan()));
    }
    let created = timezone.format_timestamp(card.created.as_deref());
    let updated = timezone.format_timestamp(card.updated.as_deref());
    out.push_str(&format!(
        "{}\n",
        format!(
            "created {}  updated {}  {} words  {} bytes",
            created, updated, word_count, card.size
        )
        .dimmed()
    ));
    out.push_str("--------------------------------\n");
    out.push_str(content);
    if !content.ends_with('\n') {
        out.push('\n');
    }
    out
}

pub(super) fn format_settings(settings: &DisplaySettings) -> String {
    let rows = [
        ("cardWidth", settings.card_width.to_string()),
        ("titleFontSize", settings.title_font_size.to_string()),
        ("bodyFontSize", settings.body_font_size.to_string()),
        ("titleLines", settings.title_lines.to_string()),
        ("previewLines", settings.preview_lines.to_string()),
        (
            "scanDepth",
            if settings.is_unlimited_depth() {
                format!("{} (unlimited)", settings.scan_depth)
            } else {
                settings.scan_depth.to_string()
            },
        ),
        ("detailWidth", settings.detail_width.to_string()),
        ("timezone", settings.timezone.to_string()),
        ("language", settings.language.to_string()),
    ];
    rows.iter()
        .map(|(key, value)| format!("{} {}\n", pad_to_width(key, 14).bold(), value))
        .collect()
}

pub(super) fn format_recent(dirs: &[String]) -> String {
    if dirs.is_empty() {
        return "No recent directories.\n".to_string();
    }
    dirs.iter()
        .enumerate()
        .map(|(i, dir)| format!("{} {}\n", format!("{}.", i + 1).yellow(), dir))
        .collect()
}

pub(super) fn print_success(message: &str) {
    println!("{}", message.green());
}

pub(super) fn print_info(message: &str) {
    println!("{}", message.dimmed());
}
