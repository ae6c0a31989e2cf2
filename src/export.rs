//! Per-page CSV export
//!
//! One delimited file per page context, named by sanitizing the page URL.
//! Timestamps are formatted as RFC 3339 with microseconds; absent values
//! export as empty fields.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::SecondsFormat;

use crate::error::ProcessError;
use crate::types::{AlignedRecord, PageSession};

/// Column order of the exported files
const EXPORT_HEADER: [&str; 21] = [
    "timestamp",
    "event",
    "scroll_position",
    "scroll_percentage",
    "pointer_x",
    "pointer_y",
    "page_context",
    "anger",
    "fear",
    "joy",
    "sadness",
    "surprise",
    "engagement",
    "confusion",
    "neutral",
    "gaze_right_x",
    "gaze_right_y",
    "gaze_left_x",
    "gaze_left_y",
    "mean_gaze_x",
    "mean_gaze_y",
];

/// Derive a filesystem-safe file stem from a page URL.
///
/// The scheme separator, path separators, and any other character that is
/// unsafe in a filename map to `_`; alphanumerics, `-`, `.` and `_` pass
/// through unchanged.
pub fn sanitize_url(url: &str) -> String {
    url.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Write one delimited file per session into `out_dir`.
///
/// Returns the written paths in session order. The directory is created if
/// it does not exist.
pub fn write_sessions(
    sessions: &[PageSession],
    out_dir: &Path,
    delimiter: char,
) -> Result<Vec<PathBuf>, ProcessError> {
    fs::create_dir_all(out_dir)?;

    let mut paths = Vec::with_capacity(sessions.len());
    for session in sessions {
        let path = out_dir.join(format!("{}.csv", sanitize_url(&session.page_context)));
        fs::write(&path, session_to_delimited(session, delimiter))?;
        paths.push(path);
    }
    Ok(paths)
}

/// Encode a session as delimited text, header row first.
pub fn session_to_delimited(session: &PageSession, delimiter: char) -> String {
    let mut out = String::new();
    out.push_str(&EXPORT_HEADER.join(&delimiter.to_string()));
    out.push('\n');
    for record in &session.records {
        out.push_str(&record_to_line(record, delimiter));
        out.push('\n');
    }
    out
}

fn record_to_line(record: &AlignedRecord, delimiter: char) -> String {
    let affect = record.affect;
    let affect_field = |value: fn(&crate::types::AffectScores) -> f64| -> String {
        affect.as_ref().map(|a| format_number(value(a))).unwrap_or_default()
    };

    let fields = [
        record
            .timestamp
            .to_rfc3339_opts(SecondsFormat::Micros, true),
        record.event_kind.as_str().to_string(),
        optional_number(record.scroll_position),
        optional_number(record.scroll_percentage),
        optional_number(record.pointer_x),
        optional_number(record.pointer_y),
        escape_field(&record.page_context, delimiter),
        affect_field(|a| a.anger),
        affect_field(|a| a.fear),
        affect_field(|a| a.joy),
        affect_field(|a| a.sadness),
        affect_field(|a| a.surprise),
        affect_field(|a| a.engagement),
        affect_field(|a| a.confusion),
        affect_field(|a| a.neutral),
        optional_number(record.gaze_right_x),
        optional_number(record.gaze_right_y),
        optional_number(record.gaze_left_x),
        optional_number(record.gaze_left_y),
        optional_number(record.mean_gaze_x),
        optional_number(record.mean_gaze_y),
    ];
    fields.join(&delimiter.to_string())
}

fn optional_number(value: Option<f64>) -> String {
    value.map(format_number).unwrap_or_default()
}

fn format_number(value: f64) -> String {
    value.to_string()
}

/// Quote a field when it contains the delimiter or a quote.
fn escape_field(value: &str, delimiter: char) -> String {
    if value.contains(delimiter) || value.contains('"') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
