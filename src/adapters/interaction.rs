//! Browser interaction log adapter
//!
//! Parses the raw browser interaction CSV (`Time (UTC)`, `Event`,
//! `Scroll Position`, `Scroll Percentage`, `Mouse X`, `Mouse Y`, `URL`) into
//! typed rows. The first row is a header; missing columns abort with an
//! expected-vs-found diagnostic before any alignment is attempted.

use chrono::{DateTime, NaiveDateTime, Utc};

use super::{find_column, split_delimited};
use crate::error::ProcessError;

/// Expected interaction log columns, in the capture tool's naming
const EXPECTED_COLUMNS: [&str; 7] = [
    "Time (UTC)",
    "Event",
    "Scroll Position",
    "Scroll Percentage",
    "Mouse X",
    "Mouse Y",
    "URL",
];

/// One raw row of the browser interaction log
#[derive(Debug, Clone)]
pub struct RawInteractionRow {
    pub timestamp: DateTime<Utc>,
    pub event: String,
    pub scroll_position: Option<f64>,
    pub scroll_percentage: Option<f64>,
    pub mouse_x: Option<f64>,
    pub mouse_y: Option<f64>,
    pub url: String,
}

/// Adapter for the browser interaction CSV log
pub struct InteractionLogAdapter;

impl InteractionLogAdapter {
    /// Parse the full log text into raw rows.
    ///
    /// `path` is used only for diagnostics. A malformed row is fatal for the
    /// whole stream: partial corruption in an offline log indicates an
    /// upstream capture bug, not a transient condition.
    pub fn parse(raw: &str, path: &str) -> Result<Vec<RawInteractionRow>, ProcessError> {
        let mut lines = raw.lines().enumerate();

        let (_, header_line) = match lines.next() {
            Some(line) => line,
            None => return Ok(Vec::new()),
        };
        let headers = split_delimited(header_line, ',');
        let columns = locate_columns(&headers, path)?;

        let mut rows = Vec::new();
        for (index, line) in lines {
            if line.trim().is_empty() {
                continue;
            }
            let line_no = index + 1;
            let fields = split_delimited(line, ',');
            rows.push(parse_row(&fields, &columns, path, line_no)?);
        }

        Ok(rows)
    }
}

/// Resolved column indices for the interaction log
struct ColumnIndices {
    timestamp: usize,
    event: usize,
    scroll_position: usize,
    scroll_percentage: usize,
    mouse_x: usize,
    mouse_y: usize,
    url: usize,
}

fn locate_columns(headers: &[String], path: &str) -> Result<ColumnIndices, ProcessError> {
    let lookup = |key: &str| find_column(headers, key);

    let resolved = (
        lookup("timeutc"),
        lookup("event"),
        lookup("scrollposition"),
        lookup("scrollpercentage"),
        lookup("mousex"),
        lookup("mousey"),
        lookup("url"),
    );

    match resolved {
        (Some(t), Some(e), Some(sp), Some(spc), Some(mx), Some(my), Some(u)) => {
            Ok(ColumnIndices {
                timestamp: t,
                event: e,
                scroll_position: sp,
                scroll_percentage: spc,
                mouse_x: mx,
                mouse_y: my,
                url: u,
            })
        }
        _ => Err(ProcessError::MissingColumns {
            path: path.to_string(),
            expected: EXPECTED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            found: headers.to_vec(),
        }),
    }
}

fn parse_row(
    fields: &[String],
    columns: &ColumnIndices,
    path: &str,
    line_no: usize,
) -> Result<RawInteractionRow, ProcessError> {
    let get = |index: usize| -> Result<&str, ProcessError> {
        fields
            .get(index)
            .map(|s| s.as_str())
            .ok_or_else(|| ProcessError::MalformedRow {
                path: path.to_string(),
                line: line_no,
                detail: format!("expected at least {} fields, found {}", index + 1, fields.len()),
            })
    };

    let timestamp = parse_timestamp(get(columns.timestamp)?, path, line_no)?;
    let event = get(columns.event)?.to_string();
    let scroll_position = parse_optional_number(get(columns.scroll_position)?, path, line_no)?;
    let scroll_percentage = parse_optional_number(get(columns.scroll_percentage)?, path, line_no)?;
    let mouse_x = parse_optional_number(get(columns.mouse_x)?, path, line_no)?;
    let mouse_y = parse_optional_number(get(columns.mouse_y)?, path, line_no)?;
    let url = get(columns.url)?.to_string();

    Ok(RawInteractionRow {
        timestamp,
        event,
        scroll_position,
        scroll_percentage,
        mouse_x,
        mouse_y,
        url,
    })
}

/// Parse an absolute interaction timestamp.
///
/// Accepts RFC 3339 and the capture tool's space-separated form
/// (`2024-01-15 14:03:07.250`), with or without fractional seconds.
fn parse_timestamp(value: &str, path: &str, line_no: usize) -> Result<DateTime<Utc>, ProcessError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive.and_utc());
        }
    }
    Err(ProcessError::TimestampParse {
        path: path.to_string(),
        line: line_no,
        value: value.to_string(),
    })
}

/// Parse a numeric field where an empty cell means a missed capture.
fn parse_optional_number(
    value: &str,
    path: &str,
    line_no: usize,
) -> Result<Option<f64>, ProcessError> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<f64>()
        .map(Some)
        .map_err(|_| ProcessError::MalformedRow {
            path: path.to_string(),
            line: line_no,
            detail: format!("not a number: {value:?}"),
        })
}
