//! Biometric log adapter
//!
//! Parses the raw eye-tracker/affect CSV into typed rows. Timestamps arrive
//! as millisecond-epoch values; gaze coordinates use `-1` as a tracking-loss
//! sentinel. The sentinel is converted to `None` here and never propagates
//! past this boundary.

use super::{find_column, split_delimited};
use crate::error::ProcessError;
use crate::types::{AffectScores, SENSOR_INVALID};

/// Expected biometric log columns (vendor prefixes on gaze columns tolerated)
const EXPECTED_COLUMNS: [&str; 13] = [
    "Timestamp",
    "Anger",
    "Fear",
    "Joy",
    "Sadness",
    "Surprise",
    "Engagement",
    "Confusion",
    "Neutral",
    "GazeRightX",
    "GazeRightY",
    "GazeLeftX",
    "GazeLeftY",
];

/// One raw row of the biometric log
///
/// Gaze coordinates are `None` where the source reported the sentinel or an
/// empty cell; affect confidences are required on every row.
#[derive(Debug, Clone)]
pub struct RawBiometricRow {
    /// Millisecond-epoch timestamp in the sensor's own clock domain
    pub timestamp_ms: f64,
    pub affect: AffectScores,
    pub gaze_right_x: Option<f64>,
    pub gaze_right_y: Option<f64>,
    pub gaze_left_x: Option<f64>,
    pub gaze_left_y: Option<f64>,
}

/// Adapter for the biometric CSV log
pub struct BiometricLogAdapter;

impl BiometricLogAdapter {
    /// Parse the full log text into raw rows.
    ///
    /// `path` is used only for diagnostics. A malformed row is fatal for the
    /// whole stream.
    pub fn parse(raw: &str, path: &str) -> Result<Vec<RawBiometricRow>, ProcessError> {
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

struct ColumnIndices {
    timestamp: usize,
    affect: [usize; 8],
    gaze: [usize; 4],
}

fn locate_columns(headers: &[String], path: &str) -> Result<ColumnIndices, ProcessError> {
    let missing = || ProcessError::MissingColumns {
        path: path.to_string(),
        expected: EXPECTED_COLUMNS.iter().map(|c| c.to_string()).collect(),
        found: headers.to_vec(),
    };

    let timestamp = find_column(headers, "timestamp").ok_or_else(missing)?;

    let affect_keys = [
        "anger",
        "fear",
        "joy",
        "sadness",
        "surprise",
        "engagement",
        "confusion",
        "neutral",
    ];
    let mut affect = [0usize; 8];
    for (slot, key) in affect.iter_mut().zip(affect_keys) {
        *slot = find_column(headers, key).ok_or_else(missing)?;
    }

    let gaze_keys = ["gazerightx", "gazerighty", "gazeleftx", "gazelefty"];
    let mut gaze = [0usize; 4];
    for (slot, key) in gaze.iter_mut().zip(gaze_keys) {
        *slot = find_column(headers, key).ok_or_else(missing)?;
    }

    Ok(ColumnIndices {
        timestamp,
        affect,
        gaze,
    })
}

fn parse_row(
    fields: &[String],
    columns: &ColumnIndices,
    path: &str,
    line_no: usize,
) -> Result<RawBiometricRow, ProcessError> {
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

    let required = |value: &str| -> Result<f64, ProcessError> {
        value.parse::<f64>().map_err(|_| ProcessError::MalformedRow {
            path: path.to_string(),
            line: line_no,
            detail: format!("not a number: {value:?}"),
        })
    };

    let timestamp_ms = required(get(columns.timestamp)?)?;

    let mut scores = [0.0f64; 8];
    for (slot, &index) in scores.iter_mut().zip(&columns.affect) {
        *slot = required(get(index)?)?;
    }
    let affect = AffectScores {
        anger: scores[0],
        fear: scores[1],
        joy: scores[2],
        sadness: scores[3],
        surprise: scores[4],
        engagement: scores[5],
        confusion: scores[6],
        neutral: scores[7],
    };

    let mut gaze = [None; 4];
    for (slot, &index) in gaze.iter_mut().zip(&columns.gaze) {
        *slot = parse_gaze(get(index)?, path, line_no)?;
    }

    Ok(RawBiometricRow {
        timestamp_ms,
        affect,
        gaze_right_x: gaze[0],
        gaze_right_y: gaze[1],
        gaze_left_x: gaze[2],
        gaze_left_y: gaze[3],
    })
}

/// Parse a gaze coordinate, mapping the tracking-loss sentinel to `None`.
fn parse_gaze(value: &str, path: &str, line_no: usize) -> Result<Option<f64>, ProcessError> {
    if value.is_empty() {
        return Ok(None);
    }
    let parsed = value.parse::<f64>().map_err(|_| ProcessError::MalformedRow {
        path: path.to_string(),
        line: line_no,
        detail: format!("not a number: {value:?}"),
    })?;
    if parsed == SENSOR_INVALID {
        Ok(None)
    } else {
        Ok(Some(parsed))
    }
}
