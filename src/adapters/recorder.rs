//! Pointer-recorder log adapter
//!
//! The raw input recorder appends pointer events in a wall-clock-free textual
//! encoding, one event per line:
//!
//! ```text
//! Mouse moved to x-512, y-384
//! Mouse clicked at x-512, y-384 with Button.left
//! Mouse scrolled at x-512, y-384 with dx-0 dy-2
//! ```
//!
//! This module parses that encoding into typed pointer events and defines the
//! recorder seam itself for capture-side collaborators.

use std::io::{self, Write};

use crate::error::ProcessError;
use crate::types::EventKind;

/// One pointer event decoded from the recorder log (no wall-clock timestamp)
#[derive(Debug, Clone, PartialEq)]
pub struct PointerEvent {
    pub kind: EventKind,
    pub x: f64,
    pub y: f64,
    /// Trailing `with <details>` payload (button, scroll deltas)
    pub details: Option<String>,
}

/// Adapter for the pointer-recorder text log
pub struct RecorderLogAdapter;

impl RecorderLogAdapter {
    /// Parse the full recorder log into pointer events.
    ///
    /// `path` is used only for diagnostics. A line that does not follow the
    /// `<action> at x-<X>, y-<Y> [with <details>]` encoding is fatal.
    pub fn parse(raw: &str, path: &str) -> Result<Vec<PointerEvent>, ProcessError> {
        let mut events = Vec::new();
        for (index, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            events.push(parse_line(line, path, index + 1)?);
        }
        Ok(events)
    }
}

fn parse_line(line: &str, path: &str, line_no: usize) -> Result<PointerEvent, ProcessError> {
    let malformed = |detail: String| ProcessError::MalformedRow {
        path: path.to_string(),
        line: line_no,
        detail,
    };

    let kind = EventKind::from_raw(line);
    if kind == EventKind::Other {
        return Err(malformed(format!("unrecognized pointer action: {line:?}")));
    }

    // Coordinates are the first two `<axis>-<value>` tokens on the line.
    let mut coords = line
        .split_whitespace()
        .filter_map(|token| token.split_once('-'))
        .filter_map(|(_, value)| value.trim_end_matches(',').parse::<f64>().ok());

    let x = coords
        .next()
        .ok_or_else(|| malformed(format!("no x coordinate in {line:?}")))?;
    let y = coords
        .next()
        .ok_or_else(|| malformed(format!("no y coordinate in {line:?}")))?;

    let details = line
        .split_once(" with ")
        .map(|(_, rest)| rest.trim().to_string());

    Ok(PointerEvent {
        kind,
        x,
        y,
        details,
    })
}

/// Append-only recorder of raw pointer events (collaborator seam).
///
/// Implementations must append one encoded line per event and never rewrite
/// earlier lines; the log is read back only after the capture session ends.
pub trait RawInputRecorder {
    fn record_move(&mut self, x: f64, y: f64) -> io::Result<()>;
    fn record_click(&mut self, x: f64, y: f64, button: &str) -> io::Result<()>;
    fn record_scroll(&mut self, x: f64, y: f64, dx: f64, dy: f64) -> io::Result<()>;
}

/// Recorder writing the textual encoding to any byte sink
pub struct TextLogRecorder<W: Write> {
    sink: W,
}

impl<W: Write> TextLogRecorder<W> {
    pub fn new(sink: W) -> Self {
        Self { sink }
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}

impl<W: Write> RawInputRecorder for TextLogRecorder<W> {
    fn record_move(&mut self, x: f64, y: f64) -> io::Result<()> {
        writeln!(self.sink, "Mouse moved to x-{x}, y-{y}")
    }

    fn record_click(&mut self, x: f64, y: f64, button: &str) -> io::Result<()> {
        writeln!(self.sink, "Mouse clicked at x-{x}, y-{y} with {button}")
    }

    fn record_scroll(&mut self, x: f64, y: f64, dx: f64, dy: f64) -> io::Result<()> {
        writeln!(self.sink, "Mouse scrolled at x-{x}, y-{y} with dx-{dx} dy-{dy}")
    }
}
