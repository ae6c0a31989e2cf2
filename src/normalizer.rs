//! Stream normalization
//!
//! This module normalizes the two raw capture streams into typed samples:
//! - Biometric: boundary trim, tracking-loss row drop, relative-clock
//!   timestamps with microsecond precision
//! - Interaction: page-context assignment and the context-aware fill rules
//!   for scroll and pointer columns

use chrono::{DateTime, Duration, Utc};

use crate::adapters::{PointerEvent, RawBiometricRow, RawInteractionRow};
use crate::types::{BiometricSample, EventKind, InteractionSample};

/// Leading records dropped from the raw biometric stream (sensor warm-up)
pub const WARMUP_TRIM: usize = 1;

/// Trailing records dropped from the raw biometric stream (sensor cooldown)
pub const COOLDOWN_TRIM: usize = 2;

/// Normalizer for the biometric stream
pub struct BiometricNormalizer;

impl BiometricNormalizer {
    /// Normalize raw biometric rows into samples on the sensor's relative clock.
    ///
    /// The first record and the last two records are dropped unconditionally,
    /// then any row without a valid right-eye x fix: a lost fixation has no
    /// salvageable position, so such rows are dropped rather than repaired.
    pub fn normalize(rows: Vec<RawBiometricRow>) -> Vec<BiometricSample> {
        if rows.len() <= WARMUP_TRIM + COOLDOWN_TRIM {
            return Vec::new();
        }
        let end = rows.len() - COOLDOWN_TRIM;

        rows[WARMUP_TRIM..end]
            .iter()
            .filter_map(|row| {
                let gaze_right_x = row.gaze_right_x?;
                let relative_timestamp = ms_epoch_to_utc(row.timestamp_ms)?;
                Some(BiometricSample {
                    relative_timestamp,
                    affect: row.affect,
                    gaze_right_x,
                    gaze_right_y: row.gaze_right_y,
                    gaze_left_x: row.gaze_left_x,
                    gaze_left_y: row.gaze_left_y,
                })
            })
            .collect()
    }
}

/// Convert a millisecond-epoch value to UTC, keeping microsecond precision.
fn ms_epoch_to_utc(timestamp_ms: f64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_micros((timestamp_ms * 1000.0).round() as i64)
}

/// Normalizer for the browser interaction stream
pub struct InteractionNormalizer;

impl InteractionNormalizer {
    /// Normalize raw interaction rows into timestamp-ordered samples.
    pub fn normalize(rows: Vec<RawInteractionRow>) -> Vec<InteractionSample> {
        let mut samples: Vec<InteractionSample> = rows
            .into_iter()
            .map(|row| InteractionSample {
                timestamp: row.timestamp,
                event_kind: EventKind::from_raw(&row.event),
                scroll_position: row.scroll_position,
                scroll_percentage: row.scroll_percentage,
                pointer_x: row.mouse_x,
                pointer_y: row.mouse_y,
                page_context: row.url,
            })
            .collect();

        samples.sort_by_key(|s| s.timestamp);
        samples
    }

    /// Build interaction samples from a recorder log.
    ///
    /// The recorder encoding is wall-clock-free, so timestamps are synthesized
    /// as evenly spaced ticks anchored at `session_start`. Scroll columns stay
    /// absent and are closed by the usual fill rules.
    pub fn from_pointer_events(
        events: &[PointerEvent],
        session_start: DateTime<Utc>,
        sample_interval: Duration,
        page_context: &str,
    ) -> Vec<InteractionSample> {
        events
            .iter()
            .enumerate()
            .map(|(index, event)| InteractionSample {
                timestamp: session_start + sample_interval * index as i32,
                event_kind: event.kind,
                scroll_position: None,
                scroll_percentage: None,
                pointer_x: Some(event.x),
                pointer_y: Some(event.y),
                page_context: page_context.to_string(),
            })
            .collect()
    }

    /// Close gaps in the scroll and pointer columns.
    ///
    /// Scroll percentage: within each maximal contiguous run sharing one page
    /// context, a missing value on the run's first sample becomes 0 (a freshly
    /// loaded page starts unscrolled) - only that first value; remaining gaps
    /// carry the last valid value forward. Scroll position and pointer
    /// coordinates have no domain default, so they borrow from temporally
    /// adjacent observations: forward-fill, then a backward-fill pass to close
    /// leading gaps.
    pub fn repair_gaps(mut samples: Vec<InteractionSample>) -> Vec<InteractionSample> {
        zero_fill_run_starts(&mut samples);
        forward_fill(&mut samples, |s| &mut s.scroll_percentage);

        forward_fill(&mut samples, |s| &mut s.scroll_position);
        backward_fill(&mut samples, |s| &mut s.scroll_position);
        forward_fill(&mut samples, |s| &mut s.pointer_x);
        backward_fill(&mut samples, |s| &mut s.pointer_x);
        forward_fill(&mut samples, |s| &mut s.pointer_y);
        backward_fill(&mut samples, |s| &mut s.pointer_y);

        samples
    }
}

/// Zero the scroll percentage on the first sample of each page-context run
/// when it is missing.
fn zero_fill_run_starts(samples: &mut [InteractionSample]) {
    for index in 0..samples.len() {
        let run_start =
            index == 0 || samples[index - 1].page_context != samples[index].page_context;
        if run_start && samples[index].scroll_percentage.is_none() {
            samples[index].scroll_percentage = Some(0.0);
        }
    }
}

/// Carry the last valid value forward over absent slots.
pub(crate) fn forward_fill<T, F>(items: &mut [T], mut field: F)
where
    F: FnMut(&mut T) -> &mut Option<f64>,
{
    let mut last = None;
    for item in items.iter_mut() {
        let slot = field(item);
        match *slot {
            Some(value) => last = Some(value),
            None => *slot = last,
        }
    }
}

/// Borrow the first valid value backward over leading absent slots.
pub(crate) fn backward_fill<T, F>(items: &mut [T], mut field: F)
where
    F: FnMut(&mut T) -> &mut Option<f64>,
{
    let mut next = None;
    for item in items.iter_mut().rev() {
        let slot = field(item);
        match *slot {
            Some(value) => next = Some(value),
            None => *slot = next,
        }
    }
}
