//! Post-merge gap repair and feature derivation
//!
//! This module closes the gaps the nearest-timestamp merge leaves behind and
//! derives the composite gaze signals:
//! - Linear interpolation per gaze column between nearest valid neighbors
//! - Forward-fill then backward-fill across all biometric columns
//! - Mean gaze position, computed strictly after repair

use crate::normalizer::{backward_fill, forward_fill};
use crate::types::{AffectScores, AlignedRecord};

/// Every numeric column of the merged timeline, as mutable field accessors
const COLUMNS: [fn(&mut AlignedRecord) -> &mut Option<f64>; 8] = [
    |r| &mut r.gaze_right_x,
    |r| &mut r.gaze_right_y,
    |r| &mut r.gaze_left_x,
    |r| &mut r.gaze_left_y,
    |r| &mut r.scroll_position,
    |r| &mut r.scroll_percentage,
    |r| &mut r.pointer_x,
    |r| &mut r.pointer_y,
];

/// Gap repair for the merged timeline
pub struct GapRepair;

impl GapRepair {
    /// Close absent biometric values and derive the mean gaze signals.
    ///
    /// Interpolation weights uniformly by record index, not by true elapsed
    /// time: records are already time-ordered and closely spaced. The fill
    /// passes close the boundary gaps interpolation cannot reach (no upper or
    /// lower neighbor). A column that is absent in every record stays absent
    /// (degenerate case), and the derived means stay absent with it.
    ///
    /// Idempotent: repairing an already-repaired sequence changes nothing.
    pub fn repair(mut records: Vec<AlignedRecord>) -> Vec<AlignedRecord> {
        interpolate_column(&mut records, |r| &mut r.gaze_right_x);
        interpolate_column(&mut records, |r| &mut r.gaze_right_y);
        interpolate_column(&mut records, |r| &mut r.gaze_left_x);
        interpolate_column(&mut records, |r| &mut r.gaze_left_y);

        // Full fill passes over every numeric column; the interaction columns
        // are normally closed upstream, so these are no-ops for them unless
        // the caller skipped the interaction repair.
        for field in COLUMNS {
            forward_fill(&mut records, field);
            backward_fill(&mut records, field);
        }

        // The eight affect confidences come from one sensor frame and move
        // together, so they fill as a unit.
        forward_fill_affect(&mut records);
        backward_fill_affect(&mut records);

        derive_mean_gaze(&mut records);
        records
    }
}

/// Linearly interpolate absent values between the nearest valid neighbors.
fn interpolate_column<F>(records: &mut [AlignedRecord], mut field: F)
where
    F: FnMut(&mut AlignedRecord) -> &mut Option<f64>,
{
    let values: Vec<Option<f64>> = records.iter_mut().map(|r| *field(r)).collect();

    let valid_indices: Vec<usize> = values
        .iter()
        .enumerate()
        .filter_map(|(index, value)| value.map(|_| index))
        .collect();

    let mut filled = values.clone();
    for pair in valid_indices.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        if hi <= lo + 1 {
            continue;
        }
        if let (Some(a), Some(b)) = (values[lo], values[hi]) {
            let span = (hi - lo) as f64;
            for k in lo + 1..hi {
                let fraction = (k - lo) as f64 / span;
                filled[k] = Some(a + (b - a) * fraction);
            }
        }
    }

    for (record, value) in records.iter_mut().zip(filled) {
        *field(record) = value;
    }
}

fn forward_fill_affect(records: &mut [AlignedRecord]) {
    let mut last: Option<AffectScores> = None;
    for record in records.iter_mut() {
        match record.affect {
            Some(affect) => last = Some(affect),
            None => record.affect = last,
        }
    }
}

fn backward_fill_affect(records: &mut [AlignedRecord]) {
    let mut next: Option<AffectScores> = None;
    for record in records.iter_mut().rev() {
        match record.affect {
            Some(affect) => next = Some(affect),
            None => record.affect = next,
        }
    }
}

/// Derive the two-eye mean for each axis.
///
/// Runs strictly after repair so no derived value is based on an unrepaired
/// absence; if either eye's column stayed absent (degenerate stream), the
/// mean stays absent rather than fabricating a position.
fn derive_mean_gaze(records: &mut [AlignedRecord]) {
    for record in records.iter_mut() {
        record.mean_gaze_x = match (record.gaze_right_x, record.gaze_left_x) {
            (Some(right), Some(left)) => Some((right + left) / 2.0),
            _ => None,
        };
        record.mean_gaze_y = match (record.gaze_right_y, record.gaze_left_y) {
            (Some(right), Some(left)) => Some((right + left) / 2.0),
            _ => None,
        };
    }
}
