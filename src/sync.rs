//! Stream synchronization
//!
//! This module merges the two normalized streams on nearest-timestamp
//! matching. Only the interaction stream's absolute clock is trusted as
//! ground truth; the biometric stream contributes its elapsed-time shape,
//! re-anchored onto the interaction stream's origin.

use chrono::{DateTime, Duration, Utc};

use crate::types::{AlignedRecord, BiometricSample, InteractionSample};

/// Synchronizer for the interaction and biometric streams
pub struct Synchronizer;

impl Synchronizer {
    /// Merge each interaction sample with its nearest-in-time biometric sample.
    ///
    /// The biometric stream is re-anchored first: each sample's elapsed
    /// duration from the stream's own first sample is added to
    /// `interaction[0].timestamp`. This assumes both recordings started
    /// simultaneously (or with a fixed, ignorable skew) and that only the
    /// elapsed-time shape of the biometric stream is meaningful.
    ///
    /// The merge is left-anchored: the output has exactly one record per
    /// interaction sample, and each record receives the closest biometric
    /// sample in either direction (ties resolve to the earlier sample). No
    /// synthetic biometric value is ever interpolated here; records left
    /// without a match (empty biometric stream) keep absent biometric fields
    /// for downstream repair.
    pub fn align(
        interaction: Vec<InteractionSample>,
        biometric: Vec<BiometricSample>,
    ) -> Vec<AlignedRecord> {
        if interaction.is_empty() {
            return Vec::new();
        }

        let mut interaction = interaction;
        interaction.sort_by_key(|s| s.timestamp);

        let mut biometric = biometric;
        biometric.sort_by_key(|s| s.relative_timestamp);

        let anchored = anchor_biometric(&biometric, interaction[0].timestamp);
        nearest_merge(interaction, anchored)
    }
}

/// Express each biometric sample in the interaction stream's clock domain.
fn anchor_biometric(
    biometric: &[BiometricSample],
    anchor: DateTime<Utc>,
) -> Vec<(DateTime<Utc>, BiometricSample)> {
    let origin = match biometric.first() {
        Some(first) => first.relative_timestamp,
        None => return Vec::new(),
    };

    biometric
        .iter()
        .map(|sample| {
            let time_from_start = sample.relative_timestamp - origin;
            (anchor + time_from_start, sample.clone())
        })
        .collect()
}

/// Pair every interaction sample with the closest anchored biometric sample.
///
/// Both inputs must be sorted ascending by timestamp. The scan pointer
/// advances only on a strictly smaller absolute distance, which resolves
/// equidistant candidates to the earlier biometric sample.
fn nearest_merge(
    interaction: Vec<InteractionSample>,
    anchored: Vec<(DateTime<Utc>, BiometricSample)>,
) -> Vec<AlignedRecord> {
    let mut records = Vec::with_capacity(interaction.len());
    let mut cursor = 0usize;

    for sample in interaction {
        if anchored.is_empty() {
            records.push(AlignedRecord::from_interaction(sample));
            continue;
        }

        while cursor + 1 < anchored.len()
            && distance(anchored[cursor + 1].0, sample.timestamp)
                < distance(anchored[cursor].0, sample.timestamp)
        {
            cursor += 1;
        }

        let (_, matched) = &anchored[cursor];
        let mut record = AlignedRecord::from_interaction(sample);
        record.affect = Some(matched.affect);
        record.gaze_right_x = Some(matched.gaze_right_x);
        record.gaze_right_y = matched.gaze_right_y;
        record.gaze_left_x = matched.gaze_left_x;
        record.gaze_left_y = matched.gaze_left_y;
        records.push(record);
    }

    records
}

fn distance(a: DateTime<Utc>, b: DateTime<Utc>) -> Duration {
    (a - b).abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AffectScores, EventKind};
    use pretty_assertions::assert_eq;

    fn t0() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_705_327_200, 0).unwrap()
    }

    fn interaction_at(offset_ms: i64) -> InteractionSample {
        InteractionSample {
            timestamp: t0() + Duration::milliseconds(offset_ms),
            event_kind: EventKind::Moved,
            scroll_position: Some(0.0),
            scroll_percentage: Some(0.0),
            pointer_x: Some(0.0),
            pointer_y: Some(0.0),
            page_context: "https://example.com/a".to_string(),
        }
    }

    fn biometric_at(relative_offset_ms: i64, gaze_right_x: f64) -> BiometricSample {
        // The sensor clock origin is deliberately unrelated to t0.
        let sensor_origin = DateTime::<Utc>::from_timestamp(978_307_200, 0).unwrap();
        BiometricSample {
            relative_timestamp: sensor_origin + Duration::milliseconds(relative_offset_ms),
            affect: AffectScores {
                joy: 0.4,
                ..Default::default()
            },
            gaze_right_x,
            gaze_right_y: Some(384.0),
            gaze_left_x: Some(508.0),
            gaze_left_y: Some(380.0),
        }
    }

    #[test]
    fn test_merge_cardinality_matches_interaction() {
        let interaction: Vec<_> = (0..5).map(|i| interaction_at(i * 100)).collect();
        let biometric: Vec<_> = (0..2).map(|i| biometric_at(i * 100, 512.0)).collect();
        assert_eq!(Synchronizer::align(interaction, biometric).len(), 5);

        let interaction: Vec<_> = (0..5).map(|i| interaction_at(i * 100)).collect();
        assert_eq!(Synchronizer::align(interaction, Vec::new()).len(), 5);
    }

    #[test]
    fn test_empty_interaction_yields_empty() {
        let biometric = vec![biometric_at(0, 512.0)];
        assert!(Synchronizer::align(Vec::new(), biometric).is_empty());
    }

    #[test]
    fn test_empty_biometric_leaves_fields_absent() {
        let interaction = vec![interaction_at(0), interaction_at(100)];
        let records = Synchronizer::align(interaction, Vec::new());
        assert!(records.iter().all(|r| r.affect.is_none()));
        assert!(records.iter().all(|r| r.gaze_right_x.is_none()));
    }

    #[test]
    fn test_nearest_match_assignment() {
        // Interaction at [T0, T0+1s, T0+5s]; anchored biometric at
        // [T0+0.4s, T0+4.9s]: the first biometric sample serves the first two
        // interaction samples, the second serves the last.
        let interaction = vec![
            interaction_at(0),
            interaction_at(1_000),
            interaction_at(5_000),
        ];
        let anchored = vec![
            (t0() + Duration::milliseconds(400), biometric_at(0, 111.0)),
            (t0() + Duration::milliseconds(4_900), biometric_at(100, 222.0)),
        ];
        let records = nearest_merge(interaction, anchored);
        assert_eq!(records[0].gaze_right_x, Some(111.0));
        assert_eq!(records[1].gaze_right_x, Some(111.0));
        assert_eq!(records[2].gaze_right_x, Some(222.0));
    }

    #[test]
    fn test_tie_resolves_to_earlier_sample() {
        let interaction = vec![interaction_at(1_000)];
        let anchored = vec![
            (t0(), biometric_at(0, 111.0)),
            (t0() + Duration::milliseconds(2_000), biometric_at(100, 222.0)),
        ];
        let records = nearest_merge(interaction, anchored);
        assert_eq!(records[0].gaze_right_x, Some(111.0));
    }

    #[test]
    fn test_reanchoring_uses_interaction_origin() {
        // Biometric offsets 0 ms and 90 ms from its own first sample land at
        // T0 and T0+90ms regardless of the sensor clock's absolute origin.
        let interaction = vec![interaction_at(0), interaction_at(100)];
        let biometric = vec![biometric_at(0, 111.0), biometric_at(90, 222.0)];
        let records = Synchronizer::align(interaction, biometric);
        // T0+100ms is 10 ms from the second anchored sample, 100 ms from the first.
        assert_eq!(records[0].gaze_right_x, Some(111.0));
        assert_eq!(records[1].gaze_right_x, Some(222.0));
    }

    #[test]
    fn test_affect_carried_from_matched_sample() {
        let interaction = vec![interaction_at(0)];
        let biometric = vec![biometric_at(0, 512.0)];
        let records = Synchronizer::align(interaction, biometric);
        assert_eq!(records[0].affect.unwrap().joy, 0.4);
    }
}
