//! Session partitioning
//!
//! This module splits the merged, repaired timeline into one session per
//! distinct page context. This is a grouping, not a run-length segmentation:
//! two disjoint visits to the same page produce one combined session.

use std::collections::HashMap;

use tracing::warn;

use crate::types::{AlignedRecord, PageSession, QualityFlag};

/// Group records by page context, preserving intra-group record order.
///
/// Sessions are returned in order of each page context's first appearance in
/// the timeline, so downstream export and rendering are deterministic. Every
/// input record lands in exactly one session.
pub fn partition(records: Vec<AlignedRecord>) -> Vec<PageSession> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<AlignedRecord>> = HashMap::new();

    for record in records {
        if !groups.contains_key(&record.page_context) {
            order.push(record.page_context.clone());
        }
        groups
            .entry(record.page_context.clone())
            .or_default()
            .push(record);
    }

    order
        .into_iter()
        .map(|page_context| {
            let records = groups.remove(&page_context).unwrap_or_default();
            let quality_flags = determine_quality_flags(&records);
            if quality_flags.contains(&QualityFlag::MissingGazeSignal) {
                warn!("no usable gaze signal for {page_context}; heatmap will be skipped");
            }
            PageSession {
                page_context,
                records,
                quality_flags,
            }
        })
        .collect()
}

/// Detect warning-level degeneracies: a column absent in every record of the
/// session survived repair, meaning the source stream had nothing to offer.
fn determine_quality_flags(records: &[AlignedRecord]) -> Vec<QualityFlag> {
    let mut flags = Vec::new();
    if records.is_empty() {
        return flags;
    }

    if records
        .iter()
        .all(|r| r.mean_gaze_x.is_none() && r.mean_gaze_y.is_none())
    {
        flags.push(QualityFlag::MissingGazeSignal);
    }
    if records.iter().all(|r| r.affect.is_none()) {
        flags.push(QualityFlag::MissingAffectSignal);
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AffectScores, EventKind, InteractionSample};
    use chrono::{DateTime, Duration, Utc};
    use pretty_assertions::assert_eq;

    fn record_for(offset_ms: i64, page: &str) -> AlignedRecord {
        let t0 = DateTime::<Utc>::from_timestamp(1_705_327_200, 0).unwrap();
        let mut record = AlignedRecord::from_interaction(InteractionSample {
            timestamp: t0 + Duration::milliseconds(offset_ms),
            event_kind: EventKind::Moved,
            scroll_position: Some(0.0),
            scroll_percentage: Some(0.0),
            pointer_x: Some(0.0),
            pointer_y: Some(0.0),
            page_context: page.to_string(),
        });
        record.mean_gaze_x = Some(100.0);
        record.mean_gaze_y = Some(100.0);
        record.affect = Some(AffectScores::default());
        record
    }

    #[test]
    fn test_partition_completeness() {
        let records = vec![
            record_for(0, "https://example.com/a"),
            record_for(100, "https://example.com/b"),
            record_for(200, "https://example.com/a"),
            record_for(300, "https://example.com/c"),
        ];
        let sessions = partition(records);

        let total: usize = sessions.iter().map(|s| s.records.len()).sum();
        assert_eq!(total, 4);
        assert_eq!(sessions.len(), 3);
    }

    #[test]
    fn test_disjoint_visits_form_one_group() {
        let records = vec![
            record_for(0, "https://example.com/a"),
            record_for(100, "https://example.com/b"),
            record_for(200, "https://example.com/a"),
        ];
        let sessions = partition(records);

        let a = sessions
            .iter()
            .find(|s| s.page_context == "https://example.com/a")
            .unwrap();
        assert_eq!(a.records.len(), 2);
        // Intra-group order follows the original timeline.
        assert!(a.records[0].timestamp < a.records[1].timestamp);
    }

    #[test]
    fn test_sessions_ordered_by_first_appearance() {
        let records = vec![
            record_for(0, "https://example.com/b"),
            record_for(100, "https://example.com/a"),
            record_for(200, "https://example.com/b"),
        ];
        let sessions = partition(records);
        assert_eq!(sessions[0].page_context, "https://example.com/b");
        assert_eq!(sessions[1].page_context, "https://example.com/a");
    }

    #[test]
    fn test_missing_gaze_flagged() {
        let mut degenerate = record_for(0, "https://example.com/a");
        degenerate.mean_gaze_x = None;
        degenerate.mean_gaze_y = None;

        let sessions = partition(vec![degenerate]);
        assert_eq!(sessions[0].quality_flags, vec![QualityFlag::MissingGazeSignal]);
    }

    #[test]
    fn test_partial_gaze_not_flagged() {
        let mut partial = record_for(0, "https://example.com/a");
        partial.mean_gaze_y = None;

        let sessions = partition(vec![partial, record_for(100, "https://example.com/a")]);
        assert!(sessions[0].quality_flags.is_empty());
    }

    #[test]
    fn test_empty_input_yields_no_sessions() {
        assert!(partition(Vec::new()).is_empty());
    }
}
