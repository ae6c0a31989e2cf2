//! Heatmap renderer collaborator seam
//!
//! The density visualization itself is owned by an external renderer; the
//! core extracts the render-ready gaze triples from a session and defines
//! the seam the renderer plugs into.

use thiserror::Error;

use crate::snapshot::PageImage;
use crate::types::PageSession;

/// One gaze point ready for density rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GazeSample {
    /// Mean gaze x in page coordinates
    pub x: f64,
    /// Mean gaze y in page coordinates
    pub y: f64,
    /// Scroll depth at the time of the fixation (0-100)
    pub scroll_percentage: f64,
}

/// Error from the external renderer
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("render failed: {0}")]
    Render(String),
}

/// Renderer producing a density overlay from gaze samples and a page snapshot
pub trait HeatmapRenderer {
    fn render(
        &mut self,
        page_context: &str,
        samples: &[GazeSample],
        snapshot: &PageImage,
    ) -> Result<PageImage, RenderError>;
}

/// Extract the render-ready triples from a session.
///
/// Records still missing a derived mean contribute no samples, so a session
/// whose biometric stream was entirely empty or invalid yields an empty
/// vector and callers naturally skip rendering it.
pub fn gaze_samples(session: &PageSession) -> Vec<GazeSample> {
    session
        .records
        .iter()
        .filter_map(|record| {
            Some(GazeSample {
                x: record.mean_gaze_x?,
                y: record.mean_gaze_y?,
                scroll_percentage: record.scroll_percentage?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AlignedRecord, EventKind, InteractionSample};
    use chrono::{DateTime, Utc};
    use pretty_assertions::assert_eq;

    fn record(mean_gaze: Option<(f64, f64)>, scroll_percentage: Option<f64>) -> AlignedRecord {
        let mut record = AlignedRecord::from_interaction(InteractionSample {
            timestamp: DateTime::<Utc>::from_timestamp(1_705_327_200, 0).unwrap(),
            event_kind: EventKind::Moved,
            scroll_position: Some(0.0),
            scroll_percentage,
            pointer_x: Some(0.0),
            pointer_y: Some(0.0),
            page_context: "https://example.com/a".to_string(),
        });
        if let Some((x, y)) = mean_gaze {
            record.mean_gaze_x = Some(x);
            record.mean_gaze_y = Some(y);
        }
        record
    }

    fn session_of(records: Vec<AlignedRecord>) -> PageSession {
        PageSession {
            page_context: "https://example.com/a".to_string(),
            records,
            quality_flags: Vec::new(),
        }
    }

    #[test]
    fn test_extracts_triples() {
        let session = session_of(vec![
            record(Some((100.0, 200.0)), Some(10.0)),
            record(Some((110.0, 210.0)), Some(12.0)),
        ]);
        let samples = gaze_samples(&session);
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].x, 100.0);
        assert_eq!(samples[1].scroll_percentage, 12.0);
    }

    #[test]
    fn test_degenerate_session_yields_no_samples() {
        let session = session_of(vec![record(None, Some(10.0)), record(None, Some(12.0))]);
        assert!(gaze_samples(&session).is_empty());
    }

    #[test]
    fn test_records_without_scroll_depth_are_skipped() {
        let session = session_of(vec![
            record(Some((100.0, 200.0)), None),
            record(Some((110.0, 210.0)), Some(12.0)),
        ]);
        assert_eq!(gaze_samples(&session).len(), 1);
    }
}
