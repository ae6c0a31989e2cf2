//! Core types for the Gazefuse pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: normalized interaction samples, normalized biometric samples,
//! merged aligned records, and per-page sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel value used by the capture source to denote a lost gaze fix.
///
/// The sentinel never survives the adapter boundary: adapters convert it to
/// `None` and the normalizer drops rows without a valid right-eye fix.
pub const SENSOR_INVALID: f64 = -1.0;

/// Kind of browser interaction event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Moved,
    Clicked,
    Scrolled,
    Other,
}

impl EventKind {
    /// Map a raw `Event` column value onto an event kind.
    ///
    /// Unknown values become `Other`: the event kind does not participate in
    /// any alignment invariant, so an unrecognized label is not a format error.
    pub fn from_raw(raw: &str) -> Self {
        let lower = raw.to_ascii_lowercase();
        if lower.contains("move") {
            EventKind::Moved
        } else if lower.contains("click") {
            EventKind::Clicked
        } else if lower.contains("scroll") {
            EventKind::Scrolled
        } else {
            EventKind::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Moved => "moved",
            EventKind::Clicked => "clicked",
            EventKind::Scrolled => "scrolled",
            EventKind::Other => "other",
        }
    }
}

/// One normalized browser-interaction sample
///
/// Produced by the interaction normalizer from the raw browser log. Ordered by
/// timestamp within a session. Numeric fields stay absent until gap repair;
/// after repair only stream-boundary gaps may remain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionSample {
    /// Capture time in the interaction stream's absolute clock (ground truth)
    pub timestamp: DateTime<Utc>,
    /// Kind of event the browser reported
    pub event_kind: EventKind,
    /// Vertical scroll offset in pixels
    pub scroll_position: Option<f64>,
    /// Scroll depth as a percentage of the page (0-100)
    pub scroll_percentage: Option<f64>,
    /// Pointer x-coordinate in page space
    pub pointer_x: Option<f64>,
    /// Pointer y-coordinate in page space
    pub pointer_y: Option<f64>,
    /// URL of the page active at capture time; the grouping key for sessions
    pub page_context: String,
}

/// Named affect confidences reported by the biometric source (each 0-1)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AffectScores {
    pub anger: f64,
    pub fear: f64,
    pub joy: f64,
    pub sadness: f64,
    pub surprise: f64,
    pub engagement: f64,
    pub confusion: f64,
    pub neutral: f64,
}

/// One normalized biometric sample
///
/// The timestamp lives in the sensor's own clock domain: intervals are
/// correct but the origin is not synchronized to the interaction stream.
/// Retained samples always carry a valid right-eye x fix; the remaining
/// gaze coordinates may individually be absent (single-coordinate dropout)
/// and are repaired after the merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BiometricSample {
    /// Sample time in the sensor's relative clock, microsecond precision
    pub relative_timestamp: DateTime<Utc>,
    /// Affect confidences for this sample
    pub affect: AffectScores,
    /// Right-eye gaze x (guaranteed valid for retained samples)
    pub gaze_right_x: f64,
    /// Right-eye gaze y
    pub gaze_right_y: Option<f64>,
    /// Left-eye gaze x
    pub gaze_left_x: Option<f64>,
    /// Left-eye gaze y
    pub gaze_left_y: Option<f64>,
}

/// One interaction sample merged with its nearest-in-time biometric sample
///
/// Exactly one biometric sample (or none, when the biometric stream is
/// shorter) contributes to each record; the merge never synthesizes values.
/// The derived means are computed strictly after gap repair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignedRecord {
    /// Interaction-clock timestamp (ground truth)
    pub timestamp: DateTime<Utc>,
    pub event_kind: EventKind,
    pub scroll_position: Option<f64>,
    pub scroll_percentage: Option<f64>,
    pub pointer_x: Option<f64>,
    pub pointer_y: Option<f64>,
    pub page_context: String,
    /// Affect confidences from the matched biometric sample
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affect: Option<AffectScores>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gaze_right_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gaze_right_y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gaze_left_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gaze_left_y: Option<f64>,
    /// Arithmetic mean of the two eyes' x coordinates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_gaze_x: Option<f64>,
    /// Arithmetic mean of the two eyes' y coordinates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_gaze_y: Option<f64>,
}

impl AlignedRecord {
    /// Build a record from an interaction sample with all biometric fields absent
    pub fn from_interaction(sample: InteractionSample) -> Self {
        Self {
            timestamp: sample.timestamp,
            event_kind: sample.event_kind,
            scroll_position: sample.scroll_position,
            scroll_percentage: sample.scroll_percentage,
            pointer_x: sample.pointer_x,
            pointer_y: sample.pointer_y,
            page_context: sample.page_context,
            affect: None,
            gaze_right_x: None,
            gaze_right_y: None,
            gaze_left_x: None,
            gaze_left_y: None,
            mean_gaze_x: None,
            mean_gaze_y: None,
        }
    }
}

/// Quality flag indicating a warning-level degeneracy in a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityFlag {
    /// Every record in the session is missing the derived gaze means
    /// (the biometric stream had no valid fixation for this page)
    MissingGazeSignal,
    /// Every record in the session is missing affect confidences
    MissingAffectSignal,
}

/// An ordered run of aligned records sharing one page context
///
/// Derived by partitioning the merged timeline; never mutated after creation.
/// Two disjoint visits to the same page produce one combined session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSession {
    /// URL shared by every record in this session
    pub page_context: String,
    /// Records in original timeline order
    pub records: Vec<AlignedRecord>,
    /// Warning-level degeneracies detected at partition time
    pub quality_flags: Vec<QualityFlag>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_from_raw() {
        assert_eq!(EventKind::from_raw("Mouse moved"), EventKind::Moved);
        assert_eq!(EventKind::from_raw("mousemove"), EventKind::Moved);
        assert_eq!(EventKind::from_raw("click"), EventKind::Clicked);
        assert_eq!(EventKind::from_raw("Scroll"), EventKind::Scrolled);
        assert_eq!(EventKind::from_raw("keypress"), EventKind::Other);
    }

    #[test]
    fn test_event_kind_serialization() {
        let json = serde_json::to_string(&EventKind::Scrolled).unwrap();
        assert_eq!(json, "\"scrolled\"");

        let parsed: EventKind = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, EventKind::Scrolled);
    }

    #[test]
    fn test_aligned_record_from_interaction() {
        let sample = InteractionSample {
            timestamp: Utc::now(),
            event_kind: EventKind::Moved,
            scroll_position: Some(120.0),
            scroll_percentage: Some(15.0),
            pointer_x: Some(640.0),
            pointer_y: Some(360.0),
            page_context: "https://example.com/home".to_string(),
        };

        let record = AlignedRecord::from_interaction(sample);
        assert_eq!(record.scroll_position, Some(120.0));
        assert!(record.affect.is_none());
        assert!(record.gaze_right_x.is_none());
        assert!(record.mean_gaze_x.is_none());
    }

    #[test]
    fn test_absent_biometric_fields_skipped_in_json() {
        let record = AlignedRecord::from_interaction(InteractionSample {
            timestamp: Utc::now(),
            event_kind: EventKind::Other,
            scroll_position: None,
            scroll_percentage: None,
            pointer_x: None,
            pointer_y: None,
            page_context: "https://example.com".to_string(),
        });

        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("mean_gaze_x"));
        assert!(!json.contains("affect"));
    }
}
