//! Pipeline orchestration
//!
//! This module provides the public API for Gazefuse. It wires the stages
//! end to end: adapter parsing → stream normalization → nearest-timestamp
//! alignment → gap repair → session partitioning.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::adapters::{BiometricLogAdapter, InteractionLogAdapter};
use crate::error::ProcessError;
use crate::export;
use crate::normalizer::{BiometricNormalizer, InteractionNormalizer};
use crate::partition::partition;
use crate::repair::GapRepair;
use crate::snapshot::{capture_with_retries, PageImage, PageSnapshot};
use crate::sync::Synchronizer;
use crate::types::PageSession;

/// Tunable pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Retry budget for the page snapshot service
    pub snapshot_attempts: u32,
    /// Field delimiter for the per-page export files
    pub delimiter: char,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            snapshot_attempts: 3,
            delimiter: ',',
        }
    }
}

/// Summary of one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique identifier for this run
    pub run_id: Uuid,
    /// When the run completed
    pub computed_at: DateTime<Utc>,
    /// Interaction samples after normalization
    pub interaction_samples: usize,
    /// Biometric samples retained after trim and sentinel filtering
    pub biometric_samples: usize,
    /// Records in the merged timeline (equals `interaction_samples`)
    pub aligned_records: usize,
    /// Distinct page contexts
    pub sessions: usize,
    /// Page contexts carrying warning-level quality flags
    pub flagged_sessions: Vec<String>,
}

/// Result of a full pipeline run
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub sessions: Vec<PageSession>,
    pub report: RunReport,
}

/// Outcome of one snapshot capture in a per-URL loop
#[derive(Debug)]
pub struct SnapshotOutcome {
    pub page_context: String,
    pub result: Result<PageImage, ProcessError>,
}

/// Align two raw session logs into per-page sessions.
///
/// Convenience wrapper over [`SessionProcessor`] with default settings; the
/// log names are used in diagnostics only.
///
/// # Example
/// ```ignore
/// let output = align_session_logs(&web_csv, &imotions_csv)?;
/// for session in &output.sessions {
///     println!("{}: {} records", session.page_context, session.records.len());
/// }
/// ```
pub fn align_session_logs(
    interaction_csv: &str,
    biometric_csv: &str,
) -> Result<RunOutput, ProcessError> {
    SessionProcessor::new().process_logs(
        interaction_csv,
        "<interaction>",
        biometric_csv,
        "<biometric>",
    )
}

/// Processor wiring the alignment stages together
pub struct SessionProcessor {
    config: PipelineConfig,
}

impl Default for SessionProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionProcessor {
    /// Create a processor with default settings
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
        }
    }

    /// Create a processor with specific settings
    pub fn with_config(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the full pipeline over raw log text.
    ///
    /// Pipeline stages:
    /// 1. Adapters - parse raw logs into typed rows (structural errors abort here)
    /// 2. Normalizers - trim/filter the biometric stream, fill interaction gaps
    /// 3. Synchronizer - re-anchor and nearest-merge the two streams
    /// 4. GapRepair - interpolate/fill biometric columns, derive mean gaze
    /// 5. Partition - one session per page context
    pub fn process_logs(
        &self,
        interaction_raw: &str,
        interaction_path: &str,
        biometric_raw: &str,
        biometric_path: &str,
    ) -> Result<RunOutput, ProcessError> {
        // Stage 1: parse both logs before any alignment (fail fast on format)
        let interaction_rows = InteractionLogAdapter::parse(interaction_raw, interaction_path)?;
        let biometric_rows = BiometricLogAdapter::parse(biometric_raw, biometric_path)?;

        // Stage 2: normalize
        let biometric = BiometricNormalizer::normalize(biometric_rows);
        let interaction = InteractionNormalizer::normalize(interaction_rows);
        let interaction = InteractionNormalizer::repair_gaps(interaction);

        let interaction_samples = interaction.len();
        let biometric_samples = biometric.len();
        debug!("normalized {interaction_samples} interaction / {biometric_samples} biometric samples");

        // Stage 3: align on the interaction clock
        let merged = Synchronizer::align(interaction, biometric);

        // Stage 4: repair gaps and derive mean gaze
        let repaired = GapRepair::repair(merged);
        let aligned_records = repaired.len();

        // Stage 5: partition by page context
        let sessions = partition(repaired);
        debug!("partitioned {aligned_records} records into {} sessions", sessions.len());

        let flagged_sessions = sessions
            .iter()
            .filter(|s| !s.quality_flags.is_empty())
            .map(|s| s.page_context.clone())
            .collect();

        let report = RunReport {
            run_id: Uuid::new_v4(),
            computed_at: Utc::now(),
            interaction_samples,
            biometric_samples,
            aligned_records,
            sessions: sessions.len(),
            flagged_sessions,
        };

        Ok(RunOutput { sessions, report })
    }

    /// Run the full pipeline over log files on disk.
    pub fn process_files(
        &self,
        interaction_path: &Path,
        biometric_path: &Path,
    ) -> Result<RunOutput, ProcessError> {
        let interaction_raw = fs::read_to_string(interaction_path)?;
        let biometric_raw = fs::read_to_string(biometric_path)?;
        self.process_logs(
            &interaction_raw,
            &interaction_path.to_string_lossy(),
            &biometric_raw,
            &biometric_path.to_string_lossy(),
        )
    }

    /// Write one delimited file per session into `out_dir`.
    pub fn export(
        &self,
        sessions: &[PageSession],
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>, ProcessError> {
        export::write_sessions(sessions, out_dir, self.config.delimiter)
    }

    /// Capture a snapshot for every session's page.
    ///
    /// Failures are isolated per URL: one page exhausting its retry budget
    /// never blocks the remaining pages.
    pub fn capture_snapshots(
        &self,
        service: &mut dyn PageSnapshot,
        sessions: &[PageSession],
    ) -> Vec<SnapshotOutcome> {
        sessions
            .iter()
            .map(|session| {
                let result = capture_with_retries(
                    service,
                    &session.page_context,
                    self.config.snapshot_attempts,
                );
                if let Err(err) = &result {
                    warn!("skipping {}: {err}", session.page_context);
                }
                SnapshotOutcome {
                    page_context: session.page_context.clone(),
                    result,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::SnapshotError;
    use crate::types::QualityFlag;
    use pretty_assertions::assert_eq;

    const INTERACTION_HEADER: &str =
        "Time (UTC),Event,Scroll Position,Scroll Percentage,Mouse X,Mouse Y,URL";
    const BIOMETRIC_HEADER: &str =
        "Timestamp,Anger,Fear,Joy,Sadness,Surprise,Engagement,Confusion,Neutral,\
         GazeRightX,GazeRightY,GazeLeftX,GazeLeftY";

    fn interaction_log() -> String {
        format!(
            "{INTERACTION_HEADER}\n\
             2024-01-15 14:00:00.000,scroll,,,640,360,https://example.com/a\n\
             2024-01-15 14:00:01.000,mousemove,120,10,650,365,https://example.com/a\n\
             2024-01-15 14:00:02.000,scroll,,,400,300,https://example.com/b\n\
             2024-01-15 14:00:03.000,mousemove,80,5,410,310,https://example.com/b\n"
        )
    }

    fn biometric_log() -> String {
        // Epoch origin differs from the interaction clock on purpose; offsets
        // are 33 ms apart. First row and last two rows are trim fodder.
        let mut log = format!("{BIOMETRIC_HEADER}\n");
        for i in 0..8 {
            let ts = 1_600_000_000_000u64 + i * 33;
            log.push_str(&format!(
                "{ts},0.1,0.0,0.6,0.0,0.0,0.8,0.1,0.2,512,384,508,380\n"
            ));
        }
        log
    }

    #[test]
    fn test_end_to_end_alignment() {
        let output = align_session_logs(&interaction_log(), &biometric_log()).unwrap();

        assert_eq!(output.report.interaction_samples, 4);
        assert_eq!(output.report.biometric_samples, 5);
        assert_eq!(output.report.aligned_records, 4);
        assert_eq!(output.report.sessions, 2);

        // Every record carries repaired gaze data and derived means.
        for session in &output.sessions {
            assert!(session.quality_flags.is_empty());
            for record in &session.records {
                assert_eq!(record.mean_gaze_x, Some(510.0));
                assert_eq!(record.mean_gaze_y, Some(382.0));
                assert!(record.affect.is_some());
            }
        }
    }

    #[test]
    fn test_scroll_fill_rules_applied_end_to_end() {
        let output = align_session_logs(&interaction_log(), &biometric_log()).unwrap();
        let a = &output.sessions[0];
        // First sample of the run had no scroll percentage -> 0.
        assert_eq!(a.records[0].scroll_percentage, Some(0.0));
        assert_eq!(a.records[1].scroll_percentage, Some(10.0));
        // Scroll position leading gap closed by backward fill.
        assert_eq!(a.records[0].scroll_position, Some(120.0));
    }

    #[test]
    fn test_empty_biometric_flags_sessions() {
        let biometric = format!("{BIOMETRIC_HEADER}\n");
        let output = align_session_logs(&interaction_log(), &biometric).unwrap();

        assert_eq!(output.report.aligned_records, 4);
        assert_eq!(output.report.flagged_sessions.len(), 2);
        for session in &output.sessions {
            assert!(session.quality_flags.contains(&QualityFlag::MissingGazeSignal));
        }
    }

    #[test]
    fn test_empty_interaction_yields_no_sessions() {
        let interaction = format!("{INTERACTION_HEADER}\n");
        let output = align_session_logs(&interaction, &biometric_log()).unwrap();
        assert!(output.sessions.is_empty());
        assert_eq!(output.report.aligned_records, 0);
    }

    #[test]
    fn test_format_error_aborts_before_alignment() {
        let bad_interaction = "Time (UTC),Event\n2024-01-15 14:00:00,scroll\n";
        let err = align_session_logs(bad_interaction, &biometric_log()).unwrap_err();
        assert!(matches!(err, ProcessError::MissingColumns { .. }));
    }

    /// Snapshot service that fails permanently for one URL
    struct OneBadPage;

    impl PageSnapshot for OneBadPage {
        fn capture(&mut self, url: &str) -> Result<PageImage, SnapshotError> {
            if url.ends_with("/a") {
                Err(SnapshotError::Timeout)
            } else {
                Ok(PageImage {
                    width: 1920,
                    height: 2400,
                    bytes: Vec::new(),
                })
            }
        }
    }

    #[test]
    fn test_capture_failures_isolated_per_url() {
        let output = align_session_logs(&interaction_log(), &biometric_log()).unwrap();
        let processor = SessionProcessor::new();

        let outcomes = processor.capture_snapshots(&mut OneBadPage, &output.sessions);
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].result.is_err());
        assert!(outcomes[1].result.is_ok());
    }
}
