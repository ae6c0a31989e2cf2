//! Gazefuse - offline alignment engine for web-interaction and eye-tracking
//! session streams
//!
//! Gazefuse reconciles two independently clocked capture logs - browser
//! interaction events and biometric gaze/affect samples - into one merged,
//! gap-repaired timeline, partitioned per visited page for heatmap
//! rendering: adapter parsing → stream normalization → nearest-timestamp
//! alignment → gap repair → session partitioning.
//!
//! ## Modules
//!
//! - **Adapters**: Parse the raw capture logs (browser CSV, biometric CSV,
//!   pointer-recorder text)
//! - **Normalizers**: Boundary trim, sentinel filtering, context-aware fills
//! - **Synchronizer**: Re-anchor the biometric relative clock and merge on
//!   nearest timestamps
//! - **Gap repair**: Interpolation, boundary fills, mean-gaze derivation
//! - **Partitioner**: One session per page context
//! - **Collaborator seams**: Page snapshot service, heatmap renderer

pub mod adapters;
pub mod error;
pub mod export;
pub mod heatmap;
pub mod normalizer;
pub mod partition;
pub mod pipeline;
pub mod repair;
pub mod snapshot;
pub mod sync;
pub mod types;

pub use error::ProcessError;
pub use partition::partition;
pub use pipeline::{align_session_logs, PipelineConfig, RunOutput, RunReport, SessionProcessor};
pub use types::{
    AffectScores, AlignedRecord, BiometricSample, EventKind, InteractionSample, PageSession,
    QualityFlag,
};

/// Gazefuse version embedded in run reports
pub const GAZEFUSE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for run reports
pub const PRODUCER_NAME: &str = "gazefuse";
