//! Page snapshot collaborator seam
//!
//! Capturing a rendered page image is peripheral plumbing owned by an
//! external service; the core only defines the seam and the bounded retry
//! policy around it.

use thiserror::Error;
use tracing::warn;

use crate::error::ProcessError;

/// Rendered image of a page
#[derive(Debug, Clone)]
pub struct PageImage {
    pub width: u32,
    pub height: u32,
    /// Encoded image bytes (format is the capture service's choice, PNG in practice)
    pub bytes: Vec<u8>,
}

/// Error from a single capture attempt
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("page load timed out")]
    Timeout,

    #[error("capture failed: {0}")]
    Capture(String),
}

/// Service that renders a page snapshot for a URL.
///
/// Implementations must size their output to the full scrollable page
/// extent, not just the viewport: gaze points reference page coordinates
/// below the fold.
pub trait PageSnapshot {
    fn capture(&mut self, url: &str) -> Result<PageImage, SnapshotError>;
}

/// Capture a snapshot with a bounded retry budget.
///
/// Each failed attempt is logged; once the budget is exhausted the failure is
/// reported as a per-URL `ProcessError::SnapshotFailed` so the caller can
/// isolate it without aborting other pages.
pub fn capture_with_retries(
    service: &mut dyn PageSnapshot,
    url: &str,
    attempts: u32,
) -> Result<PageImage, ProcessError> {
    let attempts = attempts.max(1);
    for attempt in 1..=attempts {
        match service.capture(url) {
            Ok(image) => return Ok(image),
            Err(err) => {
                warn!("snapshot attempt {attempt}/{attempts} for {url} failed: {err}");
            }
        }
    }
    Err(ProcessError::SnapshotFailed {
        url: url.to_string(),
        attempts,
    })
}
