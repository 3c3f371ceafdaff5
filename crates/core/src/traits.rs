use crate::models::{AutomationPoint, ClipInfo, Segment};
use anyhow::Result;
use async_trait::async_trait;

/// Per-window peak measurement over a clip's sample buffers
#[async_trait]
pub trait PeakSource: Send + Sync {
    /// Maximum absolute sample magnitude per fixed-duration window across
    /// all channels, in window order. Silence must report exactly `0.0`,
    /// never a near-zero float.
    async fn window_peaks(&self, clip: &ClipInfo, window_duration: f64) -> Result<Vec<f64>>;
}

/// Integrated loudness measurement (e.g. a full-mix render)
#[async_trait]
pub trait LoudnessMeter: Send + Sync {
    /// Integrated loudness of the clip in LUFS, or `None` when the source
    /// could not be measured (offline, silent). A single long blocking
    /// operation; callers must not run two measurements concurrently on the
    /// same track.
    async fn integrated_lufs(&self, clip: &ClipInfo) -> Result<Option<f64>>;
}

/// Host mutation: split-aligned stepped gains or an automation lane
#[async_trait]
pub trait MutationSink: Send + Sync {
    /// Split the clip at segment boundaries and install one stepped
    /// gain-control instance per resulting sub-range
    async fn apply_segments(&self, clip: &ClipInfo, segments: &[Segment]) -> Result<()>;

    /// Write an ordered point sequence to the clip's gain automation lane,
    /// replacing any existing points in the analyzed range
    async fn write_automation(&self, clip: &ClipInfo, points: &[AutomationPoint]) -> Result<()>;
}
