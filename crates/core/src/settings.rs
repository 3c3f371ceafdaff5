use crate::error::PlanError;
use serde::{Deserialize, Serialize};

/// Which output the adapter emits
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Split-aligned segment list with stepped parameters
    #[default]
    Discrete,
    /// Automation point sequence with attack/release ramps
    Continuous,
}

/// Loudness normalization target; absent for pure limiting
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoudnessTarget {
    /// Integrated loudness to normalize toward, LUFS
    pub target_lufs: f64,
    /// Meter readings at or below this are treated as "could not measure"
    pub silence_floor_lufs: f64,
}

impl Default for LoudnessTarget {
    fn default() -> Self {
        Self {
            target_lufs: -14.0,
            silence_floor_lufs: -60.0,
        }
    }
}

/// Engine configuration for one invocation
///
/// Validated up front; no analysis or host mutation happens on a rejected
/// configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Maximum permitted peak level, dBFS
    pub ceiling_db: f64,
    /// Extra tolerance above the ceiling before a window counts as Peak, dB
    pub margin_db: f64,
    /// Measurement window duration, seconds
    pub window_duration: f64,
    /// Duration a Peak region is extended backward in time, seconds
    pub attack: f64,
    /// Duration a Peak region is extended forward in time, seconds
    pub release: f64,
    /// Regions shorter than this are absorbed into a neighbor, seconds
    pub min_region_duration: f64,
    /// Quantization granularity of the continuous ratio multiplier
    pub ratio_step: f64,
    /// Gains below this magnitude are negligible and apply nothing, dB
    pub min_gain_db: f64,
    /// Touch/overlap tolerance for the peak-merge pass, seconds
    pub epsilon: f64,
    pub output: OutputMode,
    /// When set, a bias gain of `target_lufs − measured` is applied to
    /// Normal regions
    pub loudness: Option<LoudnessTarget>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            ceiling_db: -1.0,
            margin_db: 0.0,
            window_duration: 0.05,
            attack: 0.0,
            release: 0.0,
            min_region_duration: 0.02,
            ratio_step: 0.05,
            min_gain_db: 0.15,
            epsilon: 1e-9,
            output: OutputMode::Discrete,
            loudness: None,
        }
    }
}

impl EngineSettings {
    /// Reject non-finite or out-of-range values before any analysis runs
    pub fn validate(&self) -> Result<(), PlanError> {
        fn finite(field: &'static str, value: f64) -> Result<(), PlanError> {
            if value.is_finite() {
                Ok(())
            } else {
                Err(PlanError::invalid_config(field, "must be a finite number"))
            }
        }

        finite("ceiling_db", self.ceiling_db)?;
        finite("margin_db", self.margin_db)?;
        finite("attack", self.attack)?;
        finite("release", self.release)?;

        if !self.window_duration.is_finite() || self.window_duration <= 0.0 {
            return Err(PlanError::invalid_config(
                "window_duration",
                "must be a positive number of seconds",
            ));
        }
        if self.attack < 0.0 {
            return Err(PlanError::invalid_config("attack", "must not be negative"));
        }
        if self.release < 0.0 {
            return Err(PlanError::invalid_config("release", "must not be negative"));
        }
        if !self.min_region_duration.is_finite() || self.min_region_duration < 0.0 {
            return Err(PlanError::invalid_config(
                "min_region_duration",
                "must be zero or a positive number of seconds",
            ));
        }
        if !self.ratio_step.is_finite() || self.ratio_step <= 0.0 || self.ratio_step > 1.0 {
            return Err(PlanError::invalid_config(
                "ratio_step",
                "must be in (0, 1]",
            ));
        }
        if !self.min_gain_db.is_finite() || self.min_gain_db < 0.0 {
            return Err(PlanError::invalid_config(
                "min_gain_db",
                "must be zero or positive",
            ));
        }
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(PlanError::invalid_config(
                "epsilon",
                "must be zero or positive",
            ));
        }
        if let Some(loudness) = &self.loudness {
            finite("loudness.target_lufs", loudness.target_lufs)?;
            finite("loudness.silence_floor_lufs", loudness.silence_floor_lufs)?;
            if loudness.target_lufs <= loudness.silence_floor_lufs {
                return Err(PlanError::invalid_config(
                    "loudness.target_lufs",
                    "must be above the silence floor",
                ));
            }
        }
        Ok(())
    }
}
