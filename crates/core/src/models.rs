use serde::{Deserialize, Serialize};

/// Decibel value of one doubling of amplitude (20·log10(2)).
///
/// One "macro step" of a stepped gain-control device corresponds to this many
/// decibels; the fractional ratio multiplies it.
pub const BIT_UNIT_DB: f64 = 6.020599913279624;

/// Classification of a measurement window against the ceiling
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowLabel {
    /// Window peak exceeds the ceiling (after bias gain and margin)
    Peak,
    /// Window peak is at or below the ceiling
    Normal,
}

/// One fixed-duration measurement window, immutable after classification
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WindowMeasurement {
    /// Window start in seconds, relative to the analyzed span
    pub start: f64,
    /// Window duration in seconds
    pub duration: f64,
    /// Peak level in dBFS; silence is `f64::NEG_INFINITY`
    pub peak_db: f64,
    pub label: WindowLabel,
    /// Gain that would correct this window: `ceiling − peak` for Peak
    /// windows, the bias gain for Normal ones
    pub candidate_gain_db: f64,
}

impl WindowMeasurement {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Maximal contiguous time interval with one label and one gain.
///
/// Mutable while the pipeline reshapes the region list; frozen once the
/// output adapter has consumed it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub start: f64,
    pub end: f64,
    pub label: WindowLabel,
    /// For a Peak region, the minimum (most attenuating) candidate gain among
    /// its constituent windows. Unused for Normal regions until assignment.
    pub extreme_gain_db: f64,
    /// Final gain, set by the gain assigner
    pub assigned_gain_db: Option<f64>,
}

impl Region {
    pub fn new(start: f64, end: f64, label: WindowLabel, extreme_gain_db: f64) -> Self {
        Self {
            start,
            end,
            label,
            extreme_gain_db,
            assigned_gain_db: None,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Discretized gain for a stepped gain-control device
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GainStep {
    /// Signed integer multiple of [`BIT_UNIT_DB`]
    pub macro_step: i32,
    /// Continuous multiplier in `[0, 3]`, quantized to the ratio step
    pub ratio: f64,
    /// Gain actually applied: `sign · |macro| · ratio · BIT_UNIT_DB`
    pub effective_gain_db: f64,
}

/// Quantizer output: a concrete step, or nothing worth applying
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum QuantizedGain {
    Step(GainStep),
    /// Requested gain was below the negligibility threshold; apply nothing
    Negligible,
}

impl QuantizedGain {
    pub fn is_negligible(&self) -> bool {
        matches!(self, QuantizedGain::Negligible)
    }

    /// Effective gain in dB (0.0 for Negligible)
    pub fn effective_gain_db(&self) -> f64 {
        match self {
            QuantizedGain::Step(step) => step.effective_gain_db,
            QuantizedGain::Negligible => 0.0,
        }
    }
}

/// One split-aligned range of the discrete output
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub gain: QuantizedGain,
}

/// One point of the continuous automation curve; `value` is linear
/// amplitude, 1.0 = unity
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AutomationPoint {
    pub time: f64,
    pub value: f64,
}

/// Counters reported back to the invoking caller
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStats {
    pub regions: usize,
    pub peak_regions: usize,
    pub normal_regions: usize,
    /// Regions whose quantized gain came out Negligible
    pub negligible_regions: usize,
    /// Splits emitted in discrete mode
    pub segments: usize,
    /// Points emitted in continuous mode
    pub points: usize,
}

/// Output of one engine invocation, discrete or continuous
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum PlanOutput {
    Segments(Vec<Segment>),
    Points(Vec<AutomationPoint>),
}

/// A complete, validated plan for one clip
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GainPlan {
    /// Analyzed span `(start, end)` in seconds
    pub span: (f64, f64),
    pub output: PlanOutput,
    pub stats: PlanStats,
}

/// Why an invocation produced no plan
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoChangeReason {
    /// No window exceeds the ceiling and no non-negligible bias gain was
    /// requested
    NoViolation,
    /// Analyzed span is too short to hold a single window
    EmptySpan,
}

/// Result of one engine invocation: a plan, or an explicit "nothing to do"
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PlanOutcome {
    Plan(GainPlan),
    NoChange(NoChangeReason),
}

impl PlanOutcome {
    pub fn plan(&self) -> Option<&GainPlan> {
        match self {
            PlanOutcome::Plan(plan) => Some(plan),
            PlanOutcome::NoChange(_) => None,
        }
    }
}

/// Host clip handle: enough metadata to locate the clip and resolve its
/// sample rate
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClipInfo {
    /// Host-side identifier, used in logs and error reports
    pub id: String,
    /// Clip start on the timeline, seconds
    pub start: f64,
    /// Clip length, seconds
    pub length: f64,
    /// Sample rate of the clip itself, if the host knows it
    #[serde(default)]
    pub sample_rate: Option<u32>,
    /// Sample rate of the underlying source file, if any
    #[serde(default)]
    pub source_sample_rate: Option<u32>,
}
