/// Window classifier
///
/// Labels each fixed-duration measurement window Peak or Normal against the
/// ceiling and computes the window's candidate gain. Pure function of its
/// inputs; no side effects.
use clipgain_core::{EngineSettings, WindowLabel, WindowMeasurement};

/// Convert linear amplitude to dBFS. Exact zero (silence) maps to negative
/// infinity rather than a large negative number.
#[inline]
pub fn linear_to_db(amplitude: f64) -> f64 {
    if amplitude <= 0.0 {
        f64::NEG_INFINITY
    } else {
        20.0 * amplitude.log10()
    }
}

/// Convert dB to linear amplitude; negative infinity maps back to zero
#[inline]
pub fn db_to_linear(db: f64) -> f64 {
    if db == f64::NEG_INFINITY {
        0.0
    } else {
        10_f64.powf(db / 20.0)
    }
}

/// Classify one window of linear peaks per entry.
///
/// A window is Peak iff `peak_db + bias_gain_db > ceiling_db + margin_db`.
/// Its candidate gain is `ceiling_db − peak_db` for Peak windows and
/// `bias_gain_db` for Normal ones. A silent window (peak exactly zero) is
/// always Normal.
pub fn classify_windows(
    peaks: &[f64],
    settings: &EngineSettings,
    bias_gain_db: f64,
) -> Vec<WindowMeasurement> {
    let threshold_db = settings.ceiling_db + settings.margin_db;

    peaks
        .iter()
        .enumerate()
        .map(|(index, &peak)| {
            let peak_db = linear_to_db(peak);
            let is_peak = peak_db + bias_gain_db > threshold_db;
            let (label, candidate_gain_db) = if is_peak {
                (WindowLabel::Peak, settings.ceiling_db - peak_db)
            } else {
                (WindowLabel::Normal, bias_gain_db)
            };
            WindowMeasurement {
                start: index as f64 * settings.window_duration,
                duration: settings.window_duration,
                peak_db,
                label,
                candidate_gain_db,
            }
        })
        .collect()
}
