/// Parameter quantizer
///
/// Maps a requested gain in decibels onto the stepped "macro step + ratio"
/// representation of the gain-control device: a signed integer multiple of
/// [`BIT_UNIT_DB`] times a fractional multiplier quantized to the ratio step.
/// Gains too small to matter come back [`QuantizedGain::Negligible`].
use clipgain_core::{GainStep, QuantizedGain, BIT_UNIT_DB};
use serde::{Deserialize, Serialize};

/// Rounding direction for the ratio quantization.
///
/// Policy selection belongs to the caller: attenuating (Peak) gains use
/// `Floor` so the quantized result never exceeds the requested attenuation
/// in magnitude, which guarantees no post-quantization ceiling violation;
/// boosting (bias) gains use `Round` to minimize deviation from the
/// loudness target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundingPolicy {
    Floor,
    Round,
}

pub fn quantize_gain(
    gain_db: f64,
    policy: RoundingPolicy,
    ratio_step: f64,
    min_gain_db: f64,
) -> QuantizedGain {
    let magnitude = gain_db.abs();
    if magnitude < min_gain_db {
        return QuantizedGain::Negligible;
    }

    let mut macro_magnitude = (magnitude / BIT_UNIT_DB).round() as i32;
    if macro_magnitude == 0 {
        macro_magnitude = 1;
    }

    let raw_ratio = (magnitude / (macro_magnitude as f64 * BIT_UNIT_DB)).clamp(0.0, 3.0);
    let steps = raw_ratio / ratio_step;
    let quantized_ratio = match policy {
        // Plain floor: float error can only under-quantize, which is the
        // safe direction for attenuation.
        RoundingPolicy::Floor => steps.floor() * ratio_step,
        RoundingPolicy::Round => steps.round() * ratio_step,
    };

    let sign = if gain_db < 0.0 { -1.0 } else { 1.0 };
    let effective_gain_db = sign * macro_magnitude as f64 * quantized_ratio * BIT_UNIT_DB;

    // A ratio that quantizes down to near-zero must not silently apply a
    // non-trivial macro step alone.
    if effective_gain_db.abs() < min_gain_db {
        return QuantizedGain::Negligible;
    }

    QuantizedGain::Step(GainStep {
        macro_step: if gain_db < 0.0 {
            -macro_magnitude
        } else {
            macro_magnitude
        },
        ratio: quantized_ratio,
        effective_gain_db,
    })
}
