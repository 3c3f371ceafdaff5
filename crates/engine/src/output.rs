/// Output adapter
///
/// Discrete mode emits one split-aligned segment per region, quantized for
/// the stepped gain-control device, with textually-adjacent identical
/// parameters merged to keep the split count down. Continuous mode emits an
/// automation point sequence with linear attack/release ramps and
/// per-window tracking inside Peak regions.
use crate::classifier::db_to_linear;
use crate::quantizer::{quantize_gain, RoundingPolicy};
use clipgain_core::{
    AutomationPoint, EngineSettings, Region, Segment, WindowLabel, WindowMeasurement,
};

/// Consecutive points closer in value than this are dropped, except at
/// label boundaries (linear amplitude)
const POINT_DROP_TOLERANCE: f64 = 1e-4;

/// Quantize every region's assigned gain and merge adjacent segments whose
/// parameters are bit-for-bit identical.
///
/// Attenuating Peak gains use floor policy (no post-quantization ceiling
/// violation); Normal bias gains use round policy. Negligible regions are
/// emitted with the explicit marker rather than omitted, so callers still
/// see full time coverage.
pub fn discrete_segments(regions: &[Region], settings: &EngineSettings) -> Vec<Segment> {
    let mut segments: Vec<Segment> = Vec::with_capacity(regions.len());

    for region in regions {
        let gain_db = region.assigned_gain_db.unwrap_or(0.0);
        let policy = match region.label {
            WindowLabel::Peak => RoundingPolicy::Floor,
            WindowLabel::Normal => RoundingPolicy::Round,
        };
        let gain = quantize_gain(gain_db, policy, settings.ratio_step, settings.min_gain_db);

        match segments.last_mut() {
            Some(prev) if prev.gain == gain => prev.end = region.end,
            _ => segments.push(Segment {
                start: region.start,
                end: region.end,
                gain,
            }),
        }
    }

    segments
}

/// Linear interpolation from `from` to `to` by elapsed fraction of
/// `duration`, clamped to [0, 1]
#[inline]
fn ramp(from: f64, to: f64, elapsed: f64, duration: f64) -> f64 {
    let fraction = if duration > 0.0 {
        (elapsed / duration).clamp(0.0, 1.0)
    } else {
        1.0
    };
    from + (to - from) * fraction
}

/// Steady linear value of a region; gains below the negligibility threshold
/// collapse to unity
fn steady_value(region: &Region, min_gain_db: f64) -> f64 {
    let gain_db = region.assigned_gain_db.unwrap_or(0.0);
    if gain_db.abs() < min_gain_db {
        1.0
    } else {
        db_to_linear(gain_db)
    }
}

/// Emit the ordered point sequence covering the full span.
///
/// Shape: a leading unity point, one point at every region boundary, one
/// point per Peak window inside Peak regions, linear attack/release ramps
/// at Peak region edges, and a trailing unity point. Redundant consecutive
/// points are dropped except at label-boundary crossings.
pub fn automation_points(
    regions: &[Region],
    windows: &[WindowMeasurement],
    settings: &EngineSettings,
    span: (f64, f64),
) -> Vec<AutomationPoint> {
    let mut points: Vec<AutomationPoint> = Vec::new();
    points.push(AutomationPoint {
        time: span.0,
        value: 1.0,
    });

    for (i, region) in regions.iter().enumerate() {
        let value = steady_value(region, settings.min_gain_db);
        let prev_value = if i == 0 {
            1.0
        } else {
            steady_value(&regions[i - 1], settings.min_gain_db)
        };
        let next_value = regions
            .get(i + 1)
            .map(|r| steady_value(r, settings.min_gain_db))
            .unwrap_or(1.0);

        let is_peak = region.label == WindowLabel::Peak;
        let attack_end = if is_peak && settings.attack > 0.0 {
            (region.start + settings.attack).min(region.end)
        } else {
            region.start
        };
        let release_start = if is_peak && settings.release > 0.0 {
            (region.end - settings.release).max(attack_end)
        } else {
            region.end
        };

        if is_peak && settings.attack > 0.0 {
            points.push(AutomationPoint {
                time: region.start,
                value: prev_value,
            });
            points.push(AutomationPoint {
                time: attack_end,
                value: ramp(prev_value, value, attack_end - region.start, settings.attack),
            });
        } else {
            points.push(AutomationPoint {
                time: region.start,
                value,
            });
        }

        if is_peak {
            // Fine-grained tracking of the worst-case curve between the ramps
            for window in windows {
                if window.label == WindowLabel::Peak
                    && window.start > attack_end
                    && window.start < release_start
                    && window.start >= region.start
                {
                    points.push(AutomationPoint {
                        time: window.start,
                        value: db_to_linear(window.candidate_gain_db),
                    });
                }
            }
        }

        if is_peak && settings.release > 0.0 {
            points.push(AutomationPoint {
                time: release_start,
                value,
            });
            points.push(AutomationPoint {
                time: region.end,
                value: ramp(value, next_value, region.end - release_start, settings.release),
            });
        }
    }

    points.push(AutomationPoint {
        time: span.1,
        value: 1.0,
    });

    // Boundary times between different labels are always kept
    let mut protected: Vec<f64> = vec![span.0, span.1];
    for pair in regions.windows(2) {
        if pair[0].label != pair[1].label {
            protected.push(pair[1].start);
        }
    }
    let is_protected = |t: f64| protected.iter().any(|p| (p - t).abs() < 1e-12);

    let mut kept: Vec<AutomationPoint> = Vec::with_capacity(points.len());
    for point in points {
        match kept.last() {
            Some(prev)
                if (prev.time - point.time).abs() < 1e-12
                    && (prev.value - point.value).abs() < POINT_DROP_TOLERANCE =>
            {
                // Exact duplicate
            }
            Some(prev)
                if (prev.value - point.value).abs() < POINT_DROP_TOLERANCE
                    && !is_protected(point.time) =>
            {
                // Redundant plateau point
            }
            _ => kept.push(point),
        }
    }

    kept
}
