/// Pipeline orchestration
///
/// Threads the window measurements through every stage in data-flow order
/// and verifies the partition invariants before a plan is handed to any
/// mutation sink. Invariant violations are implementation bugs and halt via
/// assertion (fail-closed), never as reportable errors.
use crate::absorber::absorb_short_regions;
use crate::classifier::classify_windows;
use crate::expander::apply_attack_release;
use crate::output::{automation_points, discrete_segments};
use crate::quantizer::{quantize_gain, RoundingPolicy};
use crate::regions::{build_regions, merge_touching_peaks};
use clipgain_core::{
    EngineSettings, GainPlan, NoChangeReason, OutputMode, PlanError, PlanOutcome, PlanOutput,
    PlanStats, Region, WindowLabel,
};

/// Attach the final gain to each region: the most conservative
/// peak-correcting gain for Peak regions, the bias gain for Normal ones.
pub fn assign_gains(regions: &mut [Region], bias_gain_db: f64) {
    for region in regions.iter_mut() {
        region.assigned_gain_db = Some(match region.label {
            WindowLabel::Peak => region.extreme_gain_db,
            WindowLabel::Normal => bias_gain_db,
        });
    }
}

fn verify_partition(regions: &[Region], span: (f64, f64), min_region_duration: f64) {
    const TOLERANCE: f64 = 1e-9;

    assert!(!regions.is_empty(), "partition must not be empty");
    assert!(
        (regions[0].start - span.0).abs() < TOLERANCE,
        "partition must start at the span start"
    );
    assert!(
        (regions[regions.len() - 1].end - span.1).abs() < TOLERANCE,
        "partition must end at the span end"
    );
    for pair in regions.windows(2) {
        assert!(
            (pair[0].end - pair[1].start).abs() < TOLERANCE,
            "partition must have no gaps or overlaps"
        );
    }
    if regions.len() > 1 {
        for region in regions {
            assert!(
                region.duration() >= min_region_duration - TOLERANCE,
                "region shorter than the configured minimum survived absorption"
            );
        }
    }
}

/// Run the full segmentation-and-quantization pipeline over one clip's
/// window peaks.
///
/// `peaks` holds one linear peak magnitude per fixed-duration window, in
/// window order. `bias_gain_db` is the uniform gain for Normal regions
/// (zero for pure limiting). Pure function apart from tracing.
pub fn run_pipeline(
    peaks: &[f64],
    settings: &EngineSettings,
    bias_gain_db: f64,
) -> Result<PlanOutcome, PlanError> {
    settings.validate()?;

    if peaks.is_empty() {
        tracing::debug!("Span too short for a single window, nothing to do");
        return Ok(PlanOutcome::NoChange(NoChangeReason::EmptySpan));
    }

    let windows = classify_windows(peaks, settings, bias_gain_db);
    let peak_windows = windows
        .iter()
        .filter(|w| w.label == WindowLabel::Peak)
        .count();
    if peak_windows == 0 && bias_gain_db.abs() < settings.min_gain_db {
        tracing::debug!("No ceiling violation and no bias gain requested");
        return Ok(PlanOutcome::NoChange(NoChangeReason::NoViolation));
    }

    let span = (0.0, windows[windows.len() - 1].end());
    let mut regions = build_regions(&windows);
    tracing::debug!(
        "{} windows ({} peak) formed {} initial regions",
        windows.len(),
        peak_windows,
        regions.len()
    );

    regions = apply_attack_release(regions, settings.attack, settings.release, span);
    regions = merge_touching_peaks(regions, settings.epsilon);
    regions = absorb_short_regions(regions, settings.min_region_duration);
    assign_gains(&mut regions, bias_gain_db);

    verify_partition(&regions, span, settings.min_region_duration);

    let mut stats = PlanStats {
        regions: regions.len(),
        peak_regions: regions
            .iter()
            .filter(|r| r.label == WindowLabel::Peak)
            .count(),
        ..Default::default()
    };
    stats.normal_regions = stats.regions - stats.peak_regions;
    stats.negligible_regions = regions
        .iter()
        .filter(|r| {
            let policy = match r.label {
                WindowLabel::Peak => RoundingPolicy::Floor,
                WindowLabel::Normal => RoundingPolicy::Round,
            };
            quantize_gain(
                r.assigned_gain_db.unwrap_or(0.0),
                policy,
                settings.ratio_step,
                settings.min_gain_db,
            )
            .is_negligible()
        })
        .count();

    let output = match settings.output {
        OutputMode::Discrete => {
            let segments = discrete_segments(&regions, settings);
            stats.segments = segments.len();
            PlanOutput::Segments(segments)
        }
        OutputMode::Continuous => {
            let points = automation_points(&regions, &windows, settings, span);
            stats.points = points.len();
            PlanOutput::Points(points)
        }
    };

    tracing::info!(
        "Plan ready: {} regions ({} peak, {} negligible), {} segments, {} points",
        stats.regions,
        stats.peak_regions,
        stats.negligible_regions,
        stats.segments,
        stats.points
    );

    Ok(PlanOutcome::Plan(GainPlan {
        span,
        output,
        stats,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::db_to_linear;
    use clipgain_core::{QuantizedGain, Segment};

    fn peaks_db(levels: &[f64]) -> Vec<f64> {
        levels.iter().map(|db| db_to_linear(*db)).collect()
    }

    fn settings(ceiling_db: f64) -> EngineSettings {
        EngineSettings {
            ceiling_db,
            min_region_duration: 0.02,
            ..Default::default()
        }
    }

    fn segments(outcome: &PlanOutcome) -> &[Segment] {
        match &outcome.plan().expect("expected a plan").output {
            PlanOutput::Segments(segments) => segments,
            PlanOutput::Points(_) => panic!("expected discrete output"),
        }
    }

    #[test]
    fn test_limiting_scenario() {
        // Ceiling -9 dB, windows [-20,-20,-4,-4,-20,-20,-20]: windows 2 and
        // 3 form one Peak region with extreme gain -5 dB, floor-quantized to
        // macro 1, ratio 0.80, effective ≈ -4.82 dB.
        let peaks = peaks_db(&[-20.0, -20.0, -4.0, -4.0, -20.0, -20.0, -20.0]);
        let outcome = run_pipeline(&peaks, &settings(-9.0), 0.0).unwrap();
        let segments = segments(&outcome);
        assert_eq!(segments.len(), 3);
        match segments[1].gain {
            QuantizedGain::Step(step) => {
                assert_eq!(step.macro_step, -1);
                assert!((step.ratio - 0.80).abs() < 1e-12);
                assert!((step.effective_gain_db + 4.8165).abs() < 1e-3);
            }
            QuantizedGain::Negligible => panic!("peak segment must carry a step"),
        }
        assert!((segments[1].start - 0.10).abs() < 1e-9);
        assert!((segments[1].end - 0.20).abs() < 1e-9);
    }

    #[test]
    fn test_coverage_and_min_duration() {
        let peaks = peaks_db(&[-20.0, -3.0, -20.0, -2.0, -2.0, -20.0, -5.0, -20.0]);
        let s = EngineSettings {
            attack: 0.02,
            release: 0.03,
            ..settings(-9.0)
        };
        let outcome = run_pipeline(&peaks, &s, 0.0).unwrap();
        let segments = segments(&outcome);
        assert_eq!(segments.first().unwrap().start, 0.0);
        assert!((segments.last().unwrap().end - 0.40).abs() < 1e-9);
        for pair in segments.windows(2) {
            assert!((pair[0].end - pair[1].start).abs() < 1e-9);
        }
    }

    #[test]
    fn test_no_violation_outcome() {
        let peaks = peaks_db(&[-20.0, -18.0, -15.0]);
        let outcome = run_pipeline(&peaks, &settings(-9.0), 0.0).unwrap();
        assert_eq!(
            outcome,
            PlanOutcome::NoChange(NoChangeReason::NoViolation)
        );
    }

    #[test]
    fn test_negligible_bias_alone_is_no_violation() {
        let peaks = peaks_db(&[-20.0, -18.0]);
        let outcome = run_pipeline(&peaks, &settings(-9.0), 0.1).unwrap();
        assert_eq!(
            outcome,
            PlanOutcome::NoChange(NoChangeReason::NoViolation)
        );
    }

    #[test]
    fn test_bias_without_violation_produces_plan() {
        let peaks = peaks_db(&[-20.0, -18.0]);
        let outcome = run_pipeline(&peaks, &settings(-9.0), 2.0).unwrap();
        let segments = segments(&outcome);
        assert_eq!(segments.len(), 1);
        match segments[0].gain {
            QuantizedGain::Step(step) => {
                // Scenario B: +2 dB round-quantized → macro 1, ratio 0.35
                assert_eq!(step.macro_step, 1);
                assert!((step.ratio - 0.35).abs() < 1e-12);
                assert!((step.effective_gain_db - 2.1072).abs() < 1e-3);
            }
            QuantizedGain::Negligible => panic!("bias segment must carry a step"),
        }
    }

    #[test]
    fn test_empty_span_outcome() {
        let outcome = run_pipeline(&[], &settings(-9.0), 0.0).unwrap();
        assert_eq!(outcome, PlanOutcome::NoChange(NoChangeReason::EmptySpan));
    }

    #[test]
    fn test_invalid_config_rejected_before_analysis() {
        let s = EngineSettings {
            window_duration: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            run_pipeline(&[0.5], &s, 0.0),
            Err(PlanError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_idempotence_after_correction() {
        // Correct every window with its own candidate gain (peaks land
        // exactly on the ceiling); a second run finds no violation. The
        // tiny margin absorbs the dB/linear roundtrip wobble at the
        // ceiling itself.
        let peaks = peaks_db(&[-20.0, -20.0, -4.0, -4.0, -20.0, -20.0, -20.0]);
        let s = EngineSettings {
            margin_db: 1e-6,
            ..settings(-9.0)
        };
        let windows = crate::classifier::classify_windows(&peaks, &s, 0.0);
        let corrected: Vec<f64> = windows
            .iter()
            .map(|w| db_to_linear(w.peak_db + w.candidate_gain_db))
            .collect();
        let second = run_pipeline(&corrected, &s, 0.0).unwrap();
        assert_eq!(second, PlanOutcome::NoChange(NoChangeReason::NoViolation));
    }

    #[test]
    fn test_stats_reflect_output() {
        let peaks = peaks_db(&[-20.0, -4.0, -4.0, -20.0]);
        let s = EngineSettings {
            output: OutputMode::Continuous,
            ..settings(-9.0)
        };
        let outcome = run_pipeline(&peaks, &s, 0.0).unwrap();
        let plan = outcome.plan().unwrap();
        assert_eq!(plan.stats.regions, 3);
        assert_eq!(plan.stats.peak_regions, 1);
        assert_eq!(plan.stats.normal_regions, 2);
        match &plan.output {
            PlanOutput::Points(points) => assert_eq!(points.len(), plan.stats.points),
            PlanOutput::Segments(_) => panic!("expected continuous output"),
        }
        assert!(plan.stats.points >= 4);
    }

    #[test]
    fn test_whole_span_peak_single_region() {
        let peaks = peaks_db(&[-2.0, -3.0, -2.5]);
        let outcome = run_pipeline(&peaks, &settings(-9.0), 0.0).unwrap();
        let segments = segments(&outcome);
        assert_eq!(segments.len(), 1);
        // Most conservative window (-2 dB needs -7 dB) decides the gain
        match segments[0].gain {
            QuantizedGain::Step(step) => assert!(step.effective_gain_db >= -7.0 - 1e-9),
            QuantizedGain::Negligible => panic!("expected attenuation"),
        }
    }
}
