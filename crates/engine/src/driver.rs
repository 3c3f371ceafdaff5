/// Clip driver
///
/// Wires the host collaborators around the pure pipeline: measure loudness
/// (when a target is configured), fetch per-window peaks, run the pipeline,
/// and push the validated plan into the mutation sink. Nothing is mutated
/// until a complete plan exists; a failed measurement aborts the clip with
/// no partial mutation.
use crate::pipeline::run_pipeline;
use clipgain_core::{
    ClipInfo, EngineSettings, LoudnessMeter, MutationSink, PeakSource, PlanError, PlanOutcome,
    PlanOutput,
};

/// Outcome of one clip, reported back to the invoking caller
#[derive(Clone, Debug, PartialEq)]
pub struct ClipReport {
    pub clip: String,
    pub outcome: PlanOutcome,
}

async fn resolve_bias_gain(
    clip: &ClipInfo,
    settings: &EngineSettings,
    meter: Option<&dyn LoudnessMeter>,
) -> Result<f64, PlanError> {
    let Some(target) = &settings.loudness else {
        return Ok(0.0);
    };
    let Some(meter) = meter else {
        return Err(PlanError::invalid_config(
            "loudness",
            "a loudness target is configured but no meter is available",
        ));
    };

    let measured = meter
        .integrated_lufs(clip)
        .await
        .map_err(|source| PlanError::Host {
            clip: clip.id.clone(),
            source,
        })?;

    match measured {
        Some(lufs) if lufs > target.silence_floor_lufs => {
            let bias = target.target_lufs - lufs;
            tracing::info!(
                "Clip {} measured {:.2} LUFS, bias gain {:+.2} dB",
                clip.id,
                lufs,
                bias
            );
            Ok(bias)
        }
        _ => {
            tracing::warn!("Clip {} could not be measured, aborting", clip.id);
            Err(PlanError::MeasurementFailed {
                clip: clip.id.clone(),
            })
        }
    }
}

/// Plan and apply gain correction for a single clip.
///
/// The loudness render (when requested) completes before any per-window
/// analysis, since the bias gain feeds the classifier. The mutation sink is
/// only touched once the pipeline has produced a complete, validated plan.
pub async fn process_clip(
    clip: &ClipInfo,
    settings: &EngineSettings,
    peaks: &dyn PeakSource,
    meter: Option<&dyn LoudnessMeter>,
    sink: &dyn MutationSink,
) -> Result<PlanOutcome, PlanError> {
    settings.validate()?;

    let bias_gain_db = resolve_bias_gain(clip, settings, meter).await?;

    let window_peaks = peaks
        .window_peaks(clip, settings.window_duration)
        .await
        .map_err(|source| PlanError::Host {
            clip: clip.id.clone(),
            source,
        })?;

    let outcome = run_pipeline(&window_peaks, settings, bias_gain_db)?;

    match &outcome {
        PlanOutcome::Plan(plan) => {
            match &plan.output {
                PlanOutput::Segments(segments) => {
                    sink.apply_segments(clip, segments)
                        .await
                        .map_err(|source| PlanError::Host {
                            clip: clip.id.clone(),
                            source,
                        })?;
                    tracing::info!("Clip {}: applied {} segments", clip.id, segments.len());
                }
                PlanOutput::Points(points) => {
                    sink.write_automation(clip, points)
                        .await
                        .map_err(|source| PlanError::Host {
                            clip: clip.id.clone(),
                            source,
                        })?;
                    tracing::info!("Clip {}: wrote {} automation points", clip.id, points.len());
                }
            }
        }
        PlanOutcome::NoChange(reason) => {
            tracing::info!("Clip {}: no changes needed ({:?})", clip.id, reason);
        }
    }

    Ok(outcome)
}

/// Process several clips strictly sequentially.
///
/// Each clip's splitting/automation mutation can shift the positions of
/// subsequent host lookups, so clips are never processed concurrently. The
/// first failure aborts the remaining clips of the invocation.
pub async fn process_clips(
    clips: &[ClipInfo],
    settings: &EngineSettings,
    peaks: &dyn PeakSource,
    meter: Option<&dyn LoudnessMeter>,
    sink: &dyn MutationSink,
) -> Result<Vec<ClipReport>, PlanError> {
    let mut reports = Vec::with_capacity(clips.len());
    for clip in clips {
        let outcome = process_clip(clip, settings, peaks, meter, sink).await?;
        reports.push(ClipReport {
            clip: clip.id.clone(),
            outcome,
        });
    }
    Ok(reports)
}
