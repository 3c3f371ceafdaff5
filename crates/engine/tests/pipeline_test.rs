use async_trait::async_trait;
use clipgain_core::{
    AutomationPoint, ClipInfo, EngineSettings, LoudnessMeter, LoudnessTarget, MutationSink,
    OutputMode, PeakSource, PlanError, PlanOutcome, Segment,
};
use clipgain_engine::classifier::db_to_linear;
use clipgain_engine::{process_clip, process_clips};
use std::sync::Mutex;

struct FixedPeaks(Vec<f64>);

#[async_trait]
impl PeakSource for FixedPeaks {
    async fn window_peaks(&self, _clip: &ClipInfo, _window: f64) -> anyhow::Result<Vec<f64>> {
        Ok(self.0.clone())
    }
}

struct FixedMeter(Option<f64>);

#[async_trait]
impl LoudnessMeter for FixedMeter {
    async fn integrated_lufs(&self, _clip: &ClipInfo) -> anyhow::Result<Option<f64>> {
        Ok(self.0)
    }
}

#[derive(Default)]
struct RecordingSink {
    segments: Mutex<Vec<(String, Vec<Segment>)>>,
    points: Mutex<Vec<(String, Vec<AutomationPoint>)>>,
}

impl RecordingSink {
    fn mutation_count(&self) -> usize {
        self.segments.lock().unwrap().len() + self.points.lock().unwrap().len()
    }
}

#[async_trait]
impl MutationSink for RecordingSink {
    async fn apply_segments(&self, clip: &ClipInfo, segments: &[Segment]) -> anyhow::Result<()> {
        self.segments
            .lock()
            .unwrap()
            .push((clip.id.clone(), segments.to_vec()));
        Ok(())
    }

    async fn write_automation(
        &self,
        clip: &ClipInfo,
        points: &[AutomationPoint],
    ) -> anyhow::Result<()> {
        self.points
            .lock()
            .unwrap()
            .push((clip.id.clone(), points.to_vec()));
        Ok(())
    }
}

fn clip(id: &str) -> ClipInfo {
    ClipInfo {
        id: id.to_string(),
        start: 0.0,
        length: 0.35,
        sample_rate: Some(48_000),
        source_sample_rate: None,
    }
}

fn peaks_db(levels: &[f64]) -> Vec<f64> {
    levels.iter().map(|db| db_to_linear(*db)).collect()
}

fn limiter_settings() -> EngineSettings {
    EngineSettings {
        ceiling_db: -9.0,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_discrete_plan_reaches_the_sink() {
    let peaks = FixedPeaks(peaks_db(&[-20.0, -20.0, -4.0, -4.0, -20.0, -20.0, -20.0]));
    let sink = RecordingSink::default();

    let outcome = process_clip(&clip("item-1"), &limiter_settings(), &peaks, None, &sink)
        .await
        .unwrap();

    assert!(outcome.plan().is_some());
    let recorded = sink.segments.lock().unwrap();
    assert_eq!(recorded.len(), 1);
    let (id, segments) = &recorded[0];
    assert_eq!(id, "item-1");
    assert_eq!(segments.len(), 3);
    assert_eq!(segments.first().unwrap().start, 0.0);
    assert!((segments.last().unwrap().end - 0.35).abs() < 1e-9);
}

#[tokio::test]
async fn test_continuous_plan_writes_automation() {
    let peaks = FixedPeaks(peaks_db(&[-20.0, -4.0, -4.0, -20.0]));
    let sink = RecordingSink::default();
    let settings = EngineSettings {
        output: OutputMode::Continuous,
        attack: 0.02,
        release: 0.02,
        ..limiter_settings()
    };

    process_clip(&clip("item-2"), &settings, &peaks, None, &sink)
        .await
        .unwrap();

    let recorded = sink.points.lock().unwrap();
    assert_eq!(recorded.len(), 1);
    let (_, points) = &recorded[0];
    assert_eq!(points.first().unwrap().value, 1.0);
    assert_eq!(points.last().unwrap().value, 1.0);
    assert!(points.windows(2).all(|p| p[0].time <= p[1].time));
}

#[tokio::test]
async fn test_no_violation_leaves_the_host_untouched() {
    let peaks = FixedPeaks(peaks_db(&[-20.0, -18.0, -17.0]));
    let sink = RecordingSink::default();

    let outcome = process_clip(&clip("quiet"), &limiter_settings(), &peaks, None, &sink)
        .await
        .unwrap();

    assert!(matches!(outcome, PlanOutcome::NoChange(_)));
    assert_eq!(sink.mutation_count(), 0);
}

#[tokio::test]
async fn test_loudness_bias_boosts_normal_regions() {
    let peaks = FixedPeaks(peaks_db(&[-20.0, -19.0, -20.0]));
    let sink = RecordingSink::default();
    let meter = FixedMeter(Some(-20.0));
    let settings = EngineSettings {
        loudness: Some(LoudnessTarget {
            target_lufs: -14.0,
            silence_floor_lufs: -60.0,
        }),
        ..limiter_settings()
    };

    let outcome = process_clip(&clip("soft"), &settings, &peaks, Some(&meter), &sink)
        .await
        .unwrap();

    // +6 dB of bias: one Normal segment carrying roughly one full macro step
    let plan = outcome.plan().unwrap();
    assert_eq!(plan.stats.peak_regions, 0);
    let recorded = sink.segments.lock().unwrap();
    let (_, segments) = &recorded[0];
    assert_eq!(segments.len(), 1);
    assert!((segments[0].gain.effective_gain_db() - 6.0).abs() < 0.5);
}

#[tokio::test]
async fn test_unmeasurable_clip_aborts_without_mutation() {
    let peaks = FixedPeaks(peaks_db(&[-4.0, -4.0]));
    let sink = RecordingSink::default();
    let meter = FixedMeter(None);
    let settings = EngineSettings {
        loudness: Some(LoudnessTarget::default()),
        ..limiter_settings()
    };

    let err = process_clip(&clip("offline"), &settings, &peaks, Some(&meter), &sink)
        .await
        .unwrap_err();

    assert!(matches!(err, PlanError::MeasurementFailed { .. }));
    assert_eq!(sink.mutation_count(), 0);
}

#[tokio::test]
async fn test_silent_meter_reading_counts_as_unmeasurable() {
    let peaks = FixedPeaks(peaks_db(&[-4.0]));
    let sink = RecordingSink::default();
    let meter = FixedMeter(Some(-80.0)); // below the -60 LUFS silence floor
    let settings = EngineSettings {
        loudness: Some(LoudnessTarget::default()),
        ..limiter_settings()
    };

    let err = process_clip(&clip("silent"), &settings, &peaks, Some(&meter), &sink)
        .await
        .unwrap_err();
    assert!(matches!(err, PlanError::MeasurementFailed { .. }));
}

#[tokio::test]
async fn test_track_scope_processes_clips_in_order() {
    let peaks = FixedPeaks(peaks_db(&[-20.0, -4.0, -20.0]));
    let sink = RecordingSink::default();
    let clips = vec![clip("a"), clip("b"), clip("c")];

    let reports = process_clips(&clips, &limiter_settings(), &peaks, None, &sink)
        .await
        .unwrap();

    assert_eq!(reports.len(), 3);
    let recorded = sink.segments.lock().unwrap();
    let order: Vec<&str> = recorded.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(order, ["a", "b", "c"]);
}
