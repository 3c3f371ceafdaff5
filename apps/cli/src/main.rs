use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, ValueEnum};
use clipgain_core::{
    resolve_sample_rate, window_size_samples, AutomationPoint, ClipInfo, EngineSettings,
    LoudnessMeter, MutationSink, OutputMode, PeakSource, PlanOutcome, Segment,
};
use clipgain_engine::process_clip;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Plan clip-level gain correction from a captured peak measurement file
#[derive(Parser, Debug)]
#[command(name = "clipgain", version, about)]
struct Args {
    /// Capture file: JSON `{clip, peaks, measured_lufs?}`, or a raw f32le
    /// sample dump with `--raw`
    input: PathBuf,

    /// Treat the input as raw f32le samples instead of a JSON capture
    #[arg(long)]
    raw: bool,

    /// Sample rate for `--raw` input; otherwise resolved from the clip
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Engine settings file (TOML); flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum permitted peak level, dBFS
    #[arg(long, allow_negative_numbers = true)]
    ceiling: Option<f64>,

    /// Attack duration in seconds
    #[arg(long)]
    attack: Option<f64>,

    /// Release duration in seconds
    #[arg(long)]
    release: Option<f64>,

    /// Output representation
    #[arg(long, value_enum)]
    mode: Option<Mode>,

    /// Normalize toward this integrated loudness (LUFS)
    #[arg(long, allow_negative_numbers = true)]
    target_lufs: Option<f64>,

    /// Pre-measured integrated loudness of the clip (LUFS)
    #[arg(long, allow_negative_numbers = true)]
    measured_lufs: Option<f64>,

    /// Write the plan JSON here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    Discrete,
    Continuous,
}

/// On-disk capture of one clip's measurements
#[derive(Debug, Deserialize)]
struct Capture {
    clip: ClipInfo,
    /// Linear peak magnitude per fixed-duration window, in window order
    peaks: Vec<f64>,
    #[serde(default)]
    measured_lufs: Option<f64>,
}

struct CapturePeaks(Vec<f64>);

#[async_trait]
impl PeakSource for CapturePeaks {
    async fn window_peaks(&self, _clip: &ClipInfo, _window: f64) -> Result<Vec<f64>> {
        Ok(self.0.clone())
    }
}

struct CaptureMeter(Option<f64>);

#[async_trait]
impl LoudnessMeter for CaptureMeter {
    async fn integrated_lufs(&self, _clip: &ClipInfo) -> Result<Option<f64>> {
        Ok(self.0)
    }
}

/// Writes the plan as JSON instead of mutating a host project
struct JsonSink {
    output: Option<PathBuf>,
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum SinkPayload<'a> {
    Splits { clip: &'a str, segments: &'a [Segment] },
    Automation { clip: &'a str, points: &'a [AutomationPoint] },
}

impl JsonSink {
    fn new(output: Option<PathBuf>) -> Self {
        Self { output }
    }

    fn emit(&self, payload: &SinkPayload<'_>) -> Result<()> {
        let json = serde_json::to_string_pretty(payload)?;
        match &self.output {
            Some(path) => std::fs::write(path, json)
                .with_context(|| format!("failed to write {}", path.display()))?,
            None => println!("{json}"),
        }
        Ok(())
    }
}

#[async_trait]
impl MutationSink for JsonSink {
    async fn apply_segments(&self, clip: &ClipInfo, segments: &[Segment]) -> Result<()> {
        self.emit(&SinkPayload::Splits {
            clip: &clip.id,
            segments,
        })
    }

    async fn write_automation(&self, clip: &ClipInfo, points: &[AutomationPoint]) -> Result<()> {
        self.emit(&SinkPayload::Automation {
            clip: &clip.id,
            points,
        })
    }
}

/// Scan a raw f32le sample dump into per-window linear peaks
fn scan_raw_peaks(path: &Path, sample_rate: u32, window_duration: f64) -> Result<Vec<f64>> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let samples: Vec<f32> = bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();

    let window = window_size_samples(sample_rate, window_duration);
    Ok(samples
        .chunks(window)
        .map(|chunk| chunk.iter().fold(0.0_f64, |acc, s| acc.max(s.abs() as f64)))
        .collect())
}

fn load_settings(args: &Args) -> Result<EngineSettings> {
    let mut settings = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            toml::from_str(&text).with_context(|| format!("invalid settings in {}", path.display()))?
        }
        None => EngineSettings::default(),
    };

    if let Some(ceiling) = args.ceiling {
        settings.ceiling_db = ceiling;
    }
    if let Some(attack) = args.attack {
        settings.attack = attack;
    }
    if let Some(release) = args.release {
        settings.release = release;
    }
    if let Some(mode) = args.mode {
        settings.output = match mode {
            Mode::Discrete => OutputMode::Discrete,
            Mode::Continuous => OutputMode::Continuous,
        };
    }
    if let Some(target_lufs) = args.target_lufs {
        let mut target = settings.loudness.unwrap_or_default();
        target.target_lufs = target_lufs;
        settings.loudness = Some(target);
    }
    Ok(settings)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let settings = load_settings(&args)?;

    let (clip, peaks, measured_lufs) = if args.raw {
        let clip = ClipInfo {
            id: args.input.display().to_string(),
            start: 0.0,
            length: 0.0,
            sample_rate: args.sample_rate,
            source_sample_rate: None,
        };
        let rate = resolve_sample_rate(&clip, None);
        let peaks = scan_raw_peaks(&args.input, rate, settings.window_duration)?;
        (clip, peaks, args.measured_lufs)
    } else {
        let text = std::fs::read_to_string(&args.input)
            .with_context(|| format!("failed to read {}", args.input.display()))?;
        let capture: Capture = serde_json::from_str(&text)
            .with_context(|| format!("invalid capture in {}", args.input.display()))?;
        let measured = args.measured_lufs.or(capture.measured_lufs);
        (capture.clip, capture.peaks, measured)
    };

    tracing::info!(
        "Analyzing {} ({} windows of {} s)",
        clip.id,
        peaks.len(),
        settings.window_duration
    );

    let peak_source = CapturePeaks(peaks);
    let meter = CaptureMeter(measured_lufs);
    let sink = JsonSink::new(args.output.clone());

    let outcome = process_clip(&clip, &settings, &peak_source, Some(&meter), &sink).await?;

    match outcome {
        PlanOutcome::Plan(plan) => {
            tracing::info!(
                "Done: {} regions ({} peak, {} negligible)",
                plan.stats.regions,
                plan.stats.peak_regions,
                plan.stats.negligible_regions
            );
        }
        PlanOutcome::NoChange(reason) => {
            tracing::info!("No changes needed ({reason:?})");
        }
    }

    Ok(())
}
