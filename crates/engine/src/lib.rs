/// Gain-region planning pipeline
///
/// Stages, in data-flow order:
/// - Classifier: labels each measurement window Peak/Normal against the ceiling
/// - Regions: merges same-label runs into regions, fuses touching Peak regions
/// - Expander: widens Peak regions by attack/release without cascading
/// - Absorber: folds sub-minimum regions into a neighbor
/// - Quantizer: maps a gain in dB to a stepped macro/ratio parameter
/// - Output: discrete segment list or continuous automation curve
///
/// `pipeline::run_pipeline` threads a `Vec<Region>` through the stages and is
/// pure; `driver::process_clip` wires the host collaborators around it.
pub mod absorber;
pub mod classifier;
pub mod driver;
pub mod expander;
pub mod output;
pub mod pipeline;
pub mod quantizer;
pub mod regions;

pub use driver::{process_clip, process_clips, ClipReport};
pub use pipeline::run_pipeline;
pub use quantizer::{quantize_gain, RoundingPolicy};
