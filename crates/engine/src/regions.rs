/// Region builder and peak-merge pass
///
/// `build_regions` turns the classified window sequence into the initial
/// partition: one region per run of equally-labelled windows. Every window
/// belongs to exactly one region, so coverage holds trivially.
///
/// `merge_touching_peaks` runs after attack/release expansion and fuses
/// adjacent Peak regions that now touch or overlap, which happens when an
/// expansion bridges a short intervening Normal region entirely.
use clipgain_core::{Region, WindowLabel, WindowMeasurement};

/// Merge consecutive same-label windows into regions, left to right.
///
/// On a Peak run, `extreme_gain_db` tracks the minimum (most attenuating)
/// candidate gain seen in the run.
pub fn build_regions(windows: &[WindowMeasurement]) -> Vec<Region> {
    let mut regions: Vec<Region> = Vec::new();

    for window in windows {
        match regions.last_mut() {
            Some(region) if region.label == window.label => {
                region.end = window.end();
                if window.label == WindowLabel::Peak {
                    region.extreme_gain_db = region.extreme_gain_db.min(window.candidate_gain_db);
                }
            }
            _ => {
                regions.push(Region::new(
                    window.start,
                    window.end(),
                    window.label,
                    window.candidate_gain_db,
                ));
            }
        }
    }

    regions
}

/// Fuse adjacent Peak regions that touch or overlap within `epsilon`.
///
/// The surviving region keeps the later end and the more conservative
/// (smaller) extreme gain.
pub fn merge_touching_peaks(regions: Vec<Region>, epsilon: f64) -> Vec<Region> {
    let mut merged: Vec<Region> = Vec::with_capacity(regions.len());

    for region in regions {
        match merged.last_mut() {
            Some(prev)
                if prev.label == WindowLabel::Peak
                    && region.label == WindowLabel::Peak
                    && region.start <= prev.end + epsilon =>
            {
                prev.end = prev.end.max(region.end);
                prev.extreme_gain_db = prev.extreme_gain_db.min(region.extreme_gain_db);
            }
            _ => merged.push(region),
        }
    }

    merged
}
