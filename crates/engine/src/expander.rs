/// Attack/release expander
///
/// Widens every Peak region backward by the attack duration and forward by
/// the release duration, clamped to the analyzed span. Only the immediately
/// adjacent Normal region gives up time, and only on the edge facing the
/// expansion; the shrink never cascades to a further region, so one long
/// peak cannot silently consume a distant region through a chain reaction.
/// Regions collapsed to zero or negative length are dropped afterwards.
use clipgain_core::{Region, WindowLabel};

pub fn apply_attack_release(
    mut regions: Vec<Region>,
    attack: f64,
    release: f64,
    span: (f64, f64),
) -> Vec<Region> {
    if attack <= 0.0 && release <= 0.0 {
        return regions;
    }

    // Walk the pre-expansion list in order; indices stay stable because
    // dropping happens only after the walk.
    for i in 0..regions.len() {
        if regions[i].label != WindowLabel::Peak {
            continue;
        }

        let new_start = (regions[i].start - attack).max(span.0);
        let new_end = (regions[i].end + release).min(span.1);
        regions[i].start = new_start;
        regions[i].end = new_end;

        if i > 0 && regions[i - 1].label == WindowLabel::Normal && regions[i - 1].end > new_start {
            regions[i - 1].end = new_start;
        }
        if i + 1 < regions.len()
            && regions[i + 1].label == WindowLabel::Normal
            && regions[i + 1].start < new_end
        {
            regions[i + 1].start = new_end;
        }
    }

    regions.retain(|r| r.duration() > 0.0);
    regions
}
