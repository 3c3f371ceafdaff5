/// Tiny-region absorber
///
/// Eliminates regions shorter than the minimum duration by folding them into
/// a neighbor, re-scanning from the top until the list is stable. The
/// predecessor's label and gain win; a tiny region at the head of the list is
/// instead pulled into its follower. Absorption deliberately does not
/// re-trigger the peak-merge pass: two adjacent regions that end up with the
/// same label afterwards keep their boundary.
use clipgain_core::Region;

pub fn absorb_short_regions(mut regions: Vec<Region>, min_duration: f64) -> Vec<Region> {
    if min_duration <= 0.0 {
        return regions;
    }

    // Each absorption removes exactly one region, so this terminates.
    while regions.len() > 1 {
        let Some(index) = regions.iter().position(|r| r.duration() < min_duration) else {
            break;
        };
        if index > 0 {
            let end = regions[index].end;
            regions[index - 1].end = end;
        } else {
            let start = regions[0].start;
            regions[1].start = start;
        }
        regions.remove(index);
    }

    regions
}
