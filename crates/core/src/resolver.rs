use crate::models::ClipInfo;

/// Hard fallback when neither the clip, its source, nor the project supplies
/// a sample rate
pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;

/// Resolve the sample rate for a clip using the hierarchy:
/// clip rate > source rate > project rate > [`DEFAULT_SAMPLE_RATE`]
pub fn resolve_sample_rate(clip: &ClipInfo, project_rate: Option<u32>) -> u32 {
    if let Some(rate) = clip.sample_rate.filter(|r| *r > 0) {
        tracing::debug!("Clip {} uses its own rate: {} Hz", clip.id, rate);
        return rate;
    }
    if let Some(rate) = clip.source_sample_rate.filter(|r| *r > 0) {
        tracing::debug!("Clip {} falls back to source rate: {} Hz", clip.id, rate);
        return rate;
    }
    if let Some(rate) = project_rate.filter(|r| *r > 0) {
        tracing::debug!("Clip {} falls back to project rate: {} Hz", clip.id, rate);
        return rate;
    }
    tracing::debug!(
        "Clip {} has no usable rate anywhere, using {} Hz",
        clip.id,
        DEFAULT_SAMPLE_RATE
    );
    DEFAULT_SAMPLE_RATE
}

/// Window duration in samples at the resolved rate, never less than one
pub fn window_size_samples(sample_rate: u32, window_duration: f64) -> usize {
    ((sample_rate as f64 * window_duration).round() as usize).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(own: Option<u32>, source: Option<u32>) -> ClipInfo {
        ClipInfo {
            id: "clip".to_string(),
            start: 0.0,
            length: 1.0,
            sample_rate: own,
            source_sample_rate: source,
        }
    }

    #[test]
    fn test_own_rate_wins() {
        assert_eq!(
            resolve_sample_rate(&clip(Some(44_100), Some(96_000)), Some(48_000)),
            44_100
        );
    }

    #[test]
    fn test_source_rate_next() {
        assert_eq!(
            resolve_sample_rate(&clip(None, Some(96_000)), Some(48_000)),
            96_000
        );
    }

    #[test]
    fn test_project_rate_next() {
        assert_eq!(resolve_sample_rate(&clip(None, None), Some(88_200)), 88_200);
    }

    #[test]
    fn test_hard_fallback() {
        assert_eq!(resolve_sample_rate(&clip(None, None), None), DEFAULT_SAMPLE_RATE);
    }

    #[test]
    fn test_zero_rates_are_skipped() {
        assert_eq!(
            resolve_sample_rate(&clip(Some(0), Some(0)), Some(0)),
            DEFAULT_SAMPLE_RATE
        );
    }

    #[test]
    fn test_window_size_samples() {
        assert_eq!(window_size_samples(48_000, 0.05), 2_400);
        assert_eq!(window_size_samples(44_100, 0.05), 2_205);
        // Tiny windows still produce at least one sample
        assert_eq!(window_size_samples(48_000, 1e-9), 1);
    }
}
