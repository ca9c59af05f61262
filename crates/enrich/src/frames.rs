//! Frame time selection for video captioning.

/// Which points of a video to sample for captioning.
///
/// Derived from configuration; [`plan`](Self::plan) is pure so the policy
/// can be tested without touching a video backend.
#[derive(Debug, Clone, Copy)]
pub struct FramePolicy {
    /// Seconds between samples in long videos.
    pub interval_secs: f64,
    /// Hard cap on sampled frames.
    pub max_frames: usize,
}

impl Default for FramePolicy {
    fn default() -> Self {
        Self { interval_secs: 10.0, max_frames: 5 }
    }
}

/// Videos at or under this duration get the short-clip treatment.
const SHORT_CLIP_SECS: f64 = 10.0;

impl FramePolicy {
    /// Timestamps (seconds) to sample from a video of the given duration.
    ///
    /// The first sample lands near but not at the start, to skip fade-ins
    /// and title cards. Short clips add a middle and a near-end sample when
    /// they are long enough to have distinct scenes. Longer videos sample
    /// at the configured interval, falling back to an even distribution
    /// when the interval would exceed the frame cap. Every candidate within
    /// one second of the end is discarded: seeking that close to the end of
    /// a stream is unreliable.
    pub fn plan(&self, duration_secs: f64) -> Vec<f64> {
        if !duration_secs.is_finite() || duration_secs <= 0.0 {
            return Vec::new();
        }
        let opening = (duration_secs * 0.1).min(2.0);
        let mut times: Vec<f64> = if duration_secs <= SHORT_CLIP_SECS {
            let mut short = vec![opening];
            if duration_secs > 5.0 {
                short.push(duration_secs / 2.0);
                short.push(duration_secs * 0.9);
            }
            short
        } else {
            // The opening sample is unconditional; both long-video branches
            // only fill in what comes after it.
            let mut long = vec![opening];
            let by_interval = ((duration_secs - opening) / self.interval_secs) as usize + 1;
            if by_interval <= self.max_frames {
                long.extend((1..by_interval).map(|i| opening + i as f64 * self.interval_secs));
            } else {
                // Too long for interval sampling: spread the remaining cap
                // evenly over the full duration.
                let remaining = self.max_frames - 1;
                long.extend(
                    (1..=remaining).map(|i| duration_secs * i as f64 / (remaining + 1) as f64),
                );
            }
            long
        };
        times.retain(|&t| t < duration_secs - 1.0 || duration_secs <= 2.0);
        times.truncate(self.max_frames);
        times
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0)]
    #[case(-3.0)]
    #[case(f64::NAN)]
    fn test_degenerate_durations(#[case] duration: f64) {
        assert!(FramePolicy::default().plan(duration).is_empty());
    }

    #[test]
    fn test_very_short_clip_single_opening_frame() {
        let times = FramePolicy::default().plan(4.0);
        assert_eq!(times, vec![0.4]);
    }

    #[test]
    fn test_short_clip_gets_middle_and_near_end() {
        let times = FramePolicy::default().plan(8.0);
        // opening, middle, near-end; the 0.9 sample lands before the final second
        assert_eq!(times.len(), 2);
        assert_eq!(times[0], 0.8);
        assert_eq!(times[1], 4.0);
    }

    #[test]
    fn test_long_video_interval_sampling() {
        let times = FramePolicy::default().plan(35.0);
        assert_eq!(times, vec![2.0, 12.0, 22.0, 32.0]);
    }

    #[test]
    fn test_very_long_video_even_distribution() {
        let policy = FramePolicy::default();
        let times = policy.plan(600.0);
        assert_eq!(times, vec![2.0, 120.0, 240.0, 360.0, 480.0]);
    }

    #[test]
    fn test_even_distribution_keeps_opening_frame() {
        let policy = FramePolicy::default();
        for duration in [120.0, 600.0, 3600.0] {
            let times = policy.plan(duration);
            assert!(
                times[0] <= 2.0,
                "first sample {} of a {duration}s video misses the opening",
                times[0]
            );
        }
    }

    #[test]
    fn test_never_exceeds_cap() {
        let policy = FramePolicy { interval_secs: 1.0, max_frames: 3 };
        let times = policy.plan(120.0);
        assert!(times.len() <= 3);
    }

    #[test]
    fn test_all_times_within_duration() {
        let policy = FramePolicy::default();
        for duration in [3.0, 9.0, 30.0, 59.0, 61.0, 3600.0] {
            for t in policy.plan(duration) {
                assert!(t >= 0.0 && t < duration, "t={t} outside 0..{duration}");
            }
        }
    }
}
