// Input size selection
//
// Fixed: a preset ladder from 500 to 100,000, or the configured `sizes`.
// Adaptive: one of three ladders picked from the candidate's loop depth.
// Progressive: explore by doubling while it is cheap, then spread log-spaced
// sizes over the range that was explored.

use super::timer::{time_once, RunBudget};
use super::InputSizeSet;
use crate::config::{Config, SamplerPolicy};
use crate::sandbox::Candidate;
use tracing::debug;

pub const FIXED_SIZES: [u64; 10] = [500, 1_000, 2_000, 5_000, 10_000, 20_000, 40_000, 60_000, 80_000, 100_000];

/// Triply nested (or deeper) loops
pub const DEEP_TIER: [u64; 5] = [100, 150, 200, 250, 300];
/// Doubly nested loops
pub const NESTED_TIER: [u64; 5] = [1_000, 2_000, 3_000, 4_000, 5_000];
/// Flat or logarithmic candidates
pub const FLAT_TIER: [u64; 5] = [10_000, 50_000, 100_000, 500_000, 1_000_000];

pub struct Sampler<'a> {
    config: &'a Config,
}

impl<'a> Sampler<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Chooses the input sizes for a run. Progressive probing spends time from `budget`.
    pub fn select(&self, candidate: &mut dyn Candidate, budget: &RunBudget) -> InputSizeSet {
        let sizes = match self.config.sampler_policy {
            SamplerPolicy::Fixed => self.fixed_sizes(),
            SamplerPolicy::Adaptive => Self::adaptive_sizes(candidate.loop_depth()),
            SamplerPolicy::Progressive => self.progressive_sizes(candidate, budget),
        };
        debug!(policy = ?self.config.sampler_policy, sizes = ?sizes.as_slice(), "input sizes selected");
        sizes
    }

    pub fn fixed_sizes(&self) -> InputSizeSet {
        let sizes = self.config.sizes.clone().unwrap_or_else(|| FIXED_SIZES.to_vec());
        // Config::validate already rejected bad custom sizes
        InputSizeSet::new(sizes).unwrap_or_else(|_| InputSizeSet(FIXED_SIZES.to_vec()))
    }

    /// Size tier for an estimated loop-nesting depth. Without a hint the fixed ladder is used.
    pub fn adaptive_sizes(depth: Option<usize>) -> InputSizeSet {
        let tier: &[u64] = match depth {
            None => &FIXED_SIZES,
            Some(d) if d >= 3 => &DEEP_TIER,
            Some(2) => &NESTED_TIER,
            Some(_) => &FLAT_TIER,
        };
        InputSizeSet(tier.to_vec())
    }

    /// Doubles the size until a single run or the exploration as a whole
    /// gets expensive, then spreads `points` sizes over the explored range.
    pub fn progressive_sizes(&self, candidate: &mut dyn Candidate, budget: &RunBudget) -> InputSizeSet {
        let settings = &self.config.progressive;
        let explore_budget_ms = settings.budget_fraction * self.config.global_budget_ms;
        let per_run = self.config.per_trial_timeout();

        let mut size = settings.start;
        let mut explored = settings.start;
        let mut spent_ms = 0.0;

        while size <= settings.max_size && !budget.is_exhausted() {
            let deadline = budget.call_deadline(per_run);
            let (result, ms) = time_once(|| candidate.invoke(size, Some(deadline)));
            spent_ms += ms;
            if let Err(err) = result {
                debug!(size, error = %err.message, "exploratory run failed, stopping");
                break;
            }
            explored = size;
            debug!(size, ms, spent_ms, "exploratory run");
            if ms >= settings.target_trial_ms || spent_ms >= explore_budget_ms {
                break;
            }
            size = size.saturating_mul(2);
        }

        let low = settings.start.max(explored / 1_000);
        log_spaced(low, explored, settings.points)
    }
}

/// `points` sizes evenly spaced in log space over `[low, high]`, nudged upward
/// where rounding would make neighbours collide.
pub fn log_spaced(low: u64, high: u64, points: usize) -> InputSizeSet {
    let points = points.max(3);
    let low = low.max(1);
    let high = high.max(low);
    let (ln_low, ln_high) = ((low as f64).ln(), (high as f64).ln());

    let mut sizes: Vec<u64> = Vec::with_capacity(points);
    for i in 0..points {
        let t = i as f64 / (points - 1) as f64;
        let mut size = (ln_low + t * (ln_high - ln_low)).exp().round() as u64;
        if let Some(&previous) = sizes.last() {
            size = size.max(previous + 1);
        }
        sizes.push(size.max(1));
    }
    InputSizeSet(sizes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::FnCandidate;
    use std::time::Duration;

    #[test]
    fn test_fixed_sizes_default_and_override() {
        let config = Config::default();
        assert_eq!(Sampler::new(&config).fixed_sizes().as_slice(), &FIXED_SIZES);

        let config = Config { sizes: Some(vec![8, 16, 32]), ..Config::default() };
        assert_eq!(Sampler::new(&config).fixed_sizes().as_slice(), &[8, 16, 32]);
    }

    #[test]
    fn test_adaptive_tiers() {
        assert_eq!(Sampler::adaptive_sizes(Some(3)).as_slice(), &DEEP_TIER);
        assert_eq!(Sampler::adaptive_sizes(Some(5)).as_slice(), &DEEP_TIER);
        assert_eq!(Sampler::adaptive_sizes(Some(2)).as_slice(), &NESTED_TIER);
        assert_eq!(Sampler::adaptive_sizes(Some(1)).as_slice(), &FLAT_TIER);
        assert_eq!(Sampler::adaptive_sizes(Some(0)).as_slice(), &FLAT_TIER);
        assert_eq!(Sampler::adaptive_sizes(None).as_slice(), &FIXED_SIZES);
    }

    #[test]
    fn test_every_tier_is_valid() {
        for tier in [&FIXED_SIZES[..], &DEEP_TIER[..], &NESTED_TIER[..], &FLAT_TIER[..]] {
            assert!(InputSizeSet::new(tier.to_vec()).is_ok());
        }
    }

    #[test]
    fn test_log_spaced() {
        let sizes = log_spaced(10, 10_000, 4);
        assert_eq!(sizes.as_slice(), &[10, 100, 1_000, 10_000]);
    }

    #[test]
    fn test_log_spaced_collapsed_range_stays_increasing() {
        let sizes = log_spaced(16, 16, 5);
        assert_eq!(sizes.as_slice(), &[16, 17, 18, 19, 20]);
        assert!(InputSizeSet::new(sizes.as_slice().to_vec()).is_ok());
    }

    #[test]
    fn test_progressive_stops_at_max_size() {
        let mut config = Config { sampler_policy: SamplerPolicy::Progressive, ..Config::default() };
        config.progressive.start = 8;
        config.progressive.max_size = 1_024;
        config.progressive.points = 4;

        let mut seen = Vec::new();
        let mut candidate = FnCandidate::new(|n| {
            seen.push(n);
            Ok(())
        });
        let budget = RunBudget::new(Duration::from_secs(30));
        let sizes = Sampler::new(&config).select(&mut candidate, &budget);
        drop(candidate);

        assert_eq!(seen, vec![8, 16, 32, 64, 128, 256, 512, 1024]);
        assert_eq!(sizes.as_slice(), &[8, 40, 203, 1024]);
    }

    #[test]
    fn test_progressive_stops_on_failure() {
        let mut config = Config { sampler_policy: SamplerPolicy::Progressive, ..Config::default() };
        config.progressive.start = 4;
        let mut candidate = FnCandidate::new(|n| if n > 64 { Err("too large".into()) } else { Ok(()) });
        let budget = RunBudget::new(Duration::from_secs(30));
        let sizes = Sampler::new(&config).select(&mut candidate, &budget);
        assert_eq!(*sizes.as_slice().first().unwrap(), 4);
        assert_eq!(*sizes.as_slice().last().unwrap(), 64);
        assert_eq!(sizes.len(), 5);
    }
}
