// Measurer - times a candidate across an input size set
//
// For every size: optional warmup runs whose timings are discarded, then up to
// `trial_count` timed trials. Only trials strictly inside the (floor, ceiling)
// window are valid. The run budget is checked before every call and after it;
// once it is spent the measurement stops and keeps the points gathered so far.

use super::stats::Statistics;
use super::timer::{time_once, RunBudget};
use super::{InputSizeSet, MeasurementSeries, SamplePoint};
use crate::config::{Aggregation, Config};
use crate::errors::ErrorKind;
use crate::sandbox::Candidate;
use std::time::Duration;
use tracing::{debug, warn};

/// Verdict on one timed call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrialOutcome {
    /// Strictly between the resolution floor and the per-trial ceiling
    Valid,
    /// At or under the resolution floor
    BelowResolution,
    /// Reached the per-trial ceiling (or was cancelled there)
    TooSlow,
    /// The candidate raised an error with this message
    Failed(String),
    /// The run budget is spent
    Exhausted,
}

/// Series produced by a measurement pass
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub series: MeasurementSeries,
    /// Size being measured when the budget ran out
    pub bailed_out_at: Option<u64>,
}

pub struct Measurer {
    trial_count: usize,
    warmup_runs: usize,
    per_trial: Duration,
    floor_ms: f64,
    ceiling_ms: f64,
    aggregation: Aggregation,
}

enum SizeResult {
    Point(SamplePoint),
    Bailout,
}

impl Measurer {
    pub fn from_config(config: &Config) -> Self {
        Self {
            trial_count: config.trial_count,
            warmup_runs: config.warmup_runs,
            per_trial: config.per_trial_timeout(),
            floor_ms: config.min_valid_duration_ms,
            ceiling_ms: config.per_trial_timeout_ms,
            aggregation: config.aggregation,
        }
    }

    pub fn with_trials(mut self, trial_count: usize) -> Self {
        self.trial_count = trial_count;
        self
    }

    pub fn with_warmup(mut self, warmup_runs: usize) -> Self {
        self.warmup_runs = warmup_runs;
        self
    }

    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    /// Measures every size in order, stopping early if the budget runs out
    pub fn measure(&self, candidate: &mut dyn Candidate, sizes: &InputSizeSet, budget: &RunBudget) -> Measurement {
        let mut series = MeasurementSeries::new();
        for &size in sizes.as_slice() {
            match self.measure_size(candidate, size, budget) {
                SizeResult::Point(point) => {
                    debug!(
                        size,
                        duration_ms = point.duration_ms,
                        valid = point.valid_trial_count,
                        outcome = ?point.outcome,
                        "size measured"
                    );
                    series.push(point);
                }
                SizeResult::Bailout => {
                    warn!(
                        size,
                        elapsed_ms = budget.elapsed_ms(),
                        budget_ms = budget.limit().as_secs_f64() * 1000.0,
                        "time budget exhausted, abandoning larger sizes"
                    );
                    return Measurement { series, bailed_out_at: Some(size) };
                }
            }
        }
        Measurement { series, bailed_out_at: None }
    }

    fn measure_size(&self, candidate: &mut dyn Candidate, size: u64, budget: &RunBudget) -> SizeResult {
        // Warmup timings are discarded, but a size that already hits the
        // ceiling is skipped the same way a slow timed trial would skip it
        for _ in 0..self.warmup_runs {
            match self.run_trial(candidate, size, budget).0 {
                TrialOutcome::Exhausted => return SizeResult::Bailout,
                TrialOutcome::TooSlow => {
                    debug!(size, "warmup reached the ceiling, skipping size");
                    return SizeResult::Point(SamplePoint::sentinel(size).with_error(self.too_slow_message()));
                }
                _ => {}
            }
        }

        let mut valid = Vec::with_capacity(self.trial_count);
        let mut below = 0usize;
        let mut last_error: Option<String> = None;

        for trial in 0..self.trial_count {
            let (outcome, ms) = self.run_trial(candidate, size, budget);
            debug!(size, trial, ?outcome, ms, "trial");
            match outcome {
                TrialOutcome::Valid => valid.push(ms),
                TrialOutcome::BelowResolution => below += 1,
                TrialOutcome::Failed(message) => last_error = Some(message),
                TrialOutcome::TooSlow => {
                    last_error = Some(self.too_slow_message());
                    // Later trials at this size would only burn budget
                    break;
                }
                TrialOutcome::Exhausted => return SizeResult::Bailout,
            }
        }

        let point = match (Statistics::from_samples(&valid), last_error) {
            (Some(stats), _) => {
                let duration = match self.aggregation {
                    Aggregation::Mean => stats.mean,
                    Aggregation::BestOf => stats.min,
                };
                SamplePoint::measured(size, duration, stats.samples)
            }
            (None, None) if below > 0 => SamplePoint::below_resolution(size, self.floor_ms),
            (None, Some(message)) => {
                debug!(size, error = %message, "no valid trial at this size");
                SamplePoint::sentinel(size).with_error(message)
            }
            (None, None) => SamplePoint::sentinel(size),
        };
        SizeResult::Point(point)
    }

    fn too_slow_message(&self) -> String {
        format!("reached the per-trial ceiling of {} ms", self.ceiling_ms)
    }

    /// Runs one timed call and classifies it
    pub fn run_trial(&self, candidate: &mut dyn Candidate, size: u64, budget: &RunBudget) -> (TrialOutcome, f64) {
        if budget.is_exhausted() {
            return (TrialOutcome::Exhausted, 0.0);
        }
        let deadline = budget.call_deadline(self.per_trial);
        let (result, ms) = time_once(|| candidate.invoke(size, Some(deadline)));

        // A trial that used up the rest of the run budget ends the run
        if budget.is_exhausted() {
            return (TrialOutcome::Exhausted, ms);
        }
        let outcome = match result {
            Err(err) if err.kind == ErrorKind::Timeout => TrialOutcome::TooSlow,
            Err(err) => TrialOutcome::Failed(err.message),
            Ok(()) if ms >= self.ceiling_ms => TrialOutcome::TooSlow,
            Ok(()) if ms <= self.floor_ms => TrialOutcome::BelowResolution,
            Ok(()) => TrialOutcome::Valid,
        };
        (outcome, ms)
    }
}
