// Empirical complexity analysis for Ruff candidates
//
// This module turns timings into a growth estimate:
// - sampler: which input sizes to measure
// - measurer: repeated timed trials per size under a time budget
// - regression: power-law fit in log-log space
// - classifier: exponent or ratio bands to a complexity class
// - estimator: sequences the above into one report
//
// Usage:
//   let report = estimate_complexity(source, &Config::default())?;
//   Reporter::print(&report);

pub mod classifier;
pub mod estimator;
pub mod measurer;
pub mod regression;
pub mod reporter;
pub mod sampler;
pub mod stats;
pub mod timer;

pub use classifier::{Classification, Classifier, ClassifierStrategy, ExponentThresholds, RatioThresholds};
pub use estimator::{classify_series, estimate_complexity, Estimator};
pub use measurer::{Measurement, Measurer, TrialOutcome};
pub use regression::{fit_series, RegressionFit};
pub use reporter::{ReportView, Reporter};
pub use sampler::Sampler;
pub use stats::Statistics;
pub use timer::{RunBudget, Timer};

use crate::config::{validate_sizes, ClassifierKind, SamplerPolicy};
use crate::errors::{AnalysisError, ErrorKind};
use serde::Serialize;
use std::fmt;

/// Duration recorded for a size where no trial produced a usable reading
pub const SENTINEL_DURATION_MS: f64 = 9999.0;

/// How a sample point's duration came about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PointOutcome {
    /// Aggregated from valid trials
    Measured,
    /// Every completed trial was under the resolution floor; duration is the floor
    BelowResolution,
    /// Every trial failed or ran too long; duration is the sentinel
    Sentinel,
}

/// One representative duration per input size
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SamplePoint {
    pub size: u64,
    pub duration_ms: f64,
    pub valid_trial_count: usize,
    pub outcome: PointOutcome,
    /// Why the last unusable trial at this size was rejected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl SamplePoint {
    pub fn measured(size: u64, duration_ms: f64, valid_trial_count: usize) -> Self {
        Self { size, duration_ms, valid_trial_count, outcome: PointOutcome::Measured, last_error: None }
    }

    pub fn below_resolution(size: u64, floor_ms: f64) -> Self {
        Self {
            size,
            duration_ms: floor_ms,
            valid_trial_count: 0,
            outcome: PointOutcome::BelowResolution,
            last_error: None,
        }
    }

    pub fn sentinel(size: u64) -> Self {
        Self {
            size,
            duration_ms: SENTINEL_DURATION_MS,
            valid_trial_count: 0,
            outcome: PointOutcome::Sentinel,
            last_error: None,
        }
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.last_error = Some(message.into());
        self
    }

    pub fn is_sentinel(&self) -> bool {
        self.outcome == PointOutcome::Sentinel
    }
}

/// Sample points in probing order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MeasurementSeries {
    points: Vec<SamplePoint>,
}

impl MeasurementSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points(points: Vec<SamplePoint>) -> Self {
        Self { points }
    }

    /// Builds a fully measured series from `(size, duration_ms)` pairs
    pub fn from_durations(pairs: &[(u64, f64)]) -> Self {
        Self::from_points(pairs.iter().map(|&(size, d)| SamplePoint::measured(size, d, 1)).collect())
    }

    pub fn push(&mut self, point: SamplePoint) {
        self.points.push(point);
    }

    pub fn points(&self) -> &[SamplePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points carrying a real reading (measured or resolution-limited)
    pub fn usable_count(&self) -> usize {
        self.points.iter().filter(|p| !p.is_sentinel()).count()
    }
}

/// Strictly increasing sizes, at least three, chosen once before measuring
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct InputSizeSet(Vec<u64>);

impl InputSizeSet {
    pub fn new(sizes: Vec<u64>) -> Result<Self, AnalysisError> {
        validate_sizes(&sizes)?;
        Ok(Self(sizes))
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Complexity labels, ordered from cheapest to most expensive
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityClass {
    Constant,
    Logarithmic,
    Linear,
    Linearithmic,
    Quadratic,
    CubicOrWorse,
    Unknown,
}

impl ComplexityClass {
    pub fn notation(&self) -> &'static str {
        match self {
            ComplexityClass::Constant => "O(1)",
            ComplexityClass::Logarithmic => "O(log n)",
            ComplexityClass::Linear => "O(n)",
            ComplexityClass::Linearithmic => "O(n log n)",
            ComplexityClass::Quadratic => "O(n^2)",
            ComplexityClass::CubicOrWorse => "O(n^3) or worse",
            ComplexityClass::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ComplexityClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match self {
            ComplexityClass::Constant => "constant",
            ComplexityClass::Logarithmic => "logarithmic",
            ComplexityClass::Linear => "linear",
            ComplexityClass::Linearithmic => "linearithmic",
            ComplexityClass::Quadratic => "quadratic",
            ComplexityClass::CubicOrWorse => "cubic-or-worse",
            ComplexityClass::Unknown => "unknown",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    Low,
    Medium,
    High,
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfidenceTier::Low => write!(f, "low"),
            ConfidenceTier::Medium => write!(f, "medium"),
            ConfidenceTier::High => write!(f, "high"),
        }
    }
}

/// Why a run ended
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Termination {
    Completed,
    /// The time budget ran out while measuring `at_size`
    BudgetExceeded { at_size: u64 },
    /// Too few usable points to fit
    DegenerateFit { usable_points: usize },
}

impl Termination {
    /// The error kind an unsuccessful run is reported under
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Termination::Completed => None,
            Termination::BudgetExceeded { .. } => Some(ErrorKind::BudgetExceeded),
            Termination::DegenerateFit { .. } => Some(ErrorKind::DegenerateFit),
        }
    }
}

/// The single output of an analysis run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EstimationReport {
    pub complexity_class: ComplexityClass,
    pub exponent: Option<f64>,
    pub r_squared: Option<f64>,
    pub confidence: Option<ConfidenceTier>,
    /// Mean consecutive duration ratio, set by the ratio classifier
    pub average_ratio: Option<f64>,
    pub series: MeasurementSeries,
    pub bailed_out: bool,
    pub termination: Termination,
    pub sampler_policy: SamplerPolicy,
    pub classifier: ClassifierKind,
    /// Sizes planned before measuring; the series may stop short of them
    pub planned_sizes: InputSizeSet,
    pub elapsed_ms: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_size_set_validation() {
        assert!(InputSizeSet::new(vec![1, 2, 3]).is_ok());
        assert!(InputSizeSet::new(vec![3, 2, 1]).is_err());
        assert!(InputSizeSet::new(vec![1, 2]).is_err());
    }

    #[test]
    fn test_usable_count_skips_sentinels() {
        let series = MeasurementSeries::from_points(vec![
            SamplePoint::measured(10, 1.0, 5),
            SamplePoint::below_resolution(20, 0.05),
            SamplePoint::sentinel(40),
        ]);
        assert_eq!(series.len(), 3);
        assert_eq!(series.usable_count(), 2);
        assert_eq!(series.points()[2].duration_ms, SENTINEL_DURATION_MS);
    }

    #[test]
    fn test_class_ordering_and_labels() {
        assert!(ComplexityClass::Linear < ComplexityClass::Quadratic);
        assert_eq!(ComplexityClass::CubicOrWorse.to_string(), "cubic-or-worse");
        assert_eq!(ComplexityClass::Linearithmic.notation(), "O(n log n)");
    }

    #[test]
    fn test_termination_serializes_tagged() {
        let json = serde_json::to_string(&Termination::BudgetExceeded { at_size: 500 }).unwrap();
        assert_eq!(json, r#"{"kind":"budget_exceeded","at_size":500}"#);
    }

    #[test]
    fn test_termination_error_kind() {
        assert_eq!(Termination::Completed.error_kind(), None);
        assert_eq!(Termination::BudgetExceeded { at_size: 1 }.error_kind(), Some(ErrorKind::BudgetExceeded));
        assert_eq!(
            Termination::DegenerateFit { usable_points: 0 }.error_kind(),
            Some(ErrorKind::DegenerateFit)
        );
    }

    #[test]
    fn test_sentinel_error_is_serialized_only_when_set() {
        let plain = serde_json::to_value(SamplePoint::sentinel(10)).unwrap();
        assert!(plain.get("last_error").is_none());
        let failed = serde_json::to_value(SamplePoint::sentinel(10).with_error("boom")).unwrap();
        assert_eq!(failed["last_error"], "boom");
    }
}
