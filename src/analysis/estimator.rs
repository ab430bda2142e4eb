// Estimator - runs the whole analysis pipeline
//
// compile → select sizes → measure → classify → report
//
// `estimate_complexity` is the entry point for source text. It runs the
// pipeline on a worker thread sized for the configured call depth, and a panic
// comes back as an error value instead of unwinding into the caller.

use super::classifier::{Classification, Classifier, ClassifierStrategy};
use super::measurer::Measurer;
use super::regression::fit_series;
use super::sampler::Sampler;
use super::timer::RunBudget;
use super::{ComplexityClass, ConfidenceTier, EstimationReport, MeasurementSeries, Termination};
use crate::config::{ClassifierKind, Config};
use crate::errors::AnalysisError;
use crate::sandbox::{run_on_worker, Candidate, Sandbox};
use tracing::{info, warn};

pub struct Estimator {
    config: Config,
    classifier: Classifier,
}

impl Estimator {
    pub fn new(config: Config) -> Result<Self, AnalysisError> {
        config.validate()?;
        let classifier = Classifier::from_kind(config.classifier_kind());
        Ok(Self { config, classifier })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Compiles and analyzes source text on the calling thread. Deeply
    /// recursive candidates need [`run_on_worker`] or [`estimate_complexity`].
    pub fn estimate_source(&self, source: &str) -> Result<EstimationReport, AnalysisError> {
        let mut candidate = Sandbox::compile(source, &self.config)?;
        Ok(self.estimate_candidate(&mut candidate))
    }

    /// Analyzes an already compiled (or native) candidate
    pub fn estimate_candidate(&self, candidate: &mut dyn Candidate) -> EstimationReport {
        let budget = RunBudget::new(self.config.global_budget());

        let sizes = Sampler::new(&self.config).select(candidate, &budget);
        let measurement = Measurer::from_config(&self.config).measure(candidate, &sizes, &budget);
        let series = measurement.series;

        let (classification, termination) = match measurement.bailed_out_at {
            Some(at_size) => (bailout_classification(&series), Termination::BudgetExceeded { at_size }),
            None => {
                let classification = self.classifier.classify(&series);
                let termination = if classification.class == ComplexityClass::Unknown {
                    warn!(usable = series.usable_count(), "too few usable points for a fit");
                    Termination::DegenerateFit { usable_points: series.usable_count() }
                } else {
                    Termination::Completed
                };
                (classification, termination)
            }
        };

        let report = EstimationReport {
            complexity_class: classification.class,
            exponent: classification.fit.map(|fit| fit.slope),
            r_squared: classification.fit.map(|fit| fit.r_squared),
            confidence: classification.confidence,
            average_ratio: classification.average_ratio,
            bailed_out: matches!(termination, Termination::BudgetExceeded { .. }),
            termination,
            series,
            sampler_policy: self.config.sampler_policy,
            classifier: self.classifier.kind(),
            planned_sizes: sizes,
            elapsed_ms: budget.elapsed_ms(),
        };

        info!(
            class = %report.complexity_class,
            exponent = ?report.exponent,
            r_squared = ?report.r_squared,
            confidence = ?report.confidence,
            bailed_out = report.bailed_out,
            elapsed_ms = report.elapsed_ms,
            "analysis finished"
        );
        report
    }
}

/// A bailout is reported as cubic-or-worse. Whatever could be fitted from the
/// partial series is kept for display.
fn bailout_classification(series: &MeasurementSeries) -> Classification {
    Classification {
        class: ComplexityClass::CubicOrWorse,
        confidence: Some(ConfidenceTier::Low),
        fit: fit_series(series),
        average_ratio: None,
    }
}

/// Classifies a finished series with the given strategy. Pure and deterministic.
pub fn classify_series(series: &MeasurementSeries, kind: ClassifierKind) -> Classification {
    Classifier::from_kind(kind).classify(series)
}

/// Estimates the time complexity of a candidate script.
///
/// Compile errors and invalid configuration are returned as errors. Everything
/// that happens during measurement, including budget bailouts and unusable
/// series, is described by the report.
pub fn estimate_complexity(source: &str, config: &Config) -> Result<EstimationReport, AnalysisError> {
    let estimator = Estimator::new(config.clone())?;
    run_on_worker(estimator.config.max_call_depth, || estimator.estimate_source(source))
}
