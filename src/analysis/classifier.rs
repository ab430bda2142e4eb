// Classification strategies
//
// Two independent ways to turn a measurement series into a complexity class:
// - exponent bands over the log-log regression slope
// - ratio bands over the average growth between consecutive sizes
//
// Both are pure functions of the series.

use super::regression::{fit_series, RegressionFit};
use super::stats;
use super::{ComplexityClass, ConfidenceTier, MeasurementSeries};
use crate::config::ClassifierKind;

/// Ratios that are not finite are replaced by this
pub const RATIO_CLAMP: f64 = 1e6;

/// Result of classifying one series
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub class: ComplexityClass,
    pub confidence: Option<ConfidenceTier>,
    pub fit: Option<RegressionFit>,
    pub average_ratio: Option<f64>,
}

impl Classification {
    pub fn unknown() -> Self {
        Self { class: ComplexityClass::Unknown, confidence: None, fit: None, average_ratio: None }
    }
}

pub trait ClassifierStrategy {
    fn kind(&self) -> ClassifierKind;
    fn classify(&self, series: &MeasurementSeries) -> Classification;
}

/// Picks the first band whose upper bound is above `value`
fn band(value: f64, bands: &[(f64, ComplexityClass)], otherwise: ComplexityClass) -> ComplexityClass {
    bands
        .iter()
        .find(|(upper, _)| value < *upper)
        .map(|(_, class)| *class)
        .unwrap_or(otherwise)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExponentThresholds {
    /// Exclusive upper exponent bound per class, ascending
    pub bands: [(f64, ComplexityClass); 5],
    pub high_r_squared: f64,
    pub medium_r_squared: f64,
    /// Residual spread bounds used for flat (constant) fits
    pub high_flatness: f64,
    pub medium_flatness: f64,
}

impl Default for ExponentThresholds {
    fn default() -> Self {
        Self {
            bands: [
                (0.2, ComplexityClass::Constant),
                (0.7, ComplexityClass::Logarithmic),
                (1.3, ComplexityClass::Linear),
                (1.8, ComplexityClass::Linearithmic),
                (2.4, ComplexityClass::Quadratic),
            ],
            high_r_squared: 0.97,
            medium_r_squared: 0.85,
            high_flatness: 0.25,
            medium_flatness: 0.5,
        }
    }
}

impl ExponentThresholds {
    pub fn class_for(&self, exponent: f64) -> ComplexityClass {
        band(exponent, &self.bands, ComplexityClass::CubicOrWorse)
    }

    /// R² says nothing about a flat line, so constant fits are judged by how
    /// tightly the points hug it instead.
    pub fn confidence_for(&self, class: ComplexityClass, fit: &RegressionFit) -> ConfidenceTier {
        if class == ComplexityClass::Constant {
            if fit.residual_sd < self.high_flatness {
                ConfidenceTier::High
            } else if fit.residual_sd < self.medium_flatness {
                ConfidenceTier::Medium
            } else {
                ConfidenceTier::Low
            }
        } else if fit.r_squared > self.high_r_squared {
            ConfidenceTier::High
        } else if fit.r_squared > self.medium_r_squared {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }
}

impl ClassifierStrategy for ExponentThresholds {
    fn kind(&self) -> ClassifierKind {
        ClassifierKind::Exponent
    }

    fn classify(&self, series: &MeasurementSeries) -> Classification {
        let fit = match fit_series(series) {
            Some(fit) => fit,
            None => return Classification::unknown(),
        };
        let class = self.class_for(fit.slope);
        Classification {
            class,
            confidence: Some(self.confidence_for(class, &fit)),
            fit: Some(fit),
            average_ratio: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RatioThresholds {
    /// Exclusive upper average-ratio bound per class, ascending
    pub bands: [(f64, ComplexityClass); 4],
    /// Standard deviation of ln(ratio) bounds for the confidence tiers
    pub high_spread: f64,
    pub medium_spread: f64,
}

impl Default for RatioThresholds {
    fn default() -> Self {
        Self {
            bands: [
                (2.5, ComplexityClass::Constant),
                (12.0, ComplexityClass::Logarithmic),
                (100.0, ComplexityClass::Linear),
                (1000.0, ComplexityClass::Linearithmic),
            ],
            high_spread: 0.35,
            medium_spread: 0.8,
        }
    }
}

impl RatioThresholds {
    /// The top band is "quadratic or worse"
    pub fn class_for(&self, average_ratio: f64) -> ComplexityClass {
        band(average_ratio, &self.bands, ComplexityClass::Quadratic)
    }

    /// Consecutive duration ratios with non-finite values clamped
    pub fn ratios(series: &MeasurementSeries) -> Vec<f64> {
        series
            .points()
            .windows(2)
            .map(|pair| {
                let ratio = pair[1].duration_ms / pair[0].duration_ms;
                if ratio.is_finite() {
                    ratio
                } else {
                    RATIO_CLAMP
                }
            })
            .collect()
    }

    fn confidence_for(&self, ratios: &[f64]) -> ConfidenceTier {
        if ratios.len() < 2 {
            return ConfidenceTier::Medium;
        }
        let logs: Vec<f64> = ratios.iter().map(|r| r.clamp(1.0 / RATIO_CLAMP, RATIO_CLAMP).ln()).collect();
        match stats::std_dev(&logs) {
            Some(spread) if spread < self.high_spread => ConfidenceTier::High,
            Some(spread) if spread < self.medium_spread => ConfidenceTier::Medium,
            _ => ConfidenceTier::Low,
        }
    }
}

impl ClassifierStrategy for RatioThresholds {
    fn kind(&self) -> ClassifierKind {
        ClassifierKind::Ratio
    }

    fn classify(&self, series: &MeasurementSeries) -> Classification {
        if series.usable_count() < 2 {
            return Classification::unknown();
        }
        let ratios = Self::ratios(series);
        let average = match stats::mean(&ratios) {
            Some(average) => average,
            None => return Classification::unknown(),
        };
        Classification {
            class: self.class_for(average),
            confidence: Some(self.confidence_for(&ratios)),
            fit: None,
            average_ratio: Some(average),
        }
    }
}

/// The configured strategy
#[derive(Debug, Clone, PartialEq)]
pub enum Classifier {
    Exponent(ExponentThresholds),
    Ratio(RatioThresholds),
}

impl Classifier {
    pub fn from_kind(kind: ClassifierKind) -> Self {
        match kind {
            ClassifierKind::Exponent => Classifier::Exponent(ExponentThresholds::default()),
            ClassifierKind::Ratio => Classifier::Ratio(RatioThresholds::default()),
        }
    }
}

impl ClassifierStrategy for Classifier {
    fn kind(&self) -> ClassifierKind {
        match self {
            Classifier::Exponent(strategy) => strategy.kind(),
            Classifier::Ratio(strategy) => strategy.kind(),
        }
    }

    fn classify(&self, series: &MeasurementSeries) -> Classification {
        match self {
            Classifier::Exponent(strategy) => strategy.classify(series),
            Classifier::Ratio(strategy) => strategy.classify(series),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::SamplePoint;

    fn power_series(exponent: f64) -> MeasurementSeries {
        let pairs: Vec<(u64, f64)> = [500u64, 1000, 2000, 5000, 10000]
            .iter()
            .map(|&n| (n, 1e-4 * (n as f64).powf(exponent)))
            .collect();
        MeasurementSeries::from_durations(&pairs)
    }

    #[test]
    fn test_exponent_bands() {
        let t = ExponentThresholds::default();
        assert_eq!(t.class_for(0.05), ComplexityClass::Constant);
        assert_eq!(t.class_for(0.5), ComplexityClass::Logarithmic);
        assert_eq!(t.class_for(1.0), ComplexityClass::Linear);
        assert_eq!(t.class_for(1.3), ComplexityClass::Linearithmic);
        assert_eq!(t.class_for(2.0), ComplexityClass::Quadratic);
        assert_eq!(t.class_for(2.4), ComplexityClass::CubicOrWorse);
        assert_eq!(t.class_for(3.1), ComplexityClass::CubicOrWorse);
    }

    #[test]
    fn test_exponent_strategy_on_clean_series() {
        let result = ExponentThresholds::default().classify(&power_series(2.0));
        assert_eq!(result.class, ComplexityClass::Quadratic);
        assert_eq!(result.confidence, Some(ConfidenceTier::High));
        assert!((result.fit.unwrap().slope - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_flat_series_is_confident_constant() {
        let series = MeasurementSeries::from_durations(&[(500, 0.05), (1000, 0.05), (5000, 0.05)]);
        let result = ExponentThresholds::default().classify(&series);
        assert_eq!(result.class, ComplexityClass::Constant);
        assert_eq!(result.confidence, Some(ConfidenceTier::High));
        assert_eq!(result.fit.unwrap().r_squared, 0.0);
    }

    #[test]
    fn test_noisy_flat_series_is_not_high() {
        let series = MeasurementSeries::from_durations(&[
            (500, 1.0),
            (1000, 3.0),
            (2000, 0.5),
            (4000, 2.5),
            (8000, 0.6),
        ]);
        let result = ExponentThresholds::default().classify(&series);
        assert_eq!(result.class, ComplexityClass::Constant);
        assert_ne!(result.confidence, Some(ConfidenceTier::High));
    }

    #[test]
    fn test_degenerate_series_is_unknown() {
        let series = MeasurementSeries::from_points(vec![
            SamplePoint::measured(500, 1.0, 5),
            SamplePoint::sentinel(1000),
            SamplePoint::sentinel(2000),
        ]);
        for kind in [ClassifierKind::Exponent, ClassifierKind::Ratio] {
            let result = Classifier::from_kind(kind).classify(&series);
            assert_eq!(result.class, ComplexityClass::Unknown);
            assert_eq!(result.confidence, None);
        }
    }

    #[test]
    fn test_ratio_bands() {
        let t = RatioThresholds::default();
        assert_eq!(t.class_for(1.0), ComplexityClass::Constant);
        assert_eq!(t.class_for(5.0), ComplexityClass::Logarithmic);
        assert_eq!(t.class_for(50.0), ComplexityClass::Linear);
        assert_eq!(t.class_for(500.0), ComplexityClass::Linearithmic);
        assert_eq!(t.class_for(5000.0), ComplexityClass::Quadratic);
    }

    #[test]
    fn test_ratio_zero_denominator_is_clamped() {
        let series = MeasurementSeries::from_durations(&[(10, 0.0), (100, 1.0), (1000, 1.0)]);
        let ratios = RatioThresholds::ratios(&series);
        assert_eq!(ratios, vec![RATIO_CLAMP, 1.0]);
        let result = RatioThresholds::default().classify(&series);
        assert!(result.average_ratio.unwrap().is_finite());
        assert_eq!(result.class, ComplexityClass::Quadratic);
    }

    #[test]
    fn test_ratio_strategy_steady_growth() {
        let series = MeasurementSeries::from_durations(&[(100, 1.0), (1000, 10.0), (10000, 100.0)]);
        let result = RatioThresholds::default().classify(&series);
        assert_eq!(result.average_ratio, Some(10.0));
        assert_eq!(result.class, ComplexityClass::Logarithmic);
        assert_eq!(result.confidence, Some(ConfidenceTier::High));
        assert!(result.fit.is_none());
    }

    #[test]
    fn test_same_series_same_result() {
        let series = power_series(1.0);
        let classifier = Classifier::from_kind(ClassifierKind::Exponent);
        let first = classifier.classify(&series);
        for _ in 0..10 {
            assert_eq!(classifier.classify(&series), first);
        }
    }
}
