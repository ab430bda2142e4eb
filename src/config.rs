// File: src/config.rs
//
// Analysis configuration.
//
// Every knob of a run lives in `Config`: the sampler policy, trial counts,
// time budgets and sandbox limits. A config can be loaded from a TOML file,
// and any field left out takes its default. The CLI layers its flags on top.

use crate::errors::AnalysisError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Longest duration any timeout or budget may be set to (one day)
pub const MAX_DURATION_MS: f64 = 86_400_000.0;

/// Deepest script recursion a config may allow; each level reserves worker stack
pub const MAX_CALL_DEPTH: usize = 50_000;

/// How the input sizes for a run are chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SamplerPolicy {
    /// Fixed size set spanning 500 to 100,000 (or `sizes` when given)
    #[default]
    Fixed,
    /// Size tier picked from the loop-nesting depth of the candidate
    Adaptive,
    /// Doubling exploration followed by log-spaced sizes over the explored range
    Progressive,
}

/// Which classification strategy turns a series into a complexity class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
    /// Log-log regression slope mapped through exponent bands
    Exponent,
    /// Average consecutive duration ratio mapped through ratio bands
    Ratio,
}

/// How valid trial durations at one size become a representative duration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    #[default]
    Mean,
    BestOf,
}

/// Tuning for [`SamplerPolicy::Progressive`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProgressiveConfig {
    /// First explored size
    pub start: u64,
    /// Share of the global budget the doubling exploration may spend
    pub budget_fraction: f64,
    /// Doubling stops once a single exploratory run takes this long
    pub target_trial_ms: f64,
    /// Hard upper bound on explored sizes
    pub max_size: u64,
    /// Number of log-spaced sizes selected afterwards (4-6)
    pub points: usize,
}

impl Default for ProgressiveConfig {
    fn default() -> Self {
        Self {
            start: 16,
            budget_fraction: 0.25,
            target_trial_ms: 100.0,
            max_size: 1_000_000,
            points: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub sampler_policy: SamplerPolicy,
    /// Explicit classifier; `None` pairs it with the sampler policy
    pub classifier: Option<ClassifierKind>,
    pub aggregation: Aggregation,
    /// Maximum timed trials per size
    pub trial_count: usize,
    /// A trial at or above this duration is invalid and cancelled
    pub per_trial_timeout_ms: f64,
    /// Wall-clock budget for the whole run
    pub global_budget_ms: f64,
    /// A trial at or below this duration is below clock resolution
    pub min_valid_duration_ms: f64,
    /// Overrides the fixed size set
    pub sizes: Option<Vec<u64>>,
    /// Name of the function under analysis
    pub entry_point: String,
    /// Input used for the smoke invocation at compile time
    pub smoke_input: u64,
    pub max_call_depth: usize,
    pub max_collection_len: usize,
    /// Untimed runs before the trials at each size
    pub warmup_runs: usize,
    pub progressive: ProgressiveConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sampler_policy: SamplerPolicy::Fixed,
            classifier: None,
            aggregation: Aggregation::Mean,
            trial_count: 5,
            per_trial_timeout_ms: 2_000.0,
            global_budget_ms: 30_000.0,
            min_valid_duration_ms: 0.05,
            sizes: None,
            entry_point: "algoritmo".to_string(),
            smoke_input: 10,
            max_call_depth: crate::interpreter::DEFAULT_MAX_CALL_DEPTH,
            max_collection_len: crate::interpreter::DEFAULT_MAX_COLLECTION_LEN,
            warmup_runs: 0,
            progressive: ProgressiveConfig::default(),
        }
    }
}

impl Config {
    /// Load a config from a TOML file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, AnalysisError> {
        let text = fs::read_to_string(path).map_err(|e| {
            AnalysisError::io(format!("Cannot read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&text).map_err(|e| e.with_note(format!("while loading '{}'", path.display())))
    }

    pub fn from_toml_str(text: &str) -> Result<Self, AnalysisError> {
        let config: Config = toml::from_str(text)
            .map_err(|e| AnalysisError::invalid_config(e.to_string().trim_end().to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings no run could honour
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !(1..=100).contains(&self.trial_count) {
            return Err(AnalysisError::invalid_config(format!(
                "trial_count must be between 1 and 100, got {}",
                self.trial_count
            )));
        }
        for (name, value) in [
            ("per_trial_timeout_ms", self.per_trial_timeout_ms),
            ("global_budget_ms", self.global_budget_ms),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(AnalysisError::invalid_config(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
            if value > MAX_DURATION_MS {
                return Err(AnalysisError::invalid_config(format!(
                    "{} must be at most {} (one day), got {}",
                    name, MAX_DURATION_MS, value
                )));
            }
        }
        if !(self.min_valid_duration_ms.is_finite() && self.min_valid_duration_ms >= 0.0) {
            return Err(AnalysisError::invalid_config(format!(
                "min_valid_duration_ms must be non-negative, got {}",
                self.min_valid_duration_ms
            )));
        }
        if self.min_valid_duration_ms >= self.per_trial_timeout_ms {
            return Err(AnalysisError::invalid_config(
                "min_valid_duration_ms must be below per_trial_timeout_ms",
            )
            .with_help("no trial could ever be valid with this resolution window"));
        }
        if let Some(sizes) = &self.sizes {
            validate_sizes(sizes)?;
        }
        if self.entry_point.trim().is_empty() {
            return Err(AnalysisError::invalid_config("entry_point must not be empty"));
        }
        if self.max_call_depth == 0 || self.max_collection_len == 0 {
            return Err(AnalysisError::invalid_config(
                "max_call_depth and max_collection_len must be positive",
            ));
        }
        if self.max_call_depth > MAX_CALL_DEPTH {
            return Err(AnalysisError::invalid_config(format!(
                "max_call_depth must be at most {}, got {}",
                MAX_CALL_DEPTH, self.max_call_depth
            )));
        }

        let p = &self.progressive;
        if p.start == 0 || p.max_size <= p.start {
            return Err(AnalysisError::invalid_config(format!(
                "progressive sizes need 0 < start < max_size, got start={} max_size={}",
                p.start, p.max_size
            )));
        }
        if !(p.budget_fraction > 0.0 && p.budget_fraction <= 1.0) {
            return Err(AnalysisError::invalid_config(format!(
                "progressive.budget_fraction must be in (0, 1], got {}",
                p.budget_fraction
            )));
        }
        if !(p.target_trial_ms.is_finite() && p.target_trial_ms > 0.0 && p.target_trial_ms <= MAX_DURATION_MS) {
            return Err(AnalysisError::invalid_config(format!(
                "progressive.target_trial_ms must be positive and at most {}, got {}",
                MAX_DURATION_MS, p.target_trial_ms
            )));
        }
        if !(4..=6).contains(&p.points) {
            return Err(AnalysisError::invalid_config(format!(
                "progressive.points must be between 4 and 6, got {}",
                p.points
            )));
        }
        Ok(())
    }

    /// The classifier for this run: explicit, or paired with the sampler policy
    pub fn classifier_kind(&self) -> ClassifierKind {
        self.classifier.unwrap_or(match self.sampler_policy {
            SamplerPolicy::Adaptive => ClassifierKind::Ratio,
            SamplerPolicy::Fixed | SamplerPolicy::Progressive => ClassifierKind::Exponent,
        })
    }

    pub fn per_trial_timeout(&self) -> Duration {
        duration_from_ms(self.per_trial_timeout_ms)
    }

    pub fn global_budget(&self) -> Duration {
        duration_from_ms(self.global_budget_ms)
    }
}

/// Clamped into `[0, MAX_DURATION_MS]`; NaN becomes zero
fn duration_from_ms(ms: f64) -> Duration {
    Duration::try_from_secs_f64(ms.clamp(0.0, MAX_DURATION_MS) / 1000.0).unwrap_or(Duration::ZERO)
}

/// Custom size sets must be usable as an input size set as-is
pub fn validate_sizes(sizes: &[u64]) -> Result<(), AnalysisError> {
    if sizes.len() < 3 {
        return Err(AnalysisError::invalid_config(format!(
            "sizes needs at least 3 entries, got {}",
            sizes.len()
        )));
    }
    if sizes.iter().any(|&s| s == 0) {
        return Err(AnalysisError::invalid_config("sizes must all be positive"));
    }
    if sizes.windows(2).any(|w| w[1] <= w[0]) {
        return Err(AnalysisError::invalid_config(format!(
            "sizes must be strictly increasing, got {:?}",
            sizes
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.trial_count, 5);
        assert_eq!(config.entry_point, "algoritmo");
        assert_eq!(config.classifier_kind(), ClassifierKind::Exponent);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            sampler_policy = "adaptive"
            trial_count = 7
            [progressive]
            points = 6
            "#,
        )
        .unwrap();
        assert_eq!(config.sampler_policy, SamplerPolicy::Adaptive);
        assert_eq!(config.trial_count, 7);
        assert_eq!(config.progressive.points, 6);
        assert_eq!(config.progressive.start, 16);
        assert_eq!(config.global_budget_ms, 30_000.0);
        assert_eq!(config.classifier_kind(), ClassifierKind::Ratio);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = Config::from_toml_str("trials = 3").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidConfig);
    }

    #[test]
    fn test_explicit_classifier_overrides_pairing() {
        let config = Config::from_toml_str("sampler_policy = \"adaptive\"\nclassifier = \"exponent\"").unwrap();
        assert_eq!(config.classifier_kind(), ClassifierKind::Exponent);
    }

    #[test]
    fn test_invalid_values() {
        let mut config = Config { trial_count: 0, ..Config::default() };
        assert!(config.validate().is_err());

        config = Config { min_valid_duration_ms: 5.0, per_trial_timeout_ms: 1.0, ..Config::default() };
        assert!(config.validate().is_err());

        config = Config { global_budget_ms: f64::NAN, ..Config::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_huge_durations_rejected() {
        for config in [
            Config { global_budget_ms: 1e300, ..Config::default() },
            Config { per_trial_timeout_ms: 1e300, ..Config::default() },
            Config { global_budget_ms: MAX_DURATION_MS + 1.0, ..Config::default() },
        ] {
            let err = config.validate().unwrap_err();
            assert_eq!(err.kind, ErrorKind::InvalidConfig);
            assert!(err.message.contains("at most"));
        }

        let mut config = Config::default();
        config.progressive.target_trial_ms = 1e300;
        assert_eq!(config.validate().unwrap_err().kind, ErrorKind::InvalidConfig);

        let err = Config::from_toml_str("global_budget_ms = 1e300").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidConfig);
    }

    #[test]
    fn test_duration_accessors_never_panic() {
        let config = Config { global_budget_ms: 1e300, per_trial_timeout_ms: f64::NAN, ..Config::default() };
        assert_eq!(config.global_budget(), Duration::from_secs(86_400));
        assert_eq!(config.per_trial_timeout(), Duration::ZERO);
        assert_eq!(Config::default().per_trial_timeout(), Duration::from_secs(2));
    }

    #[test]
    fn test_call_depth_bounded() {
        let config = Config { max_call_depth: MAX_CALL_DEPTH + 1, ..Config::default() };
        assert!(config.validate().is_err());
        let config = Config { max_call_depth: MAX_CALL_DEPTH, ..Config::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_sizes() {
        assert!(validate_sizes(&[10, 100, 1000]).is_ok());
        assert!(validate_sizes(&[10, 100]).is_err());
        assert!(validate_sizes(&[10, 10, 100]).is_err());
        assert!(validate_sizes(&[0, 10, 100]).is_err());
    }
}
