// Report formatting - colored terminal output and JSON

use super::{ComplexityClass, ConfidenceTier, EstimationReport, PointOutcome, Statistics, Termination};
use crate::errors::AnalysisError;
use colored::*;
use std::fmt;

pub struct Reporter;

/// Terminal rendering of a report
pub struct ReportView<'a>(pub &'a EstimationReport);

fn header(f: &mut fmt::Formatter, title: &str) -> fmt::Result {
    let width = 60;
    writeln!(f, "{}", "=".repeat(width).bright_blue())?;
    writeln!(f, "{:^width$}", title.bright_white().bold(), width = width)?;
    writeln!(f, "{}", "=".repeat(width).bright_blue())
}

fn separator(f: &mut fmt::Formatter) -> fmt::Result {
    writeln!(f, "{}", "-".repeat(60).blue())
}

fn class_colored(class: ComplexityClass) -> ColoredString {
    let text = format!("{} ({})", class, class.notation());
    match class {
        ComplexityClass::Constant | ComplexityClass::Logarithmic => text.bright_green().bold(),
        ComplexityClass::Linear | ComplexityClass::Linearithmic => text.green().bold(),
        ComplexityClass::Quadratic => text.yellow().bold(),
        ComplexityClass::CubicOrWorse => text.red().bold(),
        ComplexityClass::Unknown => text.bright_black().bold(),
    }
}

fn confidence_colored(confidence: Option<ConfidenceTier>) -> ColoredString {
    match confidence {
        Some(ConfidenceTier::High) => "high".green(),
        Some(ConfidenceTier::Medium) => "medium".yellow(),
        Some(ConfidenceTier::Low) => "low".red(),
        None => "n/a".bright_black(),
    }
}

impl fmt::Display for ReportView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let report = self.0;
        header(f, "Complexity Estimate")?;

        writeln!(f, "  Class:      {}", class_colored(report.complexity_class))?;
        writeln!(f, "  Confidence: {}", confidence_colored(report.confidence))?;
        if let Some(exponent) = report.exponent {
            writeln!(f, "  Exponent:   {}", format!("{:.3}", exponent).cyan())?;
        }
        if let Some(r_squared) = report.r_squared {
            writeln!(f, "  R²:         {}", format!("{:.4}", r_squared).cyan())?;
        }
        if let Some(ratio) = report.average_ratio {
            writeln!(f, "  Avg ratio:  {}", format!("{:.2}", ratio).cyan())?;
        }
        writeln!(
            f,
            "  Strategy:   {:?} sampler, {:?} classifier",
            report.sampler_policy, report.classifier
        )?;

        if let Some(kind) = report.termination.error_kind() {
            let detail = match &report.termination {
                Termination::BudgetExceeded { at_size } => {
                    format!("time budget exhausted at n = {}; series is partial", at_size).red()
                }
                Termination::DegenerateFit { usable_points } => {
                    format!("only {} usable point(s), no fit possible", usable_points).yellow()
                }
                Termination::Completed => "".normal(),
            };
            writeln!(f, "  {} {}: {}", "!".red().bold(), kind.to_string().bold(), detail)?;
        }

        separator(f)?;
        writeln!(
            f,
            "  {:>10}  {:>14}  {:>6}",
            "n".bright_white().bold(),
            "duration".bright_white().bold(),
            "valid".bright_white().bold()
        )?;
        for point in report.series.points() {
            let duration = match point.outcome {
                PointOutcome::Measured => Statistics::format_duration(point.duration_ms).yellow(),
                PointOutcome::BelowResolution => {
                    format!("<{}", Statistics::format_duration(point.duration_ms)).bright_black()
                }
                PointOutcome::Sentinel => "failed/slow".red(),
            };
            writeln!(f, "  {:>10}  {:>14}  {:>6}", point.size, duration, point.valid_trial_count)?;
        }
        let skipped = report.planned_sizes.len().saturating_sub(report.series.len());
        if skipped > 0 {
            writeln!(f, "  {}", format!("({} larger size(s) not measured)", skipped).bright_black())?;
        }

        let failures: Vec<_> = report
            .series
            .points()
            .iter()
            .filter_map(|p| p.last_error.as_deref().map(|e| (p.size, e)))
            .collect();
        if !failures.is_empty() {
            separator(f)?;
            for (size, error) in failures {
                writeln!(f, "  {} {}", format!("n = {}:", size).red(), error)?;
            }
        }

        separator(f)?;
        writeln!(f, "  Total time: {}", Statistics::format_duration(report.elapsed_ms))
    }
}

impl Reporter {
    /// Renders a report for the terminal
    pub fn render(report: &EstimationReport) -> String {
        ReportView(report).to_string()
    }

    pub fn print(report: &EstimationReport) {
        print!("{}", ReportView(report));
    }

    pub fn to_json(report: &EstimationReport) -> Result<String, AnalysisError> {
        serde_json::to_string_pretty(report)
            .map_err(|e| AnalysisError::io(format!("Cannot serialize report: {}", e)))
    }

    /// JSON shape used when the run itself failed
    pub fn error_json(err: &AnalysisError) -> Result<String, AnalysisError> {
        serde_json::to_string_pretty(&serde_json::json!({ "error": err }))
            .map_err(|e| AnalysisError::io(format!("Cannot serialize error: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{InputSizeSet, MeasurementSeries, SamplePoint};
    use crate::config::{ClassifierKind, SamplerPolicy};

    fn sample_report() -> EstimationReport {
        EstimationReport {
            complexity_class: ComplexityClass::Linear,
            exponent: Some(1.02),
            r_squared: Some(0.991),
            confidence: Some(ConfidenceTier::High),
            average_ratio: None,
            series: MeasurementSeries::from_points(vec![
                SamplePoint::measured(500, 0.4, 5),
                SamplePoint::below_resolution(1000, 0.05),
                SamplePoint::sentinel(2000).with_error("Maximum call depth of 200 exceeded"),
            ]),
            bailed_out: false,
            termination: Termination::Completed,
            sampler_policy: SamplerPolicy::Fixed,
            classifier: ClassifierKind::Exponent,
            planned_sizes: InputSizeSet::new(vec![500, 1000, 2000, 5000]).unwrap(),
            elapsed_ms: 12.5,
        }
    }

    #[test]
    fn test_render_contains_fields() {
        colored::control::set_override(false);
        let text = Reporter::render(&sample_report());
        assert!(text.contains("linear (O(n))"));
        assert!(text.contains("1.020"));
        assert!(text.contains("failed/slow"));
        assert!(text.contains("1 larger size(s) not measured"));
        assert!(text.contains("n = 2000: Maximum call depth of 200 exceeded"));
        assert!(!text.contains("Degenerate Fit"));
    }

    #[test]
    fn test_render_names_termination_kind() {
        colored::control::set_override(false);
        let mut report = sample_report();
        report.termination = Termination::DegenerateFit { usable_points: 1 };
        let text = Reporter::render(&report);
        assert!(text.contains("Degenerate Fit: only 1 usable point(s)"));

        report.termination = Termination::BudgetExceeded { at_size: 2000 };
        let text = Reporter::render(&report);
        assert!(text.contains("Budget Exceeded: time budget exhausted at n = 2000"));
    }

    #[test]
    fn test_json_shape() {
        let json = Reporter::to_json(&sample_report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["complexity_class"], "linear");
        assert_eq!(value["confidence"], "high");
        assert_eq!(value["termination"]["kind"], "completed");
        assert_eq!(value["series"][2]["outcome"], "sentinel");
        assert_eq!(value["series"][2]["last_error"], "Maximum call depth of 200 exceeded");
        assert!(value["series"][0].get("last_error").is_none());
        assert_eq!(value["planned_sizes"][3], 5000);
    }

    #[test]
    fn test_error_json() {
        let err = AnalysisError::invalid_config("bad");
        let json = Reporter::error_json(&err).unwrap();
        assert!(json.contains("invalid_config"));
    }
}
