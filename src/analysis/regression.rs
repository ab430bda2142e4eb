// Power-law fit in log-log space
//
// duration ≈ c · size^k  ⇔  ln(duration) = k · ln(size) + ln(c)
//
// The slope k is the growth exponent.

use super::MeasurementSeries;
use serde::Serialize;

/// Durations are clamped to this before taking logarithms
pub const MIN_POSITIVE_DURATION_MS: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegressionFit {
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination; 0 when all log-durations are equal
    pub r_squared: f64,
    /// Standard deviation of the residuals in log space
    pub residual_sd: f64,
}

/// Ordinary least squares on `(ln size, ln duration)`.
///
/// Returns None for fewer than two points or when every size is the same.
pub fn fit_power_law(points: &[(f64, f64)]) -> Option<RegressionFit> {
    if points.len() < 2 {
        return None;
    }

    let xs: Vec<f64> = points.iter().map(|(size, _)| size.max(1.0).ln()).collect();
    let ys: Vec<f64> = points
        .iter()
        .map(|(_, duration)| duration.max(MIN_POSITIVE_DURATION_MS).ln())
        .collect();

    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let sxx: f64 = xs.iter().map(|x| (x - mean_x) * (x - mean_x)).sum();
    if sxx <= f64::EPSILON {
        return None;
    }
    let sxy: f64 = xs.iter().zip(&ys).map(|(x, y)| (x - mean_x) * (y - mean_y)).sum();

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;

    let ss_tot: f64 = ys.iter().map(|y| (y - mean_y) * (y - mean_y)).sum();
    let ss_res: f64 = xs
        .iter()
        .zip(&ys)
        .map(|(x, y)| {
            let residual = y - (slope * x + intercept);
            residual * residual
        })
        .sum();

    let r_squared = if ss_tot <= f64::EPSILON {
        0.0
    } else {
        (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
    };

    Some(RegressionFit {
        slope,
        intercept,
        r_squared,
        residual_sd: (ss_res / n).sqrt(),
    })
}

/// Fits a measurement series. Sentinel points take part as large durations,
/// but at least two real readings are required.
pub fn fit_series(series: &MeasurementSeries) -> Option<RegressionFit> {
    if series.usable_count() < 2 {
        return None;
    }
    let points: Vec<(f64, f64)> = series
        .points()
        .iter()
        .map(|p| (p.size as f64, p.duration_ms))
        .collect();
    fit_power_law(&points)
}
