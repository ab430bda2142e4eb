// Summary statistics over trial durations (milliseconds)

/// Aggregates of the valid trials at one size
#[derive(Debug, Clone)]
pub struct Statistics {
    pub mean: f64,
    pub min: f64,
    pub samples: usize,
}

impl Statistics {
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        let mean = mean(samples)?;
        let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
        Some(Self { mean, min, samples: samples.len() })
    }

    pub fn format_duration(ms: f64) -> String {
        if !ms.is_finite() {
            return "n/a".to_string();
        }
        let nanos = ms * 1_000_000.0;
        if nanos < 1_000.0 {
            format!("{:.0} ns", nanos)
        } else if nanos < 1_000_000.0 {
            format!("{:.2} µs", nanos / 1_000.0)
        } else if nanos < 1_000_000_000.0 {
            format!("{:.2} ms", ms)
        } else {
            format!("{:.2} s", ms / 1_000.0)
        }
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let mean = mean(values)?;
    let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statistics() {
        let samples = [10.0, 12.0, 11.0, 13.0, 10.0];
        let stats = Statistics::from_samples(&samples).unwrap();
        assert!((stats.mean - 11.2).abs() < 1e-12);
        assert_eq!(stats.min, 10.0);
        assert_eq!(stats.samples, 5);

        let single = Statistics::from_samples(&[3.5]).unwrap();
        assert_eq!((single.mean, single.min, single.samples), (3.5, 3.5, 1));
    }

    #[test]
    fn test_empty_samples() {
        assert!(Statistics::from_samples(&[]).is_none());
        assert!(std_dev(&[]).is_none());
    }

    #[test]
    fn test_std_dev() {
        assert_eq!(std_dev(&[2.0, 2.0, 2.0]).unwrap(), 0.0);
        assert!((std_dev(&[1.0, 3.0]).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(Statistics::format_duration(0.0005), "500 ns");
        assert_eq!(Statistics::format_duration(0.5), "500.00 µs");
        assert_eq!(Statistics::format_duration(500.0), "500.00 ms");
        assert_eq!(Statistics::format_duration(5_000.0), "5.00 s");
    }
}
