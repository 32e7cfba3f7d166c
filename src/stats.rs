use serde::Serialize;

use crate::error::SimError;

/// Mean and population standard deviation (divisor N) of a result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryStatistics {
    pub mean: f64,
    pub std_dev: f64,
}

/// Percentile summary of a sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistStats {
    pub n: usize,
    pub min: f64,
    pub p5: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p95: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

/// Equal-width bins starting at `lower`. Bin `i` covers
/// `[lower + i·width, lower + (i+1)·width)`; the last bin is closed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub lower: f64,
    pub width: f64,
    pub counts: Vec<usize>,
}

impl Histogram {
    pub fn bin_range(&self, i: usize) -> (f64, f64) {
        let lo = self.lower + i as f64 * self.width;
        (lo, lo + self.width)
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Mean and population standard deviation. Fails on an empty result rather
/// than returning NaN.
pub fn summarize(values: &[u64]) -> Result<SummaryStatistics, SimError> {
    let values: Vec<f64> = values.iter().map(|&v| v as f64).collect();
    summarize_f64(&values)
}

fn summarize_f64(values: &[f64]) -> Result<SummaryStatistics, SimError> {
    if values.is_empty() {
        return Err(SimError::EmptyResult);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    Ok(SummaryStatistics { mean, std_dev: variance.sqrt() })
}

/// Percentiles by linear interpolation between closest ranks.
pub fn distribution(values: &[u64]) -> Result<DistStats, SimError> {
    let values: Vec<f64> = values.iter().map(|&v| v as f64).collect();
    percentile_stats(values)
}

fn percentile_stats(mut values: Vec<f64>) -> Result<DistStats, SimError> {
    let SummaryStatistics { mean, std_dev } = summarize_f64(&values)?;
    values.sort_by(|a, b| a.total_cmp(b));
    let n = values.len();

    let interp = |p: f64| -> f64 {
        let h = p * (n - 1) as f64;
        let lo = h.floor() as usize;
        let hi = (lo + 1).min(n - 1);
        let frac = h - lo as f64;
        values[lo] * (1.0 - frac) + values[hi] * frac
    };

    Ok(DistStats {
        n,
        min: values[0],
        p5: interp(0.05),
        p25: interp(0.25),
        p50: interp(0.50),
        p75: interp(0.75),
        p95: interp(0.95),
        max: values[n - 1],
        mean,
        std_dev,
    })
}

/// Bucket `values` into `bins` equal-width bins spanning `[min, max]`.
/// When every value is equal there is a single bin of width 1.
pub fn histogram(values: &[u64], bins: usize) -> Result<Histogram, SimError> {
    if bins == 0 {
        return Err(SimError::config("bins", "must be at least 1, got 0"));
    }
    let (Some(&min), Some(&max)) = (values.iter().min(), values.iter().max()) else {
        return Err(SimError::EmptyResult);
    };
    if min == max {
        return Ok(Histogram { lower: min as f64, width: 1.0, counts: vec![values.len()] });
    }

    let lower = min as f64;
    let width = (max - min) as f64 / bins as f64;
    let mut counts = vec![0; bins];
    for &v in values {
        let idx = (((v - min) as f64 / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    Ok(Histogram { lower, width, counts })
}

/// Distribution of per-run means across replicas.
pub fn across_runs(summaries: &[SummaryStatistics]) -> Result<DistStats, SimError> {
    percentile_stats(summaries.iter().map(|s| s.mean).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── summarize ─────────────────────────────────────────────────────────────

    #[test]
    fn all_zeros_have_zero_mean_and_spread() {
        let s = summarize(&[0; 10]).unwrap();
        assert_eq!(s, SummaryStatistics { mean: 0.0, std_dev: 0.0 });
    }

    #[test]
    fn constant_result() {
        let s = summarize(&[20, 20, 20]).unwrap();
        assert_eq!(s.mean, 20.0);
        assert_eq!(s.std_dev, 0.0);
    }

    #[test]
    fn population_not_sample_std_dev() {
        // Population variance of [2,4,4,4,5,5,7,9] is exactly 4.
        let s = summarize(&[2, 4, 4, 4, 5, 5, 7, 9]).unwrap();
        assert!((s.mean - 5.0).abs() < 1e-12);
        assert!((s.std_dev - 2.0).abs() < 1e-12, "std_dev {}", s.std_dev);
    }

    #[test]
    fn single_value_has_zero_spread() {
        let s = summarize(&[7]).unwrap();
        assert_eq!(s.mean, 7.0);
        assert_eq!(s.std_dev, 0.0);
    }

    #[test]
    fn empty_result_is_an_error() {
        assert!(matches!(summarize(&[]), Err(SimError::EmptyResult)));
    }

    // ── distribution ──────────────────────────────────────────────────────────

    #[test]
    fn distribution_known_values() {
        let ds = distribution(&[5, 1, 4, 2, 3]).unwrap();
        assert_eq!(ds.n, 5);
        assert!((ds.min - 1.0).abs() < 1e-10, "min");
        assert!((ds.max - 5.0).abs() < 1e-10, "max");
        assert!((ds.p50 - 3.0).abs() < 1e-10, "p50");
        assert!((ds.p25 - 2.0).abs() < 1e-10, "p25");
        assert!((ds.mean - 3.0).abs() < 1e-10, "mean");
    }

    #[test]
    fn distribution_interpolates_between_ranks() {
        // h = 0.5 × (2 − 1) = 0.5 → halfway between 10 and 20.
        let ds = distribution(&[10, 20]).unwrap();
        assert!((ds.p50 - 15.0).abs() < 1e-10);
        assert!((ds.p95 - 19.5).abs() < 1e-10);
    }

    #[test]
    fn distribution_empty_is_an_error() {
        assert!(matches!(distribution(&[]), Err(SimError::EmptyResult)));
    }

    // ── histogram ─────────────────────────────────────────────────────────────

    #[test]
    fn histogram_counts_every_value() {
        let values: Vec<u64> = (0..=100).collect();
        let h = histogram(&values, 10).unwrap();
        assert_eq!(h.counts.len(), 10);
        assert_eq!(h.total(), 101);
        assert!((h.width - 10.0).abs() < 1e-12);
        // 100 sits on the closed upper edge of the last bin.
        assert_eq!(h.counts[9], 11);
        assert_eq!(h.bin_range(0), (0.0, 10.0));
    }

    #[test]
    fn histogram_constant_values_single_bin() {
        let h = histogram(&[0, 0, 0], 30).unwrap();
        assert_eq!(h.counts, vec![3]);
        assert_eq!(h.lower, 0.0);
    }

    #[test]
    fn histogram_zero_bins_rejected() {
        assert!(matches!(
            histogram(&[1, 2], 0),
            Err(SimError::InvalidConfig { field: "bins", .. })
        ));
    }

    #[test]
    fn histogram_empty_is_an_error() {
        assert!(matches!(histogram(&[], 5), Err(SimError::EmptyResult)));
    }

    // ── across_runs ───────────────────────────────────────────────────────────

    #[test]
    fn across_runs_summarises_means() {
        let runs = [
            SummaryStatistics { mean: 10.0, std_dev: 1.0 },
            SummaryStatistics { mean: 20.0, std_dev: 2.0 },
            SummaryStatistics { mean: 30.0, std_dev: 3.0 },
        ];
        let ds = across_runs(&runs).unwrap();
        assert_eq!(ds.n, 3);
        assert!((ds.mean - 20.0).abs() < 1e-12);
        assert!((ds.p50 - 20.0).abs() < 1e-12);
        assert!((ds.min - 10.0).abs() < 1e-12);
    }

    #[test]
    fn across_runs_empty_is_an_error() {
        assert!(matches!(across_runs(&[]), Err(SimError::EmptyResult)));
    }
}
