//! Histogram statistics
//!
//! A ball passing `n` rows lands in bin `k` with probability C(n, k) / 2^n.
//! These helpers give that expectation and compare a run's counts against it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Binomial probabilities for `rows` fair left/right decisions (`rows + 1` entries)
pub fn binomial_pmf(rows: u32) -> Vec<f64> {
    let n = rows as usize;
    let mut pmf = Vec::with_capacity(n + 1);
    // C(n, 0) / 2^n, built up as a product to stay in range for large n
    let mut p = 0.5f64.powi(rows as i32);
    for k in 0..=n {
        pmf.push(p);
        p = p * (n - k) as f64 / (k + 1) as f64;
    }
    pmf
}

/// Expected count per bin for a run of `total` balls
pub fn expected_counts(rows: u32, total: u32) -> Vec<f64> {
    binomial_pmf(rows)
        .into_iter()
        .map(|p| p * total as f64)
        .collect()
}

/// Summary of a bin histogram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinStats {
    pub total: u64,
    /// Mean bin index
    pub mean: f64,
    pub variance: f64,
    /// Binomial mean for the same rows (`rows / 2`)
    pub expected_mean: f64,
    /// Binomial variance for the same rows (`rows / 4`)
    pub expected_variance: f64,
    /// Pearson chi-square against the binomial expectation
    pub chi_square: f64,
}

impl BinStats {
    /// Statistics for `counts`, one entry per bin (`rows + 1` bins)
    pub fn from_counts(counts: &[u32]) -> Self {
        let rows = counts.len().saturating_sub(1) as u32;
        let total: u64 = counts.iter().map(|&c| c as u64).sum();

        let (mean, variance) = if total > 0 {
            let t = total as f64;
            let mean = counts
                .iter()
                .enumerate()
                .map(|(k, &c)| k as f64 * c as f64)
                .sum::<f64>()
                / t;
            let variance = counts
                .iter()
                .enumerate()
                .map(|(k, &c)| (k as f64 - mean).powi(2) * c as f64)
                .sum::<f64>()
                / t;
            (mean, variance)
        } else {
            (0.0, 0.0)
        };

        let chi_square = expected_counts(rows, total.min(u32::MAX as u64) as u32)
            .iter()
            .zip(counts)
            .filter(|(e, _)| **e > 0.0)
            .map(|(e, &c)| (c as f64 - e).powi(2) / e)
            .sum();

        Self {
            total,
            mean,
            variance,
            expected_mean: rows as f64 / 2.0,
            expected_variance: rows as f64 / 4.0,
            chi_square,
        }
    }
}

impl fmt::Display for BinStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} balls, mean {:.2} (expected {:.2}), variance {:.2} (expected {:.2}), chi² {:.2}",
            self.total,
            self.mean,
            self.expected_mean,
            self.variance,
            self.expected_variance,
            self.chi_square
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pmf_small_rows() {
        assert_eq!(binomial_pmf(0), vec![1.0]);
        assert_eq!(binomial_pmf(1), vec![0.5, 0.5]);
        let pmf = binomial_pmf(4);
        let expected = [1.0, 4.0, 6.0, 4.0, 1.0].map(|c| c / 16.0);
        for (p, e) in pmf.iter().zip(expected) {
            assert!((p - e).abs() < 1e-12);
        }
    }

    #[test]
    fn test_expected_counts() {
        let counts = expected_counts(2, 100);
        assert_eq!(counts, vec![25.0, 50.0, 25.0]);
    }

    #[test]
    fn test_stats_of_exact_expectation() {
        let stats = BinStats::from_counts(&[25, 50, 25]);
        assert_eq!(stats.total, 100);
        assert!((stats.mean - 1.0).abs() < 1e-12);
        assert!((stats.variance - 0.5).abs() < 1e-12);
        assert_eq!(stats.expected_mean, 1.0);
        assert_eq!(stats.expected_variance, 0.5);
        assert!(stats.chi_square.abs() < 1e-12);
    }

    #[test]
    fn test_stats_of_skewed_counts() {
        let stats = BinStats::from_counts(&[0, 0, 10]);
        assert_eq!(stats.mean, 2.0);
        assert_eq!(stats.variance, 0.0);
        assert!(stats.chi_square > 0.0);
    }

    #[test]
    fn test_stats_empty() {
        let stats = BinStats::from_counts(&[0, 0, 0, 0]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.mean, 0.0);
        assert_eq!(stats.chi_square, 0.0);
        assert_eq!(stats.expected_mean, 1.5);

        let stats = BinStats::from_counts(&[]);
        assert_eq!(stats.total, 0);
    }

    #[test]
    fn test_display() {
        let text = BinStats::from_counts(&[1, 2, 1]).to_string();
        assert!(text.starts_with("4 balls, mean 1.00"));
    }
}
