//! Weight quality diagnostics.
//!
//! Extreme weights inflate the variance of weighted estimates. This module
//! summarizes a weight vector (spread, percentiles, Kish design effect and
//! effective sample size) and classifies each segment's weight into a risk
//! band.

use std::collections::HashMap;

use npscope_stats::{descriptive::DescriptiveStats, percentiles::Percentiles};
use serde::Serialize;

/// Weights above this are counted as high.
pub const HIGH_WEIGHT_THRESHOLD: f64 = 3.0;
/// Weights below this are counted as low.
pub const LOW_WEIGHT_THRESHOLD: f64 = 0.3;

const PERCENTILE_POINTS: [f64; 4] = [1.0, 5.0, 95.0, 99.0];

/// Risk band of a single weight value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display, Serialize)]
pub enum WeightRisk {
    /// Below 1.5.
    Best,
    /// 1.5 to below 2.0.
    Good,
    /// 2.0 to below 3.0.
    Acceptable,
    /// 3.0 to below 5.0.
    Risk,
    /// 5.0 and above.
    Critical,
}

impl WeightRisk {
    #[must_use]
    pub fn classify(weight: f64) -> Self {
        match weight {
            w if w < 1.5 => Self::Best,
            w if w < 2.0 => Self::Good,
            w if w < 3.0 => Self::Acceptable,
            w if w < 5.0 => Self::Risk,
            _ => Self::Critical,
        }
    }
}

/// Summary of a weight vector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightDiagnostics {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation.
    pub std_dev: f64,
    pub p01: f64,
    pub p05: f64,
    pub p95: f64,
    pub p99: f64,
    /// Kish design effect, `1 + CV²`.
    pub design_effect: f64,
    /// `count / design_effect`.
    pub effective_sample_size: f64,
    pub above_high: usize,
    pub below_low: usize,
}

impl WeightDiagnostics {
    /// Summarizes `weights`, or returns `None` when there are none.
    ///
    /// ```
    /// use npscope_analysis::diagnostics::WeightDiagnostics;
    ///
    /// let diagnostics = WeightDiagnostics::from_weights(&[1.0, 1.0, 1.0, 1.0]).unwrap();
    /// assert_eq!(diagnostics.design_effect, 1.0);
    /// assert_eq!(diagnostics.effective_sample_size, 4.0);
    /// ```
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn from_weights(weights: &[f64]) -> Option<Self> {
        let stats = DescriptiveStats::new(weights.iter().copied())?;
        let percentiles = Percentiles::new(weights, &PERCENTILE_POINTS);
        let percentile = |p| percentiles.get(p).unwrap_or(f64::NAN);

        let cv = stats.coefficient_of_variation();
        let design_effect = 1.0 + cv * cv;

        Some(Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean,
            median: stats.median,
            std_dev: stats.sample_std_dev,
            p01: percentile(1.0),
            p05: percentile(5.0),
            p95: percentile(95.0),
            p99: percentile(99.0),
            design_effect,
            effective_sample_size: stats.count as f64 / design_effect,
            above_high: weights.iter().filter(|&&w| w > HIGH_WEIGHT_THRESHOLD).count(),
            below_low: weights.iter().filter(|&&w| w < LOW_WEIGHT_THRESHOLD).count(),
        })
    }
}

/// The weight assigned to one segment and its risk band.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentWeight {
    pub segment: String,
    pub rows: usize,
    pub weight: f64,
    pub risk: WeightRisk,
}

/// Groups rows by segment key, sorted by descending weight.
///
/// Rows of a segment share one weight under both weighting strategies, so the
/// weight of a segment's first row stands for the segment.
#[must_use]
pub fn segment_weights(segment_keys: &[String], weights: &[f64]) -> Vec<SegmentWeight> {
    let mut index = HashMap::<&str, usize>::new();
    let mut segments = Vec::<SegmentWeight>::new();
    for (key, &weight) in segment_keys.iter().zip(weights) {
        match index.get(key.as_str()) {
            Some(&i) => segments[i].rows += 1,
            None => {
                index.insert(key, segments.len());
                segments.push(SegmentWeight {
                    segment: key.clone(),
                    rows: 1,
                    weight,
                    risk: WeightRisk::classify(weight),
                });
            }
        }
    }
    segments.sort_by(|a, b| b.weight.total_cmp(&a.weight).then_with(|| a.segment.cmp(&b.segment)));
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_bands() {
        assert_eq!(WeightRisk::classify(0.2), WeightRisk::Best);
        assert_eq!(WeightRisk::classify(1.5), WeightRisk::Good);
        assert_eq!(WeightRisk::classify(1.99), WeightRisk::Good);
        assert_eq!(WeightRisk::classify(2.0), WeightRisk::Acceptable);
        assert_eq!(WeightRisk::classify(3.0), WeightRisk::Risk);
        assert_eq!(WeightRisk::classify(5.0), WeightRisk::Critical);
        assert!(WeightRisk::Best < WeightRisk::Critical);
    }

    #[test]
    fn test_design_effect_uses_sample_std() {
        let weights = [0.5, 1.5, 0.5, 1.5];
        let diagnostics = WeightDiagnostics::from_weights(&weights).unwrap();
        // sample variance = 4 * 0.25 / 3
        let cv2 = 1.0 / 3.0;
        assert!((diagnostics.design_effect - (1.0 + cv2)).abs() < 1e-12);
        assert!((diagnostics.effective_sample_size - 4.0 / (1.0 + cv2)).abs() < 1e-12);
        assert_eq!(diagnostics.mean, 1.0);
        assert_eq!(diagnostics.median, 1.0);
    }

    #[test]
    fn test_extreme_weight_counts() {
        let weights = [0.1, 0.2, 1.0, 3.0, 3.5, 6.0];
        let diagnostics = WeightDiagnostics::from_weights(&weights).unwrap();
        assert_eq!(diagnostics.above_high, 2);
        assert_eq!(diagnostics.below_low, 2);
        assert_eq!(diagnostics.min, 0.1);
        assert_eq!(diagnostics.max, 6.0);
        assert_eq!(diagnostics.p99, 6.0);
        assert_eq!(diagnostics.p01, 0.1);
    }

    #[test]
    fn test_empty_weights() {
        assert_eq!(WeightDiagnostics::from_weights(&[]), None);
    }

    #[test]
    fn test_segment_weights() {
        let keys = ["M", "F", "M", "X"].map(String::from);
        let weights = [0.8, 1.6, 0.8, 5.5];
        let segments = segment_weights(&keys, &weights);
        assert_eq!(
            segments
                .iter()
                .map(|s| (s.segment.as_str(), s.rows, s.risk))
                .collect::<Vec<_>>(),
            vec![
                ("X", 1, WeightRisk::Critical),
                ("F", 1, WeightRisk::Good),
                ("M", 2, WeightRisk::Best),
            ]
        );
    }
}
