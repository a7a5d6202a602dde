//! Nearest-rank percentiles.

/// Values at a fixed set of percentile points, e.g. the tails of a weight
/// distribution.
///
/// ```
/// use npscope_stats::percentiles::Percentiles;
///
/// let weights = [0.4, 0.6, 0.8, 1.0, 1.0, 1.0, 1.2, 1.4, 1.6, 3.0];
/// let tails = Percentiles::new(&weights, &[5.0, 95.0]);
/// assert_eq!(tails.get(5.0), Some(0.4));
/// assert_eq!(tails.get(95.0), Some(3.0));
/// assert_eq!(tails.get(50.0), None);
/// ```
#[derive(Debug, Clone)]
pub struct Percentiles {
    /// `(point, value)` in request order; points are on the 0-100 scale.
    values: Vec<(f64, f64)>,
}

impl Percentiles {
    /// Looks up each point in values already in ascending order.
    ///
    /// # Panics
    ///
    /// Panics if `sorted_values` is out of order.
    #[must_use]
    pub fn from_sorted(sorted_values: &[f64], points: &[f64]) -> Self {
        assert!(
            sorted_values.is_sorted_by(|a, b| a <= b),
            "values must be in ascending order"
        );
        Self {
            values: points
                .iter()
                .map(|&point| (point, compute_percentile(sorted_values, point)))
                .collect(),
        }
    }

    /// Sorts a copy of `values` and looks up each point.
    #[must_use]
    pub fn new(values: &[f64], points: &[f64]) -> Self {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        Self::from_sorted(&sorted, points)
    }

    /// The value at `point`, if it was one of the requested points.
    #[must_use]
    pub fn get(&self, point: f64) -> Option<f64> {
        self.values
            .iter()
            .find(|(p, _)| (p - point).abs() < f64::EPSILON)
            .map(|&(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.values.iter().copied()
    }
}

/// Nearest-rank percentile: the element at `floor(n * percentile / 100)`,
/// capped at the last one. `NaN` for no values.
///
/// ```
/// use npscope_stats::percentiles::compute_percentile;
///
/// let scores = [0.0, 6.0, 7.0, 9.0, 10.0];
/// assert_eq!(compute_percentile(&scores, 50.0), 7.0);
/// assert_eq!(compute_percentile(&scores, 1.0), 0.0);
/// assert_eq!(compute_percentile(&scores, 100.0), 10.0);
/// ```
#[expect(
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss
)]
#[must_use]
pub fn compute_percentile(sorted_values: &[f64], percentile: f64) -> f64 {
    let Some(last) = sorted_values.len().checked_sub(1) else {
        return f64::NAN;
    };
    let rank = (sorted_values.len() as f64 * percentile / 100.0) as usize;
    sorted_values[rank.min(last)]
}
