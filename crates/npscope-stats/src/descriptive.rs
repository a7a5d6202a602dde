//! Location and spread of a list of numbers.

/// Summary of a list of values, typically the weights of a weighted table.
///
/// Both standard deviations are kept: the population one for describing the
/// list itself, the sample one (`n - 1`) for the weighting design effect.
#[derive(Debug, Clone)]
pub struct DescriptiveStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub sum: f64,
    pub mean: f64,
    /// Middle value; the midpoint of the two middle values for an even count.
    pub median: f64,
    /// Divides by `n`.
    pub variance: f64,
    pub std_dev: f64,
    /// Divides by `n - 1`; zero for a single value.
    pub sample_std_dev: f64,
}

impl DescriptiveStats {
    /// Summarizes `values` in any order, or returns `None` when there are none.
    ///
    /// ```
    /// # use npscope_stats::descriptive::DescriptiveStats;
    /// let weights = [0.5, 1.5, 1.0, 2.0, 0.0];
    /// let stats = DescriptiveStats::new(weights).unwrap();
    /// assert_eq!((stats.min, stats.max), (0.0, 2.0));
    /// assert_eq!(stats.mean, 1.0);
    /// assert_eq!(stats.median, 1.0);
    /// ```
    #[must_use]
    pub fn new<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut values = values.into_iter().collect::<Vec<_>>();
        values.sort_by(f64::total_cmp);
        Self::from_sorted(&values)
    }

    /// Summarizes values already in ascending order.
    ///
    /// # Panics
    ///
    /// Panics if `sorted_values` is out of order.
    ///
    /// ```
    /// # use npscope_stats::descriptive::DescriptiveStats;
    /// let stats = DescriptiveStats::from_sorted(&[0.75, 0.75, 1.5, 1.5]).unwrap();
    /// assert_eq!(stats.median, 1.125);
    /// assert_eq!(stats.sum, 4.5);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_sorted(sorted_values: &[f64]) -> Option<Self> {
        assert!(
            sorted_values.is_sorted_by(|a, b| a <= b),
            "values must be in ascending order"
        );
        let (&min, &max) = (sorted_values.first()?, sorted_values.last()?);

        let count = sorted_values.len();
        let n = count as f64;
        let sum = sorted_values.iter().sum::<f64>();
        let mean = sum / n;
        let half = count / 2;
        let median = match count % 2 {
            0 => f64::midpoint(sorted_values[half - 1], sorted_values[half]),
            _ => sorted_values[half],
        };

        let sum_of_squares = sorted_values
            .iter()
            .map(|v| (v - mean).powi(2))
            .sum::<f64>();
        let variance = sum_of_squares / n;
        let sample_std_dev = match count {
            1 => 0.0,
            _ => (sum_of_squares / (n - 1.0)).sqrt(),
        };

        Some(Self {
            count,
            min,
            max,
            sum,
            mean,
            median,
            variance,
            std_dev: variance.sqrt(),
            sample_std_dev,
        })
    }

    /// `sample_std_dev / mean`, or `0.0` for a zero mean.
    ///
    /// Equal weights have no variation:
    ///
    /// ```
    /// # use npscope_stats::descriptive::DescriptiveStats;
    /// let stats = DescriptiveStats::new([1.0, 1.0, 1.0]).unwrap();
    /// assert_eq!(stats.coefficient_of_variation(), 0.0);
    /// ```
    #[must_use]
    pub fn coefficient_of_variation(&self) -> f64 {
        if self.mean == 0.0 {
            return 0.0;
        }
        self.sample_std_dev / self.mean
    }
}
