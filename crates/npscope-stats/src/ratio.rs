/// A numerator/denominator pair kept at full precision.
///
/// Percentages derived from a `Ratio` are only rounded when explicitly
/// requested, so sums of several ratios stay exact until output.
///
/// # Examples
///
/// ```
/// use npscope_stats::ratio::Ratio;
///
/// let ratio = Ratio::new(1.0, 3.0);
/// assert!((ratio.percentage() - 33.333_333).abs() < 1e-5);
/// assert_eq!(ratio.rounded_percentage(), 33.3);
///
/// // A zero denominator never yields NaN
/// assert_eq!(Ratio::new(5.0, 0.0).percentage(), 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Ratio {
    /// Weighted (or plain) count of matching observations.
    pub numerator: f64,
    /// Weighted (or plain) count of the base population.
    pub denominator: f64,
}

impl Ratio {
    #[must_use]
    pub fn new(numerator: f64, denominator: f64) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Fraction `numerator / denominator`, or `0.0` when the denominator is zero.
    #[must_use]
    pub fn fraction(&self) -> f64 {
        if self.denominator == 0.0 {
            0.0
        } else {
            self.numerator / self.denominator
        }
    }

    /// Percentage `100 * numerator / denominator`, or `0.0` when the denominator is zero.
    #[must_use]
    pub fn percentage(&self) -> f64 {
        self.fraction() * 100.0
    }

    /// [`percentage`](Self::percentage) rounded to one decimal place.
    #[must_use]
    pub fn rounded_percentage(&self) -> f64 {
        round1(self.percentage())
    }
}

/// Rounds `value` to `decimals` decimal places, half away from zero.
///
/// # Examples
///
/// ```
/// use npscope_stats::ratio::round_to;
///
/// assert_eq!(round_to(2.345_6, 2), 2.35);
/// assert_eq!(round_to(-1.25, 1), -1.3);
/// assert_eq!(round_to(7.0, 0), 7.0);
/// ```
#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

/// Rounds `value` to one decimal place.
///
/// # Examples
///
/// ```
/// use npscope_stats::ratio::round1;
///
/// assert_eq!(round1(33.333), 33.3);
/// assert_eq!(round1(66.66), 66.7);
/// ```
#[must_use]
pub fn round1(value: f64) -> f64 {
    round_to(value, 1)
}
