//! Statistical helpers for the npscope project.
//!
//! This crate provides small, table-independent numeric tools used by the
//! weighting and survey statistics engine:
//!
//! - **Descriptive statistics**: mean, median, variance, standard deviation, etc.
//! - **Percentiles**: nearest-rank percentile computation and storage
//! - **Ratios**: full-precision numerator/denominator pairs with zero-safe
//!   percentages and output rounding
//!
//! # Modules
//!
//! - [`descriptive`]: Descriptive statistics for summarizing datasets
//! - [`percentiles`]: Percentile computation and storage
//! - [`ratio`]: Ratios, percentages and rounding
//!
//! # Examples
//!
//! ## Computing descriptive statistics
//!
//! ```
//! use npscope_stats::descriptive::DescriptiveStats;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let stats = DescriptiveStats::new(values).unwrap();
//! assert_eq!(stats.mean, 3.0);
//! ```
//!
//! ## Computing percentiles
//!
//! ```
//! use npscope_stats::percentiles::Percentiles;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let percentiles = Percentiles::new(&values, &[25.0, 50.0, 75.0]);
//! assert_eq!(percentiles.get(50.0), Some(3.0));
//! ```
//!
//! ## Computing a percentage
//!
//! ```
//! use npscope_stats::ratio::Ratio;
//!
//! let promoters = Ratio::new(2.0, 3.0);
//! assert_eq!(promoters.rounded_percentage(), 66.7);
//! ```

pub mod descriptive;
pub mod percentiles;
pub mod ratio;
