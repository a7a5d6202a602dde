//! Survey weighting and weighted statistics.
//!
//! This crate turns survey tables into weighted Net Promoter Score, top-box,
//! response-rate and category-incidence figures that can be compared across
//! demographic segments.
//!
//! # Overview
//!
//! ## Weighting Workflow
//!
//! 1. **Segment Keys** ([`segment::SegmentKeyBuilder`]): Map each row to its
//!    demographic cell, with identical whitespace normalization for survey and
//!    population tables
//! 2. **Targets** ([`targets::derive_targets`]): Derive target proportions per
//!    segment from a population table, or take them from the user
//! 3. **Weights** ([`weighting::WeightCalculator`]): Apply a
//!    [`weighting::WeightingStrategy`] and attach the weights as a new column
//! 4. **Diagnostics** ([`diagnostics::WeightDiagnostics`]): Check the weights
//!    for extreme values and variance inflation
//!
//! ## Statistics
//!
//! Every percentage goes through [`aggregate::WeightedAggregator`], which owns
//! the denominator policy (weights and/or respondent ids):
//!
//! - [`nps::compute_nps`]: score, promoter/passive/detractor breakdown, 0-10
//!   distribution
//! - [`top_box::compute_top_box`]: share of ratings at or above a threshold
//! - [`response_rate::compute_response_rate`]: share of respondents answering an
//!   open-ended question
//! - [`category::compute_category_stats`]: incidence of coded answer categories
//!
//! ## Reports
//!
//! [`session::AnalysisSession`] holds the survey, population and coding tables;
//! the [`report`] module combines the pieces above into complete analyses.
//!
//! # Example
//!
//! ```
//! use npscope_analysis::{
//!     nps::compute_nps, targets::derive_targets, weighting::compute_weights,
//!     weighting::DEFAULT_WEIGHT_COLUMN,
//! };
//! use npscope_table::Table;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//!
//! let survey = Table::new(
//!     ["gender", "Q1"],
//!     vec![
//!         vec!["Male".into(), 10.0.into()],
//!         vec!["Male".into(), 9.0.into()],
//!         vec!["Female".into(), 2.0.into()],
//!     ],
//! )?;
//! let population = Table::new(
//!     ["gender"],
//!     vec![vec!["Male".into()], vec!["Female".into()]],
//! )?;
//!
//! let targets = derive_targets(&population, &["gender"], None);
//! let weighted = compute_weights(&survey, &["gender"], targets)?;
//! let nps = compute_nps(&weighted, "Q1", Some(DEFAULT_WEIGHT_COLUMN));
//!
//! // Males and females carry half of the weight each
//! assert_eq!(nps.score, 0.0);
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod category;
pub mod diagnostics;
pub mod nps;
pub mod report;
pub mod response_rate;
pub mod segment;
pub mod session;
pub mod targets;
pub mod top_box;
pub mod weighting;
