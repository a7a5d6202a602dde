//! Net Promoter Score.
//!
//! Scores are coerced to numbers; values that are not numeric or lie outside
//! `0..=10` are excluded from every denominator. The remaining responses are
//! classified as
//!
//! - promoters: above 8 (9 and 10)
//! - passives: above 6 up to 8 (7 and 8)
//! - detractors: 6 and below
//!
//! and the score is the promoter percentage minus the detractor percentage,
//! both taken over the same weighted base.
//!
//! # Example
//!
//! ```
//! use npscope_analysis::nps::compute_nps;
//! use npscope_table::Table;
//!
//! let table = Table::new(
//!     ["ResponseId", "Q1"],
//!     vec![
//!         vec!["R1".into(), 10.0.into()],
//!         vec!["R2".into(), 5.0.into()],
//!         vec!["R3".into(), 8.0.into()],
//!     ],
//! )
//! .unwrap();
//!
//! let nps = compute_nps(&table, "Q1", None);
//! assert_eq!(nps.score, 0.0);
//! assert_eq!(nps.breakdown.promoters, 33.3);
//! assert_eq!(nps.distribution[10].count, 1.0);
//! ```

use npscope_stats::ratio::{Ratio, round1};
use npscope_table::{NumericCoercion, Table};
use serde::Serialize;

use crate::aggregate::WeightedAggregator;

/// Highest valid score.
pub const MAX_SCORE: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display, Serialize)]
pub enum NpsCategory {
    Promoter,
    Passive,
    Detractor,
}

impl NpsCategory {
    /// Classifies a score, or returns `None` when it lies outside `0..=10`.
    ///
    /// Fractional scores fall into the bin they are in: `8.5` is a promoter,
    /// `6.5` a passive.
    #[must_use]
    pub fn classify(score: f64) -> Option<Self> {
        if !(0.0..=f64::from(MAX_SCORE)).contains(&score) {
            return None;
        }
        let category = if score > 8.0 {
            Self::Promoter
        } else if score > 6.0 {
            Self::Passive
        } else {
            Self::Detractor
        };
        Some(category)
    }
}

/// Weighted NPS counts at full precision.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NpsTally {
    pub promoters: f64,
    pub passives: f64,
    pub detractors: f64,
    /// Weighted count per integral score `0..=10`.
    pub distribution: [f64; MAX_SCORE as usize + 1],
    pub total_weight: f64,
    /// Number of rows with a valid score.
    pub responses: usize,
}

impl NpsTally {
    /// Tallies the valid scores of `score_column`.
    ///
    /// Returns an empty tally when the column is absent.
    #[must_use]
    pub fn from_table(table: &Table, score_column: &str, weight_column: Option<&str>) -> Self {
        let Some(score_index) = table.column_index(score_column) else {
            log::debug!("score column '{score_column}' not found; NPS is empty");
            return Self::default();
        };
        let aggregator = WeightedAggregator::new(table, weight_column, None);

        let mut tally = Self::default();
        for row in table.rows() {
            let Some(score) = NumericCoercion::Direct.coerce(&row[score_index]) else {
                continue;
            };
            let Some(category) = NpsCategory::classify(score) else {
                continue;
            };
            let weight = aggregator.row_weight(row);
            tally.add(category, score, weight);
        }
        tally
    }

    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn add(&mut self, category: NpsCategory, score: f64, weight: f64) {
        match category {
            NpsCategory::Promoter => self.promoters += weight,
            NpsCategory::Passive => self.passives += weight,
            NpsCategory::Detractor => self.detractors += weight,
        }
        if score.fract() == 0.0 {
            self.distribution[score as usize] += weight;
        }
        self.total_weight += weight;
        self.responses += 1;
    }

    #[must_use]
    pub fn share(&self, category: NpsCategory) -> Ratio {
        let count = match category {
            NpsCategory::Promoter => self.promoters,
            NpsCategory::Passive => self.passives,
            NpsCategory::Detractor => self.detractors,
        };
        Ratio::new(count, self.total_weight)
    }

    /// Promoter percentage minus detractor percentage, unrounded.
    #[must_use]
    pub fn score(&self) -> f64 {
        self.share(NpsCategory::Promoter).percentage()
            - self.share(NpsCategory::Detractor).percentage()
    }

    /// Rounds the tally into a reportable result.
    #[must_use]
    pub fn to_result(&self) -> NpsResult {
        let distribution = (0..=MAX_SCORE)
            .zip(self.distribution)
            .map(|(score, count)| ScoreBucket {
                score,
                count: round1(count),
                percent: Ratio::new(count, self.total_weight).rounded_percentage(),
            })
            .collect();
        NpsResult {
            score: round1(self.score()),
            breakdown: NpsBreakdown {
                promoters: self.share(NpsCategory::Promoter).rounded_percentage(),
                passives: self.share(NpsCategory::Passive).rounded_percentage(),
                detractors: self.share(NpsCategory::Detractor).rounded_percentage(),
            },
            distribution,
            total_weight: round1(self.total_weight),
            responses: self.responses,
        }
    }
}

/// Category percentages, rounded to one decimal.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct NpsBreakdown {
    pub promoters: f64,
    pub passives: f64,
    pub detractors: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBucket {
    pub score: u8,
    pub count: f64,
    pub percent: f64,
}

/// Reportable NPS with every percentage and the total weight rounded to one
/// decimal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NpsResult {
    pub score: f64,
    pub breakdown: NpsBreakdown,
    /// One bucket per score `0..=10`, indexed by score.
    pub distribution: Vec<ScoreBucket>,
    pub total_weight: f64,
    pub responses: usize,
}

/// Computes the NPS of `score_column`, weighted by `weight_column` when given.
///
/// An absent or entirely invalid score column yields a zero result.
#[must_use]
pub fn compute_nps(table: &Table, score_column: &str, weight_column: Option<&str>) -> NpsResult {
    NpsTally::from_table(table, score_column, weight_column).to_result()
}
