//! Sum (deviation) coding of categorical predictors.
//!
//! Follows the `contr.sum` convention over alphabetically ordered levels: the
//! first level of a two-level factor is `+1` and the last is `-1`, so a
//! fitted main effect is the deviation of the first level from the grand
//! mean. The mapping is fixed by level order and never depends on the data:
//!
//! | factor    | `+1`     | `-1`     |
//! |-----------|----------|----------|
//! | condition | `casual` | `polite` |
//! | gender    | `F`      | `M`      |
//!
//! A negative condition coefficient therefore means polite speech sits
//! *above* the grand mean.

extern crate alloc;

use alloc::collections::BTreeSet;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use crate::types::{Condition, Gender};

/// A two-level factor with a fixed ±1 sum code.
pub trait SumCoded: Copy {
    /// The `±1` code for this level.
    fn sum_code(&self) -> f64;
}

impl SumCoded for Condition {
    fn sum_code(&self) -> f64 {
        match self {
            Condition::Casual => 1.0,
            Condition::Polite => -1.0,
        }
    }
}

impl SumCoded for Gender {
    fn sum_code(&self) -> f64 {
        match self {
            Gender::Female => 1.0,
            Gender::Male => -1.0,
        }
    }
}

/// Sum coding of a factor with `k >= 2` levels into `k - 1` columns.
///
/// Level `i < k - 1` maps to the unit vector `e_i`; the last level maps to a
/// row of `-1`. Levels are sorted, so the coding is stable for a given level
/// set regardless of row order.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorCoding {
    levels: Vec<String>,
}

impl FactorCoding {
    /// Build the coding from the observed values of a factor.
    pub fn from_values<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let set: BTreeSet<&str> = values.into_iter().collect();
        Self {
            levels: set.into_iter().map(String::from).collect(),
        }
    }

    /// Sorted factor levels.
    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    /// Number of contrast columns (`k - 1`, zero for a constant factor).
    pub fn n_columns(&self) -> usize {
        self.levels.len().saturating_sub(1)
    }

    /// Contrast row for a level, or `None` for an unknown level.
    pub fn encode(&self, level: &str) -> Option<Vec<f64>> {
        let k = self.n_columns();
        let idx = self.levels.iter().position(|l| l == level)?;
        if idx == k {
            Some(vec![-1.0; k])
        } else {
            let mut row = vec![0.0; k];
            row[idx] = 1.0;
            Some(row)
        }
    }

    /// Levels that own a contrast column (all but the last).
    pub fn column_levels(&self) -> &[String] {
        &self.levels[..self.n_columns()]
    }
}
