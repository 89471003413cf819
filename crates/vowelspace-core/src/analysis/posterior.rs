//! Posterior draws and their summaries.

extern crate alloc;

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::INTERVAL_PROBS;
use crate::math;
use crate::statistics::{combined_ess, compute_quantiles, split_rhat};

/// Errors raised when querying posterior draws.
#[derive(Debug, Clone, PartialEq)]
pub enum PosteriorError {
    /// The named coefficient is not a model parameter.
    UnknownCoefficient(String),
    /// No chains or no draws.
    Empty,
    /// A draw row does not have one value per parameter.
    Ragged {
        /// Chain index.
        chain: usize,
        /// Draw index inside the chain.
        draw: usize,
    },
}

impl fmt::Display for PosteriorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PosteriorError::UnknownCoefficient(name) => {
                write!(f, "unknown coefficient '{}'", name)
            }
            PosteriorError::Empty => write!(f, "posterior has no draws"),
            PosteriorError::Ragged { chain, draw } => {
                write!(f, "draw {} of chain {} has the wrong width", draw, chain)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PosteriorError {}

/// Retained draws of every chain, with parameter names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosteriorDraws {
    /// Parameter names, one per draw column.
    pub names: Vec<String>,
    /// `chains[c][d][j]`: chain `c`, draw `d`, parameter `j`.
    pub chains: Vec<Vec<Vec<f64>>>,
}

impl PosteriorDraws {
    /// Bundle draws, checking every row has one value per name.
    pub fn new(names: Vec<String>, chains: Vec<Vec<Vec<f64>>>) -> Result<Self, PosteriorError> {
        if chains.is_empty() || chains.iter().all(Vec::is_empty) {
            return Err(PosteriorError::Empty);
        }
        for (c, chain) in chains.iter().enumerate() {
            if let Some(d) = chain.iter().position(|row| row.len() != names.len()) {
                return Err(PosteriorError::Ragged { chain: c, draw: d });
            }
        }
        Ok(Self { names, chains })
    }

    /// Number of chains.
    pub fn n_chains(&self) -> usize {
        self.chains.len()
    }

    /// Total number of draws across chains.
    pub fn n_draws(&self) -> usize {
        self.chains.iter().map(Vec::len).sum()
    }

    /// Column index of a parameter.
    pub fn index_of(&self, name: &str) -> Result<usize, PosteriorError> {
        self.names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| PosteriorError::UnknownCoefficient(name.to_string()))
    }

    /// All draws of one parameter, chains concatenated.
    pub fn column(&self, name: &str) -> Result<Vec<f64>, PosteriorError> {
        let j = self.index_of(name)?;
        Ok(self.chains.iter().flatten().map(|row| row[j]).collect())
    }

    /// Draws of one parameter, one vector per chain.
    pub fn chain_columns(&self, name: &str) -> Result<Vec<Vec<f64>>, PosteriorError> {
        let j = self.index_of(name)?;
        Ok(self
            .chains
            .iter()
            .map(|chain| chain.iter().map(|row| row[j]).collect())
            .collect())
    }

    /// Posterior probability that the coefficient is negative.
    pub fn prob_negative(&self, name: &str) -> Result<f64, PosteriorError> {
        proportion_below_zero(&self.column(name)?).ok_or(PosteriorError::Empty)
    }

    /// Posterior probability that the coefficient is non-negative,
    /// `1 - prob_negative`.
    pub fn prob_positive(&self, name: &str) -> Result<f64, PosteriorError> {
        self.prob_negative(name).map(|p| 1.0 - p)
    }

    /// Summaries of every parameter, in column order.
    pub fn summarize(&self) -> Vec<CoefficientSummary> {
        (0..self.names.len())
            .map(|j| self.summarize_column(j))
            .collect()
    }

    /// Summary of one named parameter.
    pub fn summary_of(&self, name: &str) -> Result<CoefficientSummary, PosteriorError> {
        let j = self.index_of(name)?;
        Ok(self.summarize_column(j))
    }

    fn summarize_column(&self, j: usize) -> CoefficientSummary {
        let per_chain: Vec<Vec<f64>> = self
            .chains
            .iter()
            .map(|chain| chain.iter().map(|row| row[j]).collect())
            .collect();
        let refs: Vec<&[f64]> = per_chain.iter().map(Vec::as_slice).collect();
        let all: Vec<f64> = per_chain.iter().flatten().copied().collect();

        let bounds = compute_quantiles(&all, &[INTERVAL_PROBS.0, INTERVAL_PROBS.1]);
        let p_neg = proportion_below_zero(&all).unwrap_or(0.0);

        CoefficientSummary {
            name: self.names[j].clone(),
            mean: math::mean(&all).unwrap_or(0.0),
            sd: math::sample_sd(&all).unwrap_or(0.0),
            lower: bounds[0],
            upper: bounds[1],
            rhat: split_rhat(&refs),
            ess: combined_ess(&refs),
            prob_positive: 1.0 - p_neg,
        }
    }
}

/// Fraction of draws strictly below zero; `None` for no draws.
pub fn proportion_below_zero(draws: &[f64]) -> Option<f64> {
    if draws.is_empty() {
        return None;
    }
    let below = draws.iter().filter(|&&x| x < 0.0).count();
    Some(below as f64 / draws.len() as f64)
}

/// Posterior summary of one parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoefficientSummary {
    /// Parameter name.
    pub name: String,
    /// Posterior mean.
    pub mean: f64,
    /// Posterior standard deviation.
    pub sd: f64,
    /// Lower bound of the 95% credible interval.
    pub lower: f64,
    /// Upper bound of the 95% credible interval.
    pub upper: f64,
    /// Split R-hat across chains.
    pub rhat: f64,
    /// Bulk effective sample size across chains.
    pub ess: f64,
    /// P(coefficient >= 0).
    pub prob_positive: f64,
}

impl CoefficientSummary {
    /// P(coefficient < 0).
    pub fn prob_negative(&self) -> f64 {
        1.0 - self.prob_positive
    }

    /// True when the 95% interval excludes zero.
    pub fn interval_excludes_zero(&self) -> bool {
        self.lower > 0.0 || self.upper < 0.0
    }
}
