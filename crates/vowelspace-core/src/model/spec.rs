//! Model specification: outcome, terms, family, prior and MCMC control.

extern crate alloc;

use alloc::format;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_ADAPT_DELTA, DEFAULT_CHAINS, DEFAULT_ITERATIONS, DEFAULT_PRIOR_SCALE, DEFAULT_SEED,
    DEFAULT_WARMUP, MAX_ADAPT_DELTA,
};
use crate::types::Measure;

/// Outcome distribution family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    /// Gaussian likelihood on the raw scale, identity link.
    Normal,
    /// Gaussian likelihood on ln(y); coefficients are on the log scale.
    LogNormal,
}

impl Family {
    /// Short lowercase name, used in model names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Family::Normal => "normal",
            Family::LogNormal => "lognormal",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Population-level (fixed-effect) term. The intercept is always included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixedTerm {
    /// Sum-coded condition.
    Condition,
    /// Sum-coded gender.
    Gender,
    /// Product of the condition and gender codes.
    ConditionByGender,
    /// Sum-coded vowel category (k - 1 columns).
    Vowel,
    /// Duration in ms as a continuous covariate.
    Duration,
}

impl FixedTerm {
    /// Formula fragment for this term.
    pub fn formula(&self) -> &'static str {
        match self {
            FixedTerm::Condition => "condition",
            FixedTerm::Gender => "gender",
            FixedTerm::ConditionByGender => "condition:gender",
            FixedTerm::Vowel => "vowel",
            FixedTerm::Duration => "duration",
        }
    }
}

/// Group-level (random-effect) term. Variance components are independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RandomTerm {
    /// Per-speaker intercept.
    SubjectIntercept,
    /// Per-speaker condition slope.
    SubjectConditionSlope,
    /// Per-item intercept.
    ItemIntercept,
}

impl RandomTerm {
    /// Name of the standard-deviation parameter for this term.
    pub fn sd_name(&self) -> &'static str {
        match self {
            RandomTerm::SubjectIntercept => "sd_subject__Intercept",
            RandomTerm::SubjectConditionSlope => "sd_subject__condition",
            RandomTerm::ItemIntercept => "sd_item__Intercept",
        }
    }
}

/// Normal prior placed on every non-intercept fixed-effect coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Prior {
    /// Prior mean.
    pub location: f64,
    /// Prior standard deviation.
    pub scale: f64,
}

impl Prior {
    /// `normal(location, scale)`.
    pub fn normal(location: f64, scale: f64) -> Self {
        Self { location, scale }
    }
}

impl Default for Prior {
    fn default() -> Self {
        Self::normal(0.0, DEFAULT_PRIOR_SCALE)
    }
}

impl fmt::Display for Prior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "normal({}, {})", self.location, self.scale)
    }
}

/// MCMC control settings handed to the sampler.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct McmcControl {
    /// Number of independent chains.
    pub chains: usize,
    /// Total iterations per chain, warmup included.
    pub iterations: usize,
    /// Warmup iterations per chain, discarded.
    pub warmup: usize,
    /// Base seed; chain `c` uses `seed + c`.
    pub seed: u64,
    /// Target acceptance rate for samplers with step-size adaptation.
    pub adapt_delta: f64,
    /// Worker threads available for running chains.
    pub cores: usize,
}

impl Default for McmcControl {
    fn default() -> Self {
        Self {
            chains: DEFAULT_CHAINS,
            iterations: DEFAULT_ITERATIONS,
            warmup: DEFAULT_WARMUP,
            seed: DEFAULT_SEED,
            adapt_delta: DEFAULT_ADAPT_DELTA,
            cores: 1,
        }
    }
}

impl McmcControl {
    /// Retained draws per chain.
    pub fn draws_per_chain(&self) -> usize {
        self.iterations.saturating_sub(self.warmup)
    }

    /// Seed for one chain.
    pub fn chain_seed(&self, chain: usize) -> u64 {
        self.seed.wrapping_add(chain as u64)
    }

    /// Settings for a second attempt after non-convergence: doubled warmup
    /// and iterations, `adapt_delta` halfway to its ceiling.
    pub fn relaxed(&self) -> Self {
        Self {
            iterations: self.iterations * 2,
            warmup: self.warmup * 2,
            adapt_delta: self.adapt_delta + (MAX_ADAPT_DELTA - self.adapt_delta).max(0.0) / 2.0,
            ..*self
        }
    }

    /// Check the settings are usable.
    pub fn validate(&self) -> Result<(), String> {
        if self.chains == 0 {
            return Err("chains must be at least 1".into());
        }
        if self.warmup >= self.iterations {
            return Err(format!(
                "warmup ({}) must be smaller than iterations ({})",
                self.warmup, self.iterations
            ));
        }
        if !(0.0..1.0).contains(&self.adapt_delta) {
            return Err(format!("adapt_delta must be in [0, 1), got {}", self.adapt_delta));
        }
        if self.cores == 0 {
            return Err("cores must be at least 1".into());
        }
        Ok(())
    }
}

/// A complete regression specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Model identity, also the snapshot file stem.
    pub name: String,
    /// Outcome column.
    pub outcome: Measure,
    /// Outcome distribution.
    pub family: Family,
    /// Fixed-effect terms after the intercept.
    pub fixed: Vec<FixedTerm>,
    /// Group-level terms.
    pub random: Vec<RandomTerm>,
    /// Prior on fixed-effect coefficients.
    pub prior: Prior,
}

impl ModelSpec {
    /// `duration ~ condition * gender + vowel + (1 + condition || subject) + (1 | item)`.
    pub fn duration(family: Family, prior: Prior) -> Self {
        Self {
            name: format!("duration_{}", family),
            outcome: Measure::Duration,
            family,
            fixed: vec![
                FixedTerm::Condition,
                FixedTerm::Gender,
                FixedTerm::ConditionByGender,
                FixedTerm::Vowel,
            ],
            random: Self::standard_random(),
            prior,
        }
    }

    /// `euclidean_dist ~ condition * gender + vowel + duration + (1 + condition || subject) + (1 | item)`.
    pub fn dispersion(family: Family, prior: Prior) -> Self {
        Self {
            name: format!("dispersion_{}", family),
            outcome: Measure::EuclideanDist,
            family,
            fixed: vec![
                FixedTerm::Condition,
                FixedTerm::Gender,
                FixedTerm::ConditionByGender,
                FixedTerm::Vowel,
                FixedTerm::Duration,
            ],
            random: Self::standard_random(),
            prior,
        }
    }

    /// The four models of the analysis.
    pub fn analysis_set(prior: Prior) -> Vec<Self> {
        vec![
            Self::duration(Family::Normal, prior),
            Self::duration(Family::LogNormal, prior),
            Self::dispersion(Family::Normal, prior),
            Self::dispersion(Family::LogNormal, prior),
        ]
    }

    fn standard_random() -> Vec<RandomTerm> {
        vec![
            RandomTerm::SubjectIntercept,
            RandomTerm::SubjectConditionSlope,
            RandomTerm::ItemIntercept,
        ]
    }

    /// Formula in lme4/brms notation.
    pub fn formula(&self) -> String {
        let mut rhs: Vec<&str> = Vec::new();
        let has_c = self.fixed.contains(&FixedTerm::Condition);
        let has_g = self.fixed.contains(&FixedTerm::Gender);
        let has_cg = self.fixed.contains(&FixedTerm::ConditionByGender);
        if has_c && has_g && has_cg {
            rhs.push("condition * gender");
        } else {
            rhs.extend(
                self.fixed
                    .iter()
                    .filter(|t| matches!(t, FixedTerm::Condition | FixedTerm::Gender | FixedTerm::ConditionByGender))
                    .map(|t| t.formula()),
            );
        }
        rhs.extend(
            self.fixed
                .iter()
                .filter(|t| matches!(t, FixedTerm::Vowel | FixedTerm::Duration))
                .map(|t| t.formula()),
        );
        if rhs.is_empty() {
            rhs.push("1");
        }

        let mut formula = format!("{} ~ {}", self.outcome.column(), rhs.join(" + "));

        let subj_int = self.random.contains(&RandomTerm::SubjectIntercept);
        let subj_slope = self.random.contains(&RandomTerm::SubjectConditionSlope);
        match (subj_int, subj_slope) {
            (true, true) => formula.push_str(" + (1 + condition || subject)"),
            (true, false) => formula.push_str(" + (1 | subject)"),
            (false, true) => formula.push_str(" + (0 + condition | subject)"),
            (false, false) => {}
        }
        if self.random.contains(&RandomTerm::ItemIntercept) {
            formula.push_str(" + (1 | item)");
        }
        formula
    }
}
