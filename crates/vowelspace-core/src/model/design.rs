//! Design matrices for linear mixed models.
//!
//! The fixed-effect matrix `X` has the intercept in column 0 followed by the
//! columns of each [`FixedTerm`] in specification order. Each [`RandomTerm`]
//! becomes a [`RandomBlock`]: a grouping factor with one coefficient per
//! level and a per-row covariate (1 for intercepts, the condition code for
//! slopes).

extern crate alloc;

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use crate::coding::FactorCoding;
use crate::math;
use crate::model::spec::{Family, FixedTerm, ModelSpec, RandomTerm};
use crate::types::{DerivedToken, Matrix, Vector};

/// Errors building a design from a token table.
#[derive(Debug, Clone, PartialEq)]
pub enum DesignError {
    /// No rows to fit.
    EmptyData,
    /// Log-normal outcome with a value that is not strictly positive.
    NonPositiveOutcome {
        /// Row index.
        row: usize,
        /// Offending value.
        value: f64,
    },
    /// A predictor or outcome is NaN or infinite.
    NonFinite {
        /// Row index.
        row: usize,
        /// Column name.
        column: String,
    },
}

impl fmt::Display for DesignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DesignError::EmptyData => write!(f, "no observations to fit"),
            DesignError::NonPositiveOutcome { row, value } => write!(
                f,
                "log-normal outcome must be positive, row {} has {}",
                row, value
            ),
            DesignError::NonFinite { row, column } => {
                write!(f, "non-finite value in column '{}' at row {}", column, row)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DesignError {}

/// One group-level term laid out for sampling.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomBlock {
    /// Which term this block implements.
    pub term: RandomTerm,
    /// Sorted grouping levels; coefficient `j` belongs to `levels[j]`.
    pub levels: Vec<String>,
    /// Level index of every row.
    pub index: Vec<usize>,
    /// Covariate multiplying the level coefficient in every row.
    pub value: Vec<f64>,
}

impl RandomBlock {
    fn build(term: RandomTerm, tokens: &[DerivedToken]) -> Self {
        let label = |t: &DerivedToken| -> String {
            match term {
                RandomTerm::SubjectIntercept | RandomTerm::SubjectConditionSlope => {
                    t.token.subject.clone()
                }
                RandomTerm::ItemIntercept => t.token.item_id.clone(),
            }
        };

        let levels: Vec<String> = tokens
            .iter()
            .map(label)
            .collect::<BTreeSet<String>>()
            .into_iter()
            .collect();
        let lookup: BTreeMap<&str, usize> = levels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.as_str(), i))
            .collect();

        let index = tokens.iter().map(|t| lookup[label(t).as_str()]).collect();
        let value = tokens
            .iter()
            .map(|t| match term {
                RandomTerm::SubjectConditionSlope => t.condition_coded,
                _ => 1.0,
            })
            .collect();

        Self {
            term,
            levels,
            index,
            value,
        }
    }

    /// Number of coefficients in the block.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// True when the block has no levels.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// Outcome, fixed-effect matrix and group-level structure for one model.
#[derive(Debug, Clone, PartialEq)]
pub struct Design {
    /// Outcome on the modelling scale (log-transformed for log-normal).
    pub y: Vector,
    /// Fixed-effect matrix, `n × p`.
    pub x: Matrix,
    /// Parameter names of the columns of `x` (`b_Intercept`, ...).
    pub fixed_names: Vec<String>,
    /// Group-level blocks, in specification order.
    pub blocks: Vec<RandomBlock>,
}

impl Design {
    /// Lay out `spec` over the derived token table.
    pub fn build(tokens: &[DerivedToken], spec: &ModelSpec) -> Result<Self, DesignError> {
        if tokens.is_empty() {
            return Err(DesignError::EmptyData);
        }

        let mut y = Vec::with_capacity(tokens.len());
        for (row, t) in tokens.iter().enumerate() {
            let raw = spec.outcome.value(t);
            if !raw.is_finite() {
                return Err(DesignError::NonFinite {
                    row,
                    column: spec.outcome.column().to_string(),
                });
            }
            let v = match spec.family {
                Family::Normal => raw,
                Family::LogNormal => {
                    if raw <= 0.0 {
                        return Err(DesignError::NonPositiveOutcome { row, value: raw });
                    }
                    math::ln(raw)
                }
            };
            y.push(v);
        }

        let vowel_coding = FactorCoding::from_values(tokens.iter().map(|t| t.token.vowel.as_str()));

        let mut fixed_names = vec![String::from("b_Intercept")];
        for term in &spec.fixed {
            match term {
                FixedTerm::Vowel => fixed_names.extend(
                    vowel_coding
                        .column_levels()
                        .iter()
                        .map(|l| format!("b_vowel[{}]", l)),
                ),
                other => fixed_names.push(format!("b_{}", other.formula())),
            }
        }

        let p = fixed_names.len();
        let mut x = Matrix::zeros(tokens.len(), p);
        for (row, t) in tokens.iter().enumerate() {
            x[(row, 0)] = 1.0;
            let mut col = 1;
            for term in &spec.fixed {
                match term {
                    FixedTerm::Condition => {
                        x[(row, col)] = t.condition_coded;
                        col += 1;
                    }
                    FixedTerm::Gender => {
                        x[(row, col)] = t.gender_coded;
                        col += 1;
                    }
                    FixedTerm::ConditionByGender => {
                        x[(row, col)] = t.condition_coded * t.gender_coded;
                        col += 1;
                    }
                    FixedTerm::Vowel => {
                        // Every token's vowel is one of the coding's levels.
                        let codes = vowel_coding.encode(&t.token.vowel).unwrap_or_default();
                        for c in codes {
                            x[(row, col)] = c;
                            col += 1;
                        }
                    }
                    FixedTerm::Duration => {
                        let d = t.token.duration_ms;
                        if !d.is_finite() {
                            return Err(DesignError::NonFinite {
                                row,
                                column: "duration".into(),
                            });
                        }
                        x[(row, col)] = d;
                        col += 1;
                    }
                }
            }
        }

        let blocks = spec
            .random
            .iter()
            .map(|&term| RandomBlock::build(term, tokens))
            .collect();

        Ok(Self {
            y: Vector::from_vec(y),
            x,
            fixed_names,
            blocks,
        })
    }

    /// Number of observations.
    pub fn n_obs(&self) -> usize {
        self.y.len()
    }

    /// Number of fixed-effect coefficients.
    pub fn n_fixed(&self) -> usize {
        self.x.ncols()
    }

    /// Total number of group-level coefficients.
    pub fn n_random(&self) -> usize {
        self.blocks.iter().map(RandomBlock::len).sum()
    }

    /// Combined matrix `W = [X | Z_1 | ... | Z_k]`.
    pub fn combined_matrix(&self) -> Matrix {
        let n = self.n_obs();
        let p = self.n_fixed();
        let mut w = Matrix::zeros(n, p + self.n_random());
        w.columns_mut(0, p).copy_from(&self.x);

        let mut offset = p;
        for block in &self.blocks {
            for row in 0..n {
                w[(row, offset + block.index[row])] = block.value[row];
            }
            offset += block.len();
        }
        w
    }

    /// Names of all sampled parameters, in draw column order.
    pub fn parameter_names(&self) -> Vec<String> {
        let mut names = self.fixed_names.clone();
        names.extend(self.blocks.iter().map(|b| b.term.sd_name().to_string()));
        names.push(String::from("sigma"));
        names
    }
}
