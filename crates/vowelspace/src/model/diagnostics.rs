//! Convergence diagnostics and the checks applied to every fit.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use vowelspace_core::constants::{MIN_ESS_PER_CHAIN, RHAT_THRESHOLD};
use vowelspace_core::statistics::{combined_ess, split_rhat};
use vowelspace_core::PosteriorDraws;

/// R-hat and ESS of one parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDiagnostics {
    /// Parameter name.
    pub name: String,
    /// Split R-hat.
    #[serde(with = "non_finite")]
    pub rhat: f64,
    /// Bulk effective sample size, summed over chains.
    #[serde(with = "non_finite")]
    pub ess: f64,
}

/// Diagnostics of one sampler run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Per-parameter diagnostics, in draw column order.
    pub parameters: Vec<ParameterDiagnostics>,
    /// Divergent transitions reported by the sampler.
    pub divergences: usize,
    /// Number of chains.
    pub chains: usize,
}

/// A model that failed its convergence checks.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("model '{model}' did not converge: {}", .issues.join("; "))]
pub struct ConvergenceError {
    /// Model name.
    pub model: String,
    /// One line per failed check.
    pub issues: Vec<String>,
    /// Largest R-hat over parameters.
    #[serde(with = "non_finite")]
    pub max_rhat: f64,
    /// Smallest ESS over parameters.
    #[serde(with = "non_finite")]
    pub min_ess: f64,
    /// Divergent transitions.
    pub divergences: usize,
}

impl Diagnostics {
    /// Compute R-hat and ESS for every parameter.
    pub fn from_draws(draws: &PosteriorDraws, divergences: usize) -> Self {
        let parameters = draws
            .names
            .iter()
            .enumerate()
            .map(|(j, name)| {
                let per_chain: Vec<Vec<f64>> = draws
                    .chains
                    .iter()
                    .map(|chain| chain.iter().map(|row| row[j]).collect())
                    .collect();
                let refs: Vec<&[f64]> = per_chain.iter().map(Vec::as_slice).collect();
                ParameterDiagnostics {
                    name: name.clone(),
                    rhat: split_rhat(&refs),
                    ess: combined_ess(&refs),
                }
            })
            .collect();

        Self {
            parameters,
            divergences,
            chains: draws.n_chains(),
        }
    }

    /// Largest R-hat; NaN counts as infinitely bad.
    pub fn max_rhat(&self) -> f64 {
        self.parameters
            .iter()
            .map(|p| if p.rhat.is_nan() { f64::INFINITY } else { p.rhat })
            .fold(1.0, f64::max)
    }

    /// Smallest ESS.
    pub fn min_ess(&self) -> f64 {
        self.parameters
            .iter()
            .map(|p| p.ess)
            .fold(f64::INFINITY, f64::min)
    }

    /// Minimum acceptable ESS for this number of chains.
    pub fn ess_threshold(&self) -> f64 {
        MIN_ESS_PER_CHAIN * self.chains as f64
    }

    /// Apply the convergence rules: every R-hat ≤ 1.05, every ESS ≥
    /// 100 × chains, no divergent transitions.
    pub fn check(&self, model: &str) -> Result<(), ConvergenceError> {
        let mut issues = Vec::new();

        let high_rhat: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.rhat.is_nan() || p.rhat > RHAT_THRESHOLD)
            .map(|p| p.name.as_str())
            .collect();
        if !high_rhat.is_empty() {
            issues.push(format!(
                "R-hat above {} for {}",
                RHAT_THRESHOLD,
                high_rhat.join(", ")
            ));
        }

        let threshold = self.ess_threshold();
        let low_ess: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.ess < threshold)
            .map(|p| p.name.as_str())
            .collect();
        if !low_ess.is_empty() {
            issues.push(format!("ESS below {} for {}", threshold, low_ess.join(", ")));
        }

        if self.divergences > 0 {
            issues.push(format!("{} divergent transitions", self.divergences));
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ConvergenceError {
                model: model.to_string(),
                issues,
                max_rhat: self.max_rhat(),
                min_ess: self.min_ess(),
                divergences: self.divergences,
            })
        }
    }
}

/// JSON has no infinities: non-finite values are written as `null` and
/// read back as `+inf`.
mod non_finite {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
    }
}
