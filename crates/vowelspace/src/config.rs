//! Analysis configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use vowelspace_core::{DispersionReference, McmcControl, Prior};

use crate::error::{PipelineError, Result};

/// Settings for one pipeline run.
///
/// Every field has a default, so a config file only needs the values it
/// changes:
///
/// ```json
/// { "control": { "chains": 2, "cores": 2 }, "prior": { "scale": 50.0 } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// MCMC settings shared by all four models.
    pub control: McmcControl,

    /// Prior on non-intercept fixed effects.
    ///
    /// Default: normal(0, 100)
    pub prior: Prior,

    /// Reference point for `both_dist`.
    pub dispersion_reference: DispersionReference,

    /// Directory for model snapshots.
    pub models_dir: PathBuf,

    /// Directory for plot-ready CSV tables.
    pub tables_dir: PathBuf,

    /// Fit the Bayesian models. Descriptive output is always produced.
    pub fit_models: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            control: McmcControl::default(),
            prior: Prior::default(),
            dispersion_reference: DispersionReference::default(),
            models_dir: PathBuf::from("models"),
            tables_dir: PathBuf::from("tables"),
            fit_models: true,
        }
    }
}

impl AnalysisConfig {
    /// Read a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the sampler cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.control.validate().map_err(PipelineError::Config)?;
        if !(self.prior.scale.is_finite() && self.prior.scale > 0.0) {
            return Err(PipelineError::Config(format!(
                "prior scale must be positive, got {}",
                self.prior.scale
            )));
        }
        if !self.prior.location.is_finite() {
            return Err(PipelineError::Config("prior location must be finite".into()));
        }
        Ok(())
    }

    /// Set the number of chains.
    ///
    /// # Panics
    ///
    /// Panics if `chains` is 0.
    pub fn chains(mut self, chains: usize) -> Self {
        assert!(chains > 0, "chains must be > 0");
        self.control.chains = chains;
        self
    }

    /// Set total and warmup iterations per chain.
    ///
    /// # Panics
    ///
    /// Panics if `warmup >= iterations`.
    pub fn iterations(mut self, iterations: usize, warmup: usize) -> Self {
        assert!(warmup < iterations, "warmup must be < iterations");
        self.control.iterations = iterations;
        self.control.warmup = warmup;
        self
    }

    /// Set the base seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.control.seed = seed;
        self
    }

    /// Set the worker threads for chains.
    ///
    /// # Panics
    ///
    /// Panics if `cores` is 0.
    pub fn cores(mut self, cores: usize) -> Self {
        assert!(cores > 0, "cores must be > 0");
        self.control.cores = cores;
        self
    }

    /// Set the prior on fixed effects.
    pub fn prior(mut self, prior: Prior) -> Self {
        self.prior = prior;
        self
    }

    /// Choose the `both_dist` reference point.
    pub fn dispersion_reference(mut self, reference: DispersionReference) -> Self {
        self.dispersion_reference = reference;
        self
    }

    /// Set the snapshot directory.
    pub fn models_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.models_dir = dir.into();
        self
    }

    /// Set the table output directory.
    pub fn tables_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tables_dir = dir.into();
        self
    }

    /// Skip or enable model fitting.
    pub fn fit_models(mut self, fit: bool) -> Self {
        self.fit_models = fit;
        self
    }
}
