//! The analysis report assembled by the pipeline.

use std::path::PathBuf;

use serde::Serialize;
use vowelspace_core::{CoefficientSummary, Family, McmcControl};

use crate::config::AnalysisConfig;
use crate::data::CleanedData;
use crate::descriptive::DescriptiveReport;
use crate::model::{ConvergenceError, FittedModel};

/// Coefficients whose sign answers the research question.
pub const KEY_COEFFICIENTS: [&str; 3] = ["b_condition", "b_gender", "b_condition:gender"];

/// Counts from loading and cleaning.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleaningSummary {
    /// Usable rows read.
    pub rows_read: usize,
    /// Rows dropped for missing cells.
    pub dropped_missing: usize,
    /// Diphthong rows removed.
    pub dropped_diphthongs: usize,
    /// Tokens kept.
    pub tokens: usize,
    /// `(id, raw label)` for every item.
    pub items: Vec<(String, String)>,
}

impl From<&CleanedData> for CleaningSummary {
    fn from(data: &CleanedData) -> Self {
        Self {
            rows_read: data.rows_read,
            dropped_missing: data.dropped_missing,
            dropped_diphthongs: data.dropped_diphthongs,
            tokens: data.tokens.len(),
            items: data
                .items
                .iter()
                .map(|(id, label)| (id, label.to_string()))
                .collect(),
        }
    }
}

/// Posterior tail probabilities of one coefficient.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyEffect {
    /// Coefficient name.
    pub name: String,
    /// Posterior mean.
    pub mean: f64,
    /// P(coefficient ≥ 0).
    pub prob_positive: f64,
    /// P(coefficient < 0).
    pub prob_negative: f64,
}

/// Reportable view of one fitted model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelReport {
    /// Model name.
    pub name: String,
    /// Model formula.
    pub formula: String,
    /// Outcome family.
    pub family: Family,
    /// Observations fitted.
    pub n_obs: usize,
    /// Control settings of the kept draws.
    pub control: McmcControl,
    /// Sampling attempts.
    pub attempts: usize,
    /// Convergence failure, if any.
    pub convergence: Option<ConvergenceError>,
    /// Every parameter.
    pub coefficients: Vec<CoefficientSummary>,
    /// Condition, gender and interaction effects.
    pub key_effects: Vec<KeyEffect>,
    /// Sampler notes.
    pub notes: Vec<String>,
}

impl ModelReport {
    /// Summarise a fitted model.
    pub fn from_fitted(model: &FittedModel) -> Self {
        let coefficients = model.summaries();
        let key_effects = coefficients
            .iter()
            .filter(|c| KEY_COEFFICIENTS.contains(&c.name.as_str()))
            .map(|c| KeyEffect {
                name: c.name.clone(),
                mean: c.mean,
                prob_positive: c.prob_positive,
                prob_negative: c.prob_negative(),
            })
            .collect();

        Self {
            name: model.spec.name.clone(),
            formula: model.spec.formula(),
            family: model.spec.family,
            n_obs: model.n_obs,
            control: model.control,
            attempts: model.attempts,
            convergence: model.convergence.clone(),
            coefficients,
            key_effects,
            notes: model.notes.clone(),
        }
    }

    /// True when the model passed its convergence checks.
    pub fn converged(&self) -> bool {
        self.convergence.is_none()
    }
}

/// A model that could not be fitted at all.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelFailure {
    /// Model name.
    pub name: String,
    /// Error message.
    pub error: String,
}

/// Full output of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    /// Input file.
    pub input: PathBuf,
    /// Settings used.
    pub config: AnalysisConfig,
    /// Loading and cleaning counts.
    pub cleaning: CleaningSummary,
    /// Descriptive statistics.
    pub descriptive: DescriptiveReport,
    /// Fitted models, in analysis order.
    pub models: Vec<ModelReport>,
    /// Models that failed outright.
    pub model_failures: Vec<ModelFailure>,
    /// Tables written.
    pub tables: Vec<PathBuf>,
}

impl AnalysisReport {
    /// Report for one model by name.
    pub fn model(&self, name: &str) -> Option<&ModelReport> {
        self.models.iter().find(|m| m.name == name)
    }

    /// True when every fitted model converged and none failed.
    pub fn all_converged(&self) -> bool {
        self.model_failures.is_empty() && self.models.iter().all(ModelReport::converged)
    }
}
