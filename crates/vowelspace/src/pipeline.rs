//! End-to-end analysis: load, derive, describe, fit, summarise, write.

use std::path::Path;

use indicatif::ProgressBar;
use tracing::{info, warn};
use vowelspace_core::{derive_features, DerivedToken, DispersionReference, ModelSpec};

use crate::config::AnalysisConfig;
use crate::data::{clean, load_raw_records, CleanedData};
use crate::descriptive::DescriptiveReport;
use crate::error::{PipelineError, Result};
use crate::model::{GibbsBackend, ModelFitter, ModelStore, PosteriorSampler};
use crate::output::{write_all, Tables};
use crate::report::{AnalysisReport, CleaningSummary, ModelFailure, ModelReport};

/// Runs the whole analysis with one configuration.
pub struct Pipeline<S = GibbsBackend> {
    config: AnalysisConfig,
    fitter: ModelFitter<S>,
    progress: Option<ProgressBar>,
}

impl Pipeline<GibbsBackend> {
    /// Pipeline using the Gibbs backend.
    pub fn new(config: AnalysisConfig) -> Self {
        Self::with_sampler(config, GibbsBackend)
    }
}

impl<S: PosteriorSampler> Pipeline<S> {
    /// Pipeline using a custom sampler backend.
    pub fn with_sampler(config: AnalysisConfig, sampler: S) -> Self {
        Self {
            config,
            fitter: ModelFitter::new(sampler),
            progress: None,
        }
    }

    /// Report model fitting progress on a spinner.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Settings in use.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run every stage on the measurement file at `input`.
    ///
    /// # Errors
    /// Schema, empty-dataset and invalid-value problems in the input are
    /// fatal, as are I/O failures writing tables or snapshots. A model that
    /// cannot be fitted is recorded in the report and the run continues.
    pub fn run(&self, input: &Path) -> Result<AnalysisReport> {
        self.config.validate()?;

        info!(input = %input.display(), "loading measurements");
        let cleaned = clean(load_raw_records(input)?)?;
        let tokens = self.derive(&cleaned)?;

        let descriptive = DescriptiveReport::compute(&tokens);

        let (models, model_failures) = if self.config.fit_models {
            self.fit_all(&tokens)?
        } else {
            info!("model fitting skipped");
            (Vec::new(), Vec::new())
        };

        let tables = write_all(
            &self.config.tables_dir,
            &Tables {
                tokens: &tokens,
                vowel_means: &descriptive.vowel_means,
                vowel_spaces: &descriptive.vowel_spaces,
                comparisons: &descriptive.comparisons,
                summaries: &descriptive.summaries,
                models: &models,
            },
        )?;
        info!(
            dir = %self.config.tables_dir.display(),
            count = tables.len(),
            "tables written"
        );

        Ok(AnalysisReport {
            input: input.to_path_buf(),
            config: self.config.clone(),
            cleaning: CleaningSummary::from(&cleaned),
            descriptive,
            models,
            model_failures,
            tables,
        })
    }

    /// Derive features with the configured `both_dist` reference.
    pub fn derive(&self, cleaned: &CleanedData) -> Result<Vec<DerivedToken>> {
        if self.config.dispersion_reference == DispersionReference::PooledMidpoint {
            warn!(
                "both_dist is measured from the pooled midpoint of all speakers, \
                 not each speaker's own centroid"
            );
        }
        Ok(derive_features(
            &cleaned.tokens,
            self.config.dispersion_reference,
        )?)
    }

    /// Fit or reload the four analysis models.
    pub fn fit_all(&self, tokens: &[DerivedToken]) -> Result<(Vec<ModelReport>, Vec<ModelFailure>)> {
        let store = ModelStore::new(&self.config.models_dir);
        let mut reports = Vec::new();
        let mut failures = Vec::new();

        for spec in ModelSpec::analysis_set(self.config.prior) {
            if let Some(pb) = &self.progress {
                pb.set_message(format!("fitting {}", spec.name));
            }
            match store.fit_or_load(&self.fitter, tokens, &spec, &self.config.control) {
                Ok(model) => reports.push(ModelReport::from_fitted(&model)),
                Err(err @ (PipelineError::Design(_) | PipelineError::Sampler(_))) => {
                    warn!(model = %spec.name, %err, "model could not be fitted");
                    failures.push(ModelFailure {
                        name: spec.name.clone(),
                        error: err.to_string(),
                    });
                }
                Err(err) => return Err(err),
            }
        }

        if let Some(pb) = &self.progress {
            pb.finish_and_clear();
        }
        Ok((reports, failures))
    }
}
