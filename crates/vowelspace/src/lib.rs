//! # vowelspace
//!
//! Test whether vowels become more peripheral in polite speech.
//!
//! Given acoustic measurements (F1, F2, duration) of vowel tokens produced
//! in casual and polite registers, this crate:
//! - cleans the table (monophthongs only, stable synthetic item ids)
//! - measures each token's distance from its speaker's vowel-space centroid
//! - summarises durations and distances by condition and gender, with
//!   per-speaker paired t-tests and vowel-space areas
//! - fits Bayesian mixed models for duration and dispersion, with
//!   convergence checks, one automatic retry and compressed snapshots
//! - reports posterior tail probabilities of the condition and gender effects
//! - writes plot-ready CSV tables
//!
//! ## Quick Start
//!
//! ```ignore
//! use vowelspace::{AnalysisConfig, Pipeline};
//! use std::path::Path;
//!
//! let config = AnalysisConfig::default().chains(4).cores(4);
//! let report = Pipeline::new(config).run(Path::new("formants.csv"))?;
//!
//! if let Some(model) = report.model("dispersion_lognormal") {
//!     for effect in &model.key_effects {
//!         println!("{}: P(>0) = {:.3}", effect.name, effect.prob_positive);
//!     }
//! }
//! ```
//!
//! The numerical work (features, design matrices, the Gibbs sampler,
//! posterior summaries) lives in the `no_std` crate `vowelspace-core`.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
mod config;
mod error;
mod pipeline;
mod report;

// Functional modules
pub mod data;
pub mod descriptive;
pub mod model;
pub mod output;

// Re-exports for public API
pub use config::AnalysisConfig;
pub use error::{EmptyDatasetError, PipelineError, Result, SchemaError};
pub use model::{ConvergenceError, FittedModel, GibbsBackend, ModelFitter, ModelStore, PosteriorSampler};
pub use pipeline::Pipeline;
pub use report::{
    AnalysisReport, CleaningSummary, KeyEffect, ModelFailure, ModelReport, KEY_COEFFICIENTS,
};
pub use vowelspace_core::{
    DispersionReference, Family, McmcControl, Measure, ModelSpec, Prior,
};
