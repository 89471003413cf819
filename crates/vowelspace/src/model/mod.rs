//! Model fitting, convergence checks and snapshot persistence.
//!
//! The fitter depends only on the [`PosteriorSampler`] trait; [`GibbsBackend`]
//! is the shipped implementation.

mod diagnostics;
mod fitter;
mod sampler;
mod store;

pub use diagnostics::{ConvergenceError, Diagnostics, ParameterDiagnostics};
pub use fitter::{data_fingerprint, FittedModel, ModelFitter};
pub use sampler::{GibbsBackend, PosteriorSampler, SamplerOutput};
pub use store::ModelStore;
