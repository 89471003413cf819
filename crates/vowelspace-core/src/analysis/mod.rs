//! Bayesian inference for mixed models.
//!
//! - `gibbs`: blocked Gibbs sampler producing per-chain draws
//! - `posterior`: draw storage, tail probabilities and summaries

mod gibbs;
mod posterior;

pub use gibbs::{run_gibbs_chain, ChainDraws, GibbsSampler, MixedModelPriors, SamplerError};
pub use posterior::{proportion_below_zero, CoefficientSummary, PosteriorDraws, PosteriorError};
