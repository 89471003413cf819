//! The sampler seam and its Gibbs backend.

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::debug;
use vowelspace_core::analysis::{run_gibbs_chain, ChainDraws};
use vowelspace_core::model::Design;
use vowelspace_core::{McmcControl, PosteriorDraws, Prior};

use crate::error::{PipelineError, Result};

/// Draws from one sampler run plus what the sampler reports about itself.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerOutput {
    /// Retained draws of every chain.
    pub draws: PosteriorDraws,
    /// Divergent transitions across chains.
    pub divergences: usize,
    /// Free-form notes, such as settings the backend ignored.
    pub notes: Vec<String>,
}

/// Anything that can draw from the posterior of a mixed model.
pub trait PosteriorSampler: Send + Sync {
    /// Short backend name, stored with fitted models.
    fn name(&self) -> &'static str;

    /// Sample every chain of `control` for `design`.
    fn sample(&self, design: &Design, prior: Prior, control: &McmcControl)
        -> Result<SamplerOutput>;
}

/// Blocked Gibbs sampler, one rayon task per chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct GibbsBackend;

impl PosteriorSampler for GibbsBackend {
    fn name(&self) -> &'static str {
        "gibbs"
    }

    fn sample(
        &self,
        design: &Design,
        prior: Prior,
        control: &McmcControl,
    ) -> Result<SamplerOutput> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(control.cores)
            .build()
            .map_err(|e| PipelineError::Config(format!("cannot start sampler threads: {e}")))?;

        debug!(
            chains = control.chains,
            cores = control.cores,
            iterations = control.iterations,
            warmup = control.warmup,
            parameters = design.n_fixed() + design.n_random(),
            "running Gibbs chains"
        );

        let chains: Vec<ChainDraws> = pool.install(|| {
            (0..control.chains)
                .into_par_iter()
                .map(|c| {
                    run_gibbs_chain(
                        design,
                        prior,
                        control.warmup,
                        control.iterations,
                        control.chain_seed(c),
                    )
                })
                .collect::<std::result::Result<Vec<_>, _>>()
        })?;

        let draws = PosteriorDraws::new(
            design.parameter_names(),
            chains.into_iter().map(|c| c.draws).collect(),
        )?;

        Ok(SamplerOutput {
            draws,
            // Gibbs updates are exact conditional draws; there is no
            // trajectory to diverge.
            divergences: 0,
            notes: vec![format!(
                "adapt_delta = {} ignored: the Gibbs sampler has no step-size adaptation",
                control.adapt_delta
            )],
        })
    }
}
