//! Fitting with a convergence policy.
//!
//! A fit that fails its checks is retried once with [`McmcControl::relaxed`]
//! settings. If the retry still fails, the model is returned with the
//! [`ConvergenceError`] attached so callers report it instead of dropping it.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use vowelspace_core::model::Design;
use vowelspace_core::{CoefficientSummary, DerivedToken, McmcControl, ModelSpec, PosteriorDraws};

use super::diagnostics::{ConvergenceError, Diagnostics};
use super::sampler::{GibbsBackend, PosteriorSampler, SamplerOutput};
use crate::error::{PipelineError, Result};

/// A fitted model with everything needed to report or reuse it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedModel {
    /// Specification that produced the draws.
    pub spec: ModelSpec,
    /// Control settings requested by the caller.
    pub requested_control: McmcControl,
    /// Control settings of the attempt whose draws are kept.
    pub control: McmcControl,
    /// Sampler backend name.
    pub sampler: String,
    /// Number of observations fitted.
    pub n_obs: usize,
    /// SHA-256 of the outcome, fixed-effect matrix and grouping the draws
    /// were computed from. Empty in snapshots written before it existed.
    #[serde(default)]
    pub data_fingerprint: String,
    /// Sampling attempts made (1, or 2 after a retry).
    pub attempts: usize,
    /// Posterior draws.
    pub draws: PosteriorDraws,
    /// Diagnostics of the kept draws.
    pub diagnostics: Diagnostics,
    /// Present when the kept draws failed the convergence checks.
    pub convergence: Option<ConvergenceError>,
    /// Notes reported by the sampler.
    pub notes: Vec<String>,
}

impl FittedModel {
    /// True when the kept draws passed every convergence check.
    pub fn converged(&self) -> bool {
        self.convergence.is_none()
    }

    /// Posterior summaries of every parameter.
    pub fn summaries(&self) -> Vec<CoefficientSummary> {
        self.draws.summarize()
    }

    /// Summary of one coefficient.
    pub fn summary_of(&self, name: &str) -> Result<CoefficientSummary> {
        Ok(self.draws.summary_of(name)?)
    }

    /// P(coefficient ≥ 0).
    pub fn prob_positive(&self, name: &str) -> Result<f64> {
        Ok(self.draws.prob_positive(name)?)
    }

    /// P(coefficient < 0).
    pub fn prob_negative(&self, name: &str) -> Result<f64> {
        Ok(self.draws.prob_negative(name)?)
    }
}

/// Fits model specifications through a [`PosteriorSampler`].
#[derive(Debug, Clone, Default)]
pub struct ModelFitter<S = GibbsBackend> {
    sampler: S,
}

impl<S: PosteriorSampler> ModelFitter<S> {
    /// Fitter over the given backend.
    pub fn new(sampler: S) -> Self {
        Self { sampler }
    }

    /// The backend draws come from.
    pub fn sampler(&self) -> &S {
        &self.sampler
    }

    /// Fit `spec` to the derived token table.
    ///
    /// # Errors
    /// `Config` for unusable control settings, `Design` when the model cannot
    /// be laid out, `Sampler` on numerical failure. Non-convergence is not an
    /// error here; it is attached to the returned model.
    pub fn fit(
        &self,
        tokens: &[DerivedToken],
        spec: &ModelSpec,
        control: &McmcControl,
    ) -> Result<FittedModel> {
        let design = Design::build(tokens, spec)?;
        self.fit_design(&design, spec, control)
    }

    /// Fit `spec` over an already built design.
    pub fn fit_design(
        &self,
        design: &Design,
        spec: &ModelSpec,
        control: &McmcControl,
    ) -> Result<FittedModel> {
        control.validate().map_err(PipelineError::Config)?;

        info!(
            model = %spec.name,
            formula = %spec.formula(),
            family = %spec.family,
            prior = %spec.prior,
            n_obs = design.n_obs(),
            sampler = self.sampler.name(),
            "fitting model"
        );

        let first = self.attempt(design, spec, control)?;
        let (kept, used, attempts) = match first.1.check(&spec.name) {
            Ok(()) => (first, *control, 1),
            Err(err) => {
                warn!(
                    model = %spec.name,
                    %err,
                    "not converged, retrying with longer chains"
                );
                let relaxed = control.relaxed();
                (self.attempt(design, spec, &relaxed)?, relaxed, 2)
            }
        };
        let (output, diagnostics) = kept;

        let convergence = diagnostics.check(&spec.name).err();
        match &convergence {
            Some(err) => warn!(model = %spec.name, %err, "model did not converge after retry"),
            None => info!(
                model = %spec.name,
                max_rhat = diagnostics.max_rhat(),
                min_ess = diagnostics.min_ess(),
                attempts,
                "model converged"
            ),
        }

        Ok(FittedModel {
            spec: spec.clone(),
            requested_control: *control,
            control: used,
            sampler: self.sampler.name().to_string(),
            n_obs: design.n_obs(),
            data_fingerprint: data_fingerprint(design),
            attempts,
            draws: output.draws,
            diagnostics,
            convergence,
            notes: output.notes,
        })
    }

    fn attempt(
        &self,
        design: &Design,
        spec: &ModelSpec,
        control: &McmcControl,
    ) -> Result<(SamplerOutput, Diagnostics)> {
        let output = self.sampler.sample(design, spec.prior, control)?;
        let diagnostics = Diagnostics::from_draws(&output.draws, output.divergences);
        Ok((output, diagnostics))
    }
}

/// Hex SHA-256 over everything in `design` that the posterior depends on.
pub fn data_fingerprint(design: &Design) -> String {
    let mut hasher = Sha256::new();
    hasher.update((design.n_obs() as u64).to_le_bytes());
    hasher.update((design.n_fixed() as u64).to_le_bytes());
    for v in design.y.iter().chain(design.x.iter()) {
        hasher.update(v.to_bits().to_le_bytes());
    }
    for block in &design.blocks {
        hasher.update(block.term.sd_name().as_bytes());
        for level in &block.levels {
            hasher.update(level.as_bytes());
            hasher.update([0u8]);
        }
        for (&i, &v) in block.index.iter().zip(&block.value) {
            hasher.update((i as u64).to_le_bytes());
            hasher.update(v.to_bits().to_le_bytes());
        }
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use vowelspace_core::model::{Family, Prior};
    use vowelspace_core::{derive_features, Condition, DispersionReference, Gender, Token, VowelType};

    fn tokens() -> Vec<DerivedToken> {
        let mut raw = Vec::new();
        for s in 0..4 {
            for (c, cond) in Condition::LEVELS.into_iter().enumerate() {
                for i in 0..3 {
                    let k = (s * 11 + i * 7) as f64;
                    let shift = 13.0 * c as f64;
                    raw.push(Token {
                        subject: format!("S{s}"),
                        item_id: format!("Item{}", i + 1),
                        vowel: ["a", "i", "u"][i].into(),
                        vowel_type: VowelType::Monophthong,
                        condition: cond,
                        gender: if s % 2 == 0 { Gender::Female } else { Gender::Male },
                        duration_ms: 90.0 + k,
                        f1_hz: 450.0 + k + shift,
                        f2_hz: 1400.0 + 2.0 * k - shift,
                    });
                }
            }
        }
        derive_features(&raw, DispersionReference::default()).unwrap()
    }

    /// Sampler returning constant-per-chain draws: each chain sits at its
    /// own value, so R-hat is infinite and every check fails.
    struct StuckSampler {
        calls: AtomicUsize,
    }

    impl PosteriorSampler for StuckSampler {
        fn name(&self) -> &'static str {
            "stuck"
        }

        fn sample(
            &self,
            design: &Design,
            _prior: Prior,
            control: &McmcControl,
        ) -> Result<SamplerOutput> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let names = design.parameter_names();
            let chains = (0..control.chains)
                .map(|c| vec![vec![c as f64; names.len()]; control.draws_per_chain()])
                .collect();
            Ok(SamplerOutput {
                draws: PosteriorDraws::new(names, chains)?,
                divergences: 0,
                notes: Vec::new(),
            })
        }
    }

    fn small_control() -> McmcControl {
        McmcControl {
            chains: 2,
            iterations: 40,
            warmup: 20,
            ..McmcControl::default()
        }
    }

    #[test]
    fn test_retry_then_attach_error() {
        let fitter = ModelFitter::new(StuckSampler {
            calls: AtomicUsize::new(0),
        });
        let spec = ModelSpec::duration(Family::Normal, Prior::default());
        let control = small_control();
        let fitted = fitter.fit(&tokens(), &spec, &control).unwrap();

        assert_eq!(fitter.sampler.calls.load(Ordering::SeqCst), 2);
        assert_eq!(fitted.attempts, 2);
        assert_eq!(fitted.requested_control, control);
        assert_eq!(fitted.control, control.relaxed());
        assert_eq!(fitted.draws.n_draws(), 2 * control.relaxed().draws_per_chain());
        let err = fitted.convergence.as_ref().unwrap();
        assert_eq!(err.model, "duration_normal");
        assert!(!fitted.converged());
    }

    #[test]
    fn test_invalid_control_rejected() {
        let fitter = ModelFitter::new(GibbsBackend);
        let spec = ModelSpec::duration(Family::Normal, Prior::default());
        let control = McmcControl {
            chains: 0,
            ..small_control()
        };
        assert!(matches!(
            fitter.fit(&tokens(), &spec, &control),
            Err(PipelineError::Config(_))
        ));
    }

    #[test]
    fn test_gibbs_fit_reports_coefficients() {
        let fitter = ModelFitter::new(GibbsBackend);
        let spec = ModelSpec::dispersion(Family::LogNormal, Prior::default());
        let fitted = fitter.fit(&tokens(), &spec, &small_control()).unwrap();
        assert_eq!(fitted.sampler, "gibbs");
        assert_eq!(fitted.n_obs, 24);
        let p = fitted.prob_positive("b_condition").unwrap();
        assert!((0.0..=1.0).contains(&p));
        assert!((p + fitted.prob_negative("b_condition").unwrap() - 1.0).abs() < 1e-12);
        assert!(matches!(
            fitted.summary_of("b_politeness"),
            Err(PipelineError::UnknownCoefficient(_))
        ));
    }

    #[test]
    fn test_data_fingerprint_tracks_design() {
        let spec = ModelSpec::duration(Family::Normal, Prior::default());
        let base = tokens();
        let a = Design::build(&base, &spec).unwrap();
        let b = Design::build(&base, &spec).unwrap();
        assert_eq!(data_fingerprint(&a), data_fingerprint(&b));
        assert_eq!(data_fingerprint(&a).len(), 64);

        let mut shifted = base.clone();
        shifted[0].token.duration_ms += 0.5;
        let c = Design::build(&shifted, &spec).unwrap();
        assert_ne!(data_fingerprint(&a), data_fingerprint(&c));
    }
}
