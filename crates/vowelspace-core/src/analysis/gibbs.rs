//! Blocked Gibbs sampler for Gaussian linear mixed models.
//!
//! Model, with `W = [X | Z]` and θ = (β, u):
//!
//! ```text
//! y | θ, σ²        ~ N(Wθ, σ² I)
//! β_0              ~ N(m_0, s_0²)            (intercept)
//! β_j              ~ N(μ_b, s_b²)            (j ≥ 1)
//! u_k | τ_k²       ~ N(0, τ_k² I)            (one block per group-level term)
//! σ², τ_k²         ~ InvGamma(a, b)
//! ```
//!
//! Each iteration alternates between:
//! 1. θ | σ², τ², y ~ N(Q⁻¹r, Q⁻¹) with Q = WᵀW/σ² + D, r = Wᵀy/σ² + Dμ
//! 2. σ² | θ, y ~ InvGamma(a + n/2, b + ‖y − Wθ‖²/2)
//! 3. τ_k² | u_k ~ InvGamma(a + q_k/2, b + ‖u_k‖²/2)
//!
//! All location parameters move jointly in step 1, so fixed effects and
//! group-level offsets do not trade off against each other across iterations.
//! The sufficient statistics WᵀW, Wᵀy and yᵀy are computed once per chain.

extern crate alloc;

use alloc::vec::Vec;
use core::fmt;

use nalgebra::Cholesky;
use rand::prelude::*;
use rand::SeedableRng;
use rand_distr::{Gamma, StandardNormal};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::constants::{
    INTERCEPT_PRIOR_SD_MULTIPLIER, VARIANCE_PRIOR_SCALE_FRACTION, VARIANCE_PRIOR_SHAPE,
};
use crate::math;
use crate::model::design::Design;
use crate::model::spec::Prior;
use crate::types::{Matrix, Vector};

/// Minimum variance value to prevent numerical issues.
const VARIANCE_MIN: f64 = 1e-12;

/// Maximum variance value to prevent numerical issues.
const VARIANCE_MAX: f64 = 1e12;

/// Diagonal jitter ladder tried when Q is not numerically SPD.
const JITTER_LADDER: [f64; 4] = [1e-10, 1e-8, 1e-6, 1e-4];

/// Errors raised while sampling.
#[derive(Debug, Clone, PartialEq)]
pub enum SamplerError {
    /// The conditional precision matrix could not be factorised.
    NotPositiveDefinite {
        /// Iteration at which factorisation failed.
        iteration: usize,
    },
    /// A conditional distribution received invalid parameters.
    InvalidParameter {
        /// Which parameter was being sampled.
        parameter: &'static str,
        /// Offending value.
        value: f64,
    },
    /// Warmup is not smaller than the iteration count.
    NoRetainedDraws,
}

impl fmt::Display for SamplerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SamplerError::NotPositiveDefinite { iteration } => write!(
                f,
                "conditional precision matrix not positive definite at iteration {}",
                iteration
            ),
            SamplerError::InvalidParameter { parameter, value } => {
                write!(f, "invalid value {} while sampling {}", value, parameter)
            }
            SamplerError::NoRetainedDraws => {
                write!(f, "warmup consumes every iteration, no draws retained")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SamplerError {}

/// Hyperparameters of the mixed model, resolved against the data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixedModelPriors {
    /// Prior mean of the intercept.
    pub intercept_mean: f64,
    /// Prior standard deviation of the intercept.
    pub intercept_sd: f64,
    /// Prior on the remaining fixed effects.
    pub coefficients: Prior,
    /// Inverse-gamma shape for all variances.
    pub variance_shape: f64,
    /// Inverse-gamma scale for all variances.
    pub variance_scale: f64,
}

impl MixedModelPriors {
    /// Weakly-informative priors scaled to the outcome.
    ///
    /// The intercept is centred on mean(y) with sd `10 · sd(y)`; variances get
    /// `InvGamma(1, 0.05 · var(y))`.
    pub fn from_design(design: &Design, coefficients: Prior) -> Self {
        let y = design.y.as_slice();
        let mean = math::mean(y).unwrap_or(0.0);
        let var = math::sample_variance(y)
            .filter(|v| *v > VARIANCE_MIN)
            .unwrap_or(1.0);

        Self {
            intercept_mean: mean,
            intercept_sd: INTERCEPT_PRIOR_SD_MULTIPLIER * math::sqrt(var),
            coefficients,
            variance_shape: VARIANCE_PRIOR_SHAPE,
            variance_scale: VARIANCE_PRIOR_SCALE_FRACTION * var,
        }
    }
}

/// Retained draws of one chain: one row per draw, columns in
/// [`Design::parameter_names`] order.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainDraws {
    /// Draw rows.
    pub draws: Vec<Vec<f64>>,
}

/// Gibbs sampler for one chain.
pub struct GibbsSampler<'a> {
    design: &'a Design,
    priors: MixedModelPriors,
    /// WᵀW.
    wtw: Matrix,
    /// Wᵀy.
    wty: Vector,
    /// yᵀy.
    yty: f64,
    /// Column offset of each random block inside W.
    offsets: Vec<usize>,
    /// Deterministic RNG.
    rng: Xoshiro256PlusPlus,
}

impl<'a> GibbsSampler<'a> {
    /// Create a sampler with precomputed sufficient statistics.
    ///
    /// # Arguments
    /// * `design` - Outcome and design matrices
    /// * `priors` - Resolved hyperparameters
    /// * `seed` - Deterministic RNG seed
    pub fn new(design: &'a Design, priors: MixedModelPriors, seed: u64) -> Self {
        let w = design.combined_matrix();
        let wtw = w.tr_mul(&w);
        let wty = w.tr_mul(&design.y);
        let yty = design.y.dot(&design.y);

        let mut offsets = Vec::with_capacity(design.blocks.len());
        let mut offset = design.n_fixed();
        for block in &design.blocks {
            offsets.push(offset);
            offset += block.len();
        }

        Self {
            design,
            priors,
            wtw,
            wty,
            yty,
            offsets,
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }

    /// Run `iterations` sweeps and keep those after `warmup`.
    pub fn run(&mut self, warmup: usize, iterations: usize) -> Result<ChainDraws, SamplerError> {
        if warmup >= iterations {
            return Err(SamplerError::NoRetainedDraws);
        }

        let design = self.design;
        let n = design.n_obs() as f64;
        let p = design.n_fixed();
        let q = self.wtw.nrows();
        let base_var = self.priors.variance_scale / VARIANCE_PRIOR_SCALE_FRACTION;

        // Over-dispersed starting values so chains start apart.
        let mut sigma2 = base_var * self.rng.random_range(0.5..2.0);
        let mut tau2: Vec<f64> = (0..design.blocks.len())
            .map(|_| 0.1 * base_var * self.rng.random_range(0.5..2.0))
            .collect();

        let mut draws = Vec::with_capacity(iterations - warmup);

        for t in 0..iterations {
            // Step 1: θ | σ², τ², y
            let theta = self.sample_location(sigma2, &tau2, q, p, t)?;

            // Step 2: σ² | θ, y
            let rss = self.residual_sum_of_squares(&theta);
            sigma2 = self.sample_inverse_gamma(
                "sigma",
                self.priors.variance_shape + n / 2.0,
                self.priors.variance_scale + rss / 2.0,
            )?;

            // Step 3: τ_k² | u_k
            for (k, block) in design.blocks.iter().enumerate() {
                let start = self.offsets[k];
                let u = theta.rows(start, block.len());
                let ss = u.dot(&u);
                tau2[k] = self.sample_inverse_gamma(
                    block.term.sd_name(),
                    self.priors.variance_shape + block.len() as f64 / 2.0,
                    self.priors.variance_scale + ss / 2.0,
                )?;
            }

            if t >= warmup {
                let mut row = Vec::with_capacity(p + tau2.len() + 1);
                row.extend(theta.rows(0, p).iter().copied());
                row.extend(tau2.iter().map(|&v| math::sqrt(v)));
                row.push(math::sqrt(sigma2));
                draws.push(row);
            }
        }

        Ok(ChainDraws { draws })
    }

    /// Draw all location parameters jointly from their Gaussian conditional.
    fn sample_location(
        &mut self,
        sigma2: f64,
        tau2: &[f64],
        q: usize,
        p: usize,
        iteration: usize,
    ) -> Result<Vector, SamplerError> {
        let (prior_precision, prior_shift) = self.prior_terms(tau2, q, p);

        let mut precision = &self.wtw / sigma2;
        for i in 0..q {
            precision[(i, i)] += prior_precision[i];
        }
        let rhs = &self.wty / sigma2 + prior_shift;

        let chol = Self::factorise(precision)
            .ok_or(SamplerError::NotPositiveDefinite { iteration })?;

        let mean = chol.solve(&rhs);

        // θ = μ + L⁻ᵀ z with Q = L Lᵀ, so Cov(θ) = Q⁻¹.
        let z = self.sample_standard_normal_vector(q);
        let offset = chol
            .l()
            .tr_solve_lower_triangular(&z)
            .ok_or(SamplerError::NotPositiveDefinite { iteration })?;

        Ok(mean + offset)
    }

    /// Diagonal prior precision D and prior shift Dμ.
    fn prior_terms(&self, tau2: &[f64], q: usize, p: usize) -> (Vector, Vector) {
        let mut precision = Vector::zeros(q);
        let mut shift = Vector::zeros(q);

        let int_prec = 1.0 / math::sq(self.priors.intercept_sd);
        precision[0] = int_prec;
        shift[0] = self.priors.intercept_mean * int_prec;

        let b_prec = 1.0 / math::sq(self.priors.coefficients.scale);
        for j in 1..p {
            precision[j] = b_prec;
            shift[j] = self.priors.coefficients.location * b_prec;
        }

        for (k, block) in self.design.blocks.iter().enumerate() {
            let start = self.offsets[k];
            for j in start..start + block.len() {
                precision[j] = 1.0 / tau2[k];
            }
        }

        (precision, shift)
    }

    /// ‖y − Wθ‖² from the sufficient statistics.
    fn residual_sum_of_squares(&self, theta: &Vector) -> f64 {
        let quad = theta.dot(&(&self.wtw * theta));
        (self.yty - 2.0 * theta.dot(&self.wty) + quad).max(0.0)
    }

    /// Cholesky with a jitter fallback for near-singular Q.
    fn factorise(precision: Matrix) -> Option<Cholesky<f64, nalgebra::Dyn>> {
        if let Some(c) = Cholesky::new(precision.clone()) {
            return Some(c);
        }
        let n = precision.nrows();
        JITTER_LADDER.iter().find_map(|&eps| {
            let jittered = &precision + Matrix::identity(n, n) * eps;
            Cholesky::new(jittered)
        })
    }

    /// Sample σ² ~ InvGamma(shape, scale) as the reciprocal of a Gamma precision.
    fn sample_inverse_gamma(
        &mut self,
        parameter: &'static str,
        shape: f64,
        scale: f64,
    ) -> Result<f64, SamplerError> {
        // rand_distr uses shape-scale, so the precision's scale is 1/rate
        let gamma = Gamma::new(shape, 1.0 / scale).map_err(|_| SamplerError::InvalidParameter {
            parameter,
            value: scale,
        })?;
        let precision: f64 = gamma.sample(&mut self.rng);

        // Clamp to prevent numerical issues
        Ok((1.0 / precision).clamp(VARIANCE_MIN, VARIANCE_MAX))
    }

    /// Sample a standard normal vector.
    fn sample_standard_normal_vector(&mut self, len: usize) -> Vector {
        Vector::from_fn(len, |_, _| self.rng.sample(StandardNormal))
    }
}

/// Run one chain of the mixed-model sampler.
///
/// # Arguments
/// * `design` - Outcome and design matrices
/// * `prior` - Prior on non-intercept fixed effects
/// * `warmup` - Iterations to discard
/// * `iterations` - Total iterations
/// * `seed` - Deterministic RNG seed
pub fn run_gibbs_chain(
    design: &Design,
    prior: Prior,
    warmup: usize,
    iterations: usize,
    seed: u64,
) -> Result<ChainDraws, SamplerError> {
    let priors = MixedModelPriors::from_design(design, prior);
    let mut sampler = GibbsSampler::new(design, priors, seed);
    sampler.run(warmup, iterations)
}
