//! Constants and defaults used throughout the crate.

/// Default deterministic seed for RNG operations.
///
/// Same seed + same data = same posterior draws.
pub const DEFAULT_SEED: u64 = 2024;

/// Default number of Markov chains.
pub const DEFAULT_CHAINS: usize = 4;

/// Default total iterations per chain, warmup included.
pub const DEFAULT_ITERATIONS: usize = 4000;

/// Default warmup (burn-in) iterations per chain.
pub const DEFAULT_WARMUP: usize = 2000;

/// Default target acceptance rate handed to the sampler.
///
/// Raised above the usual 0.8 library default.
pub const DEFAULT_ADAPT_DELTA: f64 = 0.99;

/// Ceiling for `adapt_delta` when control settings are relaxed.
pub const MAX_ADAPT_DELTA: f64 = 0.999;

/// Default scale of the normal(0, scale) prior on fixed-effect coefficients.
pub const DEFAULT_PRIOR_SCALE: f64 = 100.0;

/// Intercept prior scale as a multiple of the outcome standard deviation.
pub const INTERCEPT_PRIOR_SD_MULTIPLIER: f64 = 10.0;

/// Shape of the inverse-gamma prior on every variance parameter.
pub const VARIANCE_PRIOR_SHAPE: f64 = 1.0;

/// Scale of the inverse-gamma variance prior, as a fraction of var(y).
pub const VARIANCE_PRIOR_SCALE_FRACTION: f64 = 0.05;

/// Split R-hat above this value flags non-convergence.
pub const RHAT_THRESHOLD: f64 = 1.05;

/// Minimum bulk ESS per chain before a parameter counts as well sampled.
pub const MIN_ESS_PER_CHAIN: f64 = 100.0;

/// Lower and upper posterior interval probabilities (95% interval).
pub const INTERVAL_PROBS: (f64, f64) = (0.025, 0.975);
