//! Statistical primitives.
//!
//! - Type 2 quantiles for credible intervals
//! - ESS and split R-hat for MCMC convergence checks

mod mcmc;
mod quantile;

pub use mcmc::{combined_ess, compute_ess, split_rhat};
pub use quantile::{compute_quantile, compute_quantiles};
