//! Convergence diagnostics for MCMC chains.
//!
//! - Effective sample size from the initial positive autocorrelation sum.
//! - Split R-hat (Gelman et al. 2013): each chain is halved and the
//!   between/within variance ratio computed over the 2m half-chains.

extern crate alloc;

use alloc::vec::Vec;

use crate::math;

/// Compute effective sample size of a chain accounting for autocorrelation.
///
/// ESS = N / (1 + 2 * Σ_k ρ_k)
/// where ρ_k is the lag-k autocorrelation, summed until it drops below 0.05.
pub fn compute_ess(chain: &[f64]) -> f64 {
    let n = chain.len();
    if n < 2 {
        return n as f64;
    }

    let mean: f64 = chain.iter().sum::<f64>() / n as f64;
    let var: f64 = chain.iter().map(|&x| math::sq(x - mean)).sum::<f64>() / n as f64;

    if var < 1e-12 {
        return n as f64; // No variance, treat as independent
    }

    let mut sum_rho = 0.0;
    for k in 1..=(n / 2).min(1000) {
        let rho_k = autocorrelation(chain, k, mean, var);
        if rho_k < 0.05 {
            break;
        }
        sum_rho += rho_k;
    }

    n as f64 / (1.0 + 2.0 * sum_rho)
}

/// Compute lag-k autocorrelation.
fn autocorrelation(chain: &[f64], k: usize, mean: f64, var: f64) -> f64 {
    let n = chain.len();
    if k >= n {
        return 0.0;
    }

    let cov: f64 = (0..(n - k))
        .map(|i| (chain[i] - mean) * (chain[i + k] - mean))
        .sum::<f64>()
        / (n - k) as f64;

    cov / var
}

/// Bulk ESS of one parameter across chains: the sum of per-chain ESS.
pub fn combined_ess(chains: &[&[f64]]) -> f64 {
    chains.iter().map(|c| compute_ess(c)).sum()
}

/// Split R-hat of one parameter across chains.
///
/// Returns 1.0 when the statistic is undefined (fewer than four draws per
/// chain, or no variance anywhere), and infinity when the half-chains are
/// individually constant but disagree with each other.
pub fn split_rhat(chains: &[&[f64]]) -> f64 {
    let half = chains.iter().map(|c| c.len() / 2).min().unwrap_or(0);
    if half < 2 {
        return 1.0;
    }

    let mut halves: Vec<&[f64]> = Vec::with_capacity(chains.len() * 2);
    for c in chains {
        halves.push(&c[..half]);
        halves.push(&c[c.len() - half..]);
    }

    let m = halves.len() as f64;
    let n = half as f64;

    let means: Vec<f64> = halves.iter().map(|h| h.iter().sum::<f64>() / n).collect();
    let grand = means.iter().sum::<f64>() / m;

    let b = n / (m - 1.0) * means.iter().map(|&mu| math::sq(mu - grand)).sum::<f64>();
    let w = halves
        .iter()
        .zip(&means)
        .map(|(h, &mu)| h.iter().map(|&x| math::sq(x - mu)).sum::<f64>() / (n - 1.0))
        .sum::<f64>()
        / m;

    if w < 1e-300 {
        return if b < 1e-300 { 1.0 } else { f64::INFINITY };
    }

    let var_plus = (n - 1.0) / n * w + b / n;
    math::sqrt(var_plus / w)
}
