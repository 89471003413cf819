//! Quantile computation using Type 2 quantiles (inverse empirical CDF with averaging).
//!
//! **Type 2 formula** (for sorted sample x of size n at probability p):
//! ```text
//! h = n * p + 0.5
//! q = (x[floor(h)] + x[ceil(h)]) / 2
//! ```
//!
//! Used for posterior credible intervals.
//!
//! # Input Requirements
//!
//! All input data must be finite (no NaN or infinity values). In debug builds,
//! this is checked via assertions.
//!
//! # Reference
//!
//! Hyndman, R. J. & Fan, Y. (1996). "Sample quantiles in statistical packages."
//! The American Statistician 50(4):361–365.

extern crate alloc;

use alloc::vec::Vec;

use crate::math;

/// Debug assertion that all values in the slice are finite.
#[inline]
fn debug_assert_finite(data: &[f64]) {
    debug_assert!(
        data.iter().all(|x| x.is_finite()),
        "quantile input must be finite (no NaN or infinity)"
    );
}

/// Type 2 (floor, ceil) indices for probability `p`, 0-based and clamped.
#[inline]
fn type2_indices(n: usize, p: f64) -> (usize, usize) {
    let h = n as f64 * p + 0.5;
    let floor_idx = (math::floor(h) as usize).saturating_sub(1).min(n - 1);
    let ceil_idx = (math::ceil(h) as usize).saturating_sub(1).min(n - 1);
    (floor_idx, ceil_idx)
}

/// Compute a single quantile from a mutable slice using Type 2 quantiles.
///
/// Uses `select_nth_unstable()` for O(n) expected time complexity.
/// The slice is partially reordered as a side effect.
///
/// # Panics
///
/// Panics if `data` is empty or if `p` is outside [0, 1].
pub fn compute_quantile(data: &mut [f64], p: f64) -> f64 {
    assert!(!data.is_empty(), "Cannot compute quantile of empty slice");
    assert!(
        (0.0..=1.0).contains(&p),
        "Quantile probability must be in [0, 1]"
    );
    debug_assert_finite(data);

    let n = data.len();
    if n == 1 {
        return data[0];
    }

    let (floor_idx, ceil_idx) = type2_indices(n, p);
    let cmp = |a: &f64, b: &f64| a.total_cmp(b);

    if floor_idx == ceil_idx {
        let (_, value, _) = data.select_nth_unstable_by(floor_idx, cmp);
        *value
    } else {
        // After selecting floor_idx, everything to the right is >= it, so the
        // ceil element is the minimum of the right partition.
        let (_, floor_val, right) = data.select_nth_unstable_by(floor_idx, cmp);
        let floor_val = *floor_val;
        let ceil_val = right
            .iter()
            .copied()
            .min_by(|a, b| a.total_cmp(b))
            .unwrap_or(floor_val);
        (floor_val + ceil_val) / 2.0
    }
}

/// Compute several quantiles from a sorted copy of the data.
///
/// Returns an empty vector for empty input.
pub fn compute_quantiles(data: &[f64], probs: &[f64]) -> Vec<f64> {
    if data.is_empty() {
        return Vec::new();
    }
    debug_assert_finite(data);

    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();

    probs
        .iter()
        .map(|&p| {
            assert!(
                (0.0..=1.0).contains(&p),
                "Quantile probability must be in [0, 1]"
            );
            let (lo, hi) = type2_indices(n, p);
            (sorted[lo] + sorted[hi]) / 2.0
        })
        .collect()
}
