//! Core statistics for vowel-space dispersion analysis.
//!
//! This crate holds the numerical side of the analysis and works in `no_std`
//! environments with only an allocator:
//!
//! - feature derivation (speaker centroids, distances from them)
//! - grouped descriptive summaries and paired condition differences
//! - vowel-space polygons
//! - sum-coded design matrices and a Gibbs sampler for linear mixed models
//! - posterior summaries and convergence diagnostics
//!
//! # Features
//!
//! - `std` (default): implement `std::error::Error` for the error types
//!
//! Data loading, model persistence and reporting live in the `vowelspace`
//! crate.
//!
//! ```ignore
//! use vowelspace_core::{
//!     analysis::run_gibbs_chain,
//!     features::{derive_features, DispersionReference},
//!     model::{Design, Family, ModelSpec, Prior},
//! };
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod aggregate;
pub mod analysis;
pub mod coding;
pub mod constants;
pub mod features;
pub mod hull;
pub mod math;
pub mod model;
pub mod statistics;
pub mod types;

// Re-export commonly used items at crate root
pub use analysis::{CoefficientSummary, PosteriorDraws, PosteriorError};
pub use features::{derive_features, DispersionReference, FeatureError};
pub use model::{DesignError, Family, McmcControl, ModelSpec, Prior};
pub use types::{Condition, DerivedToken, Gender, Measure, Token, VowelType};
