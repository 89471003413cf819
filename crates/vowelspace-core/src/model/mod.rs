//! Regression specifications and their design matrices.

pub mod design;
pub mod spec;

pub use design::{Design, DesignError, RandomBlock};
pub use spec::{Family, FixedTerm, McmcControl, ModelSpec, Prior, RandomTerm};
