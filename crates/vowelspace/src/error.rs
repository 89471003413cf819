//! Error types for the analysis pipeline.

use std::path::PathBuf;

use thiserror::Error;
use vowelspace_core::analysis::SamplerError;
use vowelspace_core::{DesignError, FeatureError, PosteriorError};

use crate::model::ConvergenceError;

/// Required columns absent from the input header.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing required columns [{}]; found [{}]", .missing.join(", "), .found.join(", "))]
pub struct SchemaError {
    /// Canonical names of the columns that could not be matched.
    pub missing: Vec<String>,
    /// Headers present in the file, as written.
    pub found: Vec<String>,
}

/// A filtering step removed every row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no rows left after {filter}")]
pub struct EmptyDatasetError {
    /// The step that emptied the dataset.
    pub filter: String,
}

impl EmptyDatasetError {
    /// Name the step that left zero rows.
    pub fn after(filter: impl Into<String>) -> Self {
        Self {
            filter: filter.into(),
        }
    }
}

/// Errors raised anywhere in the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input header lacks required columns.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A filter left no data.
    #[error(transparent)]
    EmptyDataset(#[from] EmptyDatasetError),

    /// Too little non-missing data for a computation.
    #[error("missing value: {0}")]
    MissingValue(String),

    /// A cell could not be parsed or is out of range.
    #[error("invalid value '{value}' in column '{column}' at line {line}")]
    InvalidValue {
        /// 1-based line in the input file.
        line: u64,
        /// Canonical column name.
        column: String,
        /// The offending cell.
        value: String,
    },

    /// A model failed its convergence checks.
    #[error(transparent)]
    Convergence(#[from] ConvergenceError),

    /// Filesystem error, with the path involved.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File or directory being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Malformed delimited input.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Snapshot or config (de)serialisation failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The model could not be laid out over the data.
    #[error("design error: {0}")]
    Design(#[from] DesignError),

    /// The sampler failed numerically.
    #[error("sampler error: {0}")]
    Sampler(#[from] SamplerError),

    /// A coefficient name that the model does not have.
    #[error("unknown coefficient '{0}'")]
    UnknownCoefficient(String),

    /// Invalid settings.
    #[error("configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    /// Wrap an I/O error with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for errors the pipeline records and continues past.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PipelineError::MissingValue(_) | PipelineError::Convergence(_)
        )
    }
}

impl From<FeatureError> for PipelineError {
    fn from(err: FeatureError) -> Self {
        match err {
            FeatureError::EmptyInput => EmptyDatasetError::after("feature derivation").into(),
            other => PipelineError::MissingValue(other.to_string()),
        }
    }
}

impl From<PosteriorError> for PipelineError {
    fn from(err: PosteriorError) -> Self {
        match err {
            PosteriorError::UnknownCoefficient(name) => PipelineError::UnknownCoefficient(name),
            other => PipelineError::MissingValue(other.to_string()),
        }
    }
}

/// Result alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_lists_columns() {
        let err = SchemaError {
            missing: vec!["f1".into(), "f2".into()],
            found: vec!["Speaker".into(), "Vowel".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("f1, f2"));
        assert!(msg.contains("Speaker, Vowel"));
    }

    #[test]
    fn test_core_errors_convert() {
        let e: PipelineError = FeatureError::EmptyInput.into();
        assert!(matches!(e, PipelineError::EmptyDataset(_)));

        let e: PipelineError = PosteriorError::UnknownCoefficient("b_x".into()).into();
        assert!(matches!(e, PipelineError::UnknownCoefficient(ref n) if n == "b_x"));
        assert!(!e.is_recoverable());

        assert!(PipelineError::MissingValue("t-test".into()).is_recoverable());
    }
}
