//! Descriptive statistics: grouped summaries, paired t-tests and vowel spaces.

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};
use tracing::{info, warn};
use vowelspace_core::aggregate::{
    complete_differences, group_summary, paired_condition_differences, GroupKey,
    PairedDifference, SummaryTable,
};
use vowelspace_core::hull::{vowel_means, vowel_spaces, VowelMean, VowelSpace};
use vowelspace_core::math;
use vowelspace_core::{DerivedToken, Measure};

use crate::error::{PipelineError, Result};

/// Measures summarised in the descriptive report.
pub const REPORTED_MEASURES: [Measure; 5] = [
    Measure::Duration,
    Measure::F1,
    Measure::F2,
    Measure::BothDist,
    Measure::EuclideanDist,
];

/// Measures tested for a polite − casual difference.
pub const TESTED_MEASURES: [Measure; 3] =
    [Measure::Duration, Measure::BothDist, Measure::EuclideanDist];

/// Result of a two-sided one-sample t-test against zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TTestResult {
    /// Differences used.
    pub n: usize,
    /// Differences excluded because they were missing.
    pub excluded: usize,
    /// Mean difference.
    pub mean: f64,
    /// Sample standard deviation of the differences.
    pub sd: f64,
    /// t statistic.
    pub t: f64,
    /// Degrees of freedom, `n - 1`.
    pub df: f64,
    /// Two-sided p-value.
    pub p_value: f64,
}

/// One-sample t-test of the non-missing differences against zero.
///
/// Missing differences are excluded, never treated as zero.
///
/// # Errors
/// `MissingValue` when fewer than two differences are present.
pub fn one_sample_t_test(differences: &[Option<f64>]) -> Result<TTestResult> {
    let values: Vec<f64> = differences.iter().flatten().copied().collect();
    let excluded = differences.len() - values.len();

    let (mean, sd) = match (math::mean(&values), math::sample_sd(&values)) {
        (Some(m), Some(s)) => (m, s),
        _ => {
            return Err(PipelineError::MissingValue(format!(
                "t-test needs at least 2 differences, {} present ({} missing)",
                values.len(),
                excluded
            )))
        }
    };

    let n = values.len();
    let df = (n - 1) as f64;

    // Identical differences: the statistic degenerates.
    if sd <= f64::EPSILON * mean.abs().max(1.0) {
        let (t, p_value) = if mean == 0.0 {
            (0.0, 1.0)
        } else {
            (f64::INFINITY.copysign(mean), 0.0)
        };
        return Ok(TTestResult {
            n,
            excluded,
            mean,
            sd,
            t,
            df,
            p_value,
        });
    }

    let t = mean / (sd / math::sqrt(n as f64));
    let dist = StudentsT::new(0.0, 1.0, df)
        .map_err(|e| PipelineError::MissingValue(format!("t distribution: {e}")))?;
    let p_value = (2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0);

    Ok(TTestResult {
        n,
        excluded,
        mean,
        sd,
        t,
        df,
        p_value,
    })
}

/// Per-speaker differences of one measure and their t-test.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairedComparison {
    /// Measure compared.
    pub measure: Measure,
    /// Per-speaker condition means and differences.
    pub differences: Vec<PairedDifference>,
    /// Test result, or the reason it could not be computed.
    pub test: std::result::Result<TTestResult, String>,
}

impl PairedComparison {
    /// Compare polite and casual speech on one measure.
    pub fn compute(tokens: &[DerivedToken], measure: Measure) -> Self {
        let differences = paired_condition_differences(tokens, measure);
        let column: Vec<Option<f64>> = differences.iter().map(|d| d.difference).collect();

        let missing: Vec<&str> = differences
            .iter()
            .filter(|d| d.difference.is_none())
            .map(|d| d.subject.as_str())
            .collect();
        if !missing.is_empty() {
            warn!(
                %measure,
                speakers = %missing.join(", "),
                "speakers without both conditions excluded from the paired test"
            );
        }

        let test = one_sample_t_test(&column).map_err(|e| {
            warn!(%measure, error = %e, "paired test skipped");
            e.to_string()
        });

        Self {
            measure,
            differences,
            test,
        }
    }

    /// The differences that entered the test.
    pub fn usable(&self) -> Vec<f64> {
        complete_differences(&self.differences)
    }
}

/// Everything the descriptive stage produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptiveReport {
    /// Tokens summarised.
    pub n_tokens: usize,
    /// Distinct speakers.
    pub n_speakers: usize,
    /// Summaries by condition and by condition × gender for each measure.
    pub summaries: Vec<SummaryTable>,
    /// Polite − casual comparisons.
    pub comparisons: Vec<PairedComparison>,
    /// Per-vowel mean formants per condition × gender.
    pub vowel_means: Vec<VowelMean>,
    /// Vowel-space hulls and areas per condition × gender.
    pub vowel_spaces: Vec<VowelSpace>,
}

impl DescriptiveReport {
    /// Build the descriptive report over the derived token table.
    pub fn compute(tokens: &[DerivedToken]) -> Self {
        let groupings: [&[GroupKey]; 2] = [
            &[GroupKey::Condition],
            &[GroupKey::Condition, GroupKey::Gender],
        ];
        let summaries = REPORTED_MEASURES
            .iter()
            .flat_map(|&m| groupings.iter().map(move |keys| group_summary(tokens, keys, m)))
            .collect();

        let comparisons = TESTED_MEASURES
            .iter()
            .map(|&m| PairedComparison::compute(tokens, m))
            .collect();

        let means = vowel_means(tokens);
        let spaces = vowel_spaces(&means);

        let speakers = group_summary(tokens, &[GroupKey::Subject], Measure::Duration);

        info!(
            tokens = tokens.len(),
            speakers = speakers.rows.len(),
            "descriptive statistics computed"
        );

        Self {
            n_tokens: tokens.len(),
            n_speakers: speakers.rows.len(),
            summaries,
            comparisons,
            vowel_means: means,
            vowel_spaces: spaces,
        }
    }

    /// Comparison for one measure.
    pub fn comparison(&self, measure: Measure) -> Option<&PairedComparison> {
        self.comparisons.iter().find(|c| c.measure == measure)
    }

    /// Summary table for one measure and grouping.
    pub fn summary(&self, measure: Measure, keys: &[GroupKey]) -> Option<&SummaryTable> {
        self.summaries
            .iter()
            .find(|s| s.measure == measure && s.keys == keys)
    }
}
