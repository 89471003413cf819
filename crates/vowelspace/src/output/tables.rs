//! Plot-ready CSV tables.
//!
//! One tidy table per figure: derived tokens, vowel means, hull vertices,
//! per-speaker paired differences, grouped summaries and model coefficients.
//! Missing values are written as empty cells.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;
use vowelspace_core::aggregate::SummaryTable;
use vowelspace_core::hull::{VowelMean, VowelSpace};
use vowelspace_core::{Condition, DerivedToken, Measure};

use crate::descriptive::PairedComparison;
use crate::error::{PipelineError, Result};
use crate::report::ModelReport;

/// Derived tokens, one row per token.
pub const TOKENS_TABLE: &str = "tokens.csv";
/// Vowel means per condition × gender.
pub const VOWEL_MEANS_TABLE: &str = "vowel_means.csv";
/// Hull vertices per condition × gender.
pub const HULLS_TABLE: &str = "vowel_hulls.csv";
/// Per-speaker polite − casual differences.
pub const DIFFERENCES_TABLE: &str = "paired_differences.csv";
/// Grouped summaries.
pub const SUMMARIES_TABLE: &str = "summaries.csv";
/// Posterior coefficient summaries.
pub const COEFFICIENTS_TABLE: &str = "coefficients.csv";

#[derive(Serialize)]
struct TokenRow<'a> {
    subject: &'a str,
    item_id: &'a str,
    vowel: &'a str,
    vowel_type: String,
    condition: Condition,
    gender: &'static str,
    duration: f64,
    f1: f64,
    f2: f64,
    condition_coded: f64,
    gender_coded: f64,
    f1_midpoint: f64,
    f2_midpoint: f64,
    f1_dist: f64,
    f2_dist: f64,
    both_dist: f64,
    euclidean_dist: f64,
}

#[derive(Serialize)]
struct VowelMeanRow<'a> {
    condition: Condition,
    gender: &'static str,
    vowel: &'a str,
    n: usize,
    f1: f64,
    f2: f64,
}

#[derive(Serialize)]
struct HullRow {
    condition: Condition,
    gender: &'static str,
    vertex: usize,
    f2: f64,
    f1: f64,
    area: f64,
}

#[derive(Serialize)]
struct DifferenceRow<'a> {
    measure: Measure,
    subject: &'a str,
    casual: Option<f64>,
    polite: Option<f64>,
    difference: Option<f64>,
}

#[derive(Serialize)]
struct SummaryRow {
    measure: Measure,
    grouping: String,
    group: String,
    n: usize,
    mean: f64,
    sd: Option<f64>,
}

#[derive(Serialize)]
struct CoefficientRow<'a> {
    model: &'a str,
    parameter: &'a str,
    mean: f64,
    sd: f64,
    lower: f64,
    upper: f64,
    rhat: f64,
    ess: f64,
    prob_positive: f64,
}

fn write_rows<T: Serialize>(path: &Path, rows: impl IntoIterator<Item = T>) -> Result<()> {
    let file = File::create(path).map_err(|e| PipelineError::io(path, e))?;
    let mut wtr = csv::Writer::from_writer(file);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush().map_err(|e| PipelineError::io(path, e))?;
    debug!(path = %path.display(), "wrote table");
    Ok(())
}

/// Derived token table, one row per token.
pub fn write_token_table(path: &Path, tokens: &[DerivedToken]) -> Result<()> {
    write_rows(
        path,
        tokens.iter().map(|t| TokenRow {
            subject: &t.token.subject,
            item_id: &t.token.item_id,
            vowel: &t.token.vowel,
            vowel_type: t.token.vowel_type.to_string(),
            condition: t.token.condition,
            gender: t.token.gender.as_str(),
            duration: t.token.duration_ms,
            f1: t.token.f1_hz,
            f2: t.token.f2_hz,
            condition_coded: t.condition_coded,
            gender_coded: t.gender_coded,
            f1_midpoint: t.f1_midpoint,
            f2_midpoint: t.f2_midpoint,
            f1_dist: t.f1_dist,
            f2_dist: t.f2_dist,
            both_dist: t.both_dist,
            euclidean_dist: t.euclidean_dist,
        }),
    )
}

/// Vowel means per condition × gender.
pub fn write_vowel_means(path: &Path, means: &[VowelMean]) -> Result<()> {
    write_rows(
        path,
        means.iter().map(|m| VowelMeanRow {
            condition: m.condition,
            gender: m.gender.as_str(),
            vowel: &m.vowel,
            n: m.n,
            f1: m.point.f1,
            f2: m.point.f2,
        }),
    )
}

/// Hull vertices in drawing order, with the cell's area on every row.
pub fn write_hulls(path: &Path, spaces: &[VowelSpace]) -> Result<()> {
    write_rows(
        path,
        spaces.iter().flat_map(|s| {
            s.hull.iter().enumerate().map(move |(i, p)| HullRow {
                condition: s.condition,
                gender: s.gender.as_str(),
                vertex: i + 1,
                f2: p.f2,
                f1: p.f1,
                area: s.area,
            })
        }),
    )
}

/// Per-speaker paired differences for every compared measure.
pub fn write_paired_differences(path: &Path, comparisons: &[PairedComparison]) -> Result<()> {
    write_rows(
        path,
        comparisons.iter().flat_map(|c| {
            c.differences.iter().map(move |d| DifferenceRow {
                measure: c.measure,
                subject: &d.subject,
                casual: d.casual,
                polite: d.polite,
                difference: d.difference,
            })
        }),
    )
}

/// Grouped summaries, long format.
pub fn write_summaries(path: &Path, tables: &[SummaryTable]) -> Result<()> {
    write_rows(
        path,
        tables.iter().flat_map(|t| {
            let grouping = t
                .keys
                .iter()
                .map(|k| k.name())
                .collect::<Vec<_>>()
                .join(":");
            t.rows.iter().map(move |r| SummaryRow {
                measure: t.measure,
                grouping: grouping.clone(),
                group: r.labels.join(":"),
                n: r.n,
                mean: r.mean,
                sd: r.sd,
            })
        }),
    )
}

/// Posterior coefficient summaries of every fitted model.
pub fn write_coefficients(path: &Path, models: &[ModelReport]) -> Result<()> {
    write_rows(
        path,
        models.iter().flat_map(|m| {
            m.coefficients.iter().map(move |c| CoefficientRow {
                model: &m.name,
                parameter: &c.name,
                mean: c.mean,
                sd: c.sd,
                lower: c.lower,
                upper: c.upper,
                rhat: c.rhat,
                ess: c.ess,
                prob_positive: c.prob_positive,
            })
        }),
    )
}

/// Inputs for [`write_all`].
pub struct Tables<'a> {
    /// Derived tokens.
    pub tokens: &'a [DerivedToken],
    /// Vowel means.
    pub vowel_means: &'a [VowelMean],
    /// Vowel spaces.
    pub vowel_spaces: &'a [VowelSpace],
    /// Paired comparisons.
    pub comparisons: &'a [PairedComparison],
    /// Grouped summaries.
    pub summaries: &'a [SummaryTable],
    /// Fitted models; the coefficient table is skipped when empty.
    pub models: &'a [ModelReport],
}

/// Write every table into `dir`, creating it if needed.
pub fn write_all(dir: &Path, tables: &Tables<'_>) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).map_err(|e| PipelineError::io(dir, e))?;
    let mut written = Vec::new();
    let mut out = |name: &str| {
        let p = dir.join(name);
        written.push(p.clone());
        p
    };

    write_token_table(&out(TOKENS_TABLE), tables.tokens)?;
    write_vowel_means(&out(VOWEL_MEANS_TABLE), tables.vowel_means)?;
    write_hulls(&out(HULLS_TABLE), tables.vowel_spaces)?;
    write_paired_differences(&out(DIFFERENCES_TABLE), tables.comparisons)?;
    write_summaries(&out(SUMMARIES_TABLE), tables.summaries)?;
    if !tables.models.is_empty() {
        write_coefficients(&out(COEFFICIENTS_TABLE), tables.models)?;
    }
    Ok(written)
}
