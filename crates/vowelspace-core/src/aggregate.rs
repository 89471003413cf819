//! Grouped descriptive statistics over derived tokens.

extern crate alloc;

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use crate::math;
use crate::types::{Condition, DerivedToken, Measure};

/// Column a token table can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKey {
    /// Speaker.
    Subject,
    /// Speech register.
    Condition,
    /// Speaker gender.
    Gender,
    /// Vowel category.
    Vowel,
}

impl GroupKey {
    /// Column name.
    pub fn name(&self) -> &'static str {
        match self {
            GroupKey::Subject => "subject",
            GroupKey::Condition => "condition",
            GroupKey::Gender => "gender",
            GroupKey::Vowel => "vowel",
        }
    }

    fn label(&self, token: &DerivedToken) -> String {
        match self {
            GroupKey::Subject => token.token.subject.clone(),
            GroupKey::Condition => token.token.condition.to_string(),
            GroupKey::Gender => token.token.gender.to_string(),
            GroupKey::Vowel => token.token.vowel.clone(),
        }
    }
}

/// Mean and spread of one measure within one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    /// Labels of the group, in the order of the requested keys.
    pub labels: Vec<String>,
    /// Number of tokens in the group.
    pub n: usize,
    /// Arithmetic mean.
    pub mean: f64,
    /// Sample standard deviation; `None` for singleton groups.
    pub sd: Option<f64>,
}

/// Summary table for one measure under one grouping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryTable {
    /// Grouping columns.
    pub keys: Vec<GroupKey>,
    /// Summarised measure.
    pub measure: Measure,
    /// One row per group present in the data, sorted by labels.
    pub rows: Vec<GroupSummary>,
}

impl SummaryTable {
    /// Find the row with exactly these labels.
    pub fn get(&self, labels: &[&str]) -> Option<&GroupSummary> {
        self.rows
            .iter()
            .find(|r| r.labels.iter().map(String::as_str).eq(labels.iter().copied()))
    }
}

/// Mean and standard deviation of `measure` for every key combination present.
///
/// An empty key list yields a single grand-total row.
pub fn group_summary(tokens: &[DerivedToken], keys: &[GroupKey], measure: Measure) -> SummaryTable {
    let mut groups: BTreeMap<Vec<String>, Vec<f64>> = BTreeMap::new();
    for t in tokens {
        let labels: Vec<String> = keys.iter().map(|k| k.label(t)).collect();
        groups.entry(labels).or_default().push(measure.value(t));
    }

    let rows = groups
        .into_iter()
        .filter_map(|(labels, values)| {
            Some(GroupSummary {
                labels,
                n: values.len(),
                mean: math::mean(&values)?,
                sd: math::sample_sd(&values),
            })
        })
        .collect();

    SummaryTable {
        keys: keys.to_vec(),
        measure,
        rows,
    }
}

/// One speaker's condition means and their polite − casual difference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairedDifference {
    /// Speaker.
    pub subject: String,
    /// Speaker mean in casual speech, if the speaker has casual tokens.
    pub casual: Option<f64>,
    /// Speaker mean in polite speech, if the speaker has polite tokens.
    pub polite: Option<f64>,
    /// `polite - casual`; missing unless both condition means exist.
    pub difference: Option<f64>,
}

/// Per-speaker polite − casual difference of condition means.
///
/// Speakers without tokens in one condition get `difference: None`. Callers
/// must exclude those rows rather than treat them as zero.
pub fn paired_condition_differences(
    tokens: &[DerivedToken],
    measure: Measure,
) -> Vec<PairedDifference> {
    let mut cells: BTreeMap<&str, [Vec<f64>; 2]> = BTreeMap::new();
    for t in tokens {
        let slot = match t.token.condition {
            Condition::Casual => 0,
            Condition::Polite => 1,
        };
        cells.entry(t.token.subject.as_str()).or_default()[slot].push(measure.value(t));
    }

    cells
        .into_iter()
        .map(|(subject, [casual, polite])| {
            let casual = math::mean(&casual);
            let polite = math::mean(&polite);
            PairedDifference {
                subject: subject.to_string(),
                casual,
                polite,
                difference: casual.zip(polite).map(|(c, p)| p - c),
            }
        })
        .collect()
}

/// The usable (non-missing) differences, in speaker order.
pub fn complete_differences(pairs: &[PairedDifference]) -> Vec<f64> {
    pairs.iter().filter_map(|p| p.difference).collect()
}
