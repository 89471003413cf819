//! Cleaning: monophthong filter and synthetic item ids.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::info;
use vowelspace_core::{Token, VowelType};

use super::csv::RawData;
use crate::error::{EmptyDatasetError, Result};

/// Mapping between raw item labels and the ids `Item1`, `Item2`, ...
///
/// Ids follow the lexicographic order of the distinct labels, so the same
/// label set always produces the same ids.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ItemIndex {
    labels: Vec<String>,
    #[serde(skip)]
    lookup: BTreeMap<String, usize>,
}

impl ItemIndex {
    /// Build the index over the distinct labels.
    pub fn from_labels<'a, I>(labels: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let labels: Vec<String> = labels
            .into_iter()
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let lookup = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.clone(), i))
            .collect();
        Self { labels, lookup }
    }

    /// Id assigned to a raw label.
    pub fn id_of(&self, label: &str) -> Option<String> {
        self.lookup.get(label).map(|&i| item_id(i))
    }

    /// Raw label behind an id.
    pub fn label_of(&self, id: &str) -> Option<&str> {
        let n: usize = id.strip_prefix("Item")?.parse().ok()?;
        self.labels.get(n.checked_sub(1)?).map(String::as_str)
    }

    /// Number of distinct items.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// True when no items are indexed.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// `(id, label)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (String, &str)> {
        self.labels
            .iter()
            .enumerate()
            .map(|(i, l)| (item_id(i), l.as_str()))
    }
}

fn item_id(index: usize) -> String {
    format!("Item{}", index + 1)
}

/// Cleaned token table with the item mapping kept on the side.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedData {
    /// Monophthong tokens with synthetic item ids.
    pub tokens: Vec<Token>,
    /// Raw label for every item id.
    pub items: ItemIndex,
    /// Rows read from the file, missing-value rows excluded.
    pub rows_read: usize,
    /// Rows dropped for missing cells.
    pub dropped_missing: usize,
    /// Diphthong rows removed.
    pub dropped_diphthongs: usize,
}

/// Keep monophthongs and replace raw item labels with ids.
///
/// # Errors
/// `EmptyDataset` when the file has no usable rows or no monophthongs.
pub fn clean(raw: RawData) -> Result<CleanedData> {
    let rows_read = raw.records.len();
    if rows_read == 0 {
        return Err(EmptyDatasetError::after("missing-value filter").into());
    }

    let (mono, diph): (Vec<_>, Vec<_>) = raw
        .records
        .into_iter()
        .partition(|r| r.vowel_type == VowelType::Monophthong);

    if mono.is_empty() {
        return Err(EmptyDatasetError::after("monophthong filter").into());
    }

    let items = ItemIndex::from_labels(mono.iter().map(|r| r.item_label.as_str()));

    let tokens = mono
        .into_iter()
        .map(|r| Token {
            item_id: items.id_of(&r.item_label).unwrap_or_default(),
            subject: r.subject,
            vowel: r.vowel,
            vowel_type: r.vowel_type,
            condition: r.condition,
            gender: r.gender,
            duration_ms: r.duration_ms,
            f1_hz: r.f1_hz,
            f2_hz: r.f2_hz,
        })
        .collect::<Vec<_>>();

    info!(
        tokens = tokens.len(),
        items = items.len(),
        diphthongs = diph.len(),
        "cleaned measurements"
    );

    Ok(CleanedData {
        tokens,
        items,
        rows_read,
        dropped_missing: raw.dropped_missing,
        dropped_diphthongs: diph.len(),
    })
}
