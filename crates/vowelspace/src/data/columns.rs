//! Header normalisation and column resolution.
//!
//! Display headers such as `F1 (Hz)`, `Speaker` or `Vowel Type` are reduced
//! to identifiers (`f1`, `speaker`, `vowel_type`) and matched against a fixed
//! alias table for each required field.

use std::fmt;

use crate::error::SchemaError;

/// One of the nine required input fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Speaker.
    Subject,
    /// Lexical item label.
    Item,
    /// Vowel category.
    Vowel,
    /// Monophthong or diphthong.
    VowelType,
    /// Speech register.
    Condition,
    /// Speaker gender.
    Gender,
    /// Duration (ms).
    Duration,
    /// First formant (Hz).
    F1,
    /// Second formant (Hz).
    F2,
}

impl Field {
    /// All required fields, in canonical order.
    pub const ALL: [Field; 9] = [
        Field::Subject,
        Field::Item,
        Field::Vowel,
        Field::VowelType,
        Field::Condition,
        Field::Gender,
        Field::Duration,
        Field::F1,
        Field::F2,
    ];

    /// Canonical identifier.
    pub fn canonical(&self) -> &'static str {
        match self {
            Field::Subject => "subject",
            Field::Item => "item",
            Field::Vowel => "vowel",
            Field::VowelType => "vowel_type",
            Field::Condition => "condition",
            Field::Gender => "gender",
            Field::Duration => "duration",
            Field::F1 => "f1",
            Field::F2 => "f2",
        }
    }

    /// Normalised headers accepted for this field.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Field::Subject => &["subject", "speaker", "participant"],
            Field::Item => &["item", "word", "lexical_item", "item_label"],
            Field::Vowel => &["vowel"],
            Field::VowelType => &["vowel_type", "type", "vtype"],
            Field::Condition => &["condition", "register", "politeness"],
            Field::Gender => &["gender", "sex"],
            Field::Duration => &["duration", "duration_ms", "dur"],
            Field::F1 => &["f1", "f1_hz"],
            Field::F2 => &["f2", "f2_hz"],
        }
    }

    fn position(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical())
    }
}

/// Reduce a display header to an identifier.
///
/// Lowercases, drops parenthesised or bracketed unit suffixes, and collapses
/// every run of non-alphanumeric characters to a single `_`.
pub fn normalize_header(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut depth = 0usize;
    let mut pending_sep = false;

    for ch in raw.trim().trim_start_matches('\u{feff}').chars() {
        match ch {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            _ if depth > 0 => {}
            c if c.is_alphanumeric() => {
                if pending_sep && !out.is_empty() {
                    out.push('_');
                }
                pending_sep = false;
                out.extend(c.to_lowercase());
            }
            _ => pending_sep = true,
        }
    }
    out
}

/// Column index of every required field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    indices: [usize; 9],
}

impl ColumnMap {
    /// Match `headers` against the alias table.
    ///
    /// The first header matching a field wins. Fails listing every field
    /// without a match alongside the headers that were found.
    pub fn resolve<'a, I>(headers: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let found: Vec<String> = headers.into_iter().map(str::to_string).collect();
        let normalized: Vec<String> = found.iter().map(|h| normalize_header(h)).collect();

        let mut indices = [0usize; 9];
        let mut missing = Vec::new();
        for field in Field::ALL {
            match normalized
                .iter()
                .position(|h| field.aliases().contains(&h.as_str()))
            {
                Some(i) => indices[field.position()] = i,
                None => missing.push(field.canonical().to_string()),
            }
        }

        if missing.is_empty() {
            Ok(Self { indices })
        } else {
            Err(SchemaError { missing, found })
        }
    }

    /// Column index of `field`.
    pub fn index(&self, field: Field) -> usize {
        self.indices[field.position()]
    }
}
