//! Token types and common aliases.

extern crate alloc;

use alloc::string::String;
use core::fmt;

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// Dense column-major matrix used for design matrices and precision blocks.
pub type Matrix = DMatrix<f64>;

/// Dense vector used for coefficients and outcomes.
pub type Vector = DVector<f64>;

/// Speech register the token was elicited in.
///
/// Levels are ordered alphabetically, which fixes their sum coding
/// (see [`crate::coding`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    /// Casual (informal) speech.
    Casual,
    /// Polite (formal) speech.
    Polite,
}

impl Condition {
    /// Both levels in coding order.
    pub const LEVELS: [Condition; 2] = [Condition::Casual, Condition::Polite];

    /// Canonical lowercase label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Casual => "casual",
            Condition::Polite => "polite",
        }
    }

    /// Parse a raw cell value, case-insensitively.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "casual" => Some(Condition::Casual),
            "polite" => Some(Condition::Polite),
            _ => None,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Speaker gender as recorded in the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    /// Female speaker (`F`).
    Female,
    /// Male speaker (`M`).
    Male,
}

impl Gender {
    /// Both levels in coding order.
    pub const LEVELS: [Gender; 2] = [Gender::Female, Gender::Male];

    /// Short label as it appears in the raw data.
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Female => "F",
            Gender::Male => "M",
        }
    }

    /// Parse a raw cell value, case-insensitively.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "f" | "female" | "w" | "woman" => Some(Gender::Female),
            "m" | "male" | "man" => Some(Gender::Male),
            _ => None,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Articulatory class of the vowel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VowelType {
    /// Single steady target.
    Monophthong,
    /// Gliding vowel with two targets.
    Diphthong,
}

impl VowelType {
    /// Parse a raw cell value, case-insensitively.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "monophthong" | "mono" | "monophthongs" => Some(VowelType::Monophthong),
            "diphthong" | "diph" | "diphthongs" => Some(VowelType::Diphthong),
            _ => None,
        }
    }
}

impl fmt::Display for VowelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VowelType::Monophthong => write!(f, "monophthong"),
            VowelType::Diphthong => write!(f, "diphthong"),
        }
    }
}

/// One acoustic measurement of one vowel production.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Speaker identifier.
    pub subject: String,
    /// Synthetic lexical item identifier (`Item1`, `Item2`, ...).
    pub item_id: String,
    /// Vowel category label.
    pub vowel: String,
    /// Monophthong or diphthong.
    pub vowel_type: VowelType,
    /// Speech register.
    pub condition: Condition,
    /// Speaker gender.
    pub gender: Gender,
    /// Vowel duration in milliseconds.
    pub duration_ms: f64,
    /// First formant in Hz.
    pub f1_hz: f64,
    /// Second formant in Hz.
    pub f2_hz: f64,
}

/// A token with its coded predictors and dispersion features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedToken {
    /// The underlying measurement.
    #[serde(flatten)]
    pub token: Token,
    /// Sum-coded condition (`casual = +1`, `polite = -1`).
    pub condition_coded: f64,
    /// Sum-coded gender (`F = +1`, `M = -1`).
    pub gender_coded: f64,
    /// Speaker mean F1.
    pub f1_midpoint: f64,
    /// Speaker mean F2.
    pub f2_midpoint: f64,
    /// `f1 - f1_midpoint`.
    pub f1_dist: f64,
    /// `f2 - f2_midpoint`.
    pub f2_dist: f64,
    /// Mean absolute per-axis deviation.
    pub both_dist: f64,
    /// Straight-line distance from the speaker centroid.
    pub euclidean_dist: f64,
}

/// Numeric column of a [`DerivedToken`] that can be aggregated or modelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    /// Vowel duration (ms).
    Duration,
    /// Raw F1 (Hz).
    F1,
    /// Raw F2 (Hz).
    F2,
    /// Signed F1 deviation from the speaker centroid.
    F1Dist,
    /// Signed F2 deviation from the speaker centroid.
    F2Dist,
    /// Mean absolute per-axis deviation.
    BothDist,
    /// Euclidean distance from the speaker centroid.
    EuclideanDist,
}

impl Measure {
    /// Read this measure off a derived token.
    pub fn value(&self, token: &DerivedToken) -> f64 {
        match self {
            Measure::Duration => token.token.duration_ms,
            Measure::F1 => token.token.f1_hz,
            Measure::F2 => token.token.f2_hz,
            Measure::F1Dist => token.f1_dist,
            Measure::F2Dist => token.f2_dist,
            Measure::BothDist => token.both_dist,
            Measure::EuclideanDist => token.euclidean_dist,
        }
    }

    /// Column name used in tables and model formulas.
    pub fn column(&self) -> &'static str {
        match self {
            Measure::Duration => "duration",
            Measure::F1 => "f1",
            Measure::F2 => "f2",
            Measure::F1Dist => "f1_dist",
            Measure::F2Dist => "f2_dist",
            Measure::BothDist => "both_dist",
            Measure::EuclideanDist => "euclidean_dist",
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}
