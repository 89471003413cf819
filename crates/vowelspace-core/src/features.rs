//! Per-token dispersion features.
//!
//! Every speaker gets a single vowel-space centroid (mean F1, mean F2) over
//! all of that speaker's tokens, computed before any split by condition.
//! Distances are then taken from that centroid:
//!
//! ```text
//! f1_dist        = f1 - f1_midpoint
//! f2_dist        = f2 - f2_midpoint
//! both_dist      = (|f1_dist| + |f2_dist|) / 2
//! euclidean_dist = sqrt(f1_dist² + f2_dist²)
//! ```

extern crate alloc;

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use serde::{Deserialize, Serialize};

use crate::coding::SumCoded;
use crate::math;
use crate::types::{DerivedToken, Token};

/// Reference point for the `both_dist` summary.
///
/// `euclidean_dist` always uses the speaker's own centroid. `both_dist`
/// historically used the dataset-wide mean of speaker midpoints instead,
/// which mixes between-speaker offsets into a within-speaker measure. That
/// variant is kept selectable so results can be compared; it should be
/// reviewed before being relied on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispersionReference {
    /// Each speaker's own centroid (consistent with `euclidean_dist`).
    #[default]
    SpeakerCentroid,
    /// Mean of all speaker midpoints, pooled over the dataset.
    PooledMidpoint,
}

/// Errors from feature derivation.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureError {
    /// No tokens to derive features from.
    EmptyInput,
    /// A formant value was not finite.
    NonFinite {
        /// Speaker of the offending token.
        subject: String,
        /// Index of the token in the input slice.
        index: usize,
    },
}

impl fmt::Display for FeatureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureError::EmptyInput => write!(f, "cannot derive features from an empty token table"),
            FeatureError::NonFinite { subject, index } => write!(
                f,
                "token {} of speaker '{}' has a non-finite formant value",
                index, subject
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FeatureError {}

/// A speaker's vowel-space centroid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Centroid {
    /// Mean F1 in Hz.
    pub f1: f64,
    /// Mean F2 in Hz.
    pub f2: f64,
    /// Number of tokens the centroid was computed from.
    pub n: usize,
}

/// Compute one centroid per speaker, keyed by subject.
pub fn speaker_centroids(tokens: &[Token]) -> BTreeMap<String, Centroid> {
    let mut sums: BTreeMap<&str, (f64, f64, usize)> = BTreeMap::new();
    for t in tokens {
        let entry = sums.entry(t.subject.as_str()).or_insert((0.0, 0.0, 0));
        entry.0 += t.f1_hz;
        entry.1 += t.f2_hz;
        entry.2 += 1;
    }

    sums.into_iter()
        .map(|(subject, (f1, f2, n))| {
            (
                String::from(subject),
                Centroid {
                    f1: f1 / n as f64,
                    f2: f2 / n as f64,
                    n,
                },
            )
        })
        .collect()
}

/// Derive coded predictors and dispersion features for every token.
///
/// Output order matches input order.
pub fn derive_features(
    tokens: &[Token],
    reference: DispersionReference,
) -> Result<Vec<DerivedToken>, FeatureError> {
    if tokens.is_empty() {
        return Err(FeatureError::EmptyInput);
    }
    if let Some((index, t)) = tokens
        .iter()
        .enumerate()
        .find(|(_, t)| !t.f1_hz.is_finite() || !t.f2_hz.is_finite())
    {
        return Err(FeatureError::NonFinite {
            subject: t.subject.clone(),
            index,
        });
    }

    let centroids = speaker_centroids(tokens);

    let pooled = match reference {
        DispersionReference::SpeakerCentroid => None,
        DispersionReference::PooledMidpoint => {
            // Mean over tokens of the broadcast midpoint, i.e. weighted by token count.
            let (f1, f2) = tokens.iter().fold((0.0, 0.0), |(a, b), t| {
                let c = &centroids[t.subject.as_str()];
                (a + c.f1, b + c.f2)
            });
            let n = tokens.len() as f64;
            Some((f1 / n, f2 / n))
        }
    };

    let derived = tokens
        .iter()
        .map(|t| {
            let c = &centroids[t.subject.as_str()];
            let f1_dist = t.f1_hz - c.f1;
            let f2_dist = t.f2_hz - c.f2;
            let both_dist = match pooled {
                None => (math::abs(f1_dist) + math::abs(f2_dist)) / 2.0,
                Some((p1, p2)) => (math::abs(t.f1_hz - p1) + math::abs(t.f2_hz - p2)) / 2.0,
            };
            DerivedToken {
                token: t.clone(),
                condition_coded: t.condition.sum_code(),
                gender_coded: t.gender.sum_code(),
                f1_midpoint: c.f1,
                f2_midpoint: c.f2,
                f1_dist,
                f2_dist,
                both_dist,
                euclidean_dist: math::hypot(f1_dist, f2_dist),
            }
        })
        .collect();

    Ok(derived)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Condition, Gender, VowelType};
    use alloc::vec;

    fn token(subject: &str, condition: Condition, f1: f64, f2: f64) -> Token {
        Token {
            subject: subject.into(),
            item_id: "Item1".into(),
            vowel: "a".into(),
            vowel_type: VowelType::Monophthong,
            condition,
            gender: Gender::Female,
            duration_ms: 100.0,
            f1_hz: f1,
            f2_hz: f2,
        }
    }

    #[test]
    fn test_single_condition_speaker_gets_centroid() {
        let tokens = vec![
            token("A", Condition::Casual, 500.0, 1500.0),
            token("A", Condition::Casual, 700.0, 1700.0),
            token("B", Condition::Casual, 400.0, 1200.0),
            token("B", Condition::Polite, 600.0, 1400.0),
        ];
        let derived = derive_features(&tokens, DispersionReference::SpeakerCentroid).unwrap();

        assert_eq!(derived[0].f1_midpoint, 600.0);
        assert_eq!(derived[0].f2_midpoint, 1600.0);
        for d in &derived[..2] {
            assert!((d.euclidean_dist - 141.421_356).abs() < 1e-3);
            assert_eq!(d.both_dist, 100.0);
        }
        assert_eq!(derived[2].f1_midpoint, 500.0);
    }

    #[test]
    fn test_codes_follow_fixed_mapping() {
        let tokens = vec![
            token("A", Condition::Casual, 500.0, 1500.0),
            token("A", Condition::Polite, 700.0, 1700.0),
        ];
        let derived = derive_features(&tokens, DispersionReference::default()).unwrap();
        assert_eq!(derived[0].condition_coded, 1.0);
        assert_eq!(derived[1].condition_coded, -1.0);
        assert_eq!(derived[0].gender_coded, 1.0);
    }

    #[test]
    fn test_pooled_reference_changes_only_both_dist() {
        let tokens = vec![
            token("A", Condition::Casual, 500.0, 1500.0),
            token("A", Condition::Casual, 700.0, 1700.0),
            token("B", Condition::Casual, 300.0, 1000.0),
            token("B", Condition::Polite, 500.0, 1200.0),
        ];
        let own = derive_features(&tokens, DispersionReference::SpeakerCentroid).unwrap();
        let pooled = derive_features(&tokens, DispersionReference::PooledMidpoint).unwrap();

        // Pooled midpoint = (600 + 600 + 400 + 400) / 4 = 500 for F1, 1350 for F2.
        assert_eq!(pooled[0].both_dist, (0.0 + 150.0) / 2.0);
        for (a, b) in own.iter().zip(&pooled) {
            assert_eq!(a.euclidean_dist, b.euclidean_dist);
            assert_eq!(a.f1_dist, b.f1_dist);
        }
    }

    #[test]
    fn test_empty_input_is_error() {
        assert_eq!(
            derive_features(&[], DispersionReference::default()),
            Err(FeatureError::EmptyInput)
        );
    }

    #[test]
    fn test_non_finite_rejected() {
        let tokens = vec![token("A", Condition::Casual, f64::NAN, 1500.0)];
        assert!(matches!(
            derive_features(&tokens, DispersionReference::default()),
            Err(FeatureError::NonFinite { index: 0, .. })
        ));
    }
}
