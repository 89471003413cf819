//! Tests for features and descriptive statistics on cleaned files.

use vowelspace::data::{clean, read_raw_records};
use vowelspace::descriptive::{DescriptiveReport, PairedComparison};
use vowelspace::{DispersionReference, Measure};
use vowelspace_core::aggregate::GroupKey;
use vowelspace_core::{derive_features, DerivedToken};

const HEADER: &str = "subject,item,vowel,vowel_type,condition,gender,duration,f1,f2\n";

fn derived(body: &str) -> Vec<DerivedToken> {
    let cleaned = clean(read_raw_records(format!("{HEADER}{body}").as_bytes()).unwrap()).unwrap();
    derive_features(&cleaned.tokens, DispersionReference::SpeakerCentroid).unwrap()
}

/// Speaker A only recorded casual speech; B, C and D have both registers.
fn mixed_speakers() -> Vec<DerivedToken> {
    derived(
        "A,bat,a,mono,casual,F,100,500,1500\n\
         A,beet,i,mono,casual,F,110,700,1700\n\
         B,bat,a,mono,casual,F,90,720,1550\n\
         B,bat,a,mono,polite,F,100,760,1500\n\
         C,beet,i,mono,casual,M,80,300,2100\n\
         C,beet,i,mono,polite,M,95,280,2200\n\
         D,boot,u,mono,casual,M,85,320,900\n\
         D,boot,u,mono,polite,M,105,310,850\n",
    )
}

#[test]
fn single_condition_speaker_centroid_and_distance() {
    let tokens = mixed_speakers();
    let a: Vec<&DerivedToken> = tokens.iter().filter(|t| t.token.subject == "A").collect();
    assert_eq!(a.len(), 2);
    for t in &a {
        assert!((t.f1_midpoint - 600.0).abs() < 1e-9);
        assert!((t.f2_midpoint - 1600.0).abs() < 1e-9);
        assert!((t.euclidean_dist - 141.421356).abs() < 1e-5);
        assert!((t.both_dist - 100.0).abs() < 1e-9);
    }
}

#[test]
fn single_condition_speaker_is_excluded_from_paired_test() {
    let tokens = mixed_speakers();
    let cmp = PairedComparison::compute(&tokens, Measure::Duration);

    let a = cmp.differences.iter().find(|d| d.subject == "A").unwrap();
    assert_eq!(a.difference, None);
    assert!(a.casual.is_some());
    assert_eq!(a.polite, None);

    // B: +10, C: +15, D: +20 (polite − casual)
    assert_eq!(cmp.usable(), vec![10.0, 15.0, 20.0]);
    let test = cmp.test.as_ref().unwrap();
    assert_eq!(test.n, 3);
    assert_eq!(test.excluded, 1);
    assert!((test.mean - 15.0).abs() < 1e-12);
    assert!((test.t - 15.0 / (5.0 / 3f64.sqrt())).abs() < 1e-9);
    assert!(test.p_value > 0.0 && test.p_value < 0.05);
}

#[test]
fn too_few_paired_speakers_records_reason() {
    let tokens = derived(
        "A,bat,a,mono,casual,F,100,500,1500\n\
         A,bat,a,mono,polite,F,120,520,1480\n\
         B,bat,a,mono,casual,M,90,700,1200\n",
    );
    let cmp = PairedComparison::compute(&tokens, Measure::EuclideanDist);
    assert_eq!(cmp.usable().len(), 1);
    assert!(cmp.test.is_err());
}

#[test]
fn report_covers_every_measure_and_grouping() {
    let tokens = mixed_speakers();
    let report = DescriptiveReport::compute(&tokens);

    assert_eq!(report.n_tokens, 8);
    assert_eq!(report.n_speakers, 4);
    assert_eq!(report.summaries.len(), 10);
    assert_eq!(report.comparisons.len(), 3);

    let by_condition = report
        .summary(Measure::Duration, &[GroupKey::Condition])
        .unwrap();
    assert_eq!(by_condition.rows.len(), 2);
    let n: usize = by_condition.rows.iter().map(|r| r.n).sum();
    assert_eq!(n, 8);

    let by_cell = report
        .summary(Measure::BothDist, &[GroupKey::Condition, GroupKey::Gender])
        .unwrap();
    assert_eq!(by_cell.rows.len(), 4);

    assert!(report.comparison(Measure::F1).is_none());
    assert!(report.comparison(Measure::BothDist).is_some());
}

#[test]
fn vowel_spaces_with_two_vowels_have_zero_area() {
    use vowelspace_core::{Condition, Gender};

    let tokens = mixed_speakers();
    let report = DescriptiveReport::compute(&tokens);

    let female_casual: Vec<_> = report
        .vowel_means
        .iter()
        .filter(|m| m.condition == Condition::Casual && m.gender == Gender::Female)
        .collect();
    // "a" pools speakers A and B.
    assert_eq!(female_casual.len(), 2);
    let a = female_casual.iter().find(|m| m.vowel == "a").unwrap();
    assert_eq!(a.n, 2);
    assert!((a.point.f1 - 610.0).abs() < 1e-9);

    let space = report
        .vowel_spaces
        .iter()
        .find(|s| s.condition == Condition::Casual && s.gender == Gender::Female)
        .unwrap();
    assert_eq!(space.hull.len(), 2);
    assert_eq!(space.area, 0.0);
}
