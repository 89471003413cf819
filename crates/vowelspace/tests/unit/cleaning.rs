//! Tests for loading and cleaning measurement files.

use std::collections::{BTreeSet, HashMap};
use std::io::Write;

use proptest::prelude::*;
use vowelspace_core::VowelType;
use vowelspace::data::{clean, load_tokens, read_raw_records};
use vowelspace::PipelineError;

const HEADER: &str = "subject,item,vowel,vowel_type,condition,gender,duration,f1,f2\n";

fn parse(body: &str) -> Result<vowelspace::data::CleanedData, PipelineError> {
    clean(read_raw_records(format!("{HEADER}{body}").as_bytes())?)
}

// =============================================================================
// MONOPHTHONG FILTER
// =============================================================================

#[test]
fn diphthongs_are_removed() {
    let data = parse(
        "S1,bait,ei,diphthong,casual,F,120,500,2000\n\
         S1,bat,a,monophthong,casual,F,90,750,1600\n\
         S1,boat,ou,diph,polite,F,130,450,1000\n",
    )
    .unwrap();
    assert_eq!(data.tokens.len(), 1);
    assert_eq!(data.dropped_diphthongs, 2);
    assert!(data.tokens.iter().all(|t| t.vowel_type == VowelType::Monophthong));
}

#[test]
fn only_diphthongs_is_empty_dataset() {
    let err = parse("S1,bait,ei,diphthong,casual,F,120,500,2000\n").unwrap_err();
    match err {
        PipelineError::EmptyDataset(e) => assert_eq!(e.filter, "monophthong filter"),
        other => panic!("expected EmptyDataset, got {other:?}"),
    }
}

#[test]
fn all_rows_missing_is_empty_dataset() {
    let err = parse("S1,bat,a,mono,casual,F,NA,750,1600\n").unwrap_err();
    assert!(matches!(err, PipelineError::EmptyDataset(_)));
}

// =============================================================================
// ITEM IDS
// =============================================================================

#[test]
fn item_ids_assigned_after_filter_in_sorted_order() {
    // "aisle" only appears as a diphthong, so it gets no id.
    let data = parse(
        "S1,zoo,u,mono,casual,F,90,300,800\n\
         S1,aisle,ai,diph,casual,F,150,600,1500\n\
         S1,bat,a,mono,casual,F,90,750,1600\n\
         S2,zoo,u,mono,polite,M,95,320,820\n",
    )
    .unwrap();
    assert_eq!(data.items.len(), 2);
    assert_eq!(data.items.id_of("bat").as_deref(), Some("Item1"));
    assert_eq!(data.items.id_of("zoo").as_deref(), Some("Item2"));
    assert_eq!(data.items.id_of("aisle"), None);

    let ids: Vec<&str> = data.tokens.iter().map(|t| t.item_id.as_str()).collect();
    assert_eq!(ids, vec!["Item2", "Item1", "Item2"]);
}

// =============================================================================
// FILES
// =============================================================================

#[test]
fn loads_file_with_display_headers() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        "Speaker,Word,Vowel,Type,Register,Sex,Duration (ms),F1 (Hz),F2 (Hz)\n\
         A,bat,a,Monophthong,Polite,Female,101.5,710,1580\n"
    )
    .unwrap();

    let data = load_tokens(file.path()).unwrap();
    assert_eq!(data.tokens.len(), 1);
    assert_eq!(data.tokens[0].subject, "A");
    assert_eq!(data.tokens[0].item_id, "Item1");
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_tokens(&dir.path().join("absent.csv")).unwrap_err();
    assert!(matches!(err, PipelineError::Io { .. }));
}

#[test]
fn schema_error_names_missing_columns() {
    let err = read_raw_records("speaker,word,vowel,f1,f2\nA,bat,a,700,1500\n".as_bytes())
        .unwrap_err();
    match err {
        PipelineError::Schema(e) => {
            assert_eq!(e.missing, vec!["vowel_type", "condition", "gender", "duration"]);
        }
        other => panic!("expected Schema, got {other:?}"),
    }
}

// =============================================================================
// PROPERTIES
// =============================================================================

fn row_strategy() -> impl Strategy<Value = (String, bool, String)> {
    (
        "[A-D][0-9]",
        any::<bool>(),
        prop::sample::select(vec!["bat", "bit", "boot", "bait", "beet", "bout"]),
    )
        .prop_map(|(s, mono, item)| (s, mono, item.to_string()))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn cleaned_tokens_are_monophthongs_with_bijective_ids(
        rows in prop::collection::vec(row_strategy(), 1..40)
    ) {
        let body: String = rows
            .iter()
            .map(|(s, mono, item)| {
                let vt = if *mono { "mono" } else { "diph" };
                format!("{s},{item},a,{vt},casual,F,90,700,1500\n")
            })
            .collect();

        let mono_labels: BTreeSet<&str> = rows
            .iter()
            .filter(|(_, mono, _)| *mono)
            .map(|(_, _, item)| item.as_str())
            .collect();

        match parse(&body) {
            Ok(data) => {
                prop_assert!(data.tokens.iter().all(|t| t.vowel_type == VowelType::Monophthong));
                prop_assert_eq!(data.items.len(), mono_labels.len());

                // label -> id and id -> label agree for every label.
                let mut seen: HashMap<String, String> = HashMap::new();
                for label in &mono_labels {
                    let id = data.items.id_of(label).unwrap();
                    prop_assert_eq!(data.items.label_of(&id), Some(*label));
                    prop_assert!(seen.insert(id, label.to_string()).is_none());
                }
            }
            Err(PipelineError::EmptyDataset(_)) => prop_assert!(mono_labels.is_empty()),
            Err(other) => prop_assert!(false, "unexpected error {:?}", other),
        }
    }
}
