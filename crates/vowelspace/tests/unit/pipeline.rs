//! End-to-end pipeline runs on small temporary files.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use vowelspace::output::tables::{
    COEFFICIENTS_TABLE, DIFFERENCES_TABLE, HULLS_TABLE, SUMMARIES_TABLE, TOKENS_TABLE,
    VOWEL_MEANS_TABLE,
};
use vowelspace::output::to_json;
use vowelspace::{AnalysisConfig, Measure, Pipeline, PipelineError, KEY_COEFFICIENTS};

const HEADER: &str = "subject,item,vowel,vowel_type,condition,gender,duration,f1,f2\n";

fn write_csv(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("formants.csv");
    fs::write(&path, format!("{HEADER}{body}")).unwrap();
    path
}

/// Eight speakers, three vowels, two repetitions per register. Polite
/// tokens are longer and further from the centre.
fn simulated_body() -> String {
    let vowels = [("a", "bat", 750.0, 1500.0), ("i", "beet", 320.0, 2300.0), ("u", "boot", 350.0, 850.0)];
    let mut body = String::new();
    for s in 0..8 {
        let gender = if s % 2 == 0 { "F" } else { "M" };
        for (c, condition) in ["casual", "polite"].iter().enumerate() {
            let spread = 1.0 + 0.15 * c as f64;
            for (v, (vowel, item, f1, f2)) in vowels.iter().enumerate() {
                for rep in 0..2 {
                    // Small deterministic jitter so no two tokens coincide.
                    let jitter = ((s * 31 + v * 17 + rep * 7 + c * 3) % 23) as f64 - 11.0;
                    let f1 = 530.0 + (f1 - 530.0) * spread + jitter;
                    let f2 = 1550.0 + (f2 - 1550.0) * spread - 2.0 * jitter;
                    let duration = 90.0 + 12.0 * c as f64 + jitter.abs() + s as f64;
                    writeln!(
                        body,
                        "S{s},{item},{vowel},monophthong,{condition},{gender},{duration},{f1},{f2}"
                    )
                    .unwrap();
                }
            }
        }
    }
    body
}

fn small_config(root: &Path) -> AnalysisConfig {
    AnalysisConfig::default()
        .chains(2)
        .iterations(300, 100)
        .seed(11)
        .cores(2)
        .models_dir(root.join("models"))
        .tables_dir(root.join("tables"))
}

#[test]
fn descriptive_only_run_writes_tables() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_csv(
        dir.path(),
        "A,bat,a,mono,casual,F,100,500,1500\n\
         A,beet,i,mono,casual,F,110,700,1700\n\
         B,bat,a,mono,casual,M,90,720,1550\n\
         B,bat,a,mono,polite,M,100,760,1500\n\
         B,bait,ei,diph,polite,M,140,600,1900\n",
    );
    let config = small_config(dir.path()).fit_models(false);
    let report = Pipeline::new(config).run(&input).unwrap();

    assert_eq!(report.cleaning.rows_read, 5);
    assert_eq!(report.cleaning.dropped_diphthongs, 1);
    assert_eq!(report.cleaning.tokens, 4);
    assert!(report.models.is_empty());
    assert!(report.all_converged());

    // Only B has both registers, so no paired test can run.
    let euclid = report.descriptive.comparison(Measure::EuclideanDist).unwrap();
    let a = euclid.differences.iter().find(|d| d.subject == "A").unwrap();
    assert_eq!(a.difference, None);
    assert!((a.casual.unwrap() - 141.421356).abs() < 1e-5);
    assert!(euclid.test.is_err());

    let tables = dir.path().join("tables");
    for name in [
        TOKENS_TABLE,
        VOWEL_MEANS_TABLE,
        HULLS_TABLE,
        DIFFERENCES_TABLE,
        SUMMARIES_TABLE,
    ] {
        assert!(tables.join(name).exists(), "{name} not written");
    }
    assert!(!tables.join(COEFFICIENTS_TABLE).exists());
    assert_eq!(report.tables.len(), 5);

    let tokens = fs::read_to_string(tables.join(TOKENS_TABLE)).unwrap();
    assert_eq!(tokens.lines().count(), 5);
}

#[test]
fn bad_input_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_csv(dir.path(), "A,bat,a,mono,shouting,F,100,500,1500\n");
    let err = Pipeline::new(small_config(dir.path()).fit_models(false))
        .run(&input)
        .unwrap_err();
    assert!(matches!(err, PipelineError::InvalidValue { .. }));
    assert!(!dir.path().join("tables").exists());
}

#[test]
fn full_run_fits_and_reuses_models() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_csv(dir.path(), &simulated_body());
    let config = small_config(dir.path());

    let report = Pipeline::new(config.clone()).run(&input).unwrap();
    assert!(report.model_failures.is_empty(), "{:?}", report.model_failures);
    assert_eq!(report.models.len(), 4);

    for model in &report.models {
        assert_eq!(model.n_obs, 96);
        assert!(model.attempts == 1 || model.attempts == 2);
        let names: Vec<&str> = model.key_effects.iter().map(|k| k.name.as_str()).collect();
        assert_eq!(names, KEY_COEFFICIENTS.to_vec());
        for effect in &model.key_effects {
            assert!((effect.prob_positive + effect.prob_negative - 1.0).abs() < 1e-12);
        }
        assert!(dir
            .path()
            .join("models")
            .join(format!("{}.json.gz", model.name))
            .exists());
    }

    // Polite is coded −1, so longer polite durations give a negative
    // condition effect.
    let duration = report.model("duration_normal").unwrap();
    let condition = duration
        .key_effects
        .iter()
        .find(|k| k.name == "b_condition")
        .unwrap();
    assert!(condition.mean < 0.0);
    assert!(condition.prob_negative > 0.9);

    assert!(dir.path().join("tables").join(COEFFICIENTS_TABLE).exists());

    let json = to_json(&report).unwrap();
    assert!(json.contains("\"dispersion_lognormal\""));
    assert!(json.contains("\"key_effects\""));

    // Same settings: every model comes back from its snapshot unchanged.
    let again = Pipeline::new(config).run(&input).unwrap();
    for (first, second) in report.models.iter().zip(&again.models) {
        assert_eq!(first.name, second.name);
        assert_eq!(first.attempts, second.attempts);
        for (a, b) in first.key_effects.iter().zip(&second.key_effects) {
            assert_eq!(a.name, b.name);
            assert!((a.mean - b.mean).abs() <= 1e-9 * a.mean.abs().max(1.0));
            assert!((a.prob_positive - b.prob_positive).abs() < 1e-12);
        }
    }
}
