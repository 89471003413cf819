//! Snapshot reuse and invalidation.

use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};

use vowelspace::model::{GibbsBackend, ModelFitter, ModelStore, PosteriorSampler, SamplerOutput};
use vowelspace::{Family, McmcControl, ModelSpec, Prior};
use vowelspace_core::model::Design;
use vowelspace_core::{
    derive_features, Condition, DerivedToken, DispersionReference, Gender, Token, VowelType,
};

/// Gibbs backend that counts how often it is asked to sample.
#[derive(Default)]
struct CountingSampler {
    calls: AtomicUsize,
}

impl CountingSampler {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PosteriorSampler for CountingSampler {
    fn name(&self) -> &'static str {
        "counting-gibbs"
    }

    fn sample(
        &self,
        design: &Design,
        prior: Prior,
        control: &McmcControl,
    ) -> vowelspace::Result<SamplerOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        GibbsBackend.sample(design, prior, control)
    }
}

fn tokens() -> Vec<DerivedToken> {
    tokens_for(6)
}

fn tokens_for(speakers: usize) -> Vec<DerivedToken> {
    let mut tokens = Vec::new();
    for s in 0..speakers {
        for (c, condition) in Condition::LEVELS.into_iter().enumerate() {
            for i in 0..4 {
                let shift = ((s * 13 + c * 29 + i * 7) % 17) as f64;
                tokens.push(Token {
                    subject: format!("S{s}"),
                    item_id: format!("Item{}", i + 1),
                    vowel: ["a", "i", "u", "e"][i].into(),
                    vowel_type: VowelType::Monophthong,
                    condition,
                    gender: if s % 2 == 0 { Gender::Female } else { Gender::Male },
                    duration_ms: 85.0 + 10.0 * c as f64 + shift,
                    f1_hz: 400.0 + 90.0 * i as f64 + 13.0 * c as f64 + shift,
                    f2_hz: 2100.0 - 250.0 * i as f64 + 13.0 * c as f64 - shift,
                });
            }
        }
    }
    derive_features(&tokens, DispersionReference::SpeakerCentroid).unwrap()
}

fn control(seed: u64) -> McmcControl {
    McmcControl {
        chains: 2,
        iterations: 200,
        warmup: 50,
        seed,
        cores: 1,
        ..McmcControl::default()
    }
}

#[test]
fn matching_snapshot_is_reused() {
    let dir = tempfile::tempdir().unwrap();
    let store = ModelStore::new(dir.path());
    let fitter = ModelFitter::new(CountingSampler::default());
    let tokens = tokens();
    let spec = ModelSpec::duration(Family::Normal, Prior::default());

    let first = store.fit_or_load(&fitter, &tokens, &spec, &control(3)).unwrap();
    let calls = fitter.sampler().calls();
    assert!(calls >= 1);
    assert!(store.path_for(&spec.name).exists());

    let second = store.fit_or_load(&fitter, &tokens, &spec, &control(3)).unwrap();
    assert_eq!(fitter.sampler().calls(), calls);
    assert_eq!(second.requested_control, first.requested_control);
    assert_eq!(second.attempts, first.attempts);
    assert_eq!(second.sampler, "counting-gibbs");
}

#[test]
fn changed_control_or_spec_refits() {
    let dir = tempfile::tempdir().unwrap();
    let store = ModelStore::new(dir.path());
    let fitter = ModelFitter::new(CountingSampler::default());
    let tokens = tokens();
    let spec = ModelSpec::duration(Family::Normal, Prior::default());

    store.fit_or_load(&fitter, &tokens, &spec, &control(3)).unwrap();
    let after_first = fitter.sampler().calls();

    let refit = store.fit_or_load(&fitter, &tokens, &spec, &control(4)).unwrap();
    let after_second = fitter.sampler().calls();
    assert!(after_second > after_first);
    assert_eq!(refit.requested_control.seed, 4);

    // Same name and control, different prior.
    let wider = ModelSpec::duration(Family::Normal, Prior::normal(0.0, 50.0));
    store.fit_or_load(&fitter, &tokens, &wider, &control(4)).unwrap();
    assert!(fitter.sampler().calls() > after_second);

    let saved = store.load(&spec.name).unwrap().unwrap();
    assert_eq!(saved.spec, wider);
}

#[test]
fn corrupt_snapshot_is_refit_and_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let store = ModelStore::new(dir.path());
    let fitter = ModelFitter::new(CountingSampler::default());
    let tokens = tokens();
    let spec = ModelSpec::dispersion(Family::LogNormal, Prior::default());

    fs::write(store.path_for(&spec.name), b"\x1f\x8b truncated").unwrap();
    let model = store.fit_or_load(&fitter, &tokens, &spec, &control(5)).unwrap();
    assert!(fitter.sampler().calls() >= 1);
    assert_eq!(store.load(&spec.name).unwrap().unwrap().spec, model.spec);
}

#[test]
fn changed_data_refits() {
    let dir = tempfile::tempdir().unwrap();
    let store = ModelStore::new(dir.path());
    let fitter = ModelFitter::new(CountingSampler::default());
    let spec = ModelSpec::duration(Family::Normal, Prior::default());

    let first = store.fit_or_load(&fitter, &tokens_for(4), &spec, &control(3)).unwrap();
    let calls = fitter.sampler().calls();
    assert_eq!(first.n_obs, 32);

    let second = store.fit_or_load(&fitter, &tokens_for(7), &spec, &control(3)).unwrap();
    assert!(fitter.sampler().calls() > calls);
    assert_eq!(second.n_obs, 56);
    assert_ne!(second.data_fingerprint, first.data_fingerprint);

    // Same row count, one measurement changed.
    let mut edited = tokens_for(7);
    edited[5].token.duration_ms += 1.0;
    let calls = fitter.sampler().calls();
    let third = store.fit_or_load(&fitter, &edited, &spec, &control(3)).unwrap();
    assert!(fitter.sampler().calls() > calls);
    assert_eq!(third.n_obs, 56);
    assert_ne!(third.data_fingerprint, second.data_fingerprint);
}
