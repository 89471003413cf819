//! Compressed snapshots of fitted models.
//!
//! Each model is stored as `<dir>/<name>.json.gz`. A snapshot is reused only
//! when its specification, requested control settings and data fingerprint
//! equal the current ones; anything else is refit and the file overwritten.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::{debug, info, warn};
use vowelspace_core::model::Design;
use vowelspace_core::{DerivedToken, McmcControl, ModelSpec};

use super::fitter::{data_fingerprint, FittedModel, ModelFitter};
use super::sampler::PosteriorSampler;
use crate::error::{PipelineError, Result};

const SNAPSHOT_EXTENSION: &str = "json.gz";

/// Directory of model snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    /// Store rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Snapshot path for a model name.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", name, SNAPSHOT_EXTENSION))
    }

    /// Write a snapshot, replacing any previous one.
    pub fn save(&self, model: &FittedModel) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|e| PipelineError::io(&self.dir, e))?;
        let path = self.path_for(&model.spec.name);

        let file = File::create(&path).map_err(|e| PipelineError::io(&path, e))?;
        let mut enc = GzEncoder::new(BufWriter::new(file), Compression::default());
        serde_json::to_writer(&mut enc, model)?;
        enc.finish()
            .and_then(|mut w| w.flush())
            .map_err(|e| PipelineError::io(&path, e))?;

        debug!(path = %path.display(), "saved model snapshot");
        Ok(path)
    }

    /// Read a snapshot; `None` when the file does not exist.
    pub fn load(&self, name: &str) -> Result<Option<FittedModel>> {
        let path = self.path_for(name);
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(PipelineError::io(&path, e)),
        };
        let model = serde_json::from_reader(GzDecoder::new(BufReader::new(file)))?;
        Ok(Some(model))
    }

    /// Reuse a matching snapshot or fit and save.
    ///
    /// A snapshot matches when it was fitted with the same specification and
    /// requested control, over a design with the same data fingerprint.
    pub fn fit_or_load<S: PosteriorSampler>(
        &self,
        fitter: &ModelFitter<S>,
        tokens: &[DerivedToken],
        spec: &ModelSpec,
        control: &McmcControl,
    ) -> Result<FittedModel> {
        let design = Design::build(tokens, spec)?;
        let fingerprint = data_fingerprint(&design);

        match self.load(&spec.name) {
            Ok(Some(model))
                if model.spec == *spec
                    && model.requested_control == *control
                    && model.data_fingerprint == fingerprint =>
            {
                info!(model = %spec.name, "reusing saved model");
                return Ok(model);
            }
            Ok(Some(model)) if model.data_fingerprint != fingerprint => {
                info!(model = %spec.name, "input data changed since the saved fit, refitting")
            }
            Ok(Some(_)) => info!(model = %spec.name, "saved model is stale, refitting"),
            Ok(None) => {}
            Err(err) => warn!(model = %spec.name, %err, "unreadable snapshot, refitting"),
        }

        let model = fitter.fit_design(&design, spec, control)?;
        self.save(&model)?;
        Ok(model)
    }
}
