//! Lazily loaded cardiovascular risk predictor

use crate::error::PredictorError;
use crate::models::outputs::interpret;
use crate::models::session::{ModelBackend, ScoringSession, TensorMap};
use crate::schema::{body_mass_index, feature_spec, BMI, FEATURE_ORDER, HEIGHT, WEIGHT};
use crate::validator::ValidatedFeatures;
use anyhow::anyhow;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use tracing::{debug, info};

/// Environment variable that overrides the artifact location
pub const MODEL_PATH_ENV: &str = "HEART_MODEL_PATH";

/// Artifact filename used when none is configured
pub const DEFAULT_MODEL_FILENAME: &str = "final.onnx";

/// Alternate filenames searched after the configured one
const FALLBACK_FILENAMES: [&str; 2] = ["heart_model.onnx", "final.onnx"];

/// Pick the artifact path.
///
/// An existing override wins. Otherwise the first existing candidate under
/// `base_dir` is used, and if none exist the first candidate is returned so
/// the eventual "not found" error names a concrete path.
pub fn resolve_model_path(
    base_dir: &Path,
    default_filename: &str,
    env_override: Option<&Path>,
) -> PathBuf {
    if let Some(path) = env_override.filter(|p| p.exists()) {
        return path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    }

    let candidates: Vec<PathBuf> = std::iter::once(base_dir.join(default_filename))
        .chain(FALLBACK_FILENAMES.iter().map(|name| base_dir.join(name)))
        .collect();

    candidates
        .iter()
        .find(|p| p.exists())
        .unwrap_or(&candidates[0])
        .clone()
}

/// Session plus its declared names, immutable once published
struct LoadedModel {
    session: Mutex<Box<dyn ScoringSession>>,
    input_names: Vec<String>,
    output_names: Vec<String>,
}

/// Binary cardiovascular-disease classifier backed by a scoring artifact.
///
/// The artifact path is fixed at construction; the artifact itself is loaded
/// on first use and kept for the life of the process.
pub struct Predictor {
    backend: Box<dyn ModelBackend>,
    model_path: PathBuf,
    loaded: OnceLock<LoadedModel>,
    load_lock: Mutex<()>,
}

impl Predictor {
    /// Create a predictor, honouring the [`MODEL_PATH_ENV`] override
    pub fn new(backend: Box<dyn ModelBackend>, base_dir: &Path, default_filename: &str) -> Self {
        let env_override = std::env::var_os(MODEL_PATH_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        Self::with_override(backend, base_dir, default_filename, env_override.as_deref())
    }

    /// Create a predictor with an explicit override instead of reading the environment
    pub fn with_override(
        backend: Box<dyn ModelBackend>,
        base_dir: &Path,
        default_filename: &str,
        env_override: Option<&Path>,
    ) -> Self {
        let model_path = resolve_model_path(base_dir, default_filename, env_override);
        info!(
            path = %model_path.display(),
            exists = model_path.exists(),
            "Model path resolved"
        );
        Self {
            backend,
            model_path,
            loaded: OnceLock::new(),
            load_lock: Mutex::new(()),
        }
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.get().is_some()
    }

    /// Declared input names, once loaded
    pub fn input_names(&self) -> Option<&[String]> {
        self.loaded.get().map(|m| m.input_names.as_slice())
    }

    /// Declared output names, once loaded
    pub fn output_names(&self) -> Option<&[String]> {
        self.loaded.get().map(|m| m.output_names.as_slice())
    }

    /// Load the artifact if that has not happened yet.
    ///
    /// Concurrent first callers block until one of them has published the
    /// session; the load happens at most once.
    pub fn ensure_loaded(&self) -> Result<(), PredictorError> {
        self.loaded_model().map(|_| ())
    }

    fn loaded_model(&self) -> Result<&LoadedModel, PredictorError> {
        if let Some(model) = self.loaded.get() {
            return Ok(model);
        }

        // The guard protects no data, so a poisoned lock is still usable.
        let _guard = self.load_lock.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(model) = self.loaded.get() {
            return Ok(model);
        }

        if !self.model_path.exists() {
            return Err(PredictorError::ModelNotFound(self.model_path.clone()));
        }

        let session = self
            .backend
            .load(&self.model_path)
            .map_err(PredictorError::PredictionFailed)?;
        let model = LoadedModel {
            input_names: session.input_names().to_vec(),
            output_names: session.output_names().to_vec(),
            session: Mutex::new(session),
        };

        info!(
            path = %self.model_path.display(),
            inputs = model.input_names.len(),
            outputs = model.output_names.len(),
            "Scoring artifact ready"
        );

        Ok(self.loaded.get_or_init(|| model))
    }

    /// Score validated features, returning `(class, confidence)`.
    pub fn predict(&self, features: &ValidatedFeatures) -> Result<(i64, f64), PredictorError> {
        let model = self.loaded_model()?;
        let inputs = build_input(features)?;

        let outputs = {
            let mut session = model
                .session
                .lock()
                .map_err(|e| PredictorError::PredictionFailed(anyhow!("Session lock error: {}", e)))?;
            session.run(&inputs).map_err(PredictorError::PredictionFailed)?
        };

        let (class, confidence) = interpret(&outputs)?;

        debug!(
            class = class,
            confidence = confidence,
            outputs = outputs.len(),
            "Prediction complete"
        );

        Ok((class, confidence))
    }
}

/// Build the artifact's input map from validated features.
///
/// A supplied BMI outside its schema bounds is replaced by the value computed
/// from height and weight before any tensor is built.
pub fn build_input(features: &ValidatedFeatures) -> Result<TensorMap, PredictorError> {
    let bmi = reconciled_bmi(features);

    let mut inputs = TensorMap::with_capacity(FEATURE_ORDER.len());
    for name in FEATURE_ORDER {
        let value = if name == BMI {
            bmi
        } else {
            features.get(name).copied()
        };
        let value = value.ok_or_else(|| PredictorError::MissingFeature(name.to_string()))?;
        inputs.insert(name, value as f32);
    }
    Ok(inputs)
}

fn reconciled_bmi(features: &ValidatedFeatures) -> Option<f64> {
    let supplied = features.get(BMI).copied()?;
    let (Some(&height), Some(&weight)) = (features.get(HEIGHT), features.get(WEIGHT)) else {
        return Some(supplied);
    };

    let in_range = feature_spec(BMI).map_or(true, |spec| spec.in_range(supplied));
    match body_mass_index(height, weight) {
        Some(calculated) if !in_range => {
            debug!(supplied, calculated, "Replacing out-of-range BMI");
            Some(calculated)
        }
        _ => Some(supplied),
    }
}
