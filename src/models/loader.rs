//! ONNX Runtime backend for the scoring artifact

use crate::models::outputs::ScoreOutput;
use crate::models::session::{ModelBackend, ScoringSession, TensorMap};
use crate::schema::FEATURE_ORDER;
use anyhow::{anyhow, bail, Context, Result};
use ort::memory::Allocator;
use ort::session::{builder::GraphOptimizationLevel, Session, SessionInputValue};
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, DynValue, Tensor};
use std::path::Path;
use tracing::{info, warn};

/// How request features are fed to the artifact
#[derive(Debug, Clone, PartialEq, Eq)]
enum FeedMode {
    /// One `[1, 1]` input per feature, named after it
    PerFeature,
    /// A single `[1, n]` row under the artifact's only input name
    Packed(String),
}

impl FeedMode {
    fn detect(input_names: &[String]) -> Option<Self> {
        let per_feature = FEATURE_ORDER
            .iter()
            .all(|name| input_names.iter().any(|input| input == name));
        if per_feature {
            Some(FeedMode::PerFeature)
        } else if input_names.len() == 1 {
            Some(FeedMode::Packed(input_names[0].clone()))
        } else {
            None
        }
    }
}

/// Loader for ONNX scoring artifacts
pub struct OnnxBackend {
    /// Number of intra-op threads per session
    onnx_threads: usize,
}

impl OnnxBackend {
    /// Create a backend with default settings (1 thread)
    pub fn new() -> Result<Self> {
        Self::with_threads(1)
    }

    /// Create a backend with the given number of intra-op threads
    pub fn with_threads(onnx_threads: usize) -> Result<Self> {
        ort::init().commit()?;
        info!(onnx_threads = onnx_threads, "ONNX Runtime initialized");
        Ok(Self { onnx_threads })
    }
}

impl ModelBackend for OnnxBackend {
    fn load(&self, path: &Path) -> Result<Box<dyn ScoringSession>> {
        info!(path = %path.display(), threads = self.onnx_threads, "Loading ONNX model");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.onnx_threads)?
            .commit_from_file(path)
            .context(format!("Failed to load model from {:?}", path))?;

        let input_names: Vec<String> = session.inputs.iter().map(|i| i.name.clone()).collect();
        let output_names: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();

        let feed_mode = FeedMode::detect(&input_names);
        if feed_mode.is_none() {
            warn!(
                inputs = ?input_names,
                "Model inputs match neither per-feature nor packed layout"
            );
        }

        info!(
            inputs = ?input_names,
            outputs = ?output_names,
            feed_mode = ?feed_mode,
            "Model loaded successfully"
        );

        Ok(Box::new(OnnxSession {
            session,
            input_names,
            output_names,
            feed_mode,
        }))
    }
}

/// Loaded ONNX session with its declared names
pub struct OnnxSession {
    session: Session,
    input_names: Vec<String>,
    output_names: Vec<String>,
    feed_mode: Option<FeedMode>,
}

impl OnnxSession {
    fn feed(&self, inputs: &TensorMap) -> Result<Vec<(String, SessionInputValue<'static>)>> {
        match &self.feed_mode {
            Some(FeedMode::PerFeature) => inputs
                .iter()
                .map(|(name, value)| {
                    let tensor = Tensor::from_array((TensorMap::SHAPE.to_vec(), vec![value]))
                        .context(format!("Failed to create input tensor for {}", name))?;
                    Ok((name.to_string(), tensor.into()))
                })
                .collect(),
            Some(FeedMode::Packed(input_name)) => {
                let row = inputs.to_row();
                let shape = vec![1_i64, row.len() as i64];
                let tensor =
                    Tensor::from_array((shape, row)).context("Failed to create input tensor")?;
                Ok(vec![(input_name.clone(), tensor.into())])
            }
            None => bail!(
                "Model inputs {:?} cannot be fed from features {:?}",
                self.input_names,
                FEATURE_ORDER
            ),
        }
    }
}

impl ScoringSession for OnnxSession {
    fn input_names(&self) -> &[String] {
        &self.input_names
    }

    fn output_names(&self) -> &[String] {
        &self.output_names
    }

    fn run(&mut self, inputs: &TensorMap) -> Result<Vec<ScoreOutput>> {
        let feed = self.feed(inputs)?;
        let outputs = self.session.run(feed).context("ONNX session run failed")?;

        self.output_names
            .iter()
            .map(|name| {
                let output = outputs
                    .get(name.as_str())
                    .ok_or_else(|| anyhow!("Model output '{}' missing from run result", name))?;
                read_output(output, name)
            })
            .collect()
    }
}

/// Convert one runtime value into a [`ScoreOutput`].
///
/// Handles dense tensors (labels, probabilities, scaled features) and the
/// seq(map) probabilities produced by ZipMap exports.
fn read_output(output: &DynValue, name: &str) -> Result<ScoreOutput> {
    if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
        let shape: Vec<i64> = shape.iter().copied().collect();
        return Ok(ScoreOutput::tensor(shape, data.iter().map(|&v| v as f64).collect()));
    }
    if let Ok((shape, data)) = output.try_extract_tensor::<i64>() {
        let shape: Vec<i64> = shape.iter().copied().collect();
        return Ok(ScoreOutput::tensor(shape, data.iter().map(|&v| v as f64).collect()));
    }
    if let Ok((shape, data)) = output.try_extract_tensor::<f64>() {
        let shape: Vec<i64> = shape.iter().copied().collect();
        return Ok(ScoreOutput::tensor(shape, data.to_vec()));
    }

    let dtype = output.dtype();
    if DynSequenceValueType::can_downcast(&dtype) {
        return read_probability_maps(output, name);
    }

    bail!("Model output '{}' has unsupported type {:?}", name, dtype)
}

/// Extract seq(map(int64, float)) into per-row class probabilities
fn read_probability_maps(output: &DynValue, name: &str) -> Result<ScoreOutput> {
    let allocator = Allocator::default();

    let sequence = output
        .downcast_ref::<DynSequenceValueType>()
        .map_err(|e| anyhow!("Failed to downcast output '{}' to sequence: {}", name, e))?;

    let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;

    let mut rows: Vec<Vec<(i64, f64)>> = Vec::with_capacity(maps.len());
    for map_value in &maps {
        let kv_pairs = map_value.try_extract_key_values::<i64, f32>()?;
        rows.push(
            kv_pairs
                .into_iter()
                .map(|(class_id, prob)| (class_id, prob as f64))
                .collect(),
        );
    }

    Ok(ScoreOutput::ProbabilityMaps(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_feed_mode_per_feature() {
        let inputs = names(&FEATURE_ORDER);
        assert_eq!(FeedMode::detect(&inputs), Some(FeedMode::PerFeature));
    }

    #[test]
    fn test_feed_mode_packed() {
        let inputs = names(&["float_input"]);
        assert_eq!(
            FeedMode::detect(&inputs),
            Some(FeedMode::Packed("float_input".to_string()))
        );
    }

    #[test]
    fn test_feed_mode_unusable() {
        let inputs = names(&["age", "weight"]);
        assert_eq!(FeedMode::detect(&inputs), None);
    }
}
