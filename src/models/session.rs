//! Scoring-session abstraction between the predictor and the ONNX runtime

use crate::models::outputs::ScoreOutput;
use anyhow::Result;
use std::path::Path;

/// Loads a scoring artifact from disk into a runnable session.
pub trait ModelBackend: Send + Sync {
    fn load(&self, path: &Path) -> Result<Box<dyn ScoringSession>>;
}

/// A loaded scoring artifact with named inputs and ordered outputs.
pub trait ScoringSession: Send {
    /// Declared input names
    fn input_names(&self) -> &[String];

    /// Declared output names, in output order
    fn output_names(&self) -> &[String];

    /// Run one request and return every output in declared order.
    fn run(&mut self, inputs: &TensorMap) -> Result<Vec<ScoreOutput>>;
}

/// Named single-value input tensors, kept in feature order.
///
/// Every entry is fed to the artifact as a float32 tensor of [`TensorMap::SHAPE`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TensorMap {
    entries: Vec<(&'static str, f32)>,
}

impl TensorMap {
    /// One request, one feature
    pub const SHAPE: [i64; 2] = [1, 1];

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Insert or replace the value for `name`.
    pub fn insert(&mut self, name: &'static str, value: f32) {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<f32> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f32)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All values as one row, for artifacts exported with a single packed input.
    pub fn to_row(&self) -> Vec<f32> {
        self.entries.iter().map(|(_, v)| *v).collect()
    }
}
