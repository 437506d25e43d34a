//! In-memory scoring backend for tests

use crate::models::outputs::ScoreOutput;
use crate::models::session::{ModelBackend, ScoringSession, TensorMap};
use crate::schema::FEATURE_ORDER;
use anyhow::Result;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Backend that counts loads and replays canned outputs
pub struct FakeBackend {
    pub loads: Arc<AtomicUsize>,
    pub outputs: Vec<ScoreOutput>,
    pub load_delay: Duration,
    pub fail_load: bool,
}

impl FakeBackend {
    pub fn new(outputs: Vec<ScoreOutput>) -> (Self, Arc<AtomicUsize>) {
        let loads = Arc::new(AtomicUsize::new(0));
        let backend = Self {
            loads: loads.clone(),
            outputs,
            load_delay: Duration::ZERO,
            fail_load: false,
        };
        (backend, loads)
    }
}

impl ModelBackend for FakeBackend {
    fn load(&self, _path: &Path) -> Result<Box<dyn ScoringSession>> {
        std::thread::sleep(self.load_delay);
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.fail_load {
            anyhow::bail!("corrupt artifact");
        }
        Ok(Box::new(FakeSession {
            input_names: FEATURE_ORDER.iter().map(|s| s.to_string()).collect(),
            output_names: (0..self.outputs.len()).map(|i| format!("out{}", i)).collect(),
            outputs: self.outputs.clone(),
        }))
    }
}

struct FakeSession {
    input_names: Vec<String>,
    output_names: Vec<String>,
    outputs: Vec<ScoreOutput>,
}

impl ScoringSession for FakeSession {
    fn input_names(&self) -> &[String] {
        &self.input_names
    }

    fn output_names(&self) -> &[String] {
        &self.output_names
    }

    fn run(&mut self, inputs: &TensorMap) -> Result<Vec<ScoreOutput>> {
        anyhow::ensure!(inputs.len() == FEATURE_ORDER.len(), "short input map");
        Ok(self.outputs.clone())
    }
}

pub fn label(class: i64) -> ScoreOutput {
    ScoreOutput::tensor(vec![1], vec![class as f64])
}

pub fn probabilities(row: &[f64]) -> ScoreOutput {
    ScoreOutput::tensor(vec![1, row.len() as i64], row.to_vec())
}

/// Write a placeholder artifact named `final.onnx` so existence checks pass
pub fn artifact_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("final.onnx"), b"onnx").unwrap();
    dir
}
