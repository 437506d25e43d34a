//! Scoring artifact loading and inference

pub mod inference;
pub mod loader;
pub mod outputs;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use inference::{build_input, resolve_model_path, Predictor};
pub use loader::OnnxBackend;
pub use outputs::{OutputLayout, ScoreOutput};
pub use session::{ModelBackend, ScoringSession, TensorMap};
