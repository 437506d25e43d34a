//! Error types surfaced by the scoring pipeline

use crate::validator::ValidationErrors;
use std::path::PathBuf;
use thiserror::Error;

/// Failures raised by the predictor.
///
/// Each variant maps to a distinct response at the HTTP boundary, so callers
/// can tell a bad deployment apart from a bad artifact.
#[derive(Debug, Error)]
pub enum PredictorError {
    /// The resolved artifact path does not exist at load time
    #[error("Model not found: {}", .0.display())]
    ModelNotFound(PathBuf),

    /// A feature was absent from a map handed directly to `build_input`
    #[error("Missing feature: {0}")]
    MissingFeature(String),

    /// The artifact returned neither 2 nor at least 3 outputs
    #[error("Unexpected ONNX outputs: expected 2 or 3 tensors, got {0}")]
    UnexpectedOutputShape(usize),

    /// Any other failure while loading or invoking the artifact
    #[error("{0:#}")]
    PredictionFailed(anyhow::Error),
}

impl PredictorError {
    /// Short stable name, used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            PredictorError::ModelNotFound(_) => "model_not_found",
            PredictorError::MissingFeature(_) => "missing_feature",
            PredictorError::UnexpectedOutputShape(_) => "unexpected_output_shape",
            PredictorError::PredictionFailed(_) => "prediction_failed",
        }
    }
}

/// Failure of a full assessment: either the input or the system was at fault.
#[derive(Debug, Error)]
pub enum AssessError {
    #[error("Validation failed")]
    ValidationFailed(ValidationErrors),

    #[error(transparent)]
    Predictor(#[from] PredictorError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = PredictorError::ModelNotFound(PathBuf::from("/srv/models/final.onnx"));
        assert_eq!(err.to_string(), "Model not found: /srv/models/final.onnx");
        assert_eq!(err.kind(), "model_not_found");

        let err = PredictorError::MissingFeature("age".to_string());
        assert_eq!(err.to_string(), "Missing feature: age");

        let err = PredictorError::PredictionFailed(
            anyhow::anyhow!("bad tensor").context("Session run failed"),
        );
        assert_eq!(err.to_string(), "Session run failed: bad tensor");
    }

    #[test]
    fn test_predictor_error_converts_into_assess_error() {
        let err: AssessError = PredictorError::UnexpectedOutputShape(1).into();
        assert!(matches!(
            err,
            AssessError::Predictor(PredictorError::UnexpectedOutputShape(1))
        ));
    }
}
