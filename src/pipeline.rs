//! End-to-end assessment: validate, score, describe

use crate::error::AssessError;
use crate::models::inference::Predictor;
use crate::types::assessment::Assessment;
use crate::validator::{validate, RawInput};
use tracing::debug;

/// Validate `raw`, score it, and turn the prediction into an [`Assessment`].
///
/// Input problems come back as [`AssessError::ValidationFailed`] without the
/// predictor being touched.
pub fn assess(predictor: &Predictor, raw: &RawInput) -> Result<Assessment, AssessError> {
    let (features, errors) = validate(raw);
    if !errors.is_empty() {
        debug!(fields = errors.len(), "Validation failed");
        return Err(AssessError::ValidationFailed(errors));
    }

    let (class, confidence) = predictor.predict(&features)?;
    Ok(Assessment::new(class, confidence))
}
