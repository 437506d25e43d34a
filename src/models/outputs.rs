//! Interpretation of scoring-artifact outputs
//!
//! Classifiers reach us through two export conventions: `[label, probabilities]`
//! and `[scaled_features, label, probabilities, ...]`. [`OutputLayout`] names
//! which one produced a given output list.

use crate::error::PredictorError;
use anyhow::anyhow;

/// A single output of a scoring run, batch-first.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreOutput {
    /// Dense numeric tensor, values in row-major order
    Tensor { shape: Vec<i64>, values: Vec<f64> },
    /// `seq(map(int64, float))` as emitted by ZipMap exports, one map per row
    ProbabilityMaps(Vec<Vec<(i64, f64)>>),
}

impl ScoreOutput {
    pub fn tensor(shape: Vec<i64>, values: Vec<f64>) -> Self {
        ScoreOutput::Tensor { shape, values }
    }

    /// First element of the first row, e.g. the predicted label.
    pub fn leading_value(&self) -> Option<f64> {
        match self {
            ScoreOutput::Tensor { values, .. } => values.first().copied(),
            ScoreOutput::ProbabilityMaps(_) => None,
        }
    }

    /// Probability assigned to `class` in the first row.
    pub fn class_probability(&self, class: i64) -> Option<f64> {
        match self {
            ScoreOutput::Tensor { shape, values } => {
                let row_len = if shape.len() >= 2 {
                    usize::try_from(shape[1..].iter().product::<i64>()).unwrap_or(0)
                } else {
                    values.len()
                };
                let index = usize::try_from(class).ok()?;
                if index >= row_len {
                    return None;
                }
                values.get(index).copied()
            }
            ScoreOutput::ProbabilityMaps(rows) => rows
                .first()?
                .iter()
                .find(|(key, _)| *key == class)
                .map(|(_, prob)| *prob),
        }
    }
}

/// Which export convention produced an output list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLayout {
    /// `[label, probabilities]`
    LabelProbabilities,
    /// `[scaled_features, label, probabilities, ...]`
    ScaledLabelProbabilities,
}

impl OutputLayout {
    pub fn from_output_count(count: usize) -> Result<Self, PredictorError> {
        match count {
            2 => Ok(OutputLayout::LabelProbabilities),
            n if n >= 3 => Ok(OutputLayout::ScaledLabelProbabilities),
            n => Err(PredictorError::UnexpectedOutputShape(n)),
        }
    }

    pub fn label_index(self) -> usize {
        match self {
            OutputLayout::LabelProbabilities => 0,
            OutputLayout::ScaledLabelProbabilities => 1,
        }
    }

    pub fn probability_index(self) -> usize {
        self.label_index() + 1
    }
}

/// Turn raw outputs into `(predicted_class, confidence)`.
///
/// Confidence is the probability of the predicted class, clamped to `[0, 1]`.
pub fn interpret(outputs: &[ScoreOutput]) -> Result<(i64, f64), PredictorError> {
    let layout = OutputLayout::from_output_count(outputs.len())?;

    let label = outputs[layout.label_index()]
        .leading_value()
        .filter(|v| v.is_finite())
        .ok_or_else(|| PredictorError::PredictionFailed(anyhow!("label output holds no class value")))?;
    // Labels are whole numbers; truncation matches an integer cast of the raw value.
    let class = label.trunc() as i64;

    let probability = outputs[layout.probability_index()]
        .class_probability(class)
        .filter(|p| !p.is_nan())
        .ok_or_else(|| {
            PredictorError::PredictionFailed(anyhow!("no probability for predicted class {}", class))
        })?;

    Ok((class, probability.clamp(0.0, 1.0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(class: i64) -> ScoreOutput {
        ScoreOutput::tensor(vec![1], vec![class as f64])
    }

    fn probabilities(row: &[f64]) -> ScoreOutput {
        ScoreOutput::tensor(vec![1, row.len() as i64], row.to_vec())
    }

    #[test]
    fn test_layout_from_output_count() {
        assert_eq!(
            OutputLayout::from_output_count(2).unwrap(),
            OutputLayout::LabelProbabilities
        );
        assert_eq!(
            OutputLayout::from_output_count(3).unwrap(),
            OutputLayout::ScaledLabelProbabilities
        );
        assert_eq!(
            OutputLayout::from_output_count(5).unwrap(),
            OutputLayout::ScaledLabelProbabilities
        );
        for count in [0, 1] {
            assert!(matches!(
                OutputLayout::from_output_count(count),
                Err(PredictorError::UnexpectedOutputShape(n)) if n == count
            ));
        }
    }

    #[test]
    fn test_two_output_convention() {
        let outputs = vec![label(1), probabilities(&[0.2, 0.8])];
        assert_eq!(interpret(&outputs).unwrap(), (1, 0.8));
    }

    #[test]
    fn test_scaled_output_convention_ignores_leading_output() {
        let scaled = ScoreOutput::tensor(vec![1, 3], vec![9.0, 9.0, 9.0]);
        let outputs = vec![scaled, label(0), probabilities(&[0.65, 0.35])];
        assert_eq!(interpret(&outputs).unwrap(), (0, 0.65));
    }

    #[test]
    fn test_confidence_is_clamped() {
        let outputs = vec![label(1), probabilities(&[-0.0000001, 1.0000001])];
        assert_eq!(interpret(&outputs).unwrap(), (1, 1.0));

        let outputs = vec![label(0), probabilities(&[-0.0000001, 1.0000001])];
        assert_eq!(interpret(&outputs).unwrap(), (0, 0.0));
    }

    #[test]
    fn test_probability_maps() {
        let maps = ScoreOutput::ProbabilityMaps(vec![vec![(0, 0.3), (1, 0.7)]]);
        let outputs = vec![label(1), maps];
        assert_eq!(interpret(&outputs).unwrap(), (1, 0.7));
    }

    #[test]
    fn test_batch_rows_beyond_first_are_ignored() {
        let probs = ScoreOutput::tensor(vec![2, 2], vec![0.1, 0.9, 0.6, 0.4]);
        assert_eq!(probs.class_probability(1), Some(0.9));
        assert_eq!(probs.class_probability(2), None);
    }

    #[test]
    fn test_class_without_probability_fails() {
        let outputs = vec![label(2), probabilities(&[0.5, 0.5])];
        assert!(matches!(
            interpret(&outputs),
            Err(PredictorError::PredictionFailed(_))
        ));

        let outputs = vec![label(-1), probabilities(&[0.5, 0.5])];
        assert!(matches!(
            interpret(&outputs),
            Err(PredictorError::PredictionFailed(_))
        ));
    }

    #[test]
    fn test_empty_label_fails() {
        let outputs = vec![ScoreOutput::tensor(vec![0], vec![]), probabilities(&[0.5, 0.5])];
        assert!(matches!(
            interpret(&outputs),
            Err(PredictorError::PredictionFailed(_))
        ));
    }
}
