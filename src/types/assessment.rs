//! Risk assessment returned to callers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Label text for the positive class
pub const DISEASE_LABEL: &str = "Likely to have cardiovascular disease";
/// Label text for every other class
pub const HEALTHY_LABEL: &str = "Likely healthy";

const HIGH_RISK_ADVICE: &str = "High risk: Reduce sodium and cholesterol; avoid smoking and alcohol; begin daily 30-min moderate cardio; monitor BP/HR daily; see a cardiologist promptly.";
const MODERATE_RISK_ADVICE: &str = "Moderate risk: Eat fruits/vegetables/fiber; limit processed food and sugar; exercise 20–30 min, 5x/week; track BP weekly; follow-up in 3–6 months.";
const LOW_RISK_ADVICE: &str = "Low risk: Maintain balanced diet and exercise; keep healthy weight; routine checkups once/twice a year; monitor BP occasionally.";

/// Risk band derived from prediction confidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskBand {
    Low,
    Moderate,
    High,
}

impl RiskBand {
    /// Bucket a confidence in `[0, 1]`. Lower bounds are inclusive: 75% and 50%.
    pub fn from_confidence(confidence: f64) -> Self {
        let pct = confidence * 100.0;
        if pct >= 75.0 {
            RiskBand::High
        } else if pct >= 50.0 {
            RiskBand::Moderate
        } else {
            RiskBand::Low
        }
    }

    pub fn recommendation(self) -> &'static str {
        match self {
            RiskBand::High => HIGH_RISK_ADVICE,
            RiskBand::Moderate => MODERATE_RISK_ADVICE,
            RiskBand::Low => LOW_RISK_ADVICE,
        }
    }
}

/// Human readable label for a predicted class.
///
/// Only class 1 is positive; any other value, including ones a binary
/// classifier should never emit, reads as healthy.
pub fn label_text(class: i64) -> &'static str {
    if class == 1 {
        DISEASE_LABEL
    } else {
        HEALTHY_LABEL
    }
}

/// Canned guidance for a prediction confidence
pub fn recommendation_for(confidence: f64) -> &'static str {
    RiskBand::from_confidence(confidence).recommendation()
}

/// Outcome of scoring one patient
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    /// Unique identifier for this prediction
    pub prediction_id: String,

    /// Predicted class as emitted by the model
    pub risk_class: i64,

    /// Label text for the predicted class
    pub label: String,

    /// Confidence in percent, one decimal place
    pub confidence: f64,

    /// Guidance for the confidence band
    pub recommendation: String,

    /// When the prediction was made
    pub scored_at: DateTime<Utc>,
}

impl Assessment {
    /// Create an assessment from a raw `(class, confidence)` prediction
    pub fn new(class: i64, confidence: f64) -> Self {
        Self {
            prediction_id: uuid::Uuid::new_v4().to_string(),
            risk_class: class,
            label: label_text(class).to_string(),
            confidence: (confidence * 1000.0).round() / 10.0,
            recommendation: recommendation_for(confidence).to_string(),
            scored_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_text() {
        assert_eq!(label_text(1), "Likely to have cardiovascular disease");
        assert_eq!(label_text(0), "Likely healthy");
    }

    #[test]
    fn test_unexpected_classes_read_as_healthy() {
        // Out-of-contract classes are not rejected here.
        assert_eq!(label_text(2), HEALTHY_LABEL);
        assert_eq!(label_text(-1), HEALTHY_LABEL);
    }

    #[test]
    fn test_risk_band_boundaries() {
        assert_eq!(RiskBand::from_confidence(0.75), RiskBand::High);
        assert_eq!(RiskBand::from_confidence(0.7499), RiskBand::Moderate);
        assert_eq!(RiskBand::from_confidence(0.5), RiskBand::Moderate);
        assert_eq!(RiskBand::from_confidence(0.4999), RiskBand::Low);
        assert_eq!(RiskBand::from_confidence(1.0), RiskBand::High);
        assert_eq!(RiskBand::from_confidence(0.0), RiskBand::Low);
    }

    #[test]
    fn test_recommendation_for() {
        assert!(recommendation_for(0.75).starts_with("High risk"));
        assert!(recommendation_for(0.7499).starts_with("Moderate risk"));
        assert!(recommendation_for(0.2).starts_with("Low risk"));
    }

    #[test]
    fn test_assessment_rounds_confidence_percent() {
        let assessment = Assessment::new(1, 0.82345);
        assert_eq!(assessment.confidence, 82.3);
        assert_eq!(assessment.label, DISEASE_LABEL);
        assert_eq!(assessment.recommendation, HIGH_RISK_ADVICE);
        assert!(uuid::Uuid::parse_str(&assessment.prediction_id).is_ok());
    }

    #[test]
    fn test_assessment_serialization() {
        let assessment = Assessment::new(0, 0.61);

        let json = serde_json::to_string(&assessment).unwrap();
        let deserialized: Assessment = serde_json::from_str(&json).unwrap();

        assert_eq!(assessment.prediction_id, deserialized.prediction_id);
        assert_eq!(assessment.confidence, deserialized.confidence);
        assert_eq!(deserialized.label, HEALTHY_LABEL);
    }
}
