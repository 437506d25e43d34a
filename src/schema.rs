//! Declarative feature schema for the cardiovascular risk model.
//!
//! The table below is the single source of truth for which measurements the
//! service accepts, how they are bounded, and the exact order in which the
//! ONNX artifact expects them.

use serde::Serialize;

/// Name of the derived body-mass-index feature.
pub const BMI: &str = "BMI";
/// Height in centimetres, used to derive BMI.
pub const HEIGHT: &str = "height";
/// Weight in kilograms, used to derive BMI.
pub const WEIGHT: &str = "weight";

/// Feature names in the order the scoring artifact was exported with.
///
/// Changing membership or order is a breaking change for every deployed model.
pub const FEATURE_ORDER: [&str; 12] = [
    "age",
    "weight",
    "ap_hi",
    "ap_lo",
    "cholesterol",
    "gluc",
    "gender",
    "BMI",
    "height",
    "smoke",
    "alco",
    "active",
];

/// Numeric representation a feature is cast to after validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    Int,
    Float,
}

/// One allowed value of an enumerated feature
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Choice {
    pub value: f64,
    pub label: &'static str,
}

/// Validation and display rules for a single feature
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureSpec {
    pub name: &'static str,
    /// Display label, not used by validation
    pub label: &'static str,
    #[serde(rename = "type")]
    pub kind: FeatureKind,
    /// Inclusive lower bound
    pub min: Option<f64>,
    /// Inclusive upper bound
    pub max: Option<f64>,
    /// Form input step hint, not enforced
    pub step: f64,
    /// When present, the value must be one of these exactly
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<&'static [Choice]>,
    /// Derivable from other features; clients may leave it blank
    pub readonly: bool,
}

impl FeatureSpec {
    const fn int(name: &'static str, label: &'static str, min: f64, max: f64) -> Self {
        Self {
            name,
            label,
            kind: FeatureKind::Int,
            min: Some(min),
            max: Some(max),
            step: 1.0,
            choices: None,
            readonly: false,
        }
    }

    const fn select(
        name: &'static str,
        label: &'static str,
        choices: &'static [Choice],
        min: f64,
        max: f64,
    ) -> Self {
        Self {
            name,
            label,
            kind: FeatureKind::Int,
            min: Some(min),
            max: Some(max),
            step: 1.0,
            choices: Some(choices),
            readonly: false,
        }
    }

    /// Whether `value` is one of the enumerated choices.
    ///
    /// Features without choices accept any value here.
    pub fn allows(&self, value: f64) -> bool {
        match self.choices {
            Some(choices) => choices.iter().any(|c| c.value == value),
            None => true,
        }
    }

    /// Whether `value` lies inside the inclusive `[min, max]` bounds.
    pub fn in_range(&self, value: f64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }
}

const LEVELS: &[Choice] = &[
    Choice { value: 1.0, label: "1 — normal" },
    Choice { value: 2.0, label: "2 — above normal" },
    Choice { value: 3.0, label: "3 — well above normal" },
];

const GENDERS: &[Choice] = &[
    Choice { value: 1.0, label: "Female" },
    Choice { value: 2.0, label: "Male" },
];

const YES_NO: &[Choice] = &[
    Choice { value: 0.0, label: "No" },
    Choice { value: 1.0, label: "Yes" },
];

/// Schema entries, listed in [`FEATURE_ORDER`].
pub static SCHEMA: [FeatureSpec; 12] = [
    FeatureSpec::int("age", "Age (years)", 1.0, 120.0),
    FeatureSpec {
        name: "weight",
        label: "Weight (kg)",
        kind: FeatureKind::Float,
        min: Some(20.0),
        max: Some(300.0),
        step: 0.1,
        choices: None,
        readonly: false,
    },
    FeatureSpec::int("ap_hi", "Systolic BP (mmHg)", 70.0, 250.0),
    FeatureSpec::int("ap_lo", "Diastolic BP (mmHg)", 40.0, 150.0),
    FeatureSpec::select("cholesterol", "Cholesterol", LEVELS, 1.0, 3.0),
    FeatureSpec::select("gluc", "Glucose", LEVELS, 1.0, 3.0),
    FeatureSpec::select("gender", "Gender", GENDERS, 1.0, 2.0),
    FeatureSpec {
        name: "BMI",
        label: "BMI (auto-calculated)",
        kind: FeatureKind::Float,
        min: Some(10.0),
        max: Some(60.0),
        step: 0.1,
        choices: None,
        readonly: true,
    },
    FeatureSpec::int("height", "Height (cm)", 100.0, 250.0),
    FeatureSpec::select("smoke", "Smoker", YES_NO, 0.0, 1.0),
    FeatureSpec::select("alco", "Alcohol use", YES_NO, 0.0, 1.0),
    FeatureSpec::select("active", "Physically active", YES_NO, 0.0, 1.0),
];

/// Look up the rules for a feature by name.
pub fn feature_spec(name: &str) -> Option<&'static FeatureSpec> {
    SCHEMA.iter().find(|spec| spec.name == name)
}

/// Body mass index from weight in kilograms and height in centimetres.
///
/// Returns `None` when height is not strictly positive.
pub fn body_mass_index(height_cm: f64, weight_kg: f64) -> Option<f64> {
    if height_cm > 0.0 {
        let metres = height_cm / 100.0;
        Some(weight_kg / (metres * metres))
    } else {
        None
    }
}
