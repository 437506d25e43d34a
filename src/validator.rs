//! Validation and casting of untrusted feature maps against [`SCHEMA`].
//!
//! Validation is total: malformed input never panics or errors out, every
//! problem is reported per field in [`ValidationErrors`].

use crate::schema::{body_mass_index, FeatureKind, FeatureSpec, BMI, HEIGHT, SCHEMA, WEIGHT};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Caller-supplied feature map, values may be strings, numbers or anything else.
pub type RawInput = Map<String, Value>;

/// Feature name to validated value. Only complete when validation produced no errors.
pub type ValidatedFeatures = HashMap<String, f64>;

/// Feature name to a human readable reason. Non-empty means validation failed.
pub type ValidationErrors = BTreeMap<String, String>;

const INTEGER_TOLERANCE: f64 = 1e-6;

/// Validate `raw` against the schema.
///
/// Returns the casted features together with per-field errors. When the error
/// map is non-empty the feature map is partial and must not be scored.
pub fn validate(raw: &RawInput) -> (ValidatedFeatures, ValidationErrors) {
    let mut input = Cow::Borrowed(raw);

    if !has_usable_value(raw, BMI) {
        if let Some(bmi) = derive_bmi(raw) {
            debug!(bmi, "BMI derived from height and weight");
            input.to_mut().insert(BMI.to_string(), Value::from(bmi));
        }
    }

    let mut features = ValidatedFeatures::with_capacity(SCHEMA.len());
    let mut errors = ValidationErrors::new();

    for spec in SCHEMA.iter() {
        let Some(value) = input.get(spec.name) else {
            errors.insert(spec.name.to_string(), "Missing value".to_string());
            continue;
        };

        let parsed = match parse_number(value) {
            Some(v) => Some(v),
            None if spec.name == BMI => derive_bmi(&input),
            None => None,
        };
        let Some(parsed) = parsed else {
            errors.insert(spec.name.to_string(), "Not a number".to_string());
            continue;
        };

        match check(spec, parsed) {
            Ok(v) => {
                features.insert(spec.name.to_string(), v);
            }
            Err(reason) => {
                errors.insert(spec.name.to_string(), reason);
            }
        }
    }

    (features, errors)
}

/// Like [`validate`], but collapses the pair into a `Result`.
pub fn validate_strict(raw: &RawInput) -> Result<ValidatedFeatures, ValidationErrors> {
    let (features, errors) = validate(raw);
    if errors.is_empty() {
        Ok(features)
    } else {
        Err(errors)
    }
}

/// Apply choice, range and integer rules in order; the first failure wins.
fn check(spec: &FeatureSpec, value: f64) -> Result<f64, String> {
    if !spec.allows(value) {
        return Err("Invalid choice".to_string());
    }
    if let Some(min) = spec.min {
        if value < min {
            return Err(format!("Value below minimum {}", min));
        }
    }
    if let Some(max) = spec.max {
        if value > max {
            return Err(format!("Value above maximum {}", max));
        }
    }
    match spec.kind {
        FeatureKind::Int if (value - value.round()).abs() > INTEGER_TOLERANCE => {
            Err("Must be an integer".to_string())
        }
        FeatureKind::Int => Ok(value.round()),
        FeatureKind::Float => Ok(value),
    }
}

/// Numeric reading of an untyped value. Non-finite results are rejected.
pub(crate) fn parse_number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Present and not a blank string.
fn has_usable_value(raw: &RawInput, key: &str) -> bool {
    match raw.get(key) {
        None => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}

/// BMI from the raw height and weight entries, if both parse and height is positive.
fn derive_bmi(raw: &RawInput) -> Option<f64> {
    let height = parse_number(raw.get(HEIGHT)?)?;
    let weight = parse_number(raw.get(WEIGHT)?)?;
    body_mass_index(height, weight).filter(|bmi| bmi.is_finite())
}
