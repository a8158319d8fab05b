//! Prediction - feature alignment, coercion and label lookup
//!
//! Turns a loosely typed JSON payload into the single numeric row the
//! classifier expects, and the classifier's raw output back into a code
//! and a human readable label.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::classifier::Classifier;
use crate::{AppError, AppResult};

/// Column order used when the model does not record its own
pub const FALLBACK_FEATURES: [&str; 10] = [
    "period",
    "duration",
    "depth",
    "planet_radius",
    "stellar_temperature",
    "stellar_gravity",
    "stellar_radius",
    "magnitude",
    "snr",
    "equilibrium_temp",
];

/// Payload key carrying the user's ground-truth label
pub const KNOWN_DISPOSITION_KEY: &str = "known_disposition";

/// Human readable label for a class code
pub fn label_for(code: i64) -> String {
    match code {
        1 => "exoplanet".to_string(),
        2 => "candidate of exoplanet".to_string(),
        0 => "not an exoplanet".to_string(),
        other => other.to_string(),
    }
}

/// Feature order for this model
pub fn expected_features(model: &dyn Classifier) -> Vec<String> {
    match model.feature_names() {
        Some(names) if !names.is_empty() => names.to_vec(),
        _ => FALLBACK_FEATURES.iter().map(|s| s.to_string()).collect(),
    }
}

/// Payload values aligned to the model's feature order
#[derive(Debug, Clone)]
pub struct AlignedFeatures {
    /// Values as received, `0` where absent. This is what feedback stores.
    pub raw: Map<String, Value>,
    /// Numeric row handed to the classifier
    pub row: Vec<f64>,
}

pub fn align_features(payload: &Map<String, Value>, expected: &[String]) -> AlignedFeatures {
    let mut raw = Map::with_capacity(expected.len());
    let mut row = Vec::with_capacity(expected.len());

    for name in expected {
        let value = payload.get(name).cloned().unwrap_or_else(|| Value::from(0));
        row.push(coerce_numeric(&value));
        raw.insert(name.clone(), value);
    }

    AlignedFeatures { raw, row }
}

/// Best-effort numeric value. Anything that is not actually numeric is 0.
pub fn coerce_numeric(value: &Value) -> f64 {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    };

    match number {
        Some(n) if n.is_finite() => n,
        _ => 0.0,
    }
}

/// Reduce whatever the model returned to a plain integer class code.
///
/// Accepts scalars, numeric strings, single-element arrays and objects
/// wrapping the number under `value` or `item`.
pub fn normalize_class(output: &Value) -> AppResult<i64> {
    let code = match output {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        Value::Bool(b) => Some(i64::from(*b)),
        Value::Array(items) if items.len() == 1 => return normalize_class(&items[0]),
        Value::Object(fields) => {
            match fields.get("value").or_else(|| fields.get("item")) {
                Some(inner) => return normalize_class(inner),
                None => None,
            }
        }
        _ => None,
    };

    code.ok_or_else(|| {
        AppError::PredictionFailed(format!("cannot interpret model output {} as a class code", output))
    })
}

fn integral(n: f64) -> Option<i64> {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Some(n as i64)
    } else {
        None
    }
}

/// Trimmed `known_disposition`, or `None` when absent or blank
pub fn known_disposition(payload: &Map<String, Value>) -> AppResult<Option<String>> {
    match payload.get(KNOWN_DISPOSITION_KEY) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
        }
        Some(other) => Err(AppError::InvalidPayload(format!(
            "{} must be a string, got {}",
            KNOWN_DISPOSITION_KEY, other
        ))),
    }
}

/// Classifier verdict for one payload
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Prediction {
    pub prediction: i64,
    pub label: String,
}

/// Align, coerce and classify one payload
pub fn predict(model: &dyn Classifier, payload: &Map<String, Value>) -> AppResult<(Prediction, AlignedFeatures)> {
    let expected = expected_features(model);
    let features = align_features(payload, &expected);

    let output = model.predict(&features.row)?;
    let code = normalize_class(&output)?;

    Ok((
        Prediction {
            prediction: code,
            label: label_for(code),
        },
        features,
    ))
}

// ============================================================================
// TESTS
// ============================================================================
