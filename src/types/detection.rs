//! Detection details returned by `POST /transactions/predict/{id}`

use super::{lenient_string, non_empty};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Fraud probability as reported by the model service.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbabilityValue {
    Number(f64),
    /// Non-numeric payloads are shown verbatim
    Text(String),
}

impl fmt::Display for ProbabilityValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbabilityValue::Number(n) => write!(f, "{:.2}", n),
            ProbabilityValue::Text(s) => f.write_str(s),
        }
    }
}

impl Serialize for ProbabilityValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            ProbabilityValue::Number(n) => serializer.serialize_f64(*n),
            ProbabilityValue::Text(s) => serializer.serialize_str(s),
        }
    }
}

fn probability_value<'de, D>(deserializer: D) -> Result<Option<ProbabilityValue>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64().map(ProbabilityValue::Number),
        Some(Value::String(s)) if !s.is_empty() => Some(ProbabilityValue::Text(s)),
        Some(Value::Bool(b)) => Some(ProbabilityValue::Text(b.to_string())),
        _ => None,
    })
}

/// Model verdict for a single transaction, or the reason one could not be obtained.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawDetectionDetails")]
pub struct DetectionDetails {
    pub model: Option<String>,
    pub probability: Option<ProbabilityValue>,
    pub reason: Option<String>,
    pub error: Option<String>,
}

#[derive(Deserialize)]
struct RawDetectionDetails {
    #[serde(default, deserialize_with = "lenient_string")]
    model_version: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    model: Option<String>,
    #[serde(default, deserialize_with = "probability_value")]
    fraud_probability: Option<ProbabilityValue>,
    #[serde(default, deserialize_with = "probability_value")]
    probability: Option<ProbabilityValue>,
    #[serde(default, deserialize_with = "lenient_string")]
    reason: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    error: Option<String>,
}

impl From<RawDetectionDetails> for DetectionDetails {
    fn from(raw: RawDetectionDetails) -> Self {
        Self {
            model: raw.model_version.or(raw.model),
            probability: raw.fraud_probability.or(raw.probability),
            reason: raw.reason,
            error: raw.error,
        }
    }
}

impl DetectionDetails {
    pub fn new(model: impl Into<String>, probability: f64) -> Self {
        Self {
            model: Some(model.into()),
            probability: Some(ProbabilityValue::Number(probability)),
            ..Self::default()
        }
    }

    /// Details recording a failed prediction request
    pub fn from_error(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            error: non_empty(Some(message)).or_else(|| Some("Prediction request failed".to_string())),
            ..Self::default()
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prediction_field_names() {
        let details: DetectionDetails = serde_json::from_value(json!({
            "is_fraud_prediction": true,
            "fraud_probability": 0.8731,
            "model_version": "2.1",
            "reason": "ML prediction completed",
            "risk_factors": []
        }))
        .unwrap();

        assert_eq!(details.model.as_deref(), Some("2.1"));
        assert_eq!(details.probability, Some(ProbabilityValue::Number(0.8731)));
        assert_eq!(details.reason.as_deref(), Some("ML prediction completed"));
        assert!(!details.is_error());
    }

    #[test]
    fn test_short_field_names() {
        let details: DetectionDetails =
            serde_json::from_value(json!({ "model": "m1", "probability": "high" })).unwrap();
        assert_eq!(details.model.as_deref(), Some("m1"));
        assert_eq!(details.probability.unwrap().to_string(), "high");
    }

    #[test]
    fn test_probability_display() {
        assert_eq!(ProbabilityValue::Number(0.734).to_string(), "0.73");
        assert_eq!(ProbabilityValue::Number(1.0).to_string(), "1.00");
    }

    #[test]
    fn test_from_error_never_empty() {
        assert_eq!(
            DetectionDetails::from_error("timeout").error.as_deref(),
            Some("timeout")
        );
        assert_eq!(
            DetectionDetails::from_error("").error.as_deref(),
            Some("Prediction request failed")
        );
    }
}
