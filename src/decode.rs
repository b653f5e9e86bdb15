//! Validation of API response bodies into the normalized schema.
//!
//! Each decoder accepts the JSON body of one endpoint and either yields the
//! normalized record or a reason the body could not be understood. Field
//! aliases (`triggeredBy`, `model_version`, ...) are folded by the record types
//! themselves, so callers only ever see one shape.

use crate::types::{Anomaly, DetectionDetails, Transaction};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Outcome of decoding one response body
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<T> {
    Ok(T),
    Malformed(String),
}

impl<T> Decoded<T> {
    pub fn ok(self) -> Option<T> {
        match self {
            Decoded::Ok(value) => Some(value),
            Decoded::Malformed(_) => None,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Decoded::Ok(_))
    }

    pub fn into_result(self) -> Result<T, String> {
        match self {
            Decoded::Ok(value) => Ok(value),
            Decoded::Malformed(reason) => Err(reason),
        }
    }
}

fn decode_object<T: DeserializeOwned>(value: &Value, what: &str) -> Decoded<T> {
    if !value.is_object() {
        return Decoded::Malformed(format!("expected {} object, got {}", what, kind_of(value)));
    }
    match serde_json::from_value(value.clone()) {
        Ok(decoded) => Decoded::Ok(decoded),
        Err(e) => Decoded::Malformed(format!("invalid {}: {}", what, e)),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Decode a `GET /transactions/{id}` body
pub fn decode_transaction(body: &Value) -> Decoded<Transaction> {
    decode_object(body, "transaction")
}

/// Decode a `GET /anomalies?transaction_id=` body of the form `{ "anomalies": [...] }`.
///
/// A missing or null `anomalies` key means no anomalies were raised.
pub fn decode_anomalies(body: &Value) -> Decoded<Vec<Anomaly>> {
    let Some(object) = body.as_object() else {
        return Decoded::Malformed(format!("expected anomaly listing object, got {}", kind_of(body)));
    };

    let items = match object.get("anomalies") {
        None | Some(Value::Null) => return Decoded::Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Decoded::Malformed(format!("expected anomalies array, got {}", kind_of(other)))
        }
    };

    let mut anomalies = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match decode_object::<Anomaly>(item, "anomaly") {
            Decoded::Ok(anomaly) => anomalies.push(anomaly),
            Decoded::Malformed(reason) => {
                return Decoded::Malformed(format!("anomalies[{}]: {}", index, reason))
            }
        }
    }
    Decoded::Ok(anomalies)
}

/// Decode a `POST /transactions/predict/{id}` body.
///
/// The endpoint wraps the verdict as `{ "transaction": ..., "prediction": {...} }`;
/// older deployments return the verdict object directly.
pub fn decode_prediction(body: &Value) -> Decoded<DetectionDetails> {
    match body.get("prediction") {
        Some(prediction) if !prediction.is_null() => decode_object(prediction, "prediction"),
        _ => decode_object(body, "prediction"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProbabilityValue;
    use serde_json::json;

    #[test]
    fn test_transaction_must_be_object() {
        assert!(decode_transaction(&json!({ "transaction_id": "T1" })).is_ok());

        match decode_transaction(&json!("T1")) {
            Decoded::Malformed(reason) => assert!(reason.contains("string")),
            Decoded::Ok(_) => panic!("string body accepted as transaction"),
        }
    }

    #[test]
    fn test_anomaly_listing() {
        let decoded = decode_anomalies(&json!({
            "anomalies": [
                { "id": 1, "summary": "Velocity spike", "triggered_by": { "type": "Velocity", "algorithm": "RuleX" } },
                { "id": 2, "triggeredBy": { "name": "IsolationForest" } }
            ],
            "total": 2
        }))
        .ok()
        .unwrap();

        assert_eq!(decoded.len(), 2);
        assert_eq!(
            decoded[1].triggered_by.as_ref().unwrap().algorithm.as_deref(),
            Some("IsolationForest")
        );
    }

    #[test]
    fn test_anomaly_listing_edge_cases() {
        assert_eq!(decode_anomalies(&json!({})), Decoded::Ok(Vec::new()));
        assert_eq!(decode_anomalies(&json!({ "anomalies": null })), Decoded::Ok(Vec::new()));
        assert!(!decode_anomalies(&json!({ "anomalies": {} })).is_ok());
        assert!(!decode_anomalies(&json!([])).is_ok());

        let bad_item = decode_anomalies(&json!({ "anomalies": [{}, 3] }));
        assert_eq!(
            bad_item.into_result().unwrap_err(),
            "anomalies[1]: expected anomaly object, got number"
        );
    }

    #[test]
    fn test_wrapped_and_bare_prediction() {
        let wrapped = decode_prediction(&json!({
            "transaction": { "transaction_id": "T1" },
            "prediction": { "model_version": "1.0", "fraud_probability": 0.61 }
        }))
        .ok()
        .unwrap();
        assert_eq!(wrapped.model.as_deref(), Some("1.0"));
        assert_eq!(wrapped.probability, Some(ProbabilityValue::Number(0.61)));

        let bare = decode_prediction(&json!({ "model": "m1", "probability": 0.734 }))
            .ok()
            .unwrap();
        assert_eq!(bare.model.as_deref(), Some("m1"));

        assert!(!decode_prediction(&json!(null)).is_ok());
        assert!(!decode_prediction(&json!({ "prediction": 0.5 })).is_ok());
    }
}
