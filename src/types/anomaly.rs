//! Anomaly records as returned by `GET /anomalies?transaction_id={id}`

use super::{lenient_string, non_empty};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What raised an anomaly: a model, a rule, or a manual review.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawTriggeredBy")]
pub struct TriggeredBy {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub algorithm: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
}

/// Wire shape of `triggered_by`. Older records name the algorithm `name`.
#[derive(Deserialize)]
struct RawTriggeredBy {
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    kind: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    algorithm: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    version: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    description: Option<String>,
}

impl From<RawTriggeredBy> for TriggeredBy {
    fn from(raw: RawTriggeredBy) -> Self {
        Self {
            kind: raw.kind,
            algorithm: raw.algorithm.or(raw.name),
            version: raw.version,
            description: raw.description,
        }
    }
}

/// Anomaly raised against a transaction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawAnomaly")]
pub struct Anomaly {
    pub id: Option<String>,
    pub summary: Option<String>,
    pub rule_name: Option<String>,
    pub detection_source: Option<String>,
    pub triggered_by: Option<TriggeredBy>,
}

/// Wire shape of an anomaly. `triggered_by` may be camelCased, and rows
/// that were never re-hydrated still carry it as a JSON-encoded string.
#[derive(Deserialize)]
struct RawAnomaly {
    #[serde(default, deserialize_with = "lenient_string")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    summary: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    rule_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    detection_source: Option<String>,
    #[serde(default)]
    triggered_by: Option<Value>,
    #[serde(default, rename = "triggeredBy")]
    triggered_by_camel: Option<Value>,
}

impl From<RawAnomaly> for Anomaly {
    fn from(raw: RawAnomaly) -> Self {
        let triggered_by = raw
            .triggered_by
            .and_then(decode_trigger)
            .or_else(|| raw.triggered_by_camel.and_then(decode_trigger));

        Self {
            id: raw.id,
            summary: non_empty(raw.summary),
            rule_name: non_empty(raw.rule_name),
            detection_source: non_empty(raw.detection_source),
            triggered_by,
        }
    }
}

fn decode_trigger(value: Value) -> Option<TriggeredBy> {
    let value = match value {
        Value::String(encoded) => serde_json::from_str::<Value>(&encoded).ok()?,
        other => other,
    };
    if !value.is_object() {
        return None;
    }
    serde_json::from_value(value).ok()
}

impl Anomaly {
    /// Line shown in the anomaly list: summary, then rule name, then the raw record.
    pub fn display_line(&self) -> String {
        if let Some(summary) = &self.summary {
            return summary.clone();
        }
        if let Some(rule) = &self.rule_name {
            return rule.clone();
        }
        serde_json::to_string(self).unwrap_or_default()
    }
}
