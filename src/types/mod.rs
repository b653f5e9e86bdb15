//! Type definitions for the dashboard API snapshots

pub mod anomaly;
pub mod detection;
pub mod transaction;

pub use anomaly::{Anomaly, TriggeredBy};
pub use detection::{DetectionDetails, ProbabilityValue};
pub use transaction::{RawNumber, Transaction};

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Accept a string or a number for identifier-like fields; anything else is absent.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => non_empty(Some(s)),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Empty strings count as missing, the same way the dashboard treats them.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
