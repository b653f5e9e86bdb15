//! Transaction snapshot as returned by `GET /transactions/{id}`

use super::lenient_string;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// A numeric field whose wire shape is not guaranteed.
///
/// The API serializes decimal columns either as JSON numbers or as numeric
/// strings, and may omit them entirely.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RawNumber {
    Number(f64),
    Text(String),
    #[default]
    Missing,
}

impl RawNumber {
    /// Parse into a finite float. Unparsable text and non-finite values yield `None`.
    ///
    /// Text is read up to its longest numeric prefix, so `"0.85abc"` parses as
    /// `0.85` while `"abc"` does not parse at all.
    pub fn parse(&self) -> Option<f64> {
        let value = match self {
            RawNumber::Number(n) => *n,
            RawNumber::Text(s) => leading_float(s)?,
            RawNumber::Missing => return None,
        };
        value.is_finite().then_some(value)
    }
}

/// Parse the longest `[+-]digits[.digits][e[+-]digits]` prefix after leading whitespace
fn leading_float(text: &str) -> Option<f64> {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_end = digits_from(end);
    let mut digits = int_end - end;
    end = int_end;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        digits += frac_end - (end + 1);
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(bytes.get(end + 1), Some(b'+' | b'-')));
        let exp_start = end + 1 + sign;
        let exp_end = digits_from(exp_start);
        if exp_end > exp_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok()
}

impl From<f64> for RawNumber {
    fn from(value: f64) -> Self {
        RawNumber::Number(value)
    }
}

impl From<&str> for RawNumber {
    fn from(value: &str) -> Self {
        RawNumber::Text(value.to_string())
    }
}

impl<T: Into<RawNumber>> From<Option<T>> for RawNumber {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(RawNumber::Missing)
    }
}

impl<'de> Deserialize<'de> for RawNumber {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_f64().map(RawNumber::Number).unwrap_or_default(),
            Value::String(s) => RawNumber::Text(s),
            _ => RawNumber::Missing,
        })
    }
}

impl Serialize for RawNumber {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            RawNumber::Number(n) => serializer.serialize_f64(*n),
            RawNumber::Text(s) => serializer.serialize_str(s),
            RawNumber::Missing => serializer.serialize_none(),
        }
    }
}

/// Read-only transaction snapshot. Every field may be absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default, deserialize_with = "lenient_string")]
    pub transaction_id: Option<String>,

    #[serde(default)]
    pub amount: RawNumber,

    #[serde(default, deserialize_with = "lenient_string")]
    pub currency: Option<String>,

    /// Model risk score, expected in [0, 1]
    #[serde(default)]
    pub risk_score: RawNumber,

    #[serde(default, deserialize_with = "lenient_string")]
    pub user_id: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub transaction_type: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub device_type: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub location_city: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub location_country: Option<String>,

    /// Engine that flagged the transaction, when the simulator recorded one
    #[serde(default, deserialize_with = "lenient_string")]
    pub detection_source: Option<String>,
}

impl Transaction {
    /// Create a transaction with only an id and risk score set
    pub fn new(transaction_id: impl Into<String>, risk_score: impl Into<RawNumber>) -> Self {
        Self {
            transaction_id: Some(transaction_id.into()),
            risk_score: risk_score.into(),
            ..Self::default()
        }
    }
}
