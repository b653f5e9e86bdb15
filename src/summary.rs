//! Display fields for the simulated transaction header and detail panel

use crate::config::DisplayDefaults;
use crate::types::Transaction;
use serde::Serialize;

const MASK_HEAD: usize = 8;
const MASK_TAIL: usize = 6;

/// Transaction fields formatted for display, with fallbacks applied
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionSummary {
    pub transaction_id: String,
    /// Amount with currency prefix, e.g. `MWK1,250.5`
    pub amount: String,
    pub user: String,
    pub transaction_type: String,
    pub device: String,
    pub location: String,
}

impl TransactionSummary {
    pub fn from_transaction(transaction: &Transaction, defaults: &DisplayDefaults) -> Self {
        let amount = match transaction.amount.parse() {
            Some(value) => format!(
                "{}{}",
                transaction.currency.as_deref().unwrap_or(""),
                format_amount(value)
            ),
            None => "N/A".to_string(),
        };

        Self {
            transaction_id: transaction.transaction_id.clone().unwrap_or_default(),
            amount,
            user: transaction
                .user_id
                .as_deref()
                .map(mask_identifier)
                .unwrap_or_else(|| "N/A".to_string()),
            transaction_type: transaction
                .transaction_type
                .clone()
                .unwrap_or_else(|| defaults.default_transaction_type.clone()),
            device: transaction
                .device_type
                .clone()
                .unwrap_or_else(|| defaults.default_device_type.clone()),
            location: format_location(
                transaction.location_city.as_deref(),
                transaction.location_country.as_deref(),
            ),
        }
    }

    /// Navigation target of the "Investigate" action
    pub fn investigate_path(&self) -> String {
        format!("/case-review/{}", self.transaction_id)
    }

    /// Navigation target of the "Open Transaction" action
    pub fn transaction_path(&self) -> String {
        format!("/transactions/{}", self.transaction_id)
    }
}

/// Group thousands and keep at most two fraction digits, trimming trailing zeros
pub fn format_amount(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    let negative = rounded < 0.0;
    let fixed = format!("{:.2}", rounded.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let fraction = fraction.trim_end_matches('0');
    let sign = if negative { "-" } else { "" };
    if fraction.is_empty() {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{}", sign, grouped, fraction)
    }
}

/// Shorten long identifiers to `head...tail`
pub fn mask_identifier(id: &str) -> String {
    let chars: Vec<char> = id.chars().collect();
    if chars.len() <= MASK_HEAD + MASK_TAIL {
        return id.to_string();
    }
    let head: String = chars[..MASK_HEAD].iter().collect();
    let tail: String = chars[chars.len() - MASK_TAIL..].iter().collect();
    format!("{}...{}", head, tail)
}

fn format_location(city: Option<&str>, country: Option<&str>) -> String {
    match (city, country) {
        (Some(city), Some(country)) => format!("{}, {}", city, country),
        (Some(city), None) => city.to_string(),
        (None, Some(country)) => country.to_string(),
        (None, None) => "Unknown".to_string(),
    }
}
