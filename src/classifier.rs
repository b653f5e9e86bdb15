//! Risk tier classification of transaction risk scores

use crate::types::transaction::RawNumber;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Risk tier shown on the transaction badge. Derived from the score, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskTier {
    pub const ALL: [RiskTier; 4] = [
        RiskTier::Low,
        RiskTier::Medium,
        RiskTier::High,
        RiskTier::Critical,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RiskTier::Low => "Low",
            RiskTier::Medium => "Medium",
            RiskTier::High => "High",
            RiskTier::Critical => "Critical",
        }
    }

    /// Badge tone for the rendering layer
    pub fn tone(&self) -> BadgeTone {
        match self {
            RiskTier::Low => BadgeTone::Success,
            RiskTier::Medium => BadgeTone::Warning,
            RiskTier::High => BadgeTone::Danger,
            RiskTier::Critical => BadgeTone::Severe,
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Colour family of a risk badge. Medium is the only tone drawn with dark text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeTone {
    Success,
    Warning,
    Danger,
    Severe,
}

/// Tier thresholds, evaluated from critical downwards; the first match wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskTierThresholds {
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

impl Default for RiskTierThresholds {
    fn default() -> Self {
        Self {
            medium: 0.50,
            high: 0.80,
            critical: 0.98,
        }
    }
}

impl RiskTierThresholds {
    /// Determine the tier for an already-parsed score
    pub fn tier_for(&self, score: f64) -> RiskTier {
        if score >= self.critical {
            RiskTier::Critical
        } else if score >= self.high {
            RiskTier::High
        } else if score >= self.medium {
            RiskTier::Medium
        } else {
            RiskTier::Low
        }
    }

    /// Parse and classify a raw score. Never fails: anything unparsable scores 0.
    pub fn classify(&self, input: &RawNumber) -> Classification {
        let score = input.parse().unwrap_or(0.0);
        Classification {
            tier: self.tier_for(score),
            score,
            normalized: score.clamp(0.0, 1.0),
        }
    }
}

/// Classify with the default thresholds
pub fn classify(input: &RawNumber) -> Classification {
    RiskTierThresholds::default().classify(input)
}

/// Tier and normalized score of one transaction.
///
/// The tier is decided on the parsed `score`; `normalized` is that score
/// clamped to [0, 1] and is what the badge shows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Classification {
    pub tier: RiskTier,
    /// Parsed score; finite, but not clamped
    pub score: f64,
    pub normalized: f64,
}

impl Classification {
    /// Score text for the badge. A zero score renders as an empty string.
    pub fn display_score(&self) -> String {
        let score = self.normalized;
        if score == 0.0 {
            String::new()
        } else {
            format!("{:.2}", score)
        }
    }
}
