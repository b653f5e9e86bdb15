//! Fraud Detection Review Library
//!
//! Risk tier classification and detection explanations for transactions
//! shown on the fraud dashboard's simulation result view.

pub mod classifier;
pub mod client;
pub mod config;
pub mod decode;
pub mod error;
pub mod metrics;
pub mod resolver;
pub mod summary;
pub mod types;
pub mod view;

#[cfg(test)]
pub(crate) mod test_support;

pub use classifier::{classify, Classification, RiskTier, RiskTierThresholds};
pub use client::{HttpReviewClient, ReviewApi};
pub use config::AppConfig;
pub use error::{ReviewError, ReviewResult};
pub use resolver::{DetectionExplanation, DetectionResolver, FetchOutcome, FetchState};
pub use types::{Anomaly, DetectionDetails, RawNumber, Transaction, TriggeredBy};
pub use view::{Prefetched, SimulationView, ViewState};
