//! Detection explanation for a single transaction view.
//!
//! Three sources are checked in strict priority order every time the view
//! resolves: the first explicit anomaly, then detection details (handed in by
//! the caller or fetched on demand), and finally an on-demand fetch trigger.
//! A fetched verdict is cached for the lifetime of the resolver and from then
//! on always wins over the trigger.

use crate::client::ReviewApi;
use crate::metrics::ReviewMetrics;
use crate::types::{Anomaly, DetectionDetails};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tracing::{debug, info, warn};

const DEFAULT_TRIGGER_KIND: &str = "ML Model";
const DEFAULT_ALGORITHM: &str = "Unknown";
const DEFAULT_MODEL: &str = "unknown";
const DEFAULT_PROBABILITY: &str = "0.00";

/// Progress of the on-demand prediction request.
///
/// `Fetching` blocks re-triggering. Both settled states are final for the
/// lifetime of the view; a fresh resolver is needed to ask again. A fetch
/// whose future is dropped before settling goes back to `Idle`.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchState {
    Idle,
    Fetching,
    Resolved(DetectionDetails),
    /// Holds details whose `error` is set
    Failed(DetectionDetails),
}

impl FetchState {
    fn details(&self) -> Option<&DetectionDetails> {
        match self {
            FetchState::Resolved(details) | FetchState::Failed(details) => Some(details),
            FetchState::Idle | FetchState::Fetching => None,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.details().is_some()
    }
}

/// Which source produced an explanation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionPath {
    Anomaly,
    Detection,
    Pending,
}

/// Displayable answer to "why was this transaction flagged?"
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetectionExplanation {
    /// Raised by an explicit anomaly
    Anomaly {
        trigger: String,
        algorithm: String,
        version: Option<String>,
        description: Option<String>,
    },
    /// Model verdict is available
    Detection {
        source: String,
        model: String,
        probability: String,
    },
    /// The prediction request failed; the error replaces the probability line
    DetectionFailed { source: String, error: String },
    /// Nothing known yet; a fetch can be triggered unless one is running
    Pending { source: String, fetching: bool },
}

impl DetectionExplanation {
    pub fn path(&self) -> ResolutionPath {
        match self {
            DetectionExplanation::Anomaly { .. } => ResolutionPath::Anomaly,
            DetectionExplanation::Detection { .. }
            | DetectionExplanation::DetectionFailed { .. } => ResolutionPath::Detection,
            DetectionExplanation::Pending { .. } => ResolutionPath::Pending,
        }
    }

    /// Label for the fetch trigger, if one should be offered
    pub fn action_label(&self) -> Option<&'static str> {
        match self {
            DetectionExplanation::Pending { fetching: true, .. } => Some("Checking..."),
            DetectionExplanation::Pending { fetching: false, .. } => Some("Show detection details"),
            _ => None,
        }
    }

    /// Whether the fetch trigger accepts input
    pub fn can_fetch(&self) -> bool {
        matches!(self, DetectionExplanation::Pending { fetching: false, .. })
    }
}

impl fmt::Display for DetectionExplanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectionExplanation::Anomaly {
                trigger,
                algorithm,
                version,
                description,
            } => {
                writeln!(f, "{}", trigger)?;
                write!(f, "Algorithm: {}", algorithm)?;
                if let Some(version) = version {
                    write!(f, " v{}", version)?;
                }
                if let Some(description) = description {
                    write!(f, "\n{}", description)?;
                }
                Ok(())
            }
            DetectionExplanation::Detection {
                source,
                model,
                probability,
            } => write!(f, "{}\nModel: {} - Probability: {}", source, model, probability),
            DetectionExplanation::DetectionFailed { source, error } => {
                write!(f, "{}\nDetection details unavailable: {}", source, error)
            }
            DetectionExplanation::Pending { source, .. } => {
                write!(f, "{}\nNo explicit anomaly was created.", source)
            }
        }
    }
}

/// Why a fetch trigger did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AnomalyPresent,
    MissingTransactionId,
    InFlight,
    AlreadySettled,
}

/// Result of one fetch trigger
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Resolved,
    Failed(String),
    Skipped(SkipReason),
}

#[derive(Debug)]
struct Inner {
    state: FetchState,
    settled_at: Option<DateTime<Utc>>,
}

/// Per-view detection resolver. Owns the cached verdict for one transaction.
#[derive(Debug)]
pub struct DetectionResolver {
    transaction_id: String,
    anomalies: Vec<Anomaly>,
    detection_source: String,
    inner: Mutex<Inner>,
    metrics: Option<Arc<ReviewMetrics>>,
}

impl DetectionResolver {
    /// Create a resolver. Pre-supplied details count as already resolved.
    pub fn new(
        transaction_id: impl Into<String>,
        anomalies: Vec<Anomaly>,
        detection_details: Option<DetectionDetails>,
        detection_source: impl Into<String>,
    ) -> Self {
        let state = match detection_details {
            Some(details) if details.is_error() => FetchState::Failed(details),
            Some(details) => FetchState::Resolved(details),
            None => FetchState::Idle,
        };

        Self {
            transaction_id: transaction_id.into(),
            anomalies,
            detection_source: detection_source.into(),
            inner: Mutex::new(Inner {
                state,
                settled_at: None,
            }),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<ReviewMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn transaction_id(&self) -> &str {
        &self.transaction_id
    }

    pub fn anomalies(&self) -> &[Anomaly] {
        &self.anomalies
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the fetch state
    pub fn fetch_state(&self) -> FetchState {
        self.lock().state.clone()
    }

    /// When the on-demand fetch settled, if it ran
    pub fn settled_at(&self) -> Option<DateTime<Utc>> {
        self.lock().settled_at
    }

    /// Detection details currently known, pre-supplied or fetched
    pub fn detection_details(&self) -> Option<DetectionDetails> {
        self.lock().state.details().cloned()
    }

    /// Resolve the explanation from the highest-priority source with data
    pub fn resolve(&self) -> DetectionExplanation {
        if let Some(first) = self.anomalies.first() {
            let trigger = first.triggered_by.clone().unwrap_or_default();
            return DetectionExplanation::Anomaly {
                trigger: trigger.kind.unwrap_or_else(|| DEFAULT_TRIGGER_KIND.to_string()),
                algorithm: trigger
                    .algorithm
                    .unwrap_or_else(|| DEFAULT_ALGORITHM.to_string()),
                version: trigger.version,
                description: trigger.description,
            };
        }

        let source = self.detection_source.clone();
        let inner = self.lock();
        match &inner.state {
            FetchState::Resolved(details) | FetchState::Failed(details) => {
                explain_details(source, details)
            }
            FetchState::Idle => DetectionExplanation::Pending {
                source,
                fetching: false,
            },
            FetchState::Fetching => DetectionExplanation::Pending {
                source,
                fetching: true,
            },
        }
    }

    /// Request a prediction for this transaction and cache the answer.
    ///
    /// Only the first trigger from `Idle` reaches the API; every other call is
    /// a no-op reported as `Skipped`. Failures are stored, never returned as errors.
    pub async fn fetch_detection(&self, api: &dyn ReviewApi) -> FetchOutcome {
        if !self.anomalies.is_empty() {
            return FetchOutcome::Skipped(SkipReason::AnomalyPresent);
        }
        if self.transaction_id.is_empty() {
            return FetchOutcome::Skipped(SkipReason::MissingTransactionId);
        }

        {
            let mut inner = self.lock();
            match inner.state {
                FetchState::Idle => inner.state = FetchState::Fetching,
                FetchState::Fetching => {
                    debug!(transaction_id = %self.transaction_id, "Detection fetch already in flight");
                    return FetchOutcome::Skipped(SkipReason::InFlight);
                }
                FetchState::Resolved(_) | FetchState::Failed(_) => {
                    return FetchOutcome::Skipped(SkipReason::AlreadySettled);
                }
            }
        }

        let mut guard = FetchGuard {
            resolver: self,
            armed: true,
        };

        let started = Instant::now();
        let result = api.request_prediction(&self.transaction_id).await;
        let elapsed = started.elapsed();

        let (state, outcome) = match result {
            Ok(details) if details.is_error() => {
                let message = details.error.clone().unwrap_or_default();
                (FetchState::Failed(details), FetchOutcome::Failed(message))
            }
            Ok(details) => (FetchState::Resolved(details), FetchOutcome::Resolved),
            Err(e) => {
                let details = DetectionDetails::from_error(e.display_message());
                let message = details.error.clone().unwrap_or_default();
                (FetchState::Failed(details), FetchOutcome::Failed(message))
            }
        };

        match &outcome {
            FetchOutcome::Failed(message) => warn!(
                transaction_id = %self.transaction_id,
                error = %message,
                "Failed to fetch detection details"
            ),
            _ => info!(
                transaction_id = %self.transaction_id,
                elapsed_ms = elapsed.as_millis() as u64,
                "Detection details fetched"
            ),
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_fetch(elapsed, matches!(outcome, FetchOutcome::Resolved));
        }

        guard.armed = false;
        let mut inner = self.lock();
        inner.state = state;
        inner.settled_at = Some(Utc::now());
        outcome
    }

    pub fn detection_source(&self) -> &str {
        &self.detection_source
    }
}

/// Returns the resolver to `Idle` if a fetch future is dropped before it settles.
struct FetchGuard<'a> {
    resolver: &'a DetectionResolver,
    armed: bool,
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut inner = self.resolver.lock();
        if matches!(inner.state, FetchState::Fetching) {
            inner.state = FetchState::Idle;
            debug!(
                transaction_id = %self.resolver.transaction_id,
                "Detection fetch cancelled before settling"
            );
        }
    }
}

fn explain_details(source: String, details: &DetectionDetails) -> DetectionExplanation {
    if let Some(error) = &details.error {
        return DetectionExplanation::DetectionFailed {
            source,
            error: error.clone(),
        };
    }

    DetectionExplanation::Detection {
        source,
        model: details
            .model
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        probability: details
            .probability
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| DEFAULT_PROBABILITY.to_string()),
    }
}
