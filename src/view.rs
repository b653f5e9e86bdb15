//! Load state of one simulated transaction view

use crate::classifier::{Classification, RiskTierThresholds};
use crate::client::ReviewApi;
use crate::config::{AppConfig, DisplayDefaults};
use crate::metrics::ReviewMetrics;
use crate::resolver::{DetectionExplanation, DetectionResolver, FetchOutcome};
use crate::summary::TransactionSummary;
use crate::types::{Anomaly, DetectionDetails, Transaction};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

const LOAD_FAILED_MESSAGE: &str = "Failed to load simulated transaction";

/// Source named when anomalies exist but none of them says where it came from
pub const RULE_ENGINE_SOURCE: &str = "Rule Engine";

/// Pick the detection source label: the transaction's own source, then the
/// first anomaly's source or rule name, then a rule-engine or configured default.
pub fn resolve_detection_source(
    transaction: &Transaction,
    anomalies: &[Anomaly],
    defaults: &DisplayDefaults,
) -> String {
    let first = anomalies.first();
    transaction
        .detection_source
        .clone()
        .or_else(|| first.and_then(|a| a.detection_source.clone()))
        .or_else(|| first.and_then(|a| a.rule_name.clone()))
        .unwrap_or_else(|| {
            if first.is_some() {
                RULE_ENGINE_SOURCE.to_string()
            } else {
                defaults.default_detection_source.clone()
            }
        })
}

/// Data the caller already holds when opening the view, e.g. straight after
/// running a simulation. When a transaction is present nothing is fetched.
#[derive(Debug, Clone, Default)]
pub struct Prefetched {
    pub transaction: Option<Transaction>,
    pub anomalies: Vec<Anomaly>,
    pub detection_details: Option<DetectionDetails>,
    pub detection_source: Option<String>,
}

/// Outcome of loading a view. Replaces separate loading and error flags.
#[derive(Debug)]
pub enum ViewState {
    Ready(Box<ViewModel>),
    NotFound,
    Failed(String),
}

impl ViewState {
    pub fn ready(&self) -> Option<&ViewModel> {
        match self {
            ViewState::Ready(model) => Some(model),
            _ => None,
        }
    }

    /// Message shown in place of the view when it is not ready
    pub fn message(&self) -> Option<String> {
        match self {
            ViewState::Ready(_) => None,
            ViewState::NotFound => Some("Simulated transaction not found.".to_string()),
            ViewState::Failed(message) => Some(message.clone()),
        }
    }
}

/// Everything the rendering layer needs for a loaded transaction
#[derive(Debug)]
pub struct ViewModel {
    /// Correlates log lines of one view
    pub view_id: Uuid,
    pub summary: TransactionSummary,
    pub classification: Classification,
    resolver: DetectionResolver,
}

impl ViewModel {
    pub fn explanation(&self) -> DetectionExplanation {
        self.resolver.resolve()
    }

    pub fn resolver(&self) -> &DetectionResolver {
        &self.resolver
    }

    pub fn anomalies(&self) -> &[Anomaly] {
        self.resolver.anomalies()
    }

    /// Lines of the anomaly list; empty when the transaction was scored without one
    pub fn anomaly_lines(&self) -> Vec<String> {
        self.anomalies().iter().map(Anomaly::display_line).collect()
    }

    /// Handler for the "Show detection details" action
    pub async fn fetch_detection(&self, api: &dyn ReviewApi) -> FetchOutcome {
        debug!(view_id = %self.view_id, "Detection details requested");
        self.resolver.fetch_detection(api).await
    }
}

/// Builds view models for simulated transactions
#[derive(Debug, Clone, Default)]
pub struct SimulationView {
    thresholds: RiskTierThresholds,
    defaults: DisplayDefaults,
    metrics: Option<Arc<ReviewMetrics>>,
}

impl SimulationView {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            thresholds: config.classification.clone(),
            defaults: config.display.clone(),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<ReviewMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Load the view for `transaction_id`.
    ///
    /// Anomalies are best effort: if the transaction loads but its anomalies
    /// do not, the view is still ready with an empty list.
    pub async fn load(
        &self,
        api: &dyn ReviewApi,
        transaction_id: &str,
        prefetched: Prefetched,
    ) -> ViewState {
        let Prefetched {
            transaction,
            anomalies,
            detection_details,
            detection_source,
        } = prefetched;

        let (transaction, anomalies) = match transaction {
            Some(transaction) => (transaction, anomalies),
            None => match api.fetch_transaction(transaction_id).await {
                Ok(transaction) => {
                    let anomalies = match api.fetch_anomalies(transaction_id).await {
                        Ok(anomalies) => anomalies,
                        Err(e) => {
                            warn!(
                                transaction_id = %transaction_id,
                                error = %e,
                                "Failed to load anomalies, continuing without them"
                            );
                            Vec::new()
                        }
                    };
                    (transaction, anomalies)
                }
                Err(e) if e.is_not_found() => {
                    self.record_failure();
                    return ViewState::NotFound;
                }
                Err(e) => {
                    warn!(transaction_id = %transaction_id, error = %e, "Failed to load transaction");
                    self.record_failure();
                    let message = e.display_message();
                    return ViewState::Failed(if message.is_empty() {
                        LOAD_FAILED_MESSAGE.to_string()
                    } else {
                        message
                    });
                }
            },
        };

        let model = self.build(transaction_id, transaction, anomalies, detection_details, detection_source);
        info!(
            view_id = %model.view_id,
            transaction_id = %transaction_id,
            risk_tier = %model.classification.tier,
            anomalies = model.anomalies().len(),
            "Simulated transaction view ready"
        );
        ViewState::Ready(Box::new(model))
    }

    fn build(
        &self,
        transaction_id: &str,
        transaction: Transaction,
        anomalies: Vec<Anomaly>,
        detection_details: Option<DetectionDetails>,
        detection_source: Option<String>,
    ) -> ViewModel {
        let classification = self.thresholds.classify(&transaction.risk_score);

        let mut summary = TransactionSummary::from_transaction(&transaction, &self.defaults);
        if summary.transaction_id.is_empty() {
            summary.transaction_id = transaction_id.to_string();
        }

        let source = detection_source
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| resolve_detection_source(&transaction, &anomalies, &self.defaults));
        let mut resolver = DetectionResolver::new(transaction_id, anomalies, detection_details, source);
        if let Some(metrics) = &self.metrics {
            resolver = resolver.with_metrics(metrics.clone());
            metrics.record_view(classification.tier, resolver.resolve().path());
        }

        ViewModel {
            view_id: Uuid::new_v4(),
            summary,
            classification,
            resolver,
        }
    }

    fn record_failure(&self) {
        if let Some(metrics) = &self.metrics {
            metrics.record_view_failure();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::RiskTier;
    use crate::error::ReviewError;
    use crate::resolver::ResolutionPath;
    use crate::test_support::MockReviewApi;
    use crate::types::{RawNumber, TriggeredBy};

    fn transaction(score: &str) -> Transaction {
        Transaction {
            amount: RawNumber::Number(1500.0),
            currency: Some("USD".into()),
            ..Transaction::new("T1", score)
        }
    }

    #[tokio::test]
    async fn test_load_fetches_transaction_and_anomalies() {
        let api = MockReviewApi::default()
            .with_transaction(Ok(transaction("0.985")))
            .with_anomalies(Ok(vec![Anomaly {
                summary: Some("Amount far above user average".into()),
                triggered_by: Some(TriggeredBy {
                    kind: Some("ML Model".into()),
                    algorithm: Some("IsolationForest".into()),
                    ..TriggeredBy::default()
                }),
                ..Anomaly::default()
            }]));

        let state = SimulationView::default().load(&api, "T1", Prefetched::default()).await;
        let model = state.ready().unwrap();

        assert_eq!(model.classification.tier, RiskTier::Critical);
        assert_eq!(model.summary.amount, "USD1,500");
        assert_eq!(model.anomaly_lines(), vec!["Amount far above user average".to_string()]);
        assert_eq!(model.explanation().path(), ResolutionPath::Anomaly);
        assert_eq!(api.transaction_calls(), 1);
        assert_eq!(api.anomaly_calls(), 1);
    }

    #[tokio::test]
    async fn test_anomaly_failure_is_ignored() {
        let api = MockReviewApi::default()
            .with_transaction(Ok(transaction("0.6")))
            .with_anomalies(Err(ReviewError::Status {
                status: 500,
                message: "boom".into(),
            }));

        let state = SimulationView::default().load(&api, "T1", Prefetched::default()).await;
        let model = state.ready().unwrap();

        assert_eq!(model.classification.tier, RiskTier::Medium);
        assert!(model.anomaly_lines().is_empty());
        assert!(model.explanation().can_fetch());
    }

    #[tokio::test]
    async fn test_prefetched_view_skips_api() {
        let api = MockReviewApi::default();
        let prefetched = Prefetched {
            transaction: Some(transaction("0.2")),
            detection_details: Some(DetectionDetails::new("m1", 0.734)),
            detection_source: Some("Simulator".into()),
            ..Prefetched::default()
        };

        let state = SimulationView::default().load(&api, "T1", prefetched).await;
        let model = state.ready().unwrap();

        assert_eq!(
            model.explanation().to_string(),
            "Simulator\nModel: m1 - Probability: 0.73"
        );
        assert_eq!(api.transaction_calls(), 0);
        assert_eq!(api.anomaly_calls(), 0);
    }

    #[tokio::test]
    async fn test_not_found_and_failure_states() {
        let missing = MockReviewApi::default();
        let state = SimulationView::default().load(&missing, "T404", Prefetched::default()).await;
        assert!(matches!(state, ViewState::NotFound));
        assert_eq!(state.message().as_deref(), Some("Simulated transaction not found."));

        let failing = MockReviewApi::default().with_transaction(Err(ReviewError::Status {
            status: 500,
            message: "Database unavailable".into(),
        }));
        let state = SimulationView::default().load(&failing, "T1", Prefetched::default()).await;
        assert_eq!(state.message().as_deref(), Some("Database unavailable"));
        assert_eq!(failing.anomaly_calls(), 0);
    }

    #[test]
    fn test_detection_source_chain() {
        let defaults = DisplayDefaults::default();
        let tagged = Anomaly {
            detection_source: Some("Velocity Engine".into()),
            rule_name: Some("velocity_rule".into()),
            ..Anomaly::default()
        };
        let named = Anomaly {
            rule_name: Some("velocity_rule".into()),
            ..Anomaly::default()
        };

        let own = Transaction {
            detection_source: Some("Simulator".into()),
            ..transaction("0.9")
        };
        assert_eq!(
            resolve_detection_source(&own, &[tagged.clone()], &defaults),
            "Simulator"
        );

        let plain = transaction("0.9");
        assert_eq!(
            resolve_detection_source(&plain, &[tagged], &defaults),
            "Velocity Engine"
        );
        assert_eq!(
            resolve_detection_source(&plain, &[named], &defaults),
            "velocity_rule"
        );
        assert_eq!(
            resolve_detection_source(&plain, &[Anomaly::default()], &defaults),
            RULE_ENGINE_SOURCE
        );
        assert_eq!(resolve_detection_source(&plain, &[], &defaults), "ML/Rules");
    }

    #[tokio::test]
    async fn test_transaction_source_reaches_explanation() {
        let api = MockReviewApi::default()
            .with_transaction(Ok(Transaction {
                detection_source: Some("Simulator".into()),
                ..transaction("0.7")
            }))
            .with_anomalies(Ok(Vec::new()));

        let state = SimulationView::default().load(&api, "T1", Prefetched::default()).await;
        let model = state.ready().unwrap();

        assert_eq!(model.resolver().detection_source(), "Simulator");
        assert_eq!(
            model.explanation().to_string(),
            "Simulator\nNo explicit anomaly was created."
        );
    }

    #[tokio::test]
    async fn test_fetch_detection_through_view() {
        let metrics = Arc::new(ReviewMetrics::new());
        let api = MockReviewApi::default()
            .with_transaction(Ok(transaction("0.81")))
            .with_anomalies(Ok(Vec::new()))
            .with_prediction(Ok(DetectionDetails::new("1.0", 0.812)));

        let view = SimulationView::default().with_metrics(metrics.clone());
        let state = view.load(&api, "T1", Prefetched::default()).await;
        let model = state.ready().unwrap();

        assert_eq!(model.fetch_detection(&api).await, FetchOutcome::Resolved);
        assert_eq!(
            model.explanation().to_string(),
            "ML/Rules\nModel: 1.0 - Probability: 0.81"
        );
        assert_eq!(metrics.tier_counts().get(&RiskTier::High), Some(&1));
        assert_eq!(metrics.fetch_stats().attempts, 1);
    }
}
