//! In-memory `ReviewApi` for unit tests

use crate::client::ReviewApi;
use crate::error::{ReviewError, ReviewResult};
use crate::types::{Anomaly, DetectionDetails, Transaction};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::Notify;

/// Canned responses per endpoint. Unset endpoints answer 404.
#[derive(Default)]
pub(crate) struct MockReviewApi {
    transaction: Mutex<Option<ReviewResult<Transaction>>>,
    anomalies: Mutex<Option<ReviewResult<Vec<Anomaly>>>>,
    prediction: Mutex<Option<ReviewResult<DetectionDetails>>>,
    gate: Option<Notify>,
    transaction_calls: AtomicUsize,
    anomaly_calls: AtomicUsize,
    prediction_calls: AtomicUsize,
}

fn not_found() -> ReviewError {
    ReviewError::Status {
        status: 404,
        message: "Not found".to_string(),
    }
}

fn take<T>(slot: &Mutex<Option<ReviewResult<T>>>) -> ReviewResult<T> {
    slot.lock().unwrap().take().unwrap_or_else(|| Err(not_found()))
}

impl MockReviewApi {
    pub(crate) fn with_transaction(self, response: ReviewResult<Transaction>) -> Self {
        *self.transaction.lock().unwrap() = Some(response);
        self
    }

    pub(crate) fn with_anomalies(self, response: ReviewResult<Vec<Anomaly>>) -> Self {
        *self.anomalies.lock().unwrap() = Some(response);
        self
    }

    pub(crate) fn with_prediction(self, response: ReviewResult<DetectionDetails>) -> Self {
        *self.prediction.lock().unwrap() = Some(response);
        self
    }

    /// Hold prediction requests open until `release` is called
    pub(crate) fn gated(mut self) -> Self {
        self.gate = Some(Notify::new());
        self
    }

    pub(crate) fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub(crate) fn transaction_calls(&self) -> usize {
        self.transaction_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn anomaly_calls(&self) -> usize {
        self.anomaly_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn prediction_calls(&self) -> usize {
        self.prediction_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReviewApi for MockReviewApi {
    async fn fetch_transaction(&self, _transaction_id: &str) -> ReviewResult<Transaction> {
        self.transaction_calls.fetch_add(1, Ordering::SeqCst);
        take(&self.transaction)
    }

    async fn fetch_anomalies(&self, _transaction_id: &str) -> ReviewResult<Vec<Anomaly>> {
        self.anomaly_calls.fetch_add(1, Ordering::SeqCst);
        take(&self.anomalies)
    }

    async fn request_prediction(&self, _transaction_id: &str) -> ReviewResult<DetectionDetails> {
        self.prediction_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        take(&self.prediction)
    }
}
