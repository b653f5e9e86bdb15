//! HTTP client for the dashboard API

use crate::config::ApiConfig;
use crate::decode::{decode_anomalies, decode_prediction, decode_transaction, Decoded};
use crate::error::{ReviewError, ReviewResult};
use crate::types::{Anomaly, DetectionDetails, Transaction};
use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use serde_json::Value;
use tracing::{debug, warn};

/// Endpoints the review core consumes
#[async_trait]
pub trait ReviewApi: Send + Sync {
    /// `GET /transactions/{id}`
    async fn fetch_transaction(&self, transaction_id: &str) -> ReviewResult<Transaction>;

    /// `GET /anomalies?transaction_id={id}`
    async fn fetch_anomalies(&self, transaction_id: &str) -> ReviewResult<Vec<Anomaly>>;

    /// `POST /transactions/predict/{id}`
    async fn request_prediction(&self, transaction_id: &str) -> ReviewResult<DetectionDetails>;
}

/// `ReviewApi` over HTTP with reqwest
#[derive(Clone)]
pub struct HttpReviewClient {
    client: Client,
    base_url: Url,
    bearer_token: Option<String>,
}

impl HttpReviewClient {
    /// Create a new client from the `[api]` config section
    pub fn new(config: &ApiConfig) -> ReviewResult<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Self::with_client(client, config)
    }

    /// Create a client around an existing reqwest client
    pub fn with_client(client: Client, config: &ApiConfig) -> ReviewResult<Self> {
        let base_url = parse_base_url(&config.base_url)?;
        Ok(Self {
            client,
            base_url,
            bearer_token: config.bearer_token.clone().filter(|t| !t.is_empty()),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append path segments to the base URL, escaping each one
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send(&self, method: Method, url: Url) -> ReviewResult<Value> {
        let endpoint = url.path().to_string();
        let mut request = self.client.request(method.clone(), url);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        debug!(method = %method, endpoint = %endpoint, "Sending API request");
        let resp = request.send().await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let message = error_message(&text).unwrap_or_else(|| {
                format!(
                    "Request failed with status code {}",
                    status.as_u16()
                )
            });
            warn!(endpoint = %endpoint, status = status.as_u16(), "API request failed");
            return Err(ReviewError::Status {
                status: status.as_u16(),
                message,
            });
        }

        resp.json::<Value>().await.map_err(|e| ReviewError::Malformed {
            endpoint,
            reason: e.to_string(),
        })
    }
}

fn parse_base_url(raw: &str) -> ReviewResult<Url> {
    let url = Url::parse(raw).map_err(|e| ReviewError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(ReviewError::InvalidBaseUrl {
            url: raw.to_string(),
            reason: "URL cannot be used as a base".to_string(),
        });
    }
    Ok(url)
}

/// Pull the `message` field out of an error body, if the body is JSON and has one
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

fn into_review_result<T>(decoded: Decoded<T>, endpoint: &Url) -> ReviewResult<T> {
    decoded.into_result().map_err(|reason| ReviewError::Malformed {
        endpoint: endpoint.path().to_string(),
        reason,
    })
}

#[async_trait]
impl ReviewApi for HttpReviewClient {
    async fn fetch_transaction(&self, transaction_id: &str) -> ReviewResult<Transaction> {
        let url = self.endpoint(&["transactions", transaction_id]);
        let body = self.send(Method::GET, url.clone()).await?;
        into_review_result(decode_transaction(&body), &url)
    }

    async fn fetch_anomalies(&self, transaction_id: &str) -> ReviewResult<Vec<Anomaly>> {
        let mut url = self.endpoint(&["anomalies"]);
        url.query_pairs_mut()
            .append_pair("transaction_id", transaction_id);
        let body = self.send(Method::GET, url.clone()).await?;
        into_review_result(decode_anomalies(&body), &url)
    }

    async fn request_prediction(&self, transaction_id: &str) -> ReviewResult<DetectionDetails> {
        let url = self.endpoint(&["transactions", "predict", transaction_id]);
        let body = self.send(Method::POST, url.clone()).await?;
        into_review_result(decode_prediction(&body), &url)
    }
}
