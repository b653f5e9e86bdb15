//! Errors raised at the dashboard API boundary

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("Malformed response from {endpoint}: {reason}")]
    Malformed { endpoint: String, reason: String },

    #[error("Invalid API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl ReviewError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ReviewError::Status { status: 404, .. })
    }

    /// Message suitable for inline display in a view
    pub fn display_message(&self) -> String {
        match self {
            ReviewError::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type ReviewResult<T> = Result<T, ReviewError>;
