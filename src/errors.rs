use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Error body returned by the HTTP layer.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// HTTP status category (e.g. "Unprocessable Entity")
    pub error: String,
    /// Human-readable error description
    pub message: String,
    /// ISO 8601 timestamp when the error occurred
    pub timestamp: String,
}

/// Errors produced by the analytics core.
///
/// Record-level failures (`InvalidRecord`) are collected per row in batch
/// mode; the remaining variants abort the computation that raised them.
#[derive(Debug, Clone, thiserror::Error, Serialize)]
pub enum AnalyticsError {
    #[error("invalid record {record}: {reason}")]
    InvalidRecord { record: String, reason: String },

    #[error("unsorted period keys in partition '{partition}': '{key}' must sort strictly after '{previous}'")]
    UnsortedInput {
        partition: String,
        previous: String,
        key: String,
    },

    #[error("domain mapping error: {0}")]
    DomainMapping(String),

    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl AnalyticsError {
    /// Unified status/category mapping used by the HTTP layer.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AnalyticsError::InvalidRecord { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AnalyticsError::UnsortedInput { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AnalyticsError::DomainMapping(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AnalyticsError::Snapshot(_) => StatusCode::BAD_REQUEST,
            AnalyticsError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AnalyticsError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorResponse {
            error: status
                .canonical_reason()
                .unwrap_or("Unknown Error")
                .to_string(),
            message: self.to_string(),
            timestamp: Utc::now().to_rfc3339(),
        });
        (status, body).into_response()
    }
}

/// A skipped or erroring row, reported alongside the successful output of a
/// batch run rather than aborting it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordIssue {
    /// Which row ("transaction 42", "product SKU-9")
    pub record: String,
    pub reason: String,
}

impl RecordIssue {
    pub fn new(record: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            record: record.into(),
            reason: reason.into(),
        }
    }
}

impl From<&AnalyticsError> for RecordIssue {
    fn from(err: &AnalyticsError) -> Self {
        match err {
            AnalyticsError::InvalidRecord { record, reason } => {
                RecordIssue::new(record.clone(), reason.clone())
            }
            other => RecordIssue::new("<batch>", other.to_string()),
        }
    }
}
