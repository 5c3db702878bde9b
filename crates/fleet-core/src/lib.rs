use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Content returned when polling gives up before the remote job settles.
pub const STILL_PROCESSING_CONTENT: &str =
    "The request is taking longer than expected. Please try again.";

/// Content returned when a completed message carries nothing worth showing.
pub const FALLBACK_CONTENT: &str = "Here are the results from your query.";

/// Placeholder the remote service emits instead of a real answer.
pub const PLACEHOLDER_CONTENT: &str = "I've processed your request.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub content: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub conversation_id: String,
    pub message_id: String,
    pub content: String,
    pub status: MessageStatus,
    pub sql_query: Option<String>,
    pub query_results: Option<QueryResult>,
    pub timestamp: DateTime<Utc>,
}

impl ChatResponse {
    pub fn new(
        conversation_id: impl Into<String>,
        message_id: impl Into<String>,
        status: MessageStatus,
        content: impl Into<String>,
    ) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            message_id: message_id.into(),
            content: content.into(),
            status,
            sql_query: None,
            query_results: None,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageStatus {
    Pending,
    Processing,
    Submitted,
    Completed,
    Failed,
}

impl MessageStatus {
    /// Maps a status string reported by the remote service.
    pub fn from_remote(status: &str) -> Option<Self> {
        match status {
            "PENDING" => Some(Self::Pending),
            "PROCESSING" => Some(Self::Processing),
            "SUBMITTED" => Some(Self::Submitted),
            "COMPLETED" => Some(Self::Completed),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Tabular result of a generated query.
///
/// Every row holds exactly `columns.len()` values and `row_count` always
/// equals `data.len()`; construct through [`QueryResult::new`] to keep
/// that true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub column_types: Vec<String>,
    pub data: Vec<Vec<Value>>,
    pub row_count: usize,
}

impl QueryResult {
    /// Builds a result from `(name, type)` column pairs, padding short rows
    /// with nulls and dropping surplus cells.
    pub fn new(columns: Vec<(String, String)>, rows: Vec<Vec<Value>>) -> Self {
        let width = columns.len();
        let (columns, column_types): (Vec<_>, Vec<_>) = columns.into_iter().unzip();
        let data: Vec<Vec<Value>> = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Value::Null);
                row
            })
            .collect();

        Self {
            columns,
            column_types,
            row_count: data.len(),
            data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub configured: bool,
    /// Absent from degraded reports; when present both keys are always
    /// rendered, as `null` if unknown.
    #[serde(flatten)]
    pub target: Option<GenieTarget>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Shortened identifiers of the configured Genie space.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenieTarget {
    pub space_id: Option<String>,
    pub host: Option<String>,
}

impl HealthReport {
    pub fn healthy(configured: bool, target: GenieTarget) -> Self {
        Self {
            status: "healthy".to_string(),
            configured,
            target: Some(target),
            error: None,
        }
    }

    pub fn degraded(error: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            configured: false,
            target: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Error, Debug)]
pub enum FleetError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Failed to {operation}: {status} - {body}")]
    RemoteRejection {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("HTTP transport error: {0}")]
    TransportError(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("{0}")]
    RelayError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FleetError>;
