//! Defensive readers for Genie message payloads.
//!
//! Every level of these documents may be absent, so nothing here assumes a
//! fixed schema: missing or mistyped fields read as "not there".

use fleet_core::{MessageStatus, QueryResult, FALLBACK_CONTENT, PLACEHOLDER_CONTENT};
use serde_json::Value;
use tracing::{debug, warn};

/// The parts of a `COMPLETED` message the relay cares about.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletedMessage {
    pub content: Option<String>,
    pub text_content: Option<String>,
    pub queries: Vec<QueryAttachment>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryAttachment {
    pub sql: Option<String>,
    pub description: Option<String>,
    pub attachment_id: Option<String>,
}

/// Remote status of a message payload; unknown strings read as `None`.
pub fn message_status(payload: &Value) -> Option<MessageStatus> {
    payload
        .get("status")
        .and_then(Value::as_str)
        .and_then(MessageStatus::from_remote)
}

pub fn parse_completed(payload: &Value) -> CompletedMessage {
    let attachments = payload
        .get("attachments")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    debug!("Completed message has {} attachments", attachments.len());

    let mut message = CompletedMessage {
        content: str_at(payload, &["content"]),
        ..Default::default()
    };

    for attachment in attachments {
        if let Some(text) = attachment.get("text") {
            message.text_content = str_at(text, &["content"]);
        }

        if let Some(query) = attachment.get("query") {
            message.queries.push(QueryAttachment {
                sql: str_at(query, &["query"]).filter(|sql| !sql.is_empty()),
                description: str_at(query, &["description"]),
                attachment_id: str_at(attachment, &["attachment_id"])
                    .or_else(|| str_at(query, &["attachment_id"]))
                    .filter(|id| !id.is_empty()),
            });
        }
    }

    message
}

/// Builds a [`QueryResult`] from a query-result payload.
///
/// Rows live at `statement_response.result.data_array` and columns at
/// `statement_response.manifest.schema.columns`; both must be non-empty.
pub fn parse_query_result(payload: &Value) -> Option<QueryResult> {
    let statement = payload.get("statement_response");

    let columns: Vec<(String, String)> = statement
        .and_then(|s| s.pointer("/manifest/schema/columns"))
        .and_then(Value::as_array)
        .map(|columns| {
            columns
                .iter()
                .map(|column| {
                    let name = str_at(column, &["name"]).unwrap_or_default();
                    let type_text = str_at(column, &["type_text"])
                        .or_else(|| str_at(column, &["type_name"]))
                        .unwrap_or_default();
                    (name, type_text)
                })
                .collect()
        })
        .unwrap_or_default();

    let rows: Vec<Vec<Value>> = statement
        .and_then(|s| s.pointer("/result/data_array"))
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .filter_map(|row| match row.as_array() {
                    Some(cells) => Some(cells.clone()),
                    None => {
                        warn!("Skipping non-array row in query result");
                        None
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    if columns.is_empty() || rows.is_empty() {
        warn!(
            "No results created - columns: {}, rows: {}",
            columns.len(),
            rows.len()
        );
        return None;
    }

    if rows.iter().any(|row| row.len() != columns.len()) {
        warn!("Query result rows do not match {} columns, normalising", columns.len());
    }

    Some(QueryResult::new(columns, rows))
}

/// Picks the user-facing answer: description, then text attachment, then
/// the message content unless it is the remote placeholder, then a fixed
/// fallback.
pub fn choose_content(
    description: Option<&str>,
    text_content: Option<&str>,
    content: Option<&str>,
) -> String {
    let content = content.filter(|c| *c != PLACEHOLDER_CONTENT);

    [description, text_content, content]
        .into_iter()
        .flatten()
        .find(|candidate| !candidate.is_empty())
        .unwrap_or(FALLBACK_CONTENT)
        .to_string()
}

/// Explanation for a `FAILED` message, taken from its `error` field.
pub fn failure_reason(payload: &Value) -> String {
    match payload.get("error") {
        None | Some(Value::Null) => "Request failed".to_string(),
        Some(Value::String(reason)) if !reason.is_empty() => reason.clone(),
        Some(Value::String(_)) => "Request failed".to_string(),
        Some(error) => str_at(error, &["error"])
            .or_else(|| str_at(error, &["message"]))
            .unwrap_or_else(|| error.to_string()),
    }
}

fn str_at(value: &Value, path: &[&str]) -> Option<String> {
    path.iter()
        .try_fold(value, |current, key| current.get(*key))
        .and_then(Value::as_str)
        .map(str::to_string)
}
