//! Transport seam for the Genie conversation API.

use async_trait::async_trait;
use fleet_core::{FleetError, Result};
use serde_json::Value;

/// Identifiers returned when a new conversation is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedConversation {
    pub conversation_id: String,
    pub message_id: String,
}

/// Identifier returned when a message is posted into a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedMessage {
    pub message_id: String,
}

/// Operations of one Genie space.
///
/// Implementations map a non-success HTTP status to
/// [`FleetError::RemoteRejection`] and pass bodies through as untyped JSON.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenieApi: Send + Sync {
    /// Open a conversation whose first turn is `content`.
    async fn start_conversation(&self, content: &str) -> Result<StartedConversation>;

    /// Post `content` as a new turn of an existing conversation.
    async fn create_message(&self, conversation_id: &str, content: &str) -> Result<PostedMessage>;

    /// Fetch the current state of a message.
    async fn get_message(&self, conversation_id: &str, message_id: &str) -> Result<Value>;

    /// Fetch the statement result behind a query attachment.
    async fn get_query_result(
        &self,
        conversation_id: &str,
        message_id: &str,
        attachment_id: &str,
    ) -> Result<Value>;
}

impl StartedConversation {
    pub fn from_json(body: &Value) -> Result<Self> {
        Ok(Self {
            conversation_id: required_str(body, "conversation_id", "start conversation")?,
            message_id: required_str(body, "message_id", "start conversation")?,
        })
    }
}

impl PostedMessage {
    pub fn from_json(body: &Value) -> Result<Self> {
        // Older API revisions only report the message as `id`.
        let message_id = required_str(body, "message_id", "send message")
            .or_else(|_| required_str(body, "id", "send message"))
            .map_err(|_| {
                FleetError::MalformedResponse("send message response is missing 'message_id'".into())
            })?;
        Ok(Self { message_id })
    }
}

fn required_str(body: &Value, field: &str, operation: &str) -> Result<String> {
    body.get(field)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            FleetError::MalformedResponse(format!("{} response is missing '{}'", operation, field))
        })
}
