use fleet_config::GenieSettings;
use fleet_core::{ChatResponse, FleetError, MessageStatus, Result, STILL_PROCESSING_CONTENT};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use crate::api::GenieApi;
use crate::extract;
use crate::http::HttpGenieApi;

/// How long to wait for a remote message to settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            max_attempts: 20,
        }
    }
}

impl PollPolicy {
    pub fn from_settings(settings: &GenieSettings) -> Self {
        Self {
            interval: settings.poll_interval(),
            max_attempts: settings.max_poll_attempts.max(1),
        }
    }
}

enum PollOutcome {
    Completed(Value),
    Failed(Value),
    TimedOut,
}

/// Stateless translator between one chat turn and the Genie API.
pub struct ConversationRelay {
    api: Arc<dyn GenieApi>,
    policy: PollPolicy,
}

impl ConversationRelay {
    pub fn new(api: Arc<dyn GenieApi>, policy: PollPolicy) -> Self {
        Self { api, policy }
    }

    /// Builds an HTTP-backed relay, failing before any network traffic
    /// when host, token or space id is missing.
    pub fn connect(settings: &GenieSettings) -> Result<Self> {
        let credentials = settings.credentials()?;
        let api = HttpGenieApi::new(
            &credentials,
            settings.request_timeout(),
            settings.accept_invalid_certs,
        )?;
        Ok(Self::new(Arc::new(api), PollPolicy::from_settings(settings)))
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Sends `content` and waits for Genie's answer.
    ///
    /// Remote `FAILED` jobs and polling timeouts come back as normal
    /// responses. Rejections of the start/send call keep their remote
    /// status; every other failure is folded into [`FleetError::RelayError`].
    #[instrument(skip(self, content))]
    pub async fn send_message(
        &self,
        content: &str,
        conversation_id: Option<&str>,
    ) -> Result<ChatResponse> {
        match self.exchange(content, conversation_id).await {
            Ok(response) => Ok(response),
            Err(e @ (FleetError::ConfigError(_) | FleetError::RemoteRejection { .. })) => {
                error!("Genie request rejected: {}", e);
                Err(e)
            }
            Err(e) => {
                error!("Error in Genie API call: {}", e);
                Err(FleetError::RelayError(e.to_string()))
            }
        }
    }

    async fn exchange(&self, content: &str, conversation_id: Option<&str>) -> Result<ChatResponse> {
        let (conversation_id, message_id) = match conversation_id.filter(|id| !id.is_empty()) {
            None => {
                let started = self.api.start_conversation(content).await?;
                info!(
                    "Started conversation: {}, message: {}",
                    started.conversation_id, started.message_id
                );
                (started.conversation_id, started.message_id)
            }
            Some(id) => {
                let posted = self.api.create_message(id, content).await?;
                info!("Sent message: {}", posted.message_id);
                (id.to_string(), posted.message_id)
            }
        };

        let response = match self.poll(&conversation_id, &message_id).await {
            PollOutcome::Completed(payload) => {
                self.completed(conversation_id, message_id, &payload).await
            }
            PollOutcome::Failed(payload) => {
                let reason = extract::failure_reason(&payload);
                warn!("Message failed: {}", reason);
                ChatResponse::new(
                    conversation_id,
                    message_id,
                    MessageStatus::Failed,
                    format!("I encountered an error: {}", reason),
                )
            }
            PollOutcome::TimedOut => {
                warn!(
                    "Message {} still pending after {} attempts",
                    message_id, self.policy.max_attempts
                );
                ChatResponse::new(
                    conversation_id,
                    message_id,
                    MessageStatus::Processing,
                    STILL_PROCESSING_CONTENT,
                )
            }
        };

        Ok(response)
    }

    async fn poll(&self, conversation_id: &str, message_id: &str) -> PollOutcome {
        for attempt in 1..=self.policy.max_attempts {
            tokio::time::sleep(self.policy.interval).await;
            debug!("Checking status: attempt {}", attempt);

            let payload = match self.api.get_message(conversation_id, message_id).await {
                Ok(payload) => payload,
                Err(e) => {
                    warn!("Status check failed on attempt {}: {}", attempt, e);
                    continue;
                }
            };

            match extract::message_status(&payload) {
                Some(MessageStatus::Completed) => return PollOutcome::Completed(payload),
                Some(MessageStatus::Failed) => return PollOutcome::Failed(payload),
                status => debug!("Message status: {:?}", status),
            }
        }

        PollOutcome::TimedOut
    }

    async fn completed(
        &self,
        conversation_id: String,
        message_id: String,
        payload: &Value,
    ) -> ChatResponse {
        let message = extract::parse_completed(payload);

        let mut sql_query = None;
        let mut description = None;
        let mut query_results = None;

        for query in message.queries {
            sql_query = query.sql;
            description = query.description;

            if let Some(attachment_id) = query.attachment_id {
                query_results = match self
                    .api
                    .get_query_result(&conversation_id, &message_id, &attachment_id)
                    .await
                {
                    Ok(result) => extract::parse_query_result(&result),
                    Err(e) => {
                        warn!("Failed to fetch query results for {}: {}", attachment_id, e);
                        None
                    }
                };
            }
        }

        let content = extract::choose_content(
            description.as_deref(),
            message.text_content.as_deref(),
            message.content.as_deref(),
        );

        info!(
            "Has SQL: {}, has results: {}",
            sql_query.is_some(),
            query_results.is_some()
        );

        let mut response =
            ChatResponse::new(conversation_id, message_id, MessageStatus::Completed, content);
        response.sql_query = sql_query;
        response.query_results = query_results;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MockGenieApi, PostedMessage, StartedConversation};
    use fleet_core::FALLBACK_CONTENT;
    use serde_json::json;

    fn relay(api: MockGenieApi) -> ConversationRelay {
        ConversationRelay::new(Arc::new(api), PollPolicy::default())
    }

    fn expect_new_conversation(api: &mut MockGenieApi) {
        api.expect_start_conversation().times(1).returning(|_| {
            Ok(StartedConversation {
                conversation_id: "c-1".to_string(),
                message_id: "m-1".to_string(),
            })
        });
    }

    fn statement_payload() -> Value {
        json!({
            "statement_response": {
                "manifest": {"schema": {"columns": [
                    {"name": "product", "type_text": "STRING"},
                    {"name": "revenue", "type_text": "DECIMAL(10,2)"}
                ]}},
                "result": {"data_array": [["a", "10.00"], ["b", "9.50"], ["c", "7.25"]]}
            }
        })
    }

    #[tokio::test(start_paused = true)]
    async fn completes_on_last_attempt() {
        let mut api = MockGenieApi::new();
        expect_new_conversation(&mut api);

        let mut polls = 0;
        api.expect_get_message().times(20).returning(move |_, _| {
            polls += 1;
            if polls < 20 {
                Ok(json!({"status": "PROCESSING"}))
            } else {
                Ok(json!({"status": "COMPLETED", "content": "All 156 turbines reporting"}))
            }
        });

        let response = relay(api).send_message("status?", None).await.unwrap();
        assert_eq!(response.status, MessageStatus::Completed);
        assert_eq!(response.content, "All 156 turbines reporting");
        assert_eq!(response.conversation_id, "c-1");
        assert_eq!(response.message_id, "m-1");
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_after_twenty_polls() {
        let mut api = MockGenieApi::new();
        expect_new_conversation(&mut api);
        api.expect_get_message()
            .times(20)
            .returning(|_, _| Ok(json!({"status": "EXECUTING_QUERY"})));

        let response = relay(api).send_message("slow question", None).await.unwrap();
        assert_eq!(response.status, MessageStatus::Processing);
        assert_eq!(response.content, STILL_PROCESSING_CONTENT);
        assert!(response.sql_query.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn poll_failures_are_skipped() {
        let mut api = MockGenieApi::new();
        expect_new_conversation(&mut api);

        let mut polls = 0;
        api.expect_get_message().times(20).returning(move |_, _| {
            polls += 1;
            if polls < 20 {
                Err(FleetError::TransportError("connection reset".to_string()))
            } else {
                Ok(json!({"status": "COMPLETED", "content": "Recovered"}))
            }
        });

        let response = relay(api).send_message("q", None).await.unwrap();
        assert_eq!(response.status, MessageStatus::Completed);
        assert_eq!(response.content, "Recovered");
    }

    #[tokio::test(start_paused = true)]
    async fn continues_supplied_conversation() {
        let mut api = MockGenieApi::new();
        api.expect_start_conversation().never();
        api.expect_create_message()
            .times(1)
            .returning(|conversation_id, content| {
                assert_eq!(conversation_id.to_string(), "c-existing");
                assert_eq!(content.to_string(), "and yesterday?");
                Ok(PostedMessage {
                    message_id: "m-2".to_string(),
                })
            });
        api.expect_get_message()
            .times(1)
            .returning(|_, _| Ok(json!({"status": "COMPLETED"})));

        let response = relay(api)
            .send_message("and yesterday?", Some("c-existing"))
            .await
            .unwrap();
        assert_eq!(response.conversation_id, "c-existing");
        assert_eq!(response.message_id, "m-2");
        assert_eq!(response.content, FALLBACK_CONTENT);
    }

    #[tokio::test(start_paused = true)]
    async fn query_attachment_brings_sql_and_results() {
        let mut api = MockGenieApi::new();
        expect_new_conversation(&mut api);
        api.expect_get_message().times(1).returning(|_, _| {
            Ok(json!({
                "status": "COMPLETED",
                "content": "What sold best?",
                "attachments": [{
                    "attachment_id": "att-1",
                    "query": {"query": "SELECT product, revenue FROM sales", "description": "Top 5 products"}
                }]
            }))
        });
        api.expect_get_query_result()
            .times(1)
            .returning(|_, _, attachment_id| {
                assert_eq!(attachment_id.to_string(), "att-1");
                Ok(statement_payload())
            });

        let response = relay(api).send_message("What sold best?", None).await.unwrap();
        assert_eq!(response.content, "Top 5 products");
        assert_eq!(
            response.sql_query.as_deref(),
            Some("SELECT product, revenue FROM sales")
        );

        let results = response.query_results.unwrap();
        assert_eq!(results.row_count, 3);
        assert_eq!(results.columns.len(), 2);
        assert!(results.data.iter().all(|row| row.len() == 2));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_result_fetch_keeps_answer() {
        let mut api = MockGenieApi::new();
        expect_new_conversation(&mut api);
        api.expect_get_message().times(1).returning(|_, _| {
            Ok(json!({
                "status": "COMPLETED",
                "attachments": [{"attachment_id": "att-1", "query": {"query": "SELECT 1"}}]
            }))
        });
        api.expect_get_query_result().times(1).returning(|_, _, _| {
            Err(FleetError::RemoteRejection {
                operation: "fetch query results".to_string(),
                status: 404,
                body: "expired".to_string(),
            })
        });

        let response = relay(api).send_message("q", None).await.unwrap();
        assert_eq!(response.status, MessageStatus::Completed);
        assert_eq!(response.sql_query.as_deref(), Some("SELECT 1"));
        assert!(response.query_results.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn remote_failure_is_a_normal_response() {
        let mut api = MockGenieApi::new();
        expect_new_conversation(&mut api);
        api.expect_get_message().times(2).returning({
            let mut polls = 0;
            move |_, _| {
                polls += 1;
                if polls == 1 {
                    Ok(json!({"status": "SUBMITTED"}))
                } else {
                    Ok(json!({"status": "FAILED", "error": {"error": "Warehouse is stopped"}}))
                }
            }
        });

        let response = relay(api).send_message("q", None).await.unwrap();
        assert_eq!(response.status, MessageStatus::Failed);
        assert_eq!(response.content, "I encountered an error: Warehouse is stopped");
    }

    #[tokio::test(start_paused = true)]
    async fn start_rejection_is_not_retried() {
        let mut api = MockGenieApi::new();
        api.expect_start_conversation().times(1).returning(|_| {
            Err(FleetError::RemoteRejection {
                operation: "start conversation".to_string(),
                status: 403,
                body: "PERMISSION_DENIED".to_string(),
            })
        });
        api.expect_get_message().never();

        let err = relay(api).send_message("q", None).await.unwrap_err();
        match err {
            FleetError::RemoteRejection { status, body, .. } => {
                assert_eq!(status, 403);
                assert_eq!(body, "PERMISSION_DENIED");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn continue_rejection_is_not_retried() {
        let mut api = MockGenieApi::new();
        api.expect_start_conversation().never();
        api.expect_create_message().times(1).returning(|_, _| {
            Err(FleetError::RemoteRejection {
                operation: "send message".to_string(),
                status: 404,
                body: "RESOURCE_DOES_NOT_EXIST".to_string(),
            })
        });
        api.expect_get_message().never();
        api.expect_get_query_result().never();

        let err = relay(api)
            .send_message("and yesterday?", Some("c-gone"))
            .await
            .unwrap_err();
        match err {
            FleetError::RemoteRejection { operation, status, body } => {
                assert_eq!(operation, "send message");
                assert_eq!(status, 404);
                assert_eq!(body, "RESOURCE_DOES_NOT_EXIST");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn other_errors_become_relay_errors() {
        let mut api = MockGenieApi::new();
        api.expect_start_conversation().times(1).returning(|_| {
            Err(FleetError::MalformedResponse(
                "start conversation response is missing 'conversation_id'".to_string(),
            ))
        });

        let err = relay(api).send_message("q", None).await.unwrap_err();
        match err {
            FleetError::RelayError(message) => assert!(message.contains("conversation_id")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn connect_requires_credentials() {
        let settings = GenieSettings {
            host: Some("https://adb-1.cloud.databricks.com".to_string()),
            token: Some("dapi".to_string()),
            space_id: None,
            env_file: None,
            ..Default::default()
        };
        let err = ConversationRelay::connect(&settings).err().unwrap();
        assert!(matches!(err, FleetError::ConfigError(_)));
    }

    #[test]
    fn policy_follows_settings() {
        let settings = GenieSettings {
            host: Some("https://adb-1.cloud.databricks.com".to_string()),
            token: Some("dapi".to_string()),
            space_id: Some("space".to_string()),
            poll_interval_secs: 1,
            max_poll_attempts: 4,
            env_file: None,
            ..Default::default()
        };
        let relay = ConversationRelay::connect(&settings).unwrap();
        assert_eq!(
            relay.policy(),
            PollPolicy {
                interval: Duration::from_secs(1),
                max_attempts: 4
            }
        );
    }
}
