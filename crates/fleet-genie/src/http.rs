//! reqwest-backed implementation of [`GenieApi`].

use async_trait::async_trait;
use fleet_config::GenieCredentials;
use fleet_core::{FleetError, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

use crate::api::{GenieApi, PostedMessage, StartedConversation};

/// HTTP client scoped to one Genie space.
pub struct HttpGenieApi {
    /// `{host}/api/2.0/genie/spaces/{space_id}`
    space_url: String,

    /// Client carrying the bearer token as a default header
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpGenieApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGenieApi")
            .field("space_url", &self.space_url)
            .finish()
    }
}

impl HttpGenieApi {
    pub fn new(
        credentials: &GenieCredentials,
        timeout: Duration,
        accept_invalid_certs: bool,
    ) -> Result<Self> {
        if !credentials.host.starts_with("http://") && !credentials.host.starts_with("https://") {
            return Err(FleetError::ConfigError(
                "Genie host must start with http:// or https://".into(),
            ));
        }

        let mut default_headers = HeaderMap::new();
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", credentials.token))
            .map_err(|e| FleetError::ConfigError(format!("Invalid token header value: {}", e)))?;
        bearer.set_sensitive(true);
        default_headers.insert(AUTHORIZATION, bearer);
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(default_headers)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()
            .map_err(|e| FleetError::TransportError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            space_url: space_url(&credentials.host, &credentials.space_id),
            client,
        })
    }

    fn message_url(&self, conversation_id: &str, message_id: &str) -> String {
        format!(
            "{}/conversations/{}/messages/{}",
            self.space_url, conversation_id, message_id
        )
    }

    async fn post_json(&self, url: &str, body: Value, operation: &str) -> Result<Value> {
        debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| FleetError::TransportError(format!("Failed to send HTTP request: {}", e)))?;

        read_json(response, operation).await
    }

    async fn get_json(&self, url: &str, operation: &str) -> Result<Value> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FleetError::TransportError(format!("Failed to send HTTP request: {}", e)))?;

        read_json(response, operation).await
    }
}

#[async_trait]
impl GenieApi for HttpGenieApi {
    async fn start_conversation(&self, content: &str) -> Result<StartedConversation> {
        let url = format!("{}/start-conversation", self.space_url);
        info!("Starting new conversation");
        let body = self
            .post_json(&url, json!({ "content": content }), "start conversation")
            .await?;
        StartedConversation::from_json(&body)
    }

    async fn create_message(&self, conversation_id: &str, content: &str) -> Result<PostedMessage> {
        let url = format!("{}/conversations/{}/messages", self.space_url, conversation_id);
        info!("Continuing conversation: {}", conversation_id);
        let body = self
            .post_json(&url, json!({ "content": content }), "send message")
            .await?;
        PostedMessage::from_json(&body)
    }

    async fn get_message(&self, conversation_id: &str, message_id: &str) -> Result<Value> {
        let url = self.message_url(conversation_id, message_id);
        self.get_json(&url, "check message status").await
    }

    async fn get_query_result(
        &self,
        conversation_id: &str,
        message_id: &str,
        attachment_id: &str,
    ) -> Result<Value> {
        let url = format!(
            "{}/query-result/{}",
            self.message_url(conversation_id, message_id),
            attachment_id
        );
        self.get_json(&url, "fetch query results").await
    }
}

fn space_url(host: &str, space_id: &str) -> String {
    format!(
        "{}/api/2.0/genie/spaces/{}",
        host.trim_end_matches('/'),
        space_id
    )
}

async fn read_json(response: reqwest::Response, operation: &str) -> Result<Value> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(FleetError::RemoteRejection {
            operation: operation.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| FleetError::MalformedResponse(format!("{} returned invalid JSON: {}", operation, e)))
}
