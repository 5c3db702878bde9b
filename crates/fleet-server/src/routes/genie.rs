use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use fleet_core::{ChatRequest, ChatResponse, HealthReport};
use fleet_genie::{health_check, ConversationRelay};

use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/send-message", post(send_message))
        .route("/health", get(health))
}

/// Relay one chat turn to Genie and wait for its answer.
pub async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let settings = state
        .config
        .genie
        .resolved_with(|key| state.lookup_env(key))?;
    let relay = ConversationRelay::connect(&settings)?;

    let response = relay
        .send_message(&req.content, req.conversation_id.as_deref())
        .await?;

    Ok(Json(response))
}

pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(health_check(&state.config.genie, |key| state.lookup_env(key)))
}
