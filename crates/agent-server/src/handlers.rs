//! HTTP Handlers

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use agent_core::{AgentError, Conversation, Message, ToolCall, ToolResult, ToolSchema};

use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub provider_connected: bool,
    pub model: String,
    pub tools: usize,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub message: String,
    pub conversation_id: String,
    pub model: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    pub retryable: bool,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(err: &AgentError) -> ApiError {
    let (status, code) = match err {
        AgentError::ToolNotFound(_) => (StatusCode::NOT_FOUND, "TOOL_NOT_FOUND"),
        AgentError::ToolValidation(_) => (StatusCode::BAD_REQUEST, "INVALID_ARGUMENTS"),
        AgentError::RateLimited(_) => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
        AgentError::ProviderUnavailable(_) => {
            (StatusCode::SERVICE_UNAVAILABLE, "PROVIDER_UNAVAILABLE")
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "AGENT_ERROR"),
    };

    (
        status,
        Json(ErrorResponse {
            error: err.user_message(),
            code: code.into(),
            retryable: err.is_retryable(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let provider_connected = state.provider.health_check().await.unwrap_or(false);

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        provider_connected,
        model: state.generation.model.clone(),
        tools: state.tools.len(),
    })
}

/// Tool schemas in registration order
pub async fn list_tools(State(state): State<AppState>) -> Json<Vec<ToolSchema>> {
    Json(state.tools.schemas())
}

/// Call one tool directly, bypassing the model
pub async fn invoke_tool(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(arguments): Json<HashMap<String, serde_json::Value>>,
) -> Result<Json<ToolResult>, ApiError> {
    let call = ToolCall {
        name,
        arguments,
        id: None,
    };

    let result = state.tools.execute(&call).await.map_err(|e| {
        tracing::warn!(tool = %call.name, error = %e, "direct tool call rejected");
        api_error(&e)
    })?;

    Ok(Json(result))
}

/// Main chat endpoint. Requests sharing a `conversation_id` continue the
/// same history; a failed turn leaves the stored history untouched.
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let agent = state.assistant(payload.model.as_deref());
    let model = agent.config().generation.model.clone();

    let conversation_id = payload
        .conversation_id
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let mut conversation = state
        .conversation(&conversation_id)
        .await
        .unwrap_or_else(|| Conversation::with_system_prompt(agent.system_prompt()));
    conversation.push(Message::user(payload.message));

    let response = agent.run(&mut conversation).await.map_err(|e| {
        tracing::error!(conversation = %conversation_id, "Agent error: {}", e);
        api_error(&e)
    })?;

    state.save_conversation(conversation_id.clone(), conversation).await;

    Ok(Json(ChatResponse {
        message: response,
        conversation_id,
        model,
    }))
}
