//! LLM Provider Strategy Pattern
//!
//! Common interface for chat-completion backends. The agent loop and the
//! crew pipeline only ever talk to `dyn LlmProvider`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_core::provider::{GenerationOptions, LlmProvider};
//!
//! let provider = OpenAiCompatibleProvider::openrouter_from_env();
//! let completion = provider.complete(&messages, &GenerationOptions::default()).await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tokio::sync::Mutex;

use crate::error::{AgentError, Result};
use crate::message::Message;

/// Configuration for LLM generation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Model identifier as the provider expects it (e.g. "google/gemini-2.5-flash")
    pub model: String,

    /// Temperature for sampling (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Top-p nucleus sampling
    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Stop sequences
    #[serde(default)]
    pub stop_sequences: Vec<String>,
}

const fn default_temperature() -> f32 {
    0.7
}
const fn default_max_tokens() -> u32 {
    4096
}
const fn default_top_p() -> f32 {
    0.9
}

pub const DEFAULT_MODEL: &str = "google/gemini-2.5-flash";

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.into(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            top_p: default_top_p(),
            stop_sequences: Vec::new(),
        }
    }
}

impl GenerationOptions {
    pub fn for_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }
}

/// Response from an LLM completion
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Completion {
    /// The generated text
    pub content: String,

    /// Model that generated this response
    pub model: String,

    /// Token usage statistics (if available)
    pub usage: Option<TokenUsage>,

    /// Finish reason
    pub finish_reason: Option<FinishReason>,
}

impl Completion {
    pub fn text(content: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model: model.into(),
            usage: None,
            finish_reason: Some(FinishReason::Stop),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Reason for completion finishing
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolUse,
    ContentFilter,
    Error,
}

impl FinishReason {
    /// Map an OpenAI-style `finish_reason` string
    pub fn parse(raw: &str) -> Self {
        match raw {
            "stop" => Self::Stop,
            "length" => Self::Length,
            "tool_calls" | "function_call" => Self::ToolUse,
            "content_filter" => Self::ContentFilter,
            _ => Self::Error,
        }
    }
}

/// Provider metadata
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub name: String,
    pub base_url: Option<String>,
    pub models: Vec<ModelInfo>,
    pub supports_tools: bool,
}

/// Information about a model
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub context_length: Option<u32>,
}

/// Strategy trait for LLM providers
///
/// Implement this trait to add support for new LLM backends.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get provider information and capabilities
    async fn info(&self) -> Result<ProviderInfo>;

    /// Check if the provider is reachable and configured
    async fn health_check(&self) -> Result<bool>;

    /// Generate a completion from messages
    async fn complete(&self, messages: &[Message], options: &GenerationOptions)
    -> Result<Completion>;

    /// List available models
    async fn list_models(&self) -> Result<Vec<ModelInfo>>;

    /// Estimate token count for text
    fn estimate_tokens(&self, text: &str) -> u32 {
        u32::try_from(text.len() / 4).unwrap_or(u32::MAX)
    }
}

/// Scripted provider for tests and offline demos.
///
/// Replies are served in order; every request is recorded so callers can
/// inspect the prompts that were sent.
#[derive(Default)]
pub struct MockProvider {
    replies: Mutex<VecDeque<std::result::Result<String, String>>>,
    requests: Mutex<Vec<(Vec<Message>, GenerationOptions)>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider that answers with `replies` in order
    pub fn scripted<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect()),
            requests: Mutex::default(),
        }
    }

    /// Queue a successful reply
    pub async fn push_reply(&self, reply: impl Into<String>) {
        self.replies.lock().await.push_back(Ok(reply.into()));
    }

    /// Queue a provider failure
    pub async fn push_error(&self, error: impl Into<String>) {
        self.replies.lock().await.push_back(Err(error.into()));
    }

    /// Messages sent so far, one entry per `complete` call
    pub async fn requests(&self) -> Vec<Vec<Message>> {
        self.requests
            .lock()
            .await
            .iter()
            .map(|(messages, _)| messages.clone())
            .collect()
    }

    /// Models requested so far, one entry per `complete` call
    pub async fn requested_models(&self) -> Vec<String> {
        self.requests
            .lock()
            .await
            .iter()
            .map(|(_, options)| options.model.clone())
            .collect()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    async fn info(&self) -> Result<ProviderInfo> {
        Ok(ProviderInfo {
            name: "Mock".into(),
            base_url: None,
            models: self.list_models().await?,
            supports_tools: false,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        self.requests
            .lock()
            .await
            .push((messages.to_vec(), options.clone()));

        match self.replies.lock().await.pop_front() {
            Some(Ok(content)) => Ok(Completion::text(content, &options.model)),
            Some(Err(error)) => Err(AgentError::Provider(error)),
            None => Err(AgentError::Provider("mock script exhausted".into())),
        }
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        Ok(vec![ModelInfo {
            id: "mock".into(),
            name: "Mock".into(),
            context_length: None,
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_options_defaults() {
        let opts = GenerationOptions::default();
        assert!((opts.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(opts.max_tokens, 4096);
        assert_eq!(opts.model, "google/gemini-2.5-flash");
    }

    #[test]
    fn test_finish_reason_mapping() {
        assert_eq!(FinishReason::parse("stop"), FinishReason::Stop);
        assert_eq!(FinishReason::parse("tool_calls"), FinishReason::ToolUse);
        assert_eq!(FinishReason::parse("weird"), FinishReason::Error);
    }

    #[tokio::test]
    async fn test_mock_provider_serves_script_in_order() {
        let provider = MockProvider::scripted(["first", "second"]);
        provider.push_error("boom").await;
        let opts = GenerationOptions::for_model("mock-model");
        let msgs = [Message::user("hi")];

        assert_eq!(provider.complete(&msgs, &opts).await.unwrap().content, "first");
        assert_eq!(provider.complete(&msgs, &opts).await.unwrap().content, "second");
        assert!(matches!(
            provider.complete(&msgs, &opts).await,
            Err(AgentError::Provider(e)) if e == "boom"
        ));
        assert!(provider.complete(&msgs, &opts).await.is_err());
        assert_eq!(provider.requests().await.len(), 4);
        assert_eq!(provider.requested_models().await[0], "mock-model");
    }
}
