//! OpenAI-compatible LLM Provider
//!
//! Implementation of `LlmProvider` for any endpoint speaking the
//! `/chat/completions` dialect: OpenRouter for the demo assistant, OpenAI
//! (or a proxy set through `OPENAI_API_BASE`) for the research crew.

use std::time::Duration;

use agent_core::{
    error::{AgentError, Result},
    message::{Message, Role},
    provider::{
        Completion, FinishReason, GenerationOptions, LlmProvider, ModelInfo, ProviderInfo,
        TokenUsage,
    },
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Provider configuration
#[derive(Clone, Debug)]
pub struct ProviderConfig {
    /// Display name used in logs and `info()`
    pub name: String,

    /// API root, without trailing slash
    pub base_url: String,

    pub api_key: Option<String>,

    /// Environment variable the key is read from, for error messages
    pub api_key_var: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl ProviderConfig {
    /// OpenRouter settings from `OPENROUTER_API_KEY` / `OPENROUTER_API_BASE`
    pub fn openrouter_from_env() -> Self {
        Self::openrouter_from(|key| std::env::var(key).ok())
    }

    pub fn openrouter_from(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            name: "OpenRouter".into(),
            base_url: lookup("OPENROUTER_API_BASE")
                .unwrap_or_else(|| OPENROUTER_BASE_URL.into()),
            api_key: lookup("OPENROUTER_API_KEY").filter(|k| !k.trim().is_empty()),
            api_key_var: "OPENROUTER_API_KEY".into(),
            timeout_secs: 120,
        }
        .normalized()
    }

    /// OpenAI settings from `OPENAI_API_KEY` / `OPENAI_API_BASE`
    pub fn openai_from_env() -> Self {
        Self::openai_from(|key| std::env::var(key).ok())
    }

    pub fn openai_from(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            name: "OpenAI".into(),
            base_url: lookup("OPENAI_API_BASE").unwrap_or_else(|| OPENAI_BASE_URL.into()),
            api_key: lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty()),
            api_key_var: "OPENAI_API_KEY".into(),
            timeout_secs: 120,
        }
        .normalized()
    }

    fn normalized(mut self) -> Self {
        while self.base_url.ends_with('/') {
            self.base_url.pop();
        }
        self
    }

    pub const fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Model id as the endpoint expects it. `openai/gpt-4o-mini` names a
    /// provider and a model; OpenAI itself only knows `gpt-4o-mini`.
    pub fn wire_model<'a>(&self, model: &'a str) -> &'a str {
        if self.base_url == OPENAI_BASE_URL {
            model.strip_prefix("openai/").unwrap_or(model)
        } else {
            model
        }
    }
}

// Wire types for the chat completions API

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "no_stop_sequences")]
    stop: &'a [String],
}

fn no_stop_sequences(stop: &&[String]) -> bool {
    stop.is_empty()
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

#[derive(Deserialize)]
struct ModelList {
    data: Vec<WireModel>,
}

#[derive(Deserialize)]
struct WireModel {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    context_length: Option<u32>,
}

/// LLM provider for OpenAI-compatible HTTP APIs
pub struct OpenAiCompatibleProvider {
    client: reqwest::Client,
    config: ProviderConfig,
}

impl OpenAiCompatibleProvider {
    pub fn from_config(config: ProviderConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "falling back to default HTTP client");
                reqwest::Client::new()
            });

        Self { client, config }
    }

    pub fn openrouter_from_env() -> Self {
        Self::from_config(ProviderConfig::openrouter_from_env())
    }

    pub fn openai_from_env() -> Self {
        Self::from_config(ProviderConfig::openai_from_env())
    }

    pub const fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Tool output goes back to the model as user context
    const fn wire_role(role: Role) -> &'static str {
        match role {
            Role::System => "system",
            Role::User | Role::Tool => "user",
            Role::Assistant => "assistant",
        }
    }

    fn chat_request<'a>(
        &self,
        messages: &'a [Message],
        options: &'a GenerationOptions,
    ) -> ChatRequest<'a> {
        ChatRequest {
            model: self.config.wire_model(&options.model),
            messages: Self::convert_messages(messages),
            temperature: options.temperature,
            top_p: options.top_p,
            max_tokens: options.max_tokens,
            stop: &options.stop_sequences,
        }
    }

    fn convert_messages(messages: &[Message]) -> Vec<WireMessage<'_>> {
        messages
            .iter()
            .map(|m| WireMessage {
                role: Self::wire_role(m.role),
                content: &m.content,
            })
            .collect()
    }

    fn convert_completion(response: ChatResponse, requested_model: &str) -> Result<Completion> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::Parse("response contained no choices".into()))?;

        Ok(Completion {
            content: choice.message.content.unwrap_or_default(),
            model: response.model.unwrap_or_else(|| requested_model.to_string()),
            usage: response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            finish_reason: choice.finish_reason.as_deref().map(FinishReason::parse),
        })
    }

    fn api_key(&self) -> Result<&str> {
        self.config.api_key.as_deref().ok_or_else(|| {
            AgentError::Auth(format!("{} is not set", self.config.api_key_var))
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url, path)
    }

    async fn check_status(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(status_error(&self.config.name, status, body))
    }
}

fn status_error(provider: &str, status: StatusCode, body: String) -> AgentError {
    let detail = format!("{provider} returned {status}: {body}");
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AgentError::Auth(detail),
        StatusCode::TOO_MANY_REQUESTS => AgentError::RateLimited(detail),
        s if s.is_server_error() => AgentError::ProviderUnavailable(detail),
        _ => AgentError::Provider(detail),
    }
}

fn transport_error(e: &reqwest::Error) -> AgentError {
    if e.is_connect() || e.is_timeout() {
        AgentError::ProviderUnavailable(e.to_string())
    } else {
        AgentError::Provider(e.to_string())
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    async fn info(&self) -> Result<ProviderInfo> {
        let models = self.list_models().await.unwrap_or_default();

        Ok(ProviderInfo {
            name: self.config.name.clone(),
            base_url: Some(self.config.base_url.clone()),
            models,
            supports_tools: false,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        if !self.config.has_api_key() {
            return Ok(false);
        }
        match self.list_models().await {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!(provider = %self.config.name, error = %e, "health check failed");
                Ok(false)
            }
        }
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        let api_key = self.api_key()?;
        let request = self.chat_request(messages, options);

        tracing::debug!(
            provider = %self.config.name,
            model = %request.model,
            messages = messages.len(),
            "sending chat completion"
        );

        let response = self
            .client
            .post(self.url("chat/completions"))
            .bearer_auth(api_key)
            .header("X-Title", "demo-agents")
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let response = self.check_status(response).await?;
        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Parse(e.to_string()))?;

        Self::convert_completion(body, &options.model)
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let mut request = self.client.get(self.url("models"));
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| transport_error(&e))?;
        let response = self.check_status(response).await?;
        let list: ModelList = response
            .json()
            .await
            .map_err(|e| AgentError::Parse(e.to_string()))?;

        Ok(list
            .data
            .into_iter()
            .map(|m| ModelInfo {
                name: m.name.unwrap_or_else(|| m.id.clone()),
                id: m.id,
                context_length: m.context_length,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_openrouter_defaults() {
        let config = ProviderConfig::openrouter_from(lookup(&[]));
        assert_eq!(config.base_url, "https://openrouter.ai/api/v1");
        assert!(!config.has_api_key());
        assert_eq!(config.api_key_var, "OPENROUTER_API_KEY");
    }

    #[test]
    fn test_openai_base_override_is_normalized() {
        let config = ProviderConfig::openai_from(lookup(&[
            ("OPENAI_API_BASE", "https://proxy.local/v1/"),
            ("OPENAI_API_KEY", "sk-test"),
        ]));
        assert_eq!(config.base_url, "https://proxy.local/v1");
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_openai_prefix_stripped_for_openai_endpoint() {
        let messages = [Message::user("hi")];
        let options = GenerationOptions::for_model("openai/gpt-4o-mini");

        let openai =
            OpenAiCompatibleProvider::from_config(ProviderConfig::openai_from(lookup(&[])));
        let body = serde_json::to_value(openai.chat_request(&messages, &options)).unwrap();
        assert_eq!(body["model"], "gpt-4o-mini");

        let openrouter = OpenAiCompatibleProvider::from_config(ProviderConfig::openai_from(lookup(
            &[("OPENAI_API_BASE", "https://openrouter.ai/api/v1")],
        )));
        let body = serde_json::to_value(openrouter.chat_request(&messages, &options)).unwrap();
        assert_eq!(body["model"], "openai/gpt-4o-mini");

        let config = ProviderConfig::openai_from(lookup(&[]));
        assert_eq!(config.wire_model("gpt-4o"), "gpt-4o");
        assert_eq!(config.wire_model("anthropic/claude"), "anthropic/claude");
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let config = ProviderConfig::openrouter_from(lookup(&[("OPENROUTER_API_KEY", "  ")]));
        assert!(!config.has_api_key());
    }

    #[tokio::test]
    async fn test_complete_without_key_is_auth_error() {
        let provider =
            OpenAiCompatibleProvider::from_config(ProviderConfig::openrouter_from(lookup(&[])));
        let err = provider
            .complete(&[Message::user("hi")], &GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Auth(msg) if msg.contains("OPENROUTER_API_KEY")));
        assert!(!provider.health_check().await.unwrap());
    }

    #[test]
    fn test_message_conversion() {
        let messages = vec![
            Message::system("You are helpful."),
            Message::user("Hello"),
            Message::tool("[Tool 'get_time' returned]\n...", None),
        ];

        let converted = OpenAiCompatibleProvider::convert_messages(&messages);
        let roles: Vec<_> = converted.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec!["system", "user", "user"]);
    }

    #[test]
    fn test_completion_conversion() {
        let raw = r#"{
            "model": "google/gemini-2.5-flash",
            "choices": [{"message": {"role": "assistant", "content": "Hi!"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 2, "total_tokens": 12}
        }"#;
        let response: ChatResponse = serde_json::from_str(raw).unwrap();
        let completion = OpenAiCompatibleProvider::convert_completion(response, "x").unwrap();

        assert_eq!(completion.content, "Hi!");
        assert_eq!(completion.model, "google/gemini-2.5-flash");
        assert_eq!(completion.usage.unwrap().total_tokens, 12);
        assert_eq!(completion.finish_reason, Some(FinishReason::Stop));
    }

    #[test]
    fn test_empty_choices_is_parse_error() {
        let response: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(
            OpenAiCompatibleProvider::convert_completion(response, "x"),
            Err(AgentError::Parse(_))
        ));
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            status_error("OpenRouter", StatusCode::UNAUTHORIZED, String::new()),
            AgentError::Auth(_)
        ));
        assert!(matches!(
            status_error("OpenRouter", StatusCode::TOO_MANY_REQUESTS, String::new()),
            AgentError::RateLimited(_)
        ));
        assert!(matches!(
            status_error("OpenRouter", StatusCode::BAD_GATEWAY, String::new()),
            AgentError::ProviderUnavailable(_)
        ));
        assert!(matches!(
            status_error("OpenRouter", StatusCode::BAD_REQUEST, "bad model".into()),
            AgentError::Provider(msg) if msg.contains("bad model")
        ));
    }
}
