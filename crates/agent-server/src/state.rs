//! Application State

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use agent_core::{Agent, AgentConfig, Conversation, GenerationOptions, LlmProvider, ToolRegistry};
use demo_tools::{ASSISTANT_DESCRIPTION, ASSISTANT_INSTRUCTION, ASSISTANT_NAME};

/// Token budget a stored conversation is trimmed to after each turn
pub const MAX_CONTEXT_TOKENS: u32 = 8192;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// LLM provider (OpenRouter by default)
    pub provider: Arc<dyn LlmProvider>,

    /// The four demo tools
    pub tools: Arc<ToolRegistry>,

    /// Model and sampling defaults for new conversations
    pub generation: GenerationOptions,

    /// Chat history keyed by conversation id
    pub sessions: Arc<RwLock<HashMap<String, Conversation>>>,
}

impl AppState {
    pub fn new(provider: Arc<dyn LlmProvider>, model: Option<String>) -> Self {
        let mut generation = GenerationOptions::default();
        if let Some(model) = model {
            generation.model = model;
        }

        Self {
            provider,
            tools: Arc::new(demo_tools::registry()),
            generation,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Copy of the stored history for `id`, if any
    pub async fn conversation(&self, id: &str) -> Option<Conversation> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Trim `conversation` and store it under `id`
    pub async fn save_conversation(&self, id: String, mut conversation: Conversation) {
        let dropped = conversation.truncate_to_fit(MAX_CONTEXT_TOKENS);
        if dropped > 0 {
            tracing::debug!(conversation = %id, dropped, "trimmed conversation history");
        }
        self.sessions.write().await.insert(id, conversation);
    }

    /// The demo assistant, optionally on a different model
    pub fn assistant(&self, model: Option<&str>) -> Agent {
        let mut generation = self.generation.clone();
        if let Some(model) = model {
            generation.model = model.to_string();
        }

        let config = AgentConfig {
            name: ASSISTANT_NAME.into(),
            description: ASSISTANT_DESCRIPTION.into(),
            system_prompt: ASSISTANT_INSTRUCTION.into(),
            generation,
            ..AgentConfig::default()
        };

        Agent::new(Arc::clone(&self.provider), Arc::clone(&self.tools), config)
    }
}
