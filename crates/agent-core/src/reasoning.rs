//! Reasoning Loop
//!
//! ReAct-style loop: ask the model, run any tool it requests, feed the tool
//! output back, and stop at the first plain answer.

use std::sync::Arc;

use crate::error::{AgentError, Result};
use crate::message::{Conversation, Message};
use crate::provider::{GenerationOptions, LlmProvider};
use crate::tool::{Tool, ToolCall, ToolRegistry, ToolResult};

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// Agent identifier used in logs
    pub name: String,

    /// One-line summary of what the agent does
    pub description: String,

    /// System prompt (instruction)
    pub system_prompt: String,

    /// Maximum reasoning iterations before giving up
    pub max_iterations: usize,

    pub generation: GenerationOptions,

    /// Whether to append tool descriptions to system prompt
    pub inject_tool_descriptions: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: "assistant".into(),
            description: String::new(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            max_iterations: 10,
            generation: GenerationOptions::default(),
            inject_tool_descriptions: true,
        }
    }
}

const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a helpful AI assistant.

When you need to use a tool, respond with a JSON block in this exact format:
```tool
{"tool": "tool_name", "arguments": {"arg1": "value1"}}
```

After receiving tool results, synthesize them into a helpful response.
If you can answer directly without tools, do so.
Be concise and accurate."#;

const TOOL_FENCE: &str = "```tool";
const FENCE_END: &str = "```";

pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    config: AgentConfig,
}

impl Agent {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tools: Arc<ToolRegistry>,
        config: AgentConfig,
    ) -> Self {
        Self {
            provider,
            tools,
            config,
        }
    }

    pub fn with_defaults(provider: Arc<dyn LlmProvider>, tools: Arc<ToolRegistry>) -> Self {
        Self::new(provider, tools, AgentConfig::default())
    }

    /// Build the full system prompt including tool descriptions
    pub fn system_prompt(&self) -> String {
        let mut prompt = self.config.system_prompt.clone();

        if self.config.inject_tool_descriptions && !self.tools.is_empty() {
            prompt.push_str("\n\n");
            prompt.push_str(&self.tools.generate_prompt_section());
        }

        prompt
    }

    /// Run the loop over an existing conversation and return the final answer
    pub async fn run(&self, conversation: &mut Conversation) -> Result<String> {
        if !conversation.has_system_prompt() {
            conversation
                .messages_mut()
                .insert(0, Message::system(self.system_prompt()));
        }

        for iteration in 1..=self.config.max_iterations {
            let completion = self
                .provider
                .complete(conversation.messages(), &self.config.generation)
                .await?;

            let content = completion.content;
            conversation.push(Message::assistant(&content));

            let Some(tool_call) = parse_tool_call(&content) else {
                tracing::debug!(agent = %self.config.name, iteration, "final answer");
                return Ok(content);
            };

            tracing::info!(agent = %self.config.name, tool = %tool_call.name, iteration, "executing tool");
            let result = self.execute_tool(&tool_call).await;
            conversation.push(Message::tool(format_tool_result(&result), tool_call.id));
        }

        Err(AgentError::MaxIterations(self.config.max_iterations))
    }

    /// Answer a single prompt in a fresh conversation
    pub async fn ask(&self, question: &str) -> Result<String> {
        let mut conversation = Conversation::with_system_prompt(self.system_prompt());
        conversation.push(Message::user(question));
        self.run(&mut conversation).await
    }

    /// Tool failures are reported to the model rather than aborting the loop
    async fn execute_tool(&self, call: &ToolCall) -> ToolResult {
        match self.tools.execute(call).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(tool = %call.name, error = %e, "tool call failed");
                let mut result = ToolResult::failure(&call.name, format!("Error: {e}"));
                result.id.clone_from(&call.id);
                result
            }
        }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }
}

/// Parse a tool call from model output.
///
/// Looks for a fenced ```` ```tool ```` block first and falls back to an
/// inline JSON object carrying a `"tool"` key.
pub fn parse_tool_call(content: &str) -> Option<ToolCall> {
    let fenced = content.find(TOOL_FENCE).and_then(|start| {
        let after_marker = &content[start + TOOL_FENCE.len()..];
        let end = after_marker.find(FENCE_END)?;
        serde_json::from_str::<ToolCall>(after_marker[..end].trim()).ok()
    });

    let mut call = fenced.or_else(|| parse_inline_tool_call(content))?;
    if call.id.is_none() {
        call.id = Some(uuid::Uuid::new_v4().to_string());
    }
    Some(call)
}

fn parse_inline_tool_call(content: &str) -> Option<ToolCall> {
    if !content.contains(r#""tool""#) {
        return None;
    }

    let start = content.find('{')?;
    let end = content.rfind('}')?;
    if end <= start {
        return None;
    }

    serde_json::from_str::<ToolCall>(&content[start..=end]).ok()
}

/// Format tool result for conversation
pub fn format_tool_result(result: &ToolResult) -> String {
    if result.success {
        format!("[Tool '{}' returned]\n{}", result.name, result.output)
    } else {
        format!("[Tool '{}' failed]\n{}", result.name, result.output)
    }
}

/// Builder for Agent configuration
pub struct AgentBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    tools: ToolRegistry,
    config: AgentConfig,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            tools: ToolRegistry::new(),
            config: AgentConfig::default(),
        }
    }

    #[must_use]
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    #[must_use]
    pub fn tool<T: Tool + 'static>(mut self, tool: T) -> Self {
        self.tools.register(tool);
        self
    }

    #[must_use]
    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.config.description = description.into();
        self
    }

    #[must_use]
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    #[must_use]
    pub fn generation(mut self, generation: GenerationOptions) -> Self {
        self.config.generation = generation;
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.generation.model = model.into();
        self
    }

    #[must_use]
    pub const fn temperature(mut self, temp: f32) -> Self {
        self.config.generation.temperature = temp;
        self
    }

    #[must_use]
    pub const fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.config.generation.max_tokens = max_tokens;
        self
    }

    #[must_use]
    pub const fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    pub fn build(self) -> Result<Agent> {
        let provider = self
            .provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;

        Ok(Agent::new(provider, Arc::new(self.tools), self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;
    use crate::provider::MockProvider;
    use crate::tool::{ParameterSchema, ToolSchema};
    use async_trait::async_trait;

    struct ShoutTool;

    #[async_trait]
    impl Tool for ShoutTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "shout".into(),
                description: "Upper-case the text".into(),
                parameters: vec![ParameterSchema::string("text", "Text to shout")],
                category: None,
                has_side_effects: false,
            }
        }

        async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
            Ok(ToolResult::success(
                "shout",
                call.string_arg("text")?.to_uppercase(),
            ))
        }
    }

    fn agent_with(provider: Arc<MockProvider>) -> Agent {
        AgentBuilder::new()
            .provider(provider)
            .tool(ShoutTool)
            .max_iterations(3)
            .build()
            .unwrap()
    }

    #[test]
    fn test_parse_fenced_tool_call() {
        let content = r#"Let me check that for you.
```tool
{"tool": "calculate_math", "arguments": {"expression": "2 + 2"}}
```"#;

        let call = parse_tool_call(content).unwrap();
        assert_eq!(call.name, "calculate_math");
        assert_eq!(call.string_arg("expression").unwrap(), "2 + 2");
        assert!(call.id.is_some());
    }

    #[test]
    fn test_parse_inline_tool_call() {
        let content = r#"{"tool": "get_weather", "arguments": {"city": "Tokyo"}}"#;
        let call = parse_tool_call(content).unwrap();
        assert_eq!(call.name, "get_weather");
    }

    #[test]
    fn test_plain_answer_is_not_a_tool_call() {
        assert!(parse_tool_call("The weather in Paris is lovely.").is_none());
        assert!(parse_tool_call("```tool\nnot json\n```").is_none());
    }

    #[tokio::test]
    async fn test_tool_output_is_fed_back_to_the_model() {
        let provider = Arc::new(MockProvider::scripted([
            "```tool\n{\"tool\": \"shout\", \"arguments\": {\"text\": \"hello\"}}\n```",
            "The tool said HELLO.",
        ]));
        let agent = agent_with(provider.clone());

        let answer = agent.ask("shout hello").await.unwrap();
        assert_eq!(answer, "The tool said HELLO.");

        let requests = provider.requests().await;
        assert_eq!(requests.len(), 2);
        let tool_msg = requests[1].last().unwrap();
        assert_eq!(tool_msg.role, Role::Tool);
        assert_eq!(tool_msg.content, "[Tool 'shout' returned]\nHELLO");
        assert!(requests[0][0].content.contains("### shout"));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_reported_not_fatal() {
        let provider = Arc::new(MockProvider::scripted([
            r#"{"tool": "nope", "arguments": {}}"#,
            "Sorry, I cannot do that.",
        ]));
        let agent = agent_with(provider.clone());

        assert_eq!(agent.ask("do it").await.unwrap(), "Sorry, I cannot do that.");
        let requests = provider.requests().await;
        assert!(requests[1].last().unwrap().content.starts_with("[Tool 'nope' failed]"));
    }

    #[tokio::test]
    async fn test_max_iterations() {
        let call = r#"{"tool": "shout", "arguments": {"text": "again"}}"#;
        let provider = Arc::new(MockProvider::scripted([call, call, call]));
        let agent = agent_with(provider);

        let err = agent.ask("loop forever").await.unwrap_err();
        assert!(matches!(err, AgentError::MaxIterations(3)));
    }

    #[test]
    fn test_builder_requires_provider() {
        assert!(matches!(AgentBuilder::new().build(), Err(AgentError::Config(_))));
    }
}
