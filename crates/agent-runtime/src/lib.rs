//! # agent-runtime
//!
//! Runtime providers for the demo agents.
//!
//! ## Providers
//!
//! - **OpenAI-compatible**: any `/chat/completions` endpoint. The demo
//!   assistant points it at OpenRouter, the research crew at OpenAI.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::OpenAiCompatibleProvider;
//!
//! let provider = OpenAiCompatibleProvider::openrouter_from_env();
//! let agent = AgentBuilder::new()
//!     .provider(Arc::new(provider))
//!     .build()?;
//! ```

pub mod openai_compat;

pub use openai_compat::{OpenAiCompatibleProvider, ProviderConfig};

// Re-export core types for convenience
pub use agent_core::{
    Agent, AgentError, LlmProvider, Message, Result, Role, Tool, ToolRegistry,
};
